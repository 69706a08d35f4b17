use clap::{Args, Subcommand, ValueEnum};

use baflink_proto::Encoding;

use crate::exit::{CliError, CliResult, DATA_INVALID};
use crate::output::OutputFormat;

pub mod checksum;
pub mod decode;
pub mod opcodes;
pub mod request;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode hex-encoded wire bytes into typed messages.
    Decode(DecodeArgs),
    /// Encode a named request and print its wire bytes.
    Request(RequestArgs),
    /// List the known (family, opcode) table.
    Opcodes(OpcodesArgs),
    /// Compute the trailer checksum of a hex-encoded frame.
    Checksum(ChecksumArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Request(args) => request::run(args, format),
        Command::Opcodes(args) => opcodes::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded byte chunks, or `-` to read hex text from stdin. Each
    /// chunk is fed to the decoder separately, so stream fragmentation can
    /// be reproduced from the shell.
    #[arg(required = true, value_name = "HEX")]
    pub chunks: Vec<String>,
    /// Also report leftover bytes the decoder is still waiting on.
    #[arg(long)]
    pub flush: bool,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum EncodingArg {
    #[default]
    Plain,
    Checksummed,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Plain => Encoding::Plain,
            EncodingArg::Checksummed => Encoding::Checksummed,
        }
    }
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Request name: fw-version, evtlog-status, speed, or probe.
    pub name: String,
    /// Probe code (required with `probe`), e.g. 0x08.
    #[arg(long, value_name = "BYTE")]
    pub code: Option<String>,
    /// Wire encoding mode.
    #[arg(long, value_name = "MODE", default_value = "plain")]
    pub encoding: EncodingArg,
}

#[derive(Args, Debug, Default)]
pub struct OpcodesArgs {}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Hex-encoded frame, at least two bytes.
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex input, tolerating a leading `0x` and embedded whitespace.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&cleaned)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex '{input}': {err}")))
}

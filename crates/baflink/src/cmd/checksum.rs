use baflink_proto::wire_checksum;
use serde::Serialize;

use crate::cmd::{parse_hex, ChecksumArgs};
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct ChecksumOutput {
    frame: String,
    checksum: String,
}

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.frame)?;
    if frame.len() < 2 {
        return Err(CliError::new(
            DATA_INVALID,
            "frame must be at least two bytes",
        ));
    }
    let checksum = wire_checksum(&frame);

    match format {
        OutputFormat::Json => {
            let out = ChecksumOutput {
                frame: hex::encode(&frame),
                checksum: format!("0x{checksum:02X}"),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => println!("0x{checksum:02X}"),
    }

    Ok(SUCCESS)
}

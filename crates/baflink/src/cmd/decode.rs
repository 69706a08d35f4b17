use std::io::Read;

use baflink_proto::FrameDecoder;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut decoder = FrameDecoder::new();

    for chunk in &args.chunks {
        let bytes = if chunk == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| CliError::new(INTERNAL, format!("reading stdin: {err}")))?;
            parse_hex(&text)?
        } else {
            parse_hex(chunk)?
        };
        for message in decoder.ingest(&bytes) {
            print_message(&message, format);
        }
    }

    if args.flush {
        if let Some(remainder) = decoder.flush() {
            print_message(&remainder, format);
        }
    } else if !decoder.pending().is_empty() {
        tracing::info!(
            pending = %hex::encode(decoder.pending()),
            "decoder still waiting on an incomplete frame"
        );
    }

    Ok(SUCCESS)
}

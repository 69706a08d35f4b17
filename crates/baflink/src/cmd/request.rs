use baflink_proto::{opcode, Message};
use serde::Serialize;

use crate::cmd::{parse_hex, RequestArgs};
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct RequestOutput<'a> {
    request: &'a str,
    encoding: &'a str,
    bytes: String,
}

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let message = resolve_request(&args)?;
    let bytes = message.to_bytes(args.encoding.into());
    let encoded = hex::encode(&bytes);

    match format {
        OutputFormat::Json => {
            let out = RequestOutput {
                request: message.kind_name(),
                encoding: match args.encoding {
                    crate::cmd::EncodingArg::Plain => "plain",
                    crate::cmd::EncodingArg::Checksummed => "checksummed",
                },
                bytes: encoded,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty | OutputFormat::Table => {
            println!("{} -> {encoded}", message.kind_name());
        }
        OutputFormat::Raw => println!("{encoded}"),
    }

    Ok(SUCCESS)
}

fn resolve_request(args: &RequestArgs) -> CliResult<Message> {
    match args.name.as_str() {
        "fw-version" => Ok(Message::FirmwareVersionRequest),
        "evtlog-status" => Ok(Message::EventLogStatusRequest),
        "speed" => Ok(Message::SpeedRequest),
        "probe" => {
            let code = args
                .code
                .as_deref()
                .ok_or_else(|| CliError::new(USAGE, "probe requires --code"))?;
            let bytes = parse_hex(code)?;
            match bytes.as_slice() {
                [code] if opcode::PROBE_CODES.contains(code) => {
                    Ok(Message::Probe { code: *code })
                }
                [code] => Err(CliError::new(
                    USAGE,
                    format!("unknown probe code 0x{code:02X}"),
                )),
                _ => Err(CliError::new(USAGE, "probe code must be a single byte")),
            }
        }
        other => Err(CliError::new(
            USAGE,
            format!("unknown request '{other}' (expected fw-version, evtlog-status, speed, or probe)"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::cmd::EncodingArg;

    use super::*;

    fn args(name: &str, code: Option<&str>) -> RequestArgs {
        RequestArgs {
            name: name.to_string(),
            code: code.map(str::to_string),
            encoding: EncodingArg::Plain,
        }
    }

    #[test]
    fn named_requests_resolve() {
        assert!(matches!(
            resolve_request(&args("fw-version", None)),
            Ok(Message::FirmwareVersionRequest)
        ));
        assert!(matches!(
            resolve_request(&args("probe", Some("0x08"))),
            Ok(Message::Probe { code: 0x08 })
        ));
    }

    #[test]
    fn unknown_name_is_a_usage_error() {
        let err = resolve_request(&args("warp-speed", None)).expect_err("should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn probe_outside_the_known_set_is_rejected() {
        let err = resolve_request(&args("probe", Some("0x42"))).expect_err("should fail");
        assert_eq!(err.code, USAGE);
    }
}

use std::io::IsTerminal;

use baflink_proto::{Encoding, Message};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "FAMILY", "OPCODE", "DETAIL"])
                .add_row(vec![
                    message.kind_name().to_string(),
                    message.family().name().to_string(),
                    format!("0x{:02X}", message.opcode()),
                    message_detail(message),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} family={} opcode=0x{:02X} {}",
                message.kind_name(),
                message.family().name(),
                message.opcode(),
                message_detail(message)
            );
        }
        OutputFormat::Raw => {
            if let Some(bytes) = wire_bytes(message) {
                println!("{}", hex::encode(bytes));
            }
        }
    }
}

/// Bytes this message actually occupies on the wire.
///
/// `Unparsed` keeps the bytes it was built from; the stream sentinels
/// (`NoOp`, `ProcessingError`) never existed on the wire and yield nothing.
pub fn wire_bytes(message: &Message) -> Option<Vec<u8>> {
    match message {
        Message::Unparsed { bytes, .. } => Some(bytes.clone()),
        Message::NoOp | Message::ProcessingError { .. } => None,
        other => Some(other.to_bytes(Encoding::Plain)),
    }
}

pub fn message_detail(message: &Message) -> String {
    match message {
        Message::FirmwareVersion(version) => format!("version {version}"),
        Message::Speed {
            range_extension,
            raw_wheel_speed,
        } => format!("range_extension={range_extension} raw_wheel_speed={raw_wheel_speed}"),
        Message::Probe { code } => format!("code 0x{code:02X}"),
        Message::Write { payload, .. } => format!("payload {}", hex::encode(payload)),
        Message::Unparsed { bytes, .. } => format!("bytes {}", hex::encode(bytes)),
        Message::ProcessingError { message } => message.clone(),
        _ => String::new(),
    }
}

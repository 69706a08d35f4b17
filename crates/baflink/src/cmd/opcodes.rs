use baflink_proto::{opcode, Family};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::OpcodesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct OpcodeRow {
    family: Family,
    family_code: String,
    opcode: String,
    name: &'static str,
}

pub fn run(_args: OpcodesArgs, format: OutputFormat) -> CliResult<i32> {
    let rows: Vec<OpcodeRow> = opcode::entries()
        .into_iter()
        .map(|(family, code, name)| OpcodeRow {
            family,
            family_code: format!("0x{:02X}", family.code()),
            opcode: format!("0x{code:02X}"),
            name,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FAMILY", "CODE", "OPCODE", "NAME"]);
            for row in &rows {
                table.add_row(vec![
                    row.family.name().to_string(),
                    row.family_code.clone(),
                    row.opcode.clone(),
                    row.name.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!(
                    "{} {} {} {}",
                    row.family.name(),
                    row.family_code,
                    row.opcode,
                    row.name
                );
            }
        }
    }

    Ok(SUCCESS)
}

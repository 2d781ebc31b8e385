// dqx/src/commands/output.rs
//
// Rendering shared by all commands: pretty JSON or comfy-table tables.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

use dqx_core::domain::quality::{QueryOutput, RuleScript};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn rows_table(output: &QueryOutput) -> Table {
    let mut table = new_table();
    table.set_header(output.column_names.clone());
    for row in &output.rows {
        table.add_row(
            output
                .column_names
                .iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default()),
        );
    }
    table
}

pub fn scripts_table(scripts: &[RuleScript]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["id", "name", "description", "updated_at"]);
    for s in scripts {
        table.add_row(vec![
            s.id.to_string(),
            s.name.clone(),
            s.description.clone().unwrap_or_default(),
            s.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

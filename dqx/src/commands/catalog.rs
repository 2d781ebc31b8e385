// dqx/src/commands/catalog.rs
//
// USE CASE: Read-only views of the catalog (stats, findings, staging).

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

use dqx_core::domain::quality::FindingsFilter;

use crate::cli::GlobalOpts;
use crate::commands::context::open_pipeline;
use crate::commands::output::{print_json, rows_table};

pub fn stats(global: &GlobalOpts) -> anyhow::Result<()> {
    let stats = open_pipeline(global)?.stats()?;
    if global.json {
        return print_json(&stats);
    }
    println!("📊 Scripts:  {}", stats.script_count);
    println!("   Findings: {}", stats.finding_count);
    Ok(())
}

pub fn findings(
    global: &GlobalOpts,
    rule_id: Option<String>,
    source_id: Option<String>,
    limit: usize,
) -> anyhow::Result<()> {
    let filter = FindingsFilter {
        rule_id,
        source_id,
        limit,
    };
    let output = open_pipeline(global)?.query_findings(&filter)?;
    if global.json {
        return print_json(&output);
    }
    println!("{}", rows_table(&output));
    println!("   {} finding(s) (limit {})", output.len(), limit);
    Ok(())
}

pub fn staging(global: &GlobalOpts) -> anyhow::Result<()> {
    let tables = open_pipeline(global)?.list_staging_tables()?;
    if global.json {
        return print_json(&tables);
    }
    if tables.is_empty() {
        println!("No staging tables.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["script_id", "table", "rows"]);
    for t in &tables {
        table.add_row(vec![t.script_id.to_string(), t.table.clone(), t.rows.to_string()]);
    }
    println!("{table}");
    Ok(())
}

// dqx/src/commands/run.rs
//
// USE CASE: Move a script's output through staging into the findings table.

use std::time::Instant;

use crate::cli::GlobalOpts;
use crate::commands::context::open_pipeline;
use crate::commands::output::print_json;

pub fn populate(global: &GlobalOpts, id: i64) -> anyhow::Result<()> {
    let start = Instant::now();
    let report = open_pipeline(global)?.populate_staging(id)?;
    if global.json {
        return print_json(&report);
    }
    println!(
        "📥 Staged {} row(s) into {} in {:.2?}",
        report.inserted_rows,
        report.table,
        start.elapsed()
    );
    Ok(())
}

pub fn publish(global: &GlobalOpts, id: i64) -> anyhow::Result<()> {
    let report = open_pipeline(global)?.publish_findings(id)?;
    if global.json {
        return print_json(&report);
    }
    if report.is_noop() {
        println!("💤 {}", report.message);
    } else {
        println!(
            "📤 Published {} finding(s) across {} key(s) for script #{}",
            report.published_rows, report.keys_replaced_count, report.script_id
        );
    }
    Ok(())
}

// dqx/src/commands/query.rs
//
// USE CASE: Ad hoc SQL, read-only or with a commit policy.

use serde_json::Value;

use dqx_core::domain::value::Param;
use dqx_core::{StatementIntent, StatementOutcome};

use crate::cli::GlobalOpts;
use crate::commands::context::open_pipeline;
use crate::commands::output::{print_json, rows_table};

/// `--param` values: JSON scalars keep their type (`3`, `true`, `null`),
/// everything else binds as text.
pub fn parse_params(raw: &[String]) -> Vec<Param> {
    raw.iter()
        .map(|p| match serde_json::from_str::<Value>(p) {
            Ok(v) if !v.is_object() && !v.is_array() => Param::from_json(&v),
            _ => Param::from(p.as_str()),
        })
        .collect()
}

pub fn select(global: &GlobalOpts, sql: &str, params: &[String]) -> anyhow::Result<()> {
    let output = open_pipeline(global)?.run_select(sql, &parse_params(params))?;
    if global.json {
        return print_json(&output);
    }
    println!("{}", rows_table(&output));
    println!("   {} row(s)", output.len());
    Ok(())
}

pub fn exec(
    global: &GlobalOpts,
    sql: &str,
    params: &[String],
    mode: StatementIntent,
) -> anyhow::Result<()> {
    let outcome = open_pipeline(global)?.run_statement(sql, &parse_params(params), mode)?;
    if global.json {
        return print_json(&outcome);
    }
    let verdict = if outcome.committed() {
        "committed"
    } else {
        "rolled back"
    };
    match &outcome {
        StatementOutcome::Rows { output, .. } => {
            println!("{}", rows_table(output));
            println!("   {} row(s), {}", output.len(), verdict);
        }
        StatementOutcome::Affected { affected_rows, .. } => {
            println!("⚡ {} row(s) affected, {}", affected_rows, verdict);
        }
    }
    Ok(())
}

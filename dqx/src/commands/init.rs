// dqx/src/commands/init.rs
//
// USE CASE: Scaffold a project (dqx.yaml) and bootstrap the catalog.

use anyhow::Context;
use serde_json::json;

use dqx_core::infrastructure::config::project::CONFIG_CANDIDATES;
use dqx_core::infrastructure::config::write_default_config;

use crate::cli::GlobalOpts;
use crate::commands::context::open_pipeline;
use crate::commands::output::print_json;

pub fn execute(global: &GlobalOpts, name: &str) -> anyhow::Result<()> {
    let existing = CONFIG_CANDIDATES
        .iter()
        .map(|f| global.project_dir.join(f))
        .find(|p| p.exists());

    let (config_path, written) = match existing {
        Some(path) => (path, false),
        None => {
            let path = write_default_config(&global.project_dir, name).with_context(|| {
                format!("Failed to write dqx.yaml in {:?}", global.project_dir)
            })?;
            (path, true)
        }
    };

    let pipeline = open_pipeline(global)?;
    let catalog = pipeline.catalog();

    if global.json {
        return print_json(&json!({
            "config": config_path.display().to_string(),
            "written": written,
            "scripts_table": catalog.scripts.to_string(),
            "findings_table": catalog.findings.to_string(),
        }));
    }

    if written {
        println!("📝 Wrote {}", config_path.display());
    } else {
        println!("⚙️  Keeping existing {}", config_path.display());
    }
    println!(
        "✨ Catalog ready: {} / {}",
        catalog.scripts, catalog.findings
    );
    Ok(())
}

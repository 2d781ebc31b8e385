// dqx/src/commands/context.rs
//
// Builds the pipeline every database-backed command runs against.

use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

use dqx_core::QualityPipeline;
use dqx_core::infrastructure::adapters::DuckDbConnector;
use dqx_core::infrastructure::config::{load_project_config, resolve_database_path};

use crate::cli::GlobalOpts;

/// Loads dqx.yaml, applies `--db-path`, opens DuckDB and makes sure the
/// catalog tables exist.
pub fn open_pipeline(global: &GlobalOpts) -> anyhow::Result<QualityPipeline> {
    let mut config = load_project_config(&global.project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            global.project_dir
        )
    })?;
    if let Some(db_path) = &global.db_path {
        config.database = db_path.clone();
    }

    let database = resolve_database_path(&global.project_dir, &config.database);
    debug!(project = %config.name, database = %database, "Opening pipeline");

    let connector = DuckDbConnector::new(&database)
        .with_context(|| format!("Failed to initialize DuckDB at {}", database))?;
    let pipeline = QualityPipeline::new(Arc::new(connector), &config)?;
    pipeline
        .init_catalog()
        .context("Failed to bootstrap the quality catalog")?;
    Ok(pipeline)
}

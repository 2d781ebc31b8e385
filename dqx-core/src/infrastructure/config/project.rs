// dqx-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::project::configuration::{MEMORY_DATABASE, ProjectConfig};
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["dqx.yaml", "dqx_project.yaml"];
pub const DATABASE_ENV: &str = "DQX_DATABASE";

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    // e.g. DQX_DATABASE=/tmp/scratch.duckdb dqx stats
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    CONFIG_CANDIDATES
        .iter()
        .map(|filename| root.join(filename))
        .find(|p| p.exists())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "{} (checked {:?})",
                root.display(),
                CONFIG_CANDIDATES
            ))
        })
}

fn apply_env_overrides(config: &mut ProjectConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup(DATABASE_ENV).filter(|v| !v.trim().is_empty()) {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = val;
    }
}

/// Database location as the engine expects it: `:memory:` untouched, relative
/// paths anchored at the project directory.
pub fn resolve_database_path(project_dir: &Path, database: &str) -> String {
    if database == MEMORY_DATABASE || Path::new(database).is_absolute() {
        database.to_string()
    } else {
        project_dir.join(database).to_string_lossy().into_owned()
    }
}

/// Writes a default `dqx.yaml`. Refuses to overwrite an existing file.
pub fn write_default_config(
    project_dir: &Path,
    name: &str,
) -> Result<PathBuf, InfrastructureError> {
    let path = project_dir.join(CONFIG_CANDIDATES[0]);
    if path.exists() {
        return Err(InfrastructureError::ConfigError(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = ProjectConfig {
        name: name.to_string(),
        ..ProjectConfig::default()
    };
    config.validate()?;

    fs::create_dir_all(project_dir)?;
    fs::write(&path, serde_yaml::to_string(&config)?)?;
    info!(path = ?path, "Project configuration written");
    Ok(path)
}

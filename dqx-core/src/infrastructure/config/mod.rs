pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use project::{load_project_config, resolve_database_path, write_default_config};

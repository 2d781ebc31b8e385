// dqx-core/src/domain/project/configuration.rs

use crate::domain::compiler::dialect::Dialect;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    /// DuckDB file, relative to the project directory, or `:memory:`.
    #[validate(length(min = 1, message = "Database path cannot be empty"))]
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub dialect: Dialect,

    #[validate(nested)]
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "quality".to_string(),
            database: default_database(),
            dialect: Dialect::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl ProjectConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }
}

/// Where the pipeline keeps its tables.
#[derive(Debug, Deserialize, Serialize, Validate, Clone, PartialEq)]
pub struct CatalogConfig {
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default = "default_metadata_schema")]
    pub metadata_schema: String,

    #[validate(custom(function = "validate_identifier"))]
    #[serde(default = "default_staging_schema")]
    pub staging_schema: String,

    #[validate(custom(function = "validate_identifier"))]
    #[serde(default = "default_script_table")]
    pub script_table: String,

    #[validate(custom(function = "validate_identifier"))]
    #[serde(default = "default_findings_table")]
    pub findings_table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            metadata_schema: default_metadata_schema(),
            staging_schema: default_staging_schema(),
            script_table: default_script_table(),
            findings_table: default_findings_table(),
        }
    }
}

#[allow(clippy::expect_used)]
fn identifier_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier regex"))
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if identifier_regex().is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("identifier");
        err.message = Some(format!("'{}' is not a plain SQL identifier", value).into());
        Err(err)
    }
}

fn default_database() -> String {
    "dqx.duckdb".to_string()
}
fn default_metadata_schema() -> String {
    "dq".to_string()
}
fn default_staging_schema() -> String {
    "stg".to_string()
}
fn default_script_table() -> String {
    "dq_sql_scripts".to_string()
}
fn default_findings_table() -> String {
    "bad_detail".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_gets_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("name: audits\n").unwrap();
        assert_eq!(config.database, "dqx.duckdb");
        assert_eq!(config.dialect, Dialect::DuckDb);
        assert_eq!(config.catalog, CatalogConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dialect_and_catalog_are_read() {
        let yaml = "name: q\ndatabase: ':memory:'\ndialect: postgres\ncatalog:\n  findings_table: findings\n";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.catalog.findings_table, "findings");
        assert_eq!(config.catalog.staging_schema, "stg");
    }

    #[test]
    fn test_unsafe_identifier_fails_validation() {
        let mut config = ProjectConfig::default();
        config.catalog.staging_schema = "stg; drop".to_string();
        let errors = config.validate().unwrap_err();
        assert!(errors.to_string().contains("staging_schema"));
    }
}

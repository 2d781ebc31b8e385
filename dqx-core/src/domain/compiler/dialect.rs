// dqx-core/src/domain/compiler/dialect.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL flavour used to render generated statements.
///
/// Chosen in the project configuration and handed to the pipeline at
/// construction, so several dialects can coexist in one process.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Postgres,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuckDb => "duckdb",
            Self::Postgres => "postgres",
        }
    }

    /// Placeholder for the `position`-th bound value (1-based).
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::DuckDb => "?".to_string(),
            Self::Postgres => format!("${}", position),
        }
    }

    /// The single identifier quoting function. Every generated identifier
    /// goes through here.
    pub fn quote_ident(&self, raw: &str) -> String {
        format!("\"{}\"", raw.replace('"', "\"\""))
    }

    /// Column definition for an auto-assigned bigint primary key.
    pub fn serial_primary_key(&self, sequence: &str) -> String {
        match self {
            Self::DuckDb => format!("BIGINT PRIMARY KEY DEFAULT nextval('{}')", sequence),
            Self::Postgres => "BIGSERIAL PRIMARY KEY".to_string(),
        }
    }

    /// Whether the dialect needs an explicit sequence for generated ids.
    pub fn needs_sequence(&self) -> bool {
        matches!(self, Self::DuckDb)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(Self::DuckDb),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

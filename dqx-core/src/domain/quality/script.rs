// dqx-core/src/domain/quality/script.rs

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::compiler::builder::Ident;
use crate::domain::error::DomainError;
use crate::domain::quality::contract::validate_columns;
use crate::domain::value::{Cell, ResultSet};

/// Column order of the script table, also used for `RETURNING` projections.
pub const SCRIPT_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "description",
    "content",
    "created_at",
    "updated_at",
];

const STAGING_PREFIX: &str = "dq_script_";

/// A persisted quality rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleScript {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payload for create and update. Content is replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRuleScript {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
}

impl NewRuleScript {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            content: content.into(),
        }
    }

    /// Client-side checks; runs before any statement reaches the database.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        validate_columns(&self.content)
    }
}

/// Name of the staging table bound to a script: `dq_script_<id>`.
pub fn staging_table_name(script_id: i64) -> Result<Ident, DomainError> {
    Ident::new(format!("{}{}", STAGING_PREFIX, script_id))
}

/// Inverse of [`staging_table_name`] for names found in the catalog.
pub fn script_id_from_staging(table_name: &str) -> Option<i64> {
    table_name
        .strip_prefix(STAGING_PREFIX)
        .and_then(|id| id.parse().ok())
}

impl RuleScript {
    /// Maps every row of a result set projected as [`SCRIPT_COLUMNS`].
    pub fn from_result_set(rs: &ResultSet) -> Result<Vec<Self>, DomainError> {
        rs.rows.iter().map(|row| Self::from_row(row)).collect()
    }

    pub fn from_row(row: &[Cell]) -> Result<Self, DomainError> {
        let [id, name, description, content, created_at, updated_at] = row else {
            return Err(shape(format!(
                "expected {} columns, got {}",
                SCRIPT_COLUMNS.len(),
                row.len()
            )));
        };

        Ok(Self {
            id: id.as_i64().ok_or_else(|| shape(format!("id is {:?}", id)))?,
            name: text(name, "name")?,
            description: match description {
                Cell::Null => None,
                other => Some(text(other, "description")?),
            },
            content: text(content, "content")?,
            created_at: created_at
                .as_timestamp()
                .ok_or_else(|| shape(format!("created_at is {:?}", created_at)))?,
            updated_at: updated_at
                .as_timestamp()
                .ok_or_else(|| shape(format!("updated_at is {:?}", updated_at)))?,
        })
    }
}

fn text(cell: &Cell, column: &str) -> Result<String, DomainError> {
    cell.as_str()
        .map(str::to_string)
        .ok_or_else(|| shape(format!("{} is {:?}", column, cell)))
}

fn shape(reason: String) -> DomainError {
    DomainError::RowShape {
        entity: "rule_script".to_string(),
        reason,
    }
}

// dqx-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DomainError {
    // --- CLIENT INPUT (detected before any statement reaches the database) ---
    #[error("Invalid script. Only SELECT statements are allowed.")]
    #[diagnostic(
        code(dqx::domain::statement_kind),
        help("A rule script must be a single SELECT statement.")
    )]
    InvalidStatementKind,

    #[error("Invalid SELECT statement. Could not find column list.")]
    #[diagnostic(code(dqx::domain::empty_column_list))]
    EmptyColumnList,

    #[error("SQL script does not match required format. {}", describe_violation(.missing, .extra))]
    #[diagnostic(
        code(dqx::domain::column_contract),
        help("Project exactly: rule_id, source_id, source_uid, data_value, txn_date")
    )]
    ColumnContractViolation {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Script name cannot be empty.")]
    #[diagnostic(code(dqx::domain::empty_name))]
    EmptyName,

    #[error("Invalid identifier '{0}'")]
    #[diagnostic(
        code(dqx::domain::identifier),
        help("Identifiers must match [A-Za-z_][A-Za-z0-9_]*")
    )]
    InvalidIdentifier(String),

    // --- STATE CONFLICTS ---
    #[error("A script with the name '{0}' already exists.")]
    #[diagnostic(code(dqx::domain::duplicate_name))]
    DuplicateName(String),

    #[error("Script with ID {0} not found.")]
    #[diagnostic(code(dqx::domain::not_found))]
    NotFound(i64),

    // --- MISUSE ---
    #[error("Only SELECT queries are allowed on the read-only path.")]
    #[diagnostic(
        code(dqx::domain::not_a_select),
        help("Use the statement path (`dqx exec`) for DDL/DML.")
    )]
    NotASelect,

    #[error("Malformed row for '{entity}': {reason}")]
    #[diagnostic(code(dqx::domain::row_shape))]
    RowShape { entity: String, reason: String },
}

fn describe_violation(missing: &[String], extra: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing required columns: {:?}", missing));
    }
    if !extra.is_empty() {
        parts.push(format!("Disallowed columns found: {:?}", extra));
    }
    parts.join(". ")
}

// dqx-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DqxError {
    // --- DOMAIN (contract violations, name conflicts, missing scripts) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (engine, IO, config) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC ---
    #[error("Internal Error: {0}")]
    #[diagnostic(code(dqx::internal))]
    InternalError(String),
}

impl DqxError {
    /// The domain error carried by this error, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            DqxError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DqxError {
    fn from(err: std::io::Error) -> Self {
        DqxError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for DqxError {
    fn from(err: duckdb::Error) -> Self {
        DqxError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(err)))
    }
}

// dqx-core/src/ports/connector.rs

// What the pipeline needs from a relational engine, without knowing which one.
// A connector hands out sessions; a session is one connection running one
// serial sequence of statements.

use crate::domain::compiler::builder::Sql;
use crate::domain::compiler::dialect::Dialect;
use crate::domain::value::ResultSet;
use crate::error::DqxError;

pub trait Connector: Send + Sync {
    /// SQL flavour this engine speaks.
    fn dialect(&self) -> Dialect;

    /// Opens a dedicated connection. Dropping the session closes it.
    fn open_session(&self) -> Result<Box<dyn Session>, DqxError>;

    fn engine_name(&self) -> &str;
}

pub trait Session: Send {
    fn begin(&mut self) -> Result<(), DqxError>;
    fn commit(&mut self) -> Result<(), DqxError>;
    fn rollback(&mut self) -> Result<(), DqxError>;

    /// Runs a row-returning statement.
    fn query(&mut self, sql: &Sql) -> Result<ResultSet, DqxError>;

    /// Runs a statement and returns the affected-row count.
    fn execute(&mut self, sql: &Sql) -> Result<usize, DqxError>;
}

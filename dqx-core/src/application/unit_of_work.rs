// dqx-core/src/application/unit_of_work.rs

use tracing::{debug, warn};

use crate::domain::compiler::builder::Sql;
use crate::domain::value::ResultSet;
use crate::error::DqxError;
use crate::ports::connector::{Connector, Session};

/// One connection running one transaction.
///
/// Dropping an unfinished unit of work rolls it back, so every early return
/// through `?` leaves the database as it was before [`UnitOfWork::begin`].
pub struct UnitOfWork {
    session: Box<dyn Session>,
    open: bool,
}

impl UnitOfWork {
    pub fn begin(connector: &dyn Connector) -> Result<Self, DqxError> {
        let mut session = connector.open_session()?;
        session.begin()?;
        Ok(Self {
            session,
            open: true,
        })
    }

    pub fn query(&mut self, sql: &Sql) -> Result<ResultSet, DqxError> {
        self.session.query(sql)
    }

    pub fn execute(&mut self, sql: &Sql) -> Result<usize, DqxError> {
        self.session.execute(sql)
    }

    pub fn commit(mut self) -> Result<(), DqxError> {
        self.open = false;
        self.session.commit()
    }

    pub fn rollback(mut self) -> Result<(), DqxError> {
        self.open = false;
        self.session.rollback()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        debug!("Unit of work dropped before commit, rolling back");
        if let Err(e) = self.session.rollback() {
            warn!(error = %e, "Rollback failed");
        }
    }
}

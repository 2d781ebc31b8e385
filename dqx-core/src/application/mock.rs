// dqx-core/src/application/mock.rs

//! Recording connector for unit tests: every statement (and every
//! BEGIN/COMMIT/ROLLBACK) is logged, replies are served first in first out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::compiler::builder::Sql;
use crate::domain::compiler::dialect::Dialect;
use crate::domain::value::{Cell, Param, ResultSet};
use crate::error::DqxError;
use crate::ports::connector::{Connector, Session};

#[derive(Debug, Clone)]
pub enum Reply {
    Rows(ResultSet),
    Count(usize),
    Fail(String),
}

#[derive(Clone, Default)]
pub struct MockConnector {
    dialect: Dialect,
    log: Arc<Mutex<Vec<(String, Vec<Param>)>>>,
    replies: Arc<Mutex<VecDeque<Reply>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn rows(&self, columns: &[&str], rows: Vec<Vec<Cell>>) -> &Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.push(Reply::Rows(ResultSet::new(columns, rows)))
    }

    pub fn count(&self, n: usize) -> &Self {
        self.push(Reply::Count(n))
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.push(Reply::Fail(message.to_string()))
    }

    fn push(&self, reply: Reply) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Statement texts in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn params_of(&self, index: usize) -> Vec<Param> {
        self.log.lock().unwrap()[index].1.clone()
    }

    /// Only the transaction markers, e.g. `["BEGIN", "ROLLBACK"]`.
    pub fn transactions(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| matches!(s.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK"))
            .collect()
    }
}

impl Connector for MockConnector {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn open_session(&self) -> Result<Box<dyn Session>, DqxError> {
        Ok(Box::new(MockSession {
            connector: self.clone(),
        }))
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}

struct MockSession {
    connector: MockConnector,
}

impl MockSession {
    fn record(&self, text: &str, params: &[Param]) {
        self.connector
            .log
            .lock()
            .unwrap()
            .push((text.to_string(), params.to_vec()));
    }

    fn next_reply(&self) -> Option<Reply> {
        self.connector.replies.lock().unwrap().pop_front()
    }
}

impl Session for MockSession {
    fn begin(&mut self) -> Result<(), DqxError> {
        self.record("BEGIN", &[]);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DqxError> {
        self.record("COMMIT", &[]);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DqxError> {
        self.record("ROLLBACK", &[]);
        Ok(())
    }

    fn query(&mut self, sql: &Sql) -> Result<ResultSet, DqxError> {
        self.record(sql.text(), sql.params());
        match self.next_reply() {
            Some(Reply::Rows(rs)) => Ok(rs),
            Some(Reply::Count(_)) | None => Ok(ResultSet::default()),
            Some(Reply::Fail(msg)) => Err(DqxError::InternalError(msg)),
        }
    }

    fn execute(&mut self, sql: &Sql) -> Result<usize, DqxError> {
        self.record(sql.text(), sql.params());
        match self.next_reply() {
            Some(Reply::Count(n)) => Ok(n),
            Some(Reply::Rows(rs)) => Ok(rs.len()),
            None => Ok(0),
            Some(Reply::Fail(msg)) => Err(DqxError::InternalError(msg)),
        }
    }
}

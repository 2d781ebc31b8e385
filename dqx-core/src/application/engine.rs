// dqx-core/src/application/engine.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::application::repository::ScriptRepository;
use crate::application::staging::StagingTables;
use crate::application::unit_of_work::UnitOfWork;
use crate::domain::compiler::builder::{Ident, Sql, SqlBuilder};
use crate::domain::compiler::classifier::{StatementShape, classify, is_select};
use crate::domain::compiler::dialect::Dialect;
use crate::domain::error::DomainError;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::contract::strip_statement;
use crate::domain::quality::finding::{PopulateReport, QueryOutput};
use crate::domain::value::{Param, ResultSet};
use crate::error::DqxError;
use crate::ports::connector::Connector;

/// Words that make the inferred commit policy treat a statement as a write.
const WRITE_MARKERS: [&str; 7] = [
    "insert", "update", "delete", "create", "alter", "drop", "truncate",
];

/// How an ad hoc statement decides between commit and rollback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementIntent {
    /// Commit when the statement is not a SELECT and either changed rows or
    /// mentions a write keyword. Approximate: a SELECT calling a mutating
    /// function is rolled back, a comment containing "drop" commits.
    #[default]
    Infer,
    /// Always rolled back.
    ReadOnly,
    /// Always committed.
    Write,
}

impl FromStr for StatementIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "infer" => Ok(Self::Infer),
            "read_only" | "readonly" => Ok(Self::ReadOnly),
            "write" => Ok(Self::Write),
            _ => Err(format!("Unknown statement intent: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatementOutcome {
    Rows {
        #[serde(flatten)]
        output: QueryOutput,
        committed: bool,
    },
    Affected {
        affected_rows: usize,
        committed: bool,
    },
}

impl StatementOutcome {
    pub fn committed(&self) -> bool {
        match self {
            Self::Rows { committed, .. } | Self::Affected { committed, .. } => *committed,
        }
    }
}

/// Runs rule scripts into their staging tables and ad hoc SQL against the
/// engine. Every call is its own unit of work.
pub struct ScriptExecutor<'a> {
    connector: &'a dyn Connector,
    dialect: Dialect,
    catalog: &'a Catalog,
}

impl<'a> ScriptExecutor<'a> {
    pub fn new(connector: &'a dyn Connector, dialect: Dialect, catalog: &'a Catalog) -> Self {
        Self {
            connector,
            dialect,
            catalog,
        }
    }

    /// Read-only path: only SELECT is accepted and nothing is ever committed.
    #[instrument(skip(self, sql, params), fields(sql.len = sql.len()))]
    pub fn run_select(&self, sql: &str, params: &[Param]) -> Result<QueryOutput, DqxError> {
        if !is_select(sql) {
            return Err(DomainError::NotASelect.into());
        }

        let start = Instant::now();
        let mut uow = UnitOfWork::begin(self.connector)?;
        let rs = timed(start, uow.query(&Sql::with_params(sql, params.to_vec())))?;
        uow.rollback()?;
        Ok(into_output(rs))
    }

    /// Arbitrary SQL. Row-returning statements come back as rows, everything
    /// else as an affected-row count.
    #[instrument(skip(self, sql, params), fields(sql.len = sql.len()))]
    pub fn run_statement(
        &self,
        sql: &str,
        params: &[Param],
        intent: StatementIntent,
    ) -> Result<StatementOutcome, DqxError> {
        let statement = Sql::with_params(sql, params.to_vec());
        let start = Instant::now();
        let mut uow = UnitOfWork::begin(self.connector)?;

        let (output, affected) = match classify(sql) {
            StatementShape::Rows => {
                let rs = timed(start, uow.query(&statement))?;
                let n = rs.len();
                (Some(into_output(rs)), n)
            }
            StatementShape::Count => (None, timed(start, uow.execute(&statement))?),
        };

        let commit = match intent {
            StatementIntent::Infer => infer_commit(sql, affected),
            StatementIntent::ReadOnly => false,
            StatementIntent::Write => true,
        };
        if commit {
            uow.commit()?;
        } else {
            uow.rollback()?;
        }
        debug!(?intent, committed = commit, affected, "Statement finished");

        Ok(match output {
            Some(output) => StatementOutcome::Rows {
                output,
                committed: commit,
            },
            None => StatementOutcome::Affected {
                affected_rows: affected,
                committed: commit,
            },
        })
    }

    /// Rebuilds the script's staging table from a fresh run: truncate (or
    /// create) then insert, in one unit of work.
    #[instrument(skip(self))]
    pub fn populate(&self, script_id: i64) -> Result<PopulateReport, DqxError> {
        let mut uow = UnitOfWork::begin(self.connector)?;
        let script = ScriptRepository::new(self.dialect, self.catalog)
            .get(&mut uow, script_id)?
            .ok_or(DomainError::NotFound(script_id))?;

        let table = StagingTables::new(self.dialect, self.catalog).ensure_and_clear(
            &mut uow,
            script.id,
            &script.content,
        )?;

        // Match columns by name: a truncated table keeps the projection order
        // of whichever content created it.
        let columns = self.catalog.finding_columns();
        let mut b = SqlBuilder::new(self.dialect);
        b.push("INSERT INTO ")
            .push_table(&table)
            .push(" (")
            .push_ident_list(&columns)
            .push(") SELECT ")
            .push_ident_list(&columns)
            .push(" FROM (")
            .push(strip_statement(&script.content))
            .push(") AS ")
            .push_ident(&Ident::trusted("src"));

        let start = Instant::now();
        let inserted_rows = timed(start, uow.execute(&b.build()))?;
        uow.commit()?;

        info!(script_id, inserted_rows, table = %table, "Staging populated");
        Ok(PopulateReport {
            script_id,
            table: table.to_string(),
            inserted_rows,
        })
    }
}

/// Commit only if not a read-only SELECT and (rows changed or the text looks
/// like a write).
pub fn infer_commit(sql: &str, affected: usize) -> bool {
    if is_select(sql) {
        return false;
    }
    let lowered = sql.to_lowercase();
    affected > 0 || WRITE_MARKERS.iter().any(|w| lowered.contains(w))
}

fn timed<T>(start: Instant, result: Result<T, DqxError>) -> Result<T, DqxError> {
    let duration = start.elapsed();
    match &result {
        Ok(_) => debug!("Statement finished in {:.2?}", duration),
        Err(e) => error!("Statement failed after {:.2?}: {}", duration, e),
    }
    result
}

fn into_output(rs: ResultSet) -> QueryOutput {
    QueryOutput {
        rows: rs.to_json_rows(),
        column_names: rs.columns,
    }
}

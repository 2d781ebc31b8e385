// dqx-core/src/infrastructure/adapters/duckdb.rs

use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value, ValueRef};
use duckdb::{Config, Connection, params_from_iter};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::domain::compiler::builder::Sql;
use crate::domain::compiler::dialect::Dialect;
use crate::domain::project::configuration::MEMORY_DATABASE;
use crate::domain::value::{Cell, Param, ResultSet};
use crate::error::DqxError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{Connector, Session};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct DuckDbConnector {
    // Every session is a clone of this handle onto the same database.
    root: Mutex<Connection>,
    location: String,
}

impl DuckDbConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == MEMORY_DATABASE {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        info!(path = db_path, "DuckDB opened");

        Ok(Self {
            root: Mutex::new(conn),
            location: db_path.to_string(),
        })
    }

    pub fn in_memory() -> Result<Self, InfrastructureError> {
        Self::new(MEMORY_DATABASE)
    }
}

impl Connector for DuckDbConnector {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn open_session(&self) -> Result<Box<dyn Session>, DqxError> {
        let root = self.root.lock().map_err(|_| {
            InfrastructureError::Database(DatabaseError::Poisoned("DuckDB root connection".into()))
        })?;
        let conn = root.try_clone()?;
        debug!(path = %self.location, "DuckDB session opened");
        Ok(Box::new(DuckDbSession { conn }))
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

pub struct DuckDbSession {
    conn: Connection,
}

impl Session for DuckDbSession {
    fn begin(&mut self) -> Result<(), DqxError> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DqxError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DqxError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn query(&mut self, sql: &Sql) -> Result<ResultSet, DqxError> {
        debug!(sql = sql.text(), params = sql.params().len(), "query");
        let mut stmt = self.conn.prepare(sql.text())?;
        let mut rows = stmt.query(params_from_iter(sql.params().iter().map(to_value)))?;

        // Column metadata is only available once the statement has run.
        let columns = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(to_cell(row.get_ref(idx)?));
            }
            out.push(cells);
        }

        Ok(ResultSet::new(columns, out))
    }

    fn execute(&mut self, sql: &Sql) -> Result<usize, DqxError> {
        debug!(sql = sql.text(), params = sql.params().len(), "execute");
        let mut stmt = self.conn.prepare(sql.text())?;
        let affected = stmt.execute(params_from_iter(sql.params().iter().map(to_value)))?;
        Ok(affected)
    }
}

fn to_value(param: &Param) -> Value {
    match param {
        Param::Null => Value::Null,
        Param::Bool(b) => Value::Boolean(*b),
        Param::Int(i) => Value::BigInt(*i),
        Param::Float(f) => Value::Double(*f),
        Param::Text(s) => Value::Text(s.clone()),
        // Paired with CAST(? AS TIMESTAMP) in the generated SQL.
        Param::Timestamp(ts) => Value::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn to_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Boolean(b) => Cell::Bool(b),
        ValueRef::TinyInt(i) => Cell::Int(i.into()),
        ValueRef::SmallInt(i) => Cell::Int(i.into()),
        ValueRef::Int(i) => Cell::Int(i.into()),
        ValueRef::BigInt(i) => Cell::Int(i),
        ValueRef::UTinyInt(i) => Cell::Int(i.into()),
        ValueRef::USmallInt(i) => Cell::Int(i.into()),
        ValueRef::UInt(i) => Cell::Int(i.into()),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Cell::Int)
            .unwrap_or_else(|_| Cell::Other(i.to_string())),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Cell::Int)
            .unwrap_or_else(|_| Cell::Other(i.to_string())),
        ValueRef::Float(f) => Cell::Float(f.into()),
        ValueRef::Double(f) => Cell::Float(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Cell::Float)
            .unwrap_or_else(|_| Cell::Other(d.to_string())),
        ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Cell::Bytes(bytes.to_vec()),
        ValueRef::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, v))
            .map(|dt| Cell::Timestamp(dt.naive_utc()))
            .unwrap_or_else(|| Cell::Other(v.to_string())),
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Other(days.to_string())),
        ValueRef::Time64(unit, v) => {
            let micros = to_micros(unit, v);
            u32::try_from(micros.div_euclid(1_000_000))
                .ok()
                .zip(u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok())
                .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
                .map(Cell::Time)
                .unwrap_or_else(|| Cell::Other(v.to_string()))
        }
        other => Cell::Other(format!("{:?}", other.to_owned())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn session() -> Result<(DuckDbConnector, Box<dyn Session>)> {
        let connector = DuckDbConnector::in_memory()?;
        let session = connector.open_session()?;
        Ok((connector, session))
    }

    #[test]
    fn test_duckdb_flow() -> Result<()> {
        let (_connector, mut s) = session()?;

        s.execute(&Sql::raw("CREATE TABLE users (id INTEGER, name VARCHAR)"))?;
        let inserted = s.execute(&Sql::with_params(
            "INSERT INTO users VALUES (?, ?), (?, ?)",
            vec![Param::Int(1), "ann".into(), Param::Int(2), Param::Null],
        ))?;
        assert_eq!(inserted, 2);

        let rs = s.query(&Sql::raw("SELECT id, name FROM users ORDER BY id"))?;
        assert_eq!(rs.columns, vec!["id", "name"]);
        assert_eq!(rs.rows[0], vec![Cell::Int(1), Cell::Text("ann".into())]);
        assert_eq!(rs.rows[1][1], Cell::Null);
        Ok(())
    }

    #[test]
    fn test_temporal_and_decimal_decoding() -> Result<()> {
        let (_connector, mut s) = session()?;
        let rs = s.query(&Sql::raw(
            "SELECT TIMESTAMP '2024-03-01 10:15:00.25' AS ts, DATE '1999-12-31' AS d, \
             TIME '12:30:05' AS t, CAST(12.50 AS DECIMAL(10, 2)) AS amount, '\\xFF'::BLOB AS b",
        ))?;
        let row = &rs.rows[0];
        assert_eq!(
            row[0].to_json(),
            serde_json::json!("2024-03-01T10:15:00.250")
        );
        assert_eq!(row[1].to_json(), serde_json::json!("1999-12-31"));
        assert_eq!(row[2].to_json(), serde_json::json!("12:30:05"));
        assert_eq!(row[3], Cell::Float(12.5));
        assert_eq!(row[4], Cell::Bytes(vec![0xff]));
        Ok(())
    }

    #[test]
    fn test_timestamp_param_round_trip() -> Result<()> {
        let (_connector, mut s) = session()?;
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 6)
            .unwrap();
        let rs = s.query(&Sql::with_params(
            "SELECT CAST(? AS TIMESTAMP) AS ts",
            vec![Param::Timestamp(ts)],
        ))?;
        assert_eq!(rs.rows[0][0].as_timestamp(), Some(ts));
        Ok(())
    }

    #[test]
    fn test_sessions_share_the_database_and_rollback_discards() -> Result<()> {
        let connector = DuckDbConnector::in_memory()?;
        let mut first = connector.open_session()?;
        first.execute(&Sql::raw("CREATE TABLE t (a INTEGER)"))?;

        first.begin()?;
        first.execute(&Sql::raw("INSERT INTO t VALUES (1)"))?;
        first.rollback()?;

        let mut second = connector.open_session()?;
        second.begin()?;
        second.execute(&Sql::raw("INSERT INTO t VALUES (2)"))?;
        second.commit()?;

        let rs = first.query(&Sql::raw("SELECT a FROM t"))?;
        assert_eq!(rs.rows, vec![vec![Cell::Int(2)]]);
        Ok(())
    }

    #[test]
    fn test_duckdb_error() -> Result<()> {
        let (_connector, mut s) = session()?;
        let result = s.query(&Sql::raw("SELECT * FROM non_existent_table"));
        assert!(result.is_err());
        Ok(())
    }
}

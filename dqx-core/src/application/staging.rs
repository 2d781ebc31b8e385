// dqx-core/src/application/staging.rs

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::compiler::builder::{Ident, Sql, SqlBuilder, TableRef};
use crate::domain::compiler::dialect::Dialect;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::contract::strip_statement;
use crate::domain::quality::script::script_id_from_staging;
use crate::error::DqxError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingTableInfo {
    pub script_id: i64,
    pub table: String,
    pub rows: i64,
}

/// Lifecycle of the `dq_script_<id>` tables. Every call runs inside the
/// caller's unit of work.
pub struct StagingTables<'a> {
    dialect: Dialect,
    catalog: &'a Catalog,
}

impl<'a> StagingTables<'a> {
    pub fn new(dialect: Dialect, catalog: &'a Catalog) -> Self {
        Self { dialect, catalog }
    }

    pub fn table(&self, script_id: i64) -> Result<TableRef, DqxError> {
        Ok(self.catalog.staging_table(script_id)?)
    }

    /// Drops any previous table and recreates it empty with the projection of
    /// `select_sql`.
    #[instrument(skip(self, uow, select_sql))]
    pub fn create_or_replace(
        &self,
        uow: &mut UnitOfWork,
        script_id: i64,
        select_sql: &str,
    ) -> Result<TableRef, DqxError> {
        let table = self.table(script_id)?;
        uow.execute(&self.drop_sql(&table))?;
        uow.execute(&self.create_sql(&table, select_sql))?;
        debug!(table = %table, "Staging table created");
        Ok(table)
    }

    /// Leaves an existing, empty staging table behind: truncated if present,
    /// created otherwise.
    #[instrument(skip(self, uow, select_sql))]
    pub fn ensure_and_clear(
        &self,
        uow: &mut UnitOfWork,
        script_id: i64,
        select_sql: &str,
    ) -> Result<TableRef, DqxError> {
        let table = self.table(script_id)?;
        if self.exists(uow, &table)? {
            let mut b = SqlBuilder::new(self.dialect);
            b.push("TRUNCATE TABLE ").push_table(&table);
            uow.execute(&b.build())?;
            debug!(table = %table, "Staging table truncated");
        } else {
            uow.execute(&self.create_sql(&table, select_sql))?;
            debug!(table = %table, "Staging table was missing, created");
        }
        Ok(table)
    }

    /// Idempotent.
    pub fn drop(&self, uow: &mut UnitOfWork, script_id: i64) -> Result<(), DqxError> {
        let table = self.table(script_id)?;
        uow.execute(&self.drop_sql(&table))?;
        Ok(())
    }

    pub fn exists(&self, uow: &mut UnitOfWork, table: &TableRef) -> Result<bool, DqxError> {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT count(*) FROM information_schema.tables WHERE table_schema = ")
            .push_param(table.schema.as_str())
            .push(" AND table_name = ")
            .push_param(table.name.as_str());
        let count = uow.query(&b.build())?.scalar_i64().unwrap_or(0);
        Ok(count > 0)
    }

    /// Staging tables present in the staging schema, ordered by script id.
    pub fn list(&self, uow: &mut UnitOfWork) -> Result<Vec<StagingTableInfo>, DqxError> {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT table_name FROM information_schema.tables WHERE table_schema = ")
            .push_param(self.catalog.staging_schema.as_str());
        let names = uow.query(&b.build())?;

        let mut found: Vec<(i64, String)> = names
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(|c| c.as_str()))
            .filter_map(|name| script_id_from_staging(name).map(|id| (id, name.to_string())))
            .collect();
        found.sort();

        let mut tables = Vec::with_capacity(found.len());
        for (script_id, name) in found {
            let table = TableRef::new(self.catalog.staging_schema.clone(), Ident::new(name)?);
            let mut b = SqlBuilder::new(self.dialect);
            b.push("SELECT count(*) FROM ").push_table(&table);
            let rows = uow.query(&b.build())?.scalar_i64().unwrap_or(0);
            tables.push(StagingTableInfo {
                script_id,
                table: table.to_string(),
                rows,
            });
        }
        Ok(tables)
    }

    fn drop_sql(&self, table: &TableRef) -> Sql {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("DROP TABLE IF EXISTS ").push_table(table);
        b.build()
    }

    fn create_sql(&self, table: &TableRef, select_sql: &str) -> Sql {
        let select = strip_statement(select_sql);
        let mut b = SqlBuilder::new(self.dialect);
        b.push("CREATE TABLE ").push_table(table).push(" AS ");
        match self.dialect {
            Dialect::Postgres => {
                b.push("(").push(select).push(") WITH NO DATA");
            }
            Dialect::DuckDb => {
                b.push("SELECT * FROM (")
                    .push(select)
                    .push(") AS ")
                    .push_ident(&Ident::trusted("src"))
                    .push(" LIMIT 0");
            }
        }
        b.build()
    }
}

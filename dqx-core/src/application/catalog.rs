// dqx-core/src/application/catalog.rs

use tracing::{info, instrument};

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::compiler::builder::{Ident, Sql, SqlBuilder};
use crate::domain::compiler::dialect::Dialect;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::finding::{CatalogStats, FindingsFilter, QueryOutput};
use crate::error::DqxError;

/// Bootstrap and read-side queries over the script and findings tables.
pub struct CatalogStore<'a> {
    dialect: Dialect,
    catalog: &'a Catalog,
}

impl<'a> CatalogStore<'a> {
    pub fn new(dialect: Dialect, catalog: &'a Catalog) -> Self {
        Self { dialect, catalog }
    }

    /// Creates schemas and tables that do not exist yet. Safe to rerun.
    #[instrument(skip_all)]
    pub fn bootstrap(&self, uow: &mut UnitOfWork) -> Result<(), DqxError> {
        for statement in self.bootstrap_statements()? {
            uow.execute(&statement)?;
        }
        info!(
            scripts = %self.catalog.scripts,
            findings = %self.catalog.findings,
            "Catalog ready"
        );
        Ok(())
    }

    pub fn bootstrap_statements(&self) -> Result<Vec<Sql>, DqxError> {
        let mut statements = Vec::new();

        for schema in [&self.catalog.metadata_schema, &self.catalog.staging_schema] {
            let mut b = SqlBuilder::new(self.dialect);
            b.push("CREATE SCHEMA IF NOT EXISTS ").push_ident(schema);
            statements.push(b.build());
        }

        let sequence = self.catalog.script_sequence()?;
        if self.dialect.needs_sequence() {
            let mut b = SqlBuilder::new(self.dialect);
            b.push("CREATE SEQUENCE IF NOT EXISTS ").push_table(&sequence);
            statements.push(b.build());
        }

        // Name uniqueness is checked by the repository inside the write
        // transaction, not by an index.
        let mut b = SqlBuilder::new(self.dialect);
        b.push("CREATE TABLE IF NOT EXISTS ")
            .push_table(&self.catalog.scripts)
            .push(" (")
            .push_ident(&Ident::trusted("id"))
            .push(" ")
            .push(&self.dialect.serial_primary_key(&sequence.to_string()))
            .push(", ")
            .push_ident(&Ident::trusted("name"))
            .push(" VARCHAR NOT NULL, ")
            .push_ident(&Ident::trusted("description"))
            .push(" VARCHAR, ")
            .push_ident(&Ident::trusted("content"))
            .push(" VARCHAR NOT NULL, ")
            .push_ident(&Ident::trusted("created_at"))
            .push(" TIMESTAMP NOT NULL, ")
            .push_ident(&Ident::trusted("updated_at"))
            .push(" TIMESTAMP NOT NULL)");
        statements.push(b.build());

        let mut b = SqlBuilder::new(self.dialect);
        b.push("CREATE TABLE IF NOT EXISTS ")
            .push_table(&self.catalog.findings)
            .push(" (");
        for (i, column) in self.catalog.finding_columns().iter().enumerate() {
            if i > 0 {
                b.push(", ");
            }
            let ty = if column.as_str() == "txn_date" { "DATE" } else { "VARCHAR" };
            b.push_ident(column).push(" ").push(ty);
        }
        b.push(")");
        statements.push(b.build());

        Ok(statements)
    }

    pub fn stats(&self, uow: &mut UnitOfWork) -> Result<CatalogStats, DqxError> {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT count(*) FROM ").push_table(&self.catalog.scripts);
        let script_count = uow.query(&b.build())?.scalar_i64().unwrap_or(0);

        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT count(*) FROM ").push_table(&self.catalog.findings);
        let finding_count = uow.query(&b.build())?.scalar_i64().unwrap_or(0);

        Ok(CatalogStats {
            script_count,
            finding_count,
        })
    }

    pub fn query_findings(
        &self,
        uow: &mut UnitOfWork,
        filter: &FindingsFilter,
    ) -> Result<QueryOutput, DqxError> {
        let columns = self.catalog.finding_columns();
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT ")
            .push_ident_list(&columns)
            .push(" FROM ")
            .push_table(&self.catalog.findings)
            .push(" WHERE 1 = 1");
        if let Some(rule_id) = &filter.rule_id {
            b.push(" AND ")
                .push_ident(&Ident::trusted("rule_id"))
                .push(" = ")
                .push_param(rule_id.as_str());
        }
        if let Some(source_id) = &filter.source_id {
            b.push(" AND ")
                .push_ident(&Ident::trusted("source_id"))
                .push(" = ")
                .push_param(source_id.as_str());
        }
        b.push(" ORDER BY ").push_ident_list(&columns[..3]).push(" LIMIT ").push_param(filter.limit);

        let rs = uow.query(&b.build())?;
        Ok(QueryOutput {
            rows: rs.to_json_rows(),
            column_names: rs.columns,
        })
    }
}

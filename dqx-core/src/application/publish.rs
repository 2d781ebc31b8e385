// dqx-core/src/application/publish.rs

use tracing::{info, instrument};

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::compiler::builder::{Ident, Sql, SqlBuilder, TableRef};
use crate::domain::compiler::dialect::Dialect;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::finding::PublishReport;
use crate::error::DqxError;
use crate::ports::connector::Connector;

/// Moves staged rows into the findings table with replace semantics per
/// `(rule_id, source_id)`.
pub struct PublishEngine<'a> {
    connector: &'a dyn Connector,
    dialect: Dialect,
    catalog: &'a Catalog,
}

impl<'a> PublishEngine<'a> {
    pub fn new(connector: &'a dyn Connector, dialect: Dialect, catalog: &'a Catalog) -> Self {
        Self {
            connector,
            dialect,
            catalog,
        }
    }

    /// After success the findings table holds exactly the staged rows for
    /// every staged key. Keys absent from staging are not touched. An empty
    /// staging table publishes nothing and deletes nothing.
    #[instrument(skip(self))]
    pub fn publish(&self, script_id: i64) -> Result<PublishReport, DqxError> {
        let staging = self.catalog.staging_table(script_id)?;
        let mut uow = UnitOfWork::begin(self.connector)?;

        let keys = uow.query(&self.keys_sql(&staging))?;
        if keys.is_empty() {
            uow.rollback()?;
            info!(script_id, "Staging table is empty, nothing to publish");
            return Ok(PublishReport::nothing_to_publish(script_id));
        }

        let replaced = uow.execute(&self.delete_sql(&staging))?;
        let published_rows = uow.execute(&self.insert_sql(&staging))?;
        uow.commit()?;

        info!(
            script_id,
            published_rows,
            keys = keys.len(),
            replaced,
            "Findings published"
        );
        Ok(PublishReport::published(
            script_id,
            published_rows,
            keys.len(),
        ))
    }

    fn keys_sql(&self, staging: &TableRef) -> Sql {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT DISTINCT ")
            .push_ident_list(&self.catalog.finding_key())
            .push(" FROM ")
            .push_table(staging);
        b.build()
    }

    /// Null-safe key match so rows with a NULL rule or source id are
    /// replaced too.
    fn delete_sql(&self, staging: &TableRef) -> Sql {
        let findings = Ident::trusted("f");
        let staged = Ident::trusted("s");
        let mut b = SqlBuilder::new(self.dialect);
        b.push("DELETE FROM ")
            .push_table(&self.catalog.findings)
            .push(" AS ")
            .push_ident(&findings)
            .push(" WHERE EXISTS (SELECT 1 FROM ")
            .push_table(staging)
            .push(" AS ")
            .push_ident(&staged)
            .push(" WHERE ");
        for (i, column) in self.catalog.finding_key().iter().enumerate() {
            if i > 0 {
                b.push(" AND ");
            }
            b.push_qualified(&staged, column)
                .push(" IS NOT DISTINCT FROM ")
                .push_qualified(&findings, column);
        }
        b.push(")");
        b.build()
    }

    fn insert_sql(&self, staging: &TableRef) -> Sql {
        let columns = self.catalog.finding_columns();
        let mut b = SqlBuilder::new(self.dialect);
        b.push("INSERT INTO ")
            .push_table(&self.catalog.findings)
            .push(" (")
            .push_ident_list(&columns)
            .push(") SELECT ")
            .push_ident_list(&columns)
            .push(" FROM ")
            .push_table(staging);
        b.build()
    }
}

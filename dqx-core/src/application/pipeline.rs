// dqx-core/src/application/pipeline.rs

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::DqxError;
use crate::ports::connector::Connector;

// Application Services
use crate::application::catalog::CatalogStore;
use crate::application::engine::{ScriptExecutor, StatementIntent, StatementOutcome};
use crate::application::locks::{ScriptLocks, hold};
use crate::application::publish::PublishEngine;
use crate::application::repository::ScriptRepository;
use crate::application::staging::{StagingTableInfo, StagingTables};
use crate::application::unit_of_work::UnitOfWork;

// Domain
use crate::domain::compiler::dialect::Dialect;
use crate::domain::error::DomainError;
use crate::domain::project::configuration::ProjectConfig;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::contract::{resolve_columns, strip_statement, validate_columns};
use crate::domain::quality::finding::{
    CatalogStats, FindingsFilter, PopulateReport, PublishReport, QueryOutput,
};
use crate::domain::quality::script::{NewRuleScript, RuleScript};
use crate::domain::value::Param;
use crate::infrastructure::error::InfrastructureError;

/// Entry point for every pipeline operation.
///
/// Holds the connector, the dialect and table names chosen by configuration,
/// and the per-script locks. Cheap to share behind an `Arc`.
pub struct QualityPipeline {
    connector: Arc<dyn Connector>,
    dialect: Dialect,
    catalog: Catalog,
    locks: ScriptLocks,
}

impl QualityPipeline {
    pub fn new(connector: Arc<dyn Connector>, config: &ProjectConfig) -> Result<Self, DqxError> {
        let catalog = Catalog::from_config(&config.catalog)?;
        Self::with_catalog(connector, config.dialect, catalog)
    }

    pub fn with_catalog(
        connector: Arc<dyn Connector>,
        dialect: Dialect,
        catalog: Catalog,
    ) -> Result<Self, DqxError> {
        if connector.dialect() != dialect {
            return Err(InfrastructureError::ConfigError(format!(
                "dialect '{}' is configured but the {} engine speaks '{}'",
                dialect,
                connector.engine_name(),
                connector.dialect()
            ))
            .into());
        }
        Ok(Self {
            connector,
            dialect,
            catalog,
            locks: ScriptLocks::new(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn begin(&self) -> Result<UnitOfWork, DqxError> {
        UnitOfWork::begin(self.connector.as_ref())
    }

    fn repository(&self) -> ScriptRepository<'_> {
        ScriptRepository::new(self.dialect, &self.catalog)
    }

    fn executor(&self) -> ScriptExecutor<'_> {
        ScriptExecutor::new(self.connector.as_ref(), self.dialect, &self.catalog)
    }

    // --- CATALOG ---

    #[instrument(skip(self))]
    pub fn init_catalog(&self) -> Result<(), DqxError> {
        let mut uow = self.begin()?;
        CatalogStore::new(self.dialect, &self.catalog).bootstrap(&mut uow)?;
        uow.commit()
    }

    #[instrument(skip(self))]
    pub fn stats(&self) -> Result<CatalogStats, DqxError> {
        let mut uow = self.begin()?;
        let stats = CatalogStore::new(self.dialect, &self.catalog).stats(&mut uow)?;
        uow.rollback()?;
        Ok(stats)
    }

    #[instrument(skip(self))]
    pub fn query_findings(&self, filter: &FindingsFilter) -> Result<QueryOutput, DqxError> {
        let mut uow = self.begin()?;
        let out = CatalogStore::new(self.dialect, &self.catalog).query_findings(&mut uow, filter)?;
        uow.rollback()?;
        Ok(out)
    }

    #[instrument(skip(self))]
    pub fn list_staging_tables(&self) -> Result<Vec<StagingTableInfo>, DqxError> {
        let mut uow = self.begin()?;
        let tables = StagingTables::new(self.dialect, &self.catalog).list(&mut uow)?;
        uow.rollback()?;
        Ok(tables)
    }

    // --- SCRIPTS ---

    /// Checks content against the column contract without touching the
    /// database. Returns the resolved output columns.
    pub fn validate_script(content: &str) -> Result<Vec<String>, DqxError> {
        validate_columns(content)?;
        Ok(resolve_columns(content)?)
    }

    #[instrument(skip(self, script), fields(name = %script.name))]
    pub fn create_script(&self, script: &NewRuleScript) -> Result<RuleScript, DqxError> {
        let mut uow = self.begin()?;
        let created = self.repository().create(&mut uow, script)?;
        uow.commit()?;
        Ok(created)
    }

    #[instrument(skip(self, script))]
    pub fn update_script(&self, id: i64, script: &NewRuleScript) -> Result<RuleScript, DqxError> {
        let mut uow = self.begin()?;
        let updated = self.repository().update(&mut uow, id, script)?;
        uow.commit()?;
        Ok(updated)
    }

    /// Returns the number of deleted rows; 0 for an unknown id.
    #[instrument(skip(self))]
    pub fn delete_script(&self, id: i64) -> Result<usize, DqxError> {
        let lane = self.locks.lane(id)?;
        let _guard = hold(&lane)?;
        let mut uow = self.begin()?;
        let deleted = self.repository().delete(&mut uow, id)?;
        uow.commit()?;
        Ok(deleted)
    }

    pub fn get_script(&self, id: i64) -> Result<RuleScript, DqxError> {
        let mut uow = self.begin()?;
        let script = self.repository().get(&mut uow, id)?;
        uow.rollback()?;
        script.ok_or_else(|| DomainError::NotFound(id).into())
    }

    pub fn list_scripts(&self) -> Result<Vec<RuleScript>, DqxError> {
        let mut uow = self.begin()?;
        let scripts = self.repository().list(&mut uow)?;
        uow.rollback()?;
        Ok(scripts)
    }

    // --- EXECUTION ---

    #[instrument(skip(self))]
    pub fn populate_staging(&self, id: i64) -> Result<PopulateReport, DqxError> {
        let lane = self.locks.lane(id)?;
        let _guard = hold(&lane)?;
        self.executor().populate(id)
    }

    #[instrument(skip(self))]
    pub fn publish_findings(&self, id: i64) -> Result<PublishReport, DqxError> {
        let lane = self.locks.lane(id)?;
        let _guard = hold(&lane)?;
        let report =
            PublishEngine::new(self.connector.as_ref(), self.dialect, &self.catalog).publish(id)?;
        info!(id, published = report.published_rows, "{}", report.message);
        Ok(report)
    }

    pub fn run_select(&self, sql: &str, params: &[Param]) -> Result<QueryOutput, DqxError> {
        self.executor().run_select(sql, params)
    }

    pub fn run_statement(
        &self,
        sql: &str,
        params: &[Param],
        intent: StatementIntent,
    ) -> Result<StatementOutcome, DqxError> {
        self.executor().run_statement(sql, params, intent)
    }

    /// Validates `content`, then runs it read-only. Nothing is persisted.
    #[instrument(skip(self, content))]
    pub fn preview_script(&self, content: &str) -> Result<QueryOutput, DqxError> {
        validate_columns(content)?;
        self.executor().run_select(strip_statement(content), &[])
    }
}

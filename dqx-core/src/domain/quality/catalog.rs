// dqx-core/src/domain/quality/catalog.rs

use crate::domain::compiler::builder::{Ident, TableRef};
use crate::domain::error::DomainError;
use crate::domain::project::configuration::CatalogConfig;
use crate::domain::quality::finding::{FINDING_COLUMNS, FINDING_KEY};
use crate::domain::quality::script::{SCRIPT_COLUMNS, staging_table_name};

/// Resolved, whitelisted names of every table the pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub metadata_schema: Ident,
    pub staging_schema: Ident,
    pub scripts: TableRef,
    pub findings: TableRef,
}

impl Catalog {
    pub fn from_config(config: &CatalogConfig) -> Result<Self, DomainError> {
        let metadata_schema = Ident::new(&config.metadata_schema)?;
        let staging_schema = Ident::new(&config.staging_schema)?;
        Ok(Self {
            scripts: TableRef::new(metadata_schema.clone(), Ident::new(&config.script_table)?),
            findings: TableRef::new(metadata_schema.clone(), Ident::new(&config.findings_table)?),
            metadata_schema,
            staging_schema,
        })
    }

    /// `stg.dq_script_<id>`
    pub fn staging_table(&self, script_id: i64) -> Result<TableRef, DomainError> {
        Ok(TableRef::new(
            self.staging_schema.clone(),
            staging_table_name(script_id)?,
        ))
    }

    /// Sequence backing generated script ids on engines without serial types.
    pub fn script_sequence(&self) -> Result<TableRef, DomainError> {
        Ok(TableRef::new(
            self.metadata_schema.clone(),
            Ident::new(format!("{}_id_seq", self.scripts.name))?,
        ))
    }

    pub fn script_columns(&self) -> Vec<Ident> {
        idents(&SCRIPT_COLUMNS)
    }

    pub fn finding_columns(&self) -> Vec<Ident> {
        idents(&FINDING_COLUMNS)
    }

    pub fn finding_key(&self) -> Vec<Ident> {
        idents(&FINDING_KEY)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let metadata_schema = Ident::trusted("dq");
        Self {
            scripts: TableRef::new(metadata_schema.clone(), Ident::trusted("dq_sql_scripts")),
            findings: TableRef::new(metadata_schema.clone(), Ident::trusted("bad_detail")),
            metadata_schema,
            staging_schema: Ident::trusted("stg"),
        }
    }
}

fn idents(names: &[&'static str]) -> Vec<Ident> {
    names.iter().map(|n| Ident::trusted(n)).collect()
}

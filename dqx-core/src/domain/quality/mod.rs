// dqx-core/src/domain/quality/mod.rs

pub mod catalog;
pub mod contract;
pub mod finding;
pub mod script;

pub use catalog::Catalog;
pub use contract::{resolve_columns, strip_statement, validate_columns};
pub use finding::{
    CatalogStats, FINDING_COLUMNS, FindingsFilter, PopulateReport, PublishReport, QueryOutput,
};
pub use script::{NewRuleScript, RuleScript, staging_table_name};

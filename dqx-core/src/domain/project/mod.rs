// dqx-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{CatalogConfig, MEMORY_DATABASE, ProjectConfig};

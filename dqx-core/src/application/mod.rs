// dqx-core/src/application/mod.rs

pub mod catalog;
pub mod engine;
pub mod locks;
pub mod pipeline;
pub mod publish;
pub mod repository;
pub mod staging;
pub mod unit_of_work;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod mock;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use dqx_core::application::{QualityPipeline, StatementIntent};`

pub use engine::{StatementIntent, StatementOutcome};
pub use pipeline::QualityPipeline;
pub use staging::StagingTableInfo;

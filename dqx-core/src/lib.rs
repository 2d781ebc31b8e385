// dqx-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: what the pipeline needs from an engine (Connector, Session).
pub mod ports;

// 2. Domain: column contract, rule scripts, SQL builder, configuration.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: DuckDB adapter, YAML config loader.
pub mod infrastructure;

// 4. Application: repository, staging, executor, publish, pipeline facade.
pub mod application;

// --- ERRORS ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::{QualityPipeline, StatementIntent, StatementOutcome};
pub use error::DqxError;

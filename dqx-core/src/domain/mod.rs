// dqx-core/src/domain/mod.rs

pub mod compiler;
pub mod error;
pub mod project;
pub mod quality;
pub mod value;

pub use error::DomainError;

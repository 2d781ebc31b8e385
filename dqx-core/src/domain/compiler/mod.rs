// dqx-core/src/domain/compiler/mod.rs

pub mod builder;
pub mod classifier;
pub mod dialect;

pub use builder::{Ident, Sql, SqlBuilder, TableRef};
pub use classifier::{StatementShape, classify, is_select};
pub use dialect::Dialect;

//! DDL synthesis over Schemaforge graphs.
//!
//! Consumes the emission order computed by the core resolver and renders
//! each table into executable SQL, with deferred foreign keys emitted as
//! trailing ALTER TABLE statements.

pub mod compiler;
pub mod dialect;

pub use compiler::{compile, CompileError};
pub use dialect::Dialect;

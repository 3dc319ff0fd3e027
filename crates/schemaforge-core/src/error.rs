use thiserror::Error;

/// Core error type shared across Schemaforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A table or attribute name collides with an existing one.
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    /// The table already carries a primary-key attribute.
    #[error("table already has a primary key: {0}")]
    MultiplePrimaryKey(String),
    /// A foreign key does not resolve to an existing primary-key attribute.
    #[error("invalid foreign key: {0}")]
    InvalidForeignKey(String),
    /// A mutation referenced an unknown table id or attribute index.
    #[error("not found: {0}")]
    NotFound(String),
    /// An attribute definition is structurally incomplete or inconsistent.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
    /// A type name falls outside the closed enumeration.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// A schema document failed structural validation.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// Convenience alias for results returned by Schemaforge crates.
pub type Result<T> = std::result::Result<T, Error>;

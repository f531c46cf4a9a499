//! Error types for the mapper.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DbError>;

/// Errors surfaced by registration and DAO operations.
///
/// Engine-level statement failures pass through unchanged; there is no retry
/// anywhere in the crate.
#[derive(Debug, Error)]
pub enum DbError {
    /// The field descriptors of a type cannot be turned into a valid table.
    #[error("schema error for table {table}: {message}")]
    Schema { table: String, message: String },

    /// Failure reported by the storage engine.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    pub(crate) fn schema(table: &str, message: impl Into<String>) -> Self {
        DbError::Schema {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

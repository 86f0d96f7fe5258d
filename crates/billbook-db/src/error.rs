//! # Database Errors
//!
//! `DbError` classifies what SQLite reported; callers of the store traits
//! only ever see it folded into `CoreError::Storage`.
//!
//! ```text
//! sqlx::Error ──► DbError ──► StorageError ──► CoreError::Storage
//!                   │
//!                   ├── UniqueViolation      ──► Duplicate
//!                   ├── Corrupt              ──► Deserialization
//!                   ├── ConnectionFailed,
//!                   │   PoolExhausted        ──► Unavailable
//!                   └── everything else      ──► Query
//! ```

use billbook_core::{CoreError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the row.
    ///
    /// ## When This Occurs
    /// - Appending a transaction whose id is already recorded
    /// - Importing a snapshot that repeats a product or transaction id
    #[error("{field} '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A CHECK constraint or trigger refused the write.
    ///
    /// ## When This Occurs
    /// - A row whose status disagrees with its quantity
    /// - Any UPDATE or DELETE against the sales history
    /// - Importing a snapshot into a database that already has data
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The file could not be opened, or the pool is closed.
    #[error("Cannot open database: {0}")]
    ConnectionFailed(String),

    #[error("Timed out waiting for a database connection")]
    PoolExhausted,

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// A column held a value of the wrong type.
    #[error("Corrupt {entity} data: {reason}")]
    Corrupt { entity: String, reason: String },

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                // SQLite: "UNIQUE constraint failed: transactions.id"
                if let Some(column) = message.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::duplicate(column, "?")
                } else if message.starts_with("CHECK constraint failed")
                    || message.starts_with("FOREIGN KEY constraint failed")
                    || message.contains("immutable")
                {
                    DbError::ConstraintViolation(message.to_string())
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            sqlx::Error::ColumnDecode { index, source } => DbError::Corrupt {
                entity: format!("column {index}"),
                reason: source.to_string(),
            },
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<DbError> for StorageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } => StorageError::Duplicate {
                entity: field,
                id: value,
            },
            DbError::Corrupt { entity, reason } => StorageError::Deserialization { entity, reason },
            DbError::ConnectionFailed(reason) => StorageError::Unavailable(reason),
            DbError::PoolExhausted => StorageError::Unavailable(DbError::PoolExhausted.to_string()),
            other => StorageError::Query(other.to_string()),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        CoreError::Storage(err.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;

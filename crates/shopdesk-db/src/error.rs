//! # Storage Errors
//!
//! Every repository and [`crate::SaleTransaction`] method returns
//! [`DbResult`]. sqlx failures are sorted into the few cases the billing
//! service reacts to differently.
//!
//! ```text
//!   sqlx::Error
//!       │  From
//!       ▼
//!   DbError ─────────┬─ Conflict / invoice UniqueViolation
//!                    │      └─► SaleService rolls back, backs off, retries
//!                    ├─ NotFound
//!                    │      └─► 404 for sales, 400 for referenced rows
//!                    └─ everything else
//!                           └─► logged, 500 without internals
//! ```

use thiserror::Error;

// Primary result codes; extended codes carry these in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the row. `field` is `table.column` as SQLite
    /// reports it.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Lost a race for the write lock (SQLITE_BUSY, SQLITE_LOCKED or a
    /// stale WAL snapshot).
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when rerunning the sale from `BEGIN` can succeed.
    ///
    /// A duplicate invoice number counts: the upsert on
    /// `invoice_sequences` hands out a fresh number on the next attempt.
    pub fn is_conflict(&self) -> bool {
        match self {
            DbError::Conflict(_) => true,
            DbError::UniqueViolation { field, .. } => field.contains("invoice_number"),
            _ => false,
        }
    }

    fn from_database(err: &dyn sqlx::error::DatabaseError) -> Self {
        let message = err.message();
        let code = err
            .code()
            .and_then(|c| c.parse::<i32>().ok())
            .map(|c| c & 0xff);

        if matches!(code, Some(SQLITE_BUSY | SQLITE_LOCKED)) || message.contains("is locked") {
            return DbError::Conflict(message.to_string());
        }

        if let Some(column) = message.strip_prefix("UNIQUE constraint failed: ") {
            return DbError::UniqueViolation {
                field: column.to_string(),
                value: "unknown".to_string(),
            };
        }

        if message.contains("FOREIGN KEY constraint failed") {
            return DbError::ForeignKeyViolation {
                message: message.to_string(),
            };
        }

        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_database(db_err.as_ref()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn duplicate(field: &str) -> DbError {
        DbError::UniqueViolation {
            field: field.to_string(),
            value: "x".to_string(),
        }
    }

    #[test]
    fn test_conflicts_are_retryable() {
        assert!(DbError::Conflict("database is locked".into()).is_conflict());
        assert!(duplicate("sales.invoice_number").is_conflict());
    }

    #[test]
    fn test_other_errors_are_final() {
        assert!(!duplicate("customers.id").is_conflict());
        assert!(!DbError::not_found("Sale", "INV-2025-000001").is_conflict());
        assert!(!DbError::PoolExhausted.is_conflict());
        assert!(!DbError::QueryFailed("syntax error".into()).is_conflict());
    }

    #[test]
    fn test_pool_errors_map() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }
}

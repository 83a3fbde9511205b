//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← constraint classification                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (service.rs) ← alongside CoreError                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (tavola-api) ← {code, message} + HTTP status                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is `table.column` as SQLite reports it, e.g. `discounts.code`.
    /// Composite indexes list every column, comma separated.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A scope list or order line naming a row that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK failed, e.g. `current_uses <= max_uses`.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be decoded, e.g. a malformed JSON column.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },

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

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn corrupt(table: impl Into<String>, reason: impl ToString) -> Self {
        DbError::CorruptRow {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// True when this is a unique violation involving `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }
}

/// Pulls `table.column` out of "UNIQUE constraint failed: table.column".
fn unique_field(message: &str) -> String {
    message
        .split_once("UNIQUE constraint failed: ")
        .map_or("unknown", |(_, field)| field)
        .to_string()
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::duplicate(unique_field(&message), "unknown"),
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation => DbError::CheckViolation { message },
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
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

    #[test]
    fn test_unique_violation_matching() {
        let err = DbError::duplicate("discounts.code", "SUMMER");
        assert!(err.is_unique_violation_on("discounts.code"));
        assert!(!err.is_unique_violation_on("promo_codes.code"));
        assert!(!DbError::PoolExhausted.is_unique_violation_on("discounts.code"));
    }

    #[test]
    fn test_unique_field_parsing() {
        assert_eq!(
            unique_field("UNIQUE constraint failed: discounts.code"),
            "discounts.code"
        );
        assert_eq!(
            unique_field("UNIQUE constraint failed: promo_codes.discount_id, promo_codes.customer_id"),
            "promo_codes.discount_id, promo_codes.customer_id"
        );
        assert_eq!(unique_field("disk I/O error"), "unknown");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DbError::not_found("Discount", "d-1").to_string(),
            "Discount not found: d-1"
        );
    }
}

//! # API Error Type
//!
//! Every failed request answers with the same JSON shape:
//!
//! ```json
//! { "code": "BAD_REQUEST", "message": "Discount limit reached" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  source                                   code              status      │
//! │  ───────────────────────────────────────  ────────────────  ──────      │
//! │  DiscountNotFound / OrderNotFound         NOT_FOUND         404         │
//! │  DbError::NotFound                        NOT_FOUND         404         │
//! │  DiscountNotApplicable, DuplicateCode,    BAD_REQUEST       400         │
//! │  PromoCodesUnsupported, bad JSON body                                   │
//! │  ValidationError                          VALIDATION_ERROR  400         │
//! │  unique / check constraint                CONFLICT          409         │
//! │  other database failures                  DATABASE_ERROR    500         │
//! │  corrupt rows                             INTERNAL          500         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database details are logged and replaced by a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tavola_core::CoreError;
use tavola_db::{DbError, ServiceError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    ValidationError,
    Conflict,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DiscountNotFound(_) | CoreError::OrderNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, err.to_string())
            }
            CoreError::DiscountNotApplicable { reason } => ApiError::bad_request(reason),
            CoreError::DuplicateCode(_) => ApiError::bad_request("Discount code already exists"),
            CoreError::PromoCodesUnsupported(_) => ApiError::bad_request(err.to_string()),
            CoreError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint rejected write: {}", message);
                ApiError::new(ErrorCode::Conflict, "Write conflicts with current state")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::bad_request("Invalid reference")
            }
            DbError::CorruptRow { table, reason } => {
                tracing::error!(table = %table, "Corrupt row: {}", reason);
                ApiError::new(ErrorCode::Internal, "Stored data could not be read")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => {
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tavola_core::ValidationError;

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::DiscountNotFound("d-1".into()));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Discount not found: d-1");

        let err = ApiError::from(CoreError::not_applicable("Discount limit reached"));
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.message, "Discount limit reached");

        let err = ApiError::from(CoreError::DuplicateCode("SUMMER".into()));
        assert_eq!(err.message, "Discount code already exists");

        let err = ApiError::from(CoreError::Validation(ValidationError::InvalidWindow));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_details_are_not_leaked() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let err = ApiError::from(DbError::CheckViolation {
            message: "CHECK constraint failed".into(),
        });
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::bad_request("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "BAD_REQUEST", "message": "nope"}));
    }
}

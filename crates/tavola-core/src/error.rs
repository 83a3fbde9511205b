//! # Error Types
//!
//! Domain-specific error types for tavola-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tavola-core (this file)                                               │
//! │  ├── CoreError        - Discount rule failures, missing entities       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tavola-db                                                              │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  tavola-api                                                             │
//! │  └── ApiError         - {code, message} + HTTP status                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Discount engine errors.
///
/// Every variant maps onto one of the three public outcomes: NotFound,
/// BadRequest or (through the database layer) Conflict.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No discount with this id or code.
    #[error("Discount not found: {0}")]
    DiscountNotFound(String),

    /// No order with this id.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The eligibility evaluator rejected the discount.
    ///
    /// `reason` is the message of the first failing rule, e.g.
    /// "Discount limit reached".
    #[error("{reason}")]
    DiscountNotApplicable { reason: String },

    /// Another discount already holds this code.
    #[error("Discount code already exists: {0}")]
    DuplicateCode(String),

    /// Promo codes were requested for a discount without a `code`.
    #[error("Discount does not support promo codes")]
    PromoCodesUnsupported(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Builds a `DiscountNotApplicable` from an evaluator message.
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        CoreError::DiscountNotApplicable {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write reaches the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad code characters, unknown weekday).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A list that must carry at least one entry was empty.
    #[error("{field} must contain at least one value")]
    Empty { field: String },

    /// `startDate` falls after `endDate`.
    #[error("startDate must not be after endDate")]
    InvalidWindow,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

//! # tavola-core: Pure Discount Rules for Tavola
//!
//! This crate decides which discounts apply to an order, whether a given
//! discount is currently usable and how much it takes off. It has zero I/O
//! dependencies: the database layer loads the facts, this crate judges them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola Discount Engine                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/tavola-api (axum)                       │   │
//! │  │     /discounts/find  /best  /{id}/validate  /{id}/apply        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            tavola-db (repositories + DiscountService)           │   │
//! │  │     candidate queries, transactions, conditional counters       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tavola-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │  discount   │  │validation│  │   │
//! │  │   │  Order    │  │   Money   │  │ eligibility │  │  rules   │  │   │
//! │  │   │  Catalog  │  │ % math    │  │ amount/rank │  │  checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Orders, catalog entities, order types, weekdays
//! - [`discount`] - The discount model plus eligibility, amount and ranking
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for discount writes
//!
//! ## Example Usage
//!
//! ```rust
//! use tavola_core::money::Money;
//!
//! // 10% of 10.00
//! let off = Money::from_cents(1000).percentage(10);
//! assert_eq!(off.cents(), 100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{
    AppliedDiscount, BestDiscount, Discount, DiscountApplication, DiscountPatch, DiscountScope,
    DiscountType, Eligibility, NewDiscount, PromoCode, ScopeKind, TargetType,
};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Percentage discounts are whole percentage points; this is 100%.
pub const MAX_PERCENTAGE: i64 = 100;

/// Prefix shared by every generated promo code.
pub const PROMO_CODE_PREFIX: &str = "PROMO-";

/// Number of random characters after [`PROMO_CODE_PREFIX`].
pub const PROMO_CODE_SUFFIX_LEN: usize = 6;

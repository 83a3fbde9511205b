//! # tavola-db: Database Layer for Tavola
//!
//! SQLite storage for the discount engine, and the [`DiscountService`] that
//! combines it with the rules in `tavola-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tavola Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /discounts/{id}/apply)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tavola-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │DiscountService│    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │───►│ discount      │    │  (embedded)  │  │   │
//! │  │   │               │    │ finder        │    │              │  │   │
//! │  │   │ apply / best  │    │ promo_code    │    │ 001_initial  │  │   │
//! │  │   │ validate      │    │ order, ...    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                    │                               │   │
//! │  │           └──── Database (pool.rs) ────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - The discount facade
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tavola_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tavola.db")).await?;
//! let service = db.discount_service();
//!
//! let best = service.best_discount(&ctx, Some(Money::from_cents(2500))).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{DiscountService, ServiceError, ServiceResult};

pub use repository::application::ApplicationRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::discount::DiscountRepository;
pub use repository::finder::DiscountFinder;
pub use repository::order::OrderRepository;
pub use repository::promo_code::PromoCodeRepository;

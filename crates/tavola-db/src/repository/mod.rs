//! # Repository Module
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DiscountService                                                       │
//! │       │                                                                 │
//! │       │  db.discounts().get_by_id("…")                                 │
//! │       ▼                                                                 │
//! │  Repository structs (own a pool clone)                                 │
//! │  ├── pub async fn …(&self, …)        one call, one connection          │
//! │  │                                                                      │
//! │  └── pub(crate) async fn …(conn, …)  run on a caller's connection,     │
//! │                                       so the service can compose them   │
//! │                                       inside a single transaction       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`discount::DiscountRepository`] - discount CRUD and scope associations
//! - [`finder::DiscountFinder`] - candidate discounts for an order context
//! - [`promo_code::PromoCodeRepository`] - per-customer promo codes
//! - [`order::OrderRepository`] - orders and their items
//! - [`application::ApplicationRepository`] - the application audit ledger
//! - [`catalog::CatalogRepository`] - restaurants, categories, products

pub mod application;
pub mod catalog;
pub mod discount;
pub mod finder;
pub mod order;
pub mod promo_code;

use sqlx::{QueryBuilder, Sqlite};

/// Appends `(?, ?, …)` binding every id.
pub(crate) fn push_id_list<'a>(qb: &mut QueryBuilder<'a, Sqlite>, ids: &'a [String]) {
    qb.push("(");
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(id.as_str());
    }
    list.push_unseparated(")");
}

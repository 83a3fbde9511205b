//! # HTTP Routes
//!
//! ```text
//! GET    /health
//! GET    /discounts                      list, newest first
//! POST   /discounts                      create
//! GET    /discounts/{id}
//! PATCH  /discounts/{id}
//! DELETE /discounts/{id}                 204
//! GET    /discounts/code/{code}
//! POST   /discounts/find                 OrderContext → [Discount]
//! POST   /discounts/best                 OrderContext + amount → {discount, amount}
//! POST   /discounts/{id}/validate        → {isValid, message?}
//! POST   /discounts/{id}/apply           → {discountAmount, order}
//! POST   /discounts/{id}/promo-codes     → {code}
//! GET    /discounts/{id}/promo-codes
//! GET    /discounts/{id}/applications
//! ```

pub mod discounts;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/discounts",
            get(discounts::list_discounts).post(discounts::create_discount),
        )
        .route("/discounts/find", post(discounts::find_discounts))
        .route("/discounts/best", post(discounts::best_discount))
        .route("/discounts/code/{code}", get(discounts::get_discount_by_code))
        .route(
            "/discounts/{id}",
            get(discounts::get_discount)
                .patch(discounts::update_discount)
                .delete(discounts::delete_discount),
        )
        .route("/discounts/{id}/validate", post(discounts::validate_discount))
        .route("/discounts/{id}/apply", post(discounts::apply_discount))
        .route(
            "/discounts/{id}/promo-codes",
            get(discounts::list_promo_codes).post(discounts::generate_promo_code),
        )
        .route("/discounts/{id}/applications", get(discounts::list_applications))
}

//! Shared handler state.

use tavola_db::{Database, DiscountService};

/// Cloned into every handler; both fields share one pool.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub discounts: DiscountService,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let discounts = db.discount_service();
        AppState { db, discounts }
    }
}

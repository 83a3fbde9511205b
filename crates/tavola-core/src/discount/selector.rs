//! # Best-Discount Selection
//!
//! Ranking is deterministic: FIXED before PERCENTAGE, then larger `value`
//! first. Ties keep their input order (stable sort), so the finder's
//! product → category → restaurant → all ordering breaks them.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{amount, Discount, DiscountType};
use crate::money::Money;

/// The winning discount and what it takes off the supplied amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BestDiscount {
    pub discount: Option<Discount>,
    pub amount: Money,
}

impl BestDiscount {
    pub fn none() -> Self {
        BestDiscount {
            discount: None,
            amount: Money::zero(),
        }
    }
}

fn type_rank(discount_type: DiscountType) -> u8 {
    match discount_type {
        DiscountType::Fixed => 0,
        DiscountType::Percentage => 1,
    }
}

pub fn compare(a: &Discount, b: &Discount) -> Ordering {
    (type_rank(a.discount_type), Reverse(a.value))
        .cmp(&(type_rank(b.discount_type), Reverse(b.value)))
}

/// Sorts candidates best-first.
pub fn rank(discounts: &mut [Discount]) {
    discounts.sort_by(compare);
}

/// Picks the best candidate and prices it against `amount`, or zero when no
/// amount is known.
pub fn select_best(mut candidates: Vec<Discount>, amount: Option<Money>) -> BestDiscount {
    rank(&mut candidates);
    match candidates.into_iter().next() {
        Some(best) => {
            let off = amount
                .map(|total| amount::calculate(&best, total, &[]))
                .unwrap_or_default();
            BestDiscount {
                discount: Some(best),
                amount: off,
            }
        }
        None => BestDiscount::none(),
    }
}

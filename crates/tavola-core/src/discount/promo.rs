//! # Promo Codes
//!
//! A coded discount is redeemed through per-customer codes of the form
//! `PROMO-XXXXXX`. Each code belongs to one customer, is used at most once and
//! a customer holds at most one unused code per discount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{PROMO_CODE_PREFIX, PROMO_CODE_SUFFIX_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: String,
    pub code: String,
    pub discount_id: String,
    pub customer_id: String,
    /// Flips false → true exactly once, when the discount is applied.
    pub used: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,
}

impl PromoCode {
    /// A fresh, unused code for `customer_id` on `discount_id`.
    pub fn issue(discount_id: &str, customer_id: &str, now: DateTime<Utc>) -> Self {
        PromoCode {
            id: Uuid::new_v4().to_string(),
            code: generate_code(),
            discount_id: discount_id.to_string(),
            customer_id: customer_id.to_string(),
            used: false,
            created_at: now,
            used_at: None,
        }
    }
}

/// `PROMO-` followed by six uppercase alphanumerics drawn from a v4 UUID.
pub fn generate_code() -> String {
    let entropy = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", PROMO_CODE_PREFIX, &entropy[..PROMO_CODE_SUFFIX_LEN])
}

pub fn is_promo_code(code: &str) -> bool {
    code.strip_prefix(PROMO_CODE_PREFIX).is_some_and(|suffix| {
        suffix.len() == PROMO_CODE_SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_have_expected_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert!(is_promo_code(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_format_check() {
        assert!(is_promo_code("PROMO-A1B2C3"));
        assert!(!is_promo_code("PROMO-a1b2c3"));
        assert!(!is_promo_code("PROMO-A1B2C"));
        assert!(!is_promo_code("PROMO-A1B2C3D"));
        assert!(!is_promo_code("CODE-A1B2C3"));
    }

    #[test]
    fn test_issue_is_unused() {
        let promo = PromoCode::issue("d1", "c1", Utc::now());
        assert!(!promo.used);
        assert_eq!(promo.discount_id, "d1");
        assert_eq!(promo.customer_id, "c1");
        assert!(promo.used_at.is_none());
    }
}

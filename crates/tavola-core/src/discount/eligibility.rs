//! # Eligibility
//!
//! Decides whether a discount can be used right now, for this amount and
//! this customer.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  #  rule          passes when                       failure message     │
//! │  ─  ────────────  ────────────────────────────────  ─────────────────── │
//! │  1  active        is_active                         not active          │
//! │  2  window        start <= now <= end               not yet / expired   │
//! │  3  min amount    no amount, no min, amount >= min  minimum order ...   │
//! │  4  usage cap     no cap or current < max           limit reached       │
//! │  5  weekday       no days or today listed           not valid for today │
//! │  6  promo code    no code, or customer has unused   invalid or used     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rule is evaluated. The verdict is the AND of all of them and the
//! message comes from the first one that failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::Discount;
use crate::money::Money;
use crate::types::DayOfWeek;

pub const MSG_NOT_ACTIVE: &str = "Discount is not active";
pub const MSG_NOT_YET_AVAILABLE: &str = "Discount is not yet available";
pub const MSG_EXPIRED: &str = "Discount has expired";
pub const MSG_LIMIT_REACHED: &str = "Discount limit reached";
pub const MSG_WRONG_DAY: &str = "Discount is not valid for today";
pub const MSG_PROMO_CODE: &str = "Invalid or used promo code";

/// Facts the evaluator needs beyond the discount itself.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityInput<'a> {
    pub now: DateTime<Utc>,
    /// Order amount; `None` skips the minimum-amount rule.
    pub amount: Option<Money>,
    pub customer_id: Option<&'a str>,
    /// Whether the store holds an unused promo code for (discount, customer).
    pub has_unused_promo_code: bool,
}

impl<'a> EligibilityInput<'a> {
    pub fn at(now: DateTime<Utc>) -> Self {
        EligibilityInput {
            now,
            amount: None,
            customer_id: None,
            has_unused_promo_code: false,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn for_customer(mut self, customer_id: &'a str, has_unused_promo_code: bool) -> Self {
        self.customer_id = Some(customer_id);
        self.has_unused_promo_code = has_unused_promo_code;
        self
    }

    /// Request bodies carry the amount optionally.
    pub fn with_optional_amount(mut self, amount: Option<Money>) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_optional_customer(
        mut self,
        customer_id: Option<&'a str>,
        has_unused_promo_code: bool,
    ) -> Self {
        self.customer_id = customer_id;
        self.has_unused_promo_code = customer_id.is_some() && has_unused_promo_code;
        self
    }
}

/// Evaluator verdict, serialized as `{isValid, message?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Eligibility {
    pub fn valid() -> Self {
        Eligibility {
            is_valid: true,
            message: None,
        }
    }
}

/// The six rules in precedence order, as `(passed, message)` pairs.
pub fn rules(discount: &Discount, input: &EligibilityInput<'_>) -> Vec<(bool, String)> {
    let window_message = match discount.start_date {
        Some(start) if input.now < start => MSG_NOT_YET_AVAILABLE,
        _ => MSG_EXPIRED,
    };

    let min_passed = discount.meets_min_order(input.amount);
    let min_message = discount
        .min_order()
        .map(|min| format!("Minimum order amount is {}", min))
        .unwrap_or_default();

    let promo_passed = !discount.requires_promo_code()
        || (input.customer_id.is_some() && input.has_unused_promo_code);

    vec![
        (discount.is_active, MSG_NOT_ACTIVE.to_string()),
        (discount.is_time_active(input.now), window_message.to_string()),
        (min_passed, min_message),
        (discount.has_uses_left(), MSG_LIMIT_REACHED.to_string()),
        (discount.runs_on(DayOfWeek::of(input.now)), MSG_WRONG_DAY.to_string()),
        (promo_passed, MSG_PROMO_CODE.to_string()),
    ]
}

pub fn evaluate(discount: &Discount, input: &EligibilityInput<'_>) -> Eligibility {
    let checks = rules(discount, input);
    let is_valid = checks.iter().all(|(passed, _)| *passed);
    let message = checks
        .into_iter()
        .find(|(passed, _)| !passed)
        .map(|(_, message)| message);

    Eligibility { is_valid, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::fixtures::{discount, monday_noon};
    use crate::discount::DiscountType;
    use chrono::Duration;

    fn input() -> EligibilityInput<'static> {
        EligibilityInput::at(monday_noon())
    }

    #[test]
    fn test_plain_discount_is_valid() {
        let d = discount(DiscountType::Fixed, 100);
        assert_eq!(evaluate(&d, &input()), Eligibility::valid());
    }

    #[test]
    fn test_inactive() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.is_active = false;
        let result = evaluate(&d, &input());
        assert!(!result.is_valid);
        assert_eq!(result.message.as_deref(), Some(MSG_NOT_ACTIVE));
    }

    #[test]
    fn test_window_messages() {
        let now = monday_noon();
        let mut d = discount(DiscountType::Fixed, 100);

        d.start_date = Some(now + Duration::days(1));
        assert_eq!(
            evaluate(&d, &input()).message.as_deref(),
            Some(MSG_NOT_YET_AVAILABLE)
        );

        d.start_date = None;
        d.end_date = Some(now - Duration::days(1));
        assert_eq!(evaluate(&d, &input()).message.as_deref(), Some(MSG_EXPIRED));
    }

    #[test]
    fn test_min_amount() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.min_order_cents = Some(1000);

        let short = input().with_amount(Money::from_cents(999));
        assert_eq!(
            evaluate(&d, &short).message.as_deref(),
            Some("Minimum order amount is 10.00")
        );

        let exact = input().with_amount(Money::from_cents(1000));
        assert!(evaluate(&d, &exact).is_valid);

        // Amount not supplied: rule passes
        assert!(evaluate(&d, &input()).is_valid);
    }

    #[test]
    fn test_usage_cap() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.max_uses = Some(1);
        d.current_uses = 1;
        assert_eq!(
            evaluate(&d, &input()).message.as_deref(),
            Some(MSG_LIMIT_REACHED)
        );
    }

    #[test]
    fn test_weekday() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.days_of_week = vec![DayOfWeek::Tuesday, DayOfWeek::Sunday];
        assert_eq!(evaluate(&d, &input()).message.as_deref(), Some(MSG_WRONG_DAY));

        d.days_of_week.push(DayOfWeek::Monday);
        assert!(evaluate(&d, &input()).is_valid);
    }

    #[test]
    fn test_coded_discount_needs_customer_with_code() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.code = Some("VIP".to_string());

        assert_eq!(evaluate(&d, &input()).message.as_deref(), Some(MSG_PROMO_CODE));
        assert!(!evaluate(&d, &input().for_customer("c1", false)).is_valid);
        assert!(evaluate(&d, &input().for_customer("c1", true)).is_valid);
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.is_active = false;
        d.max_uses = Some(1);
        d.current_uses = 1;
        d.code = Some("VIP".to_string());

        let result = evaluate(&d, &input());
        assert!(!result.is_valid);
        assert_eq!(result.message.as_deref(), Some(MSG_NOT_ACTIVE));
    }

    #[test]
    fn test_flipping_any_rule_flips_verdict() {
        let base = discount(DiscountType::Fixed, 100);
        let flips: Vec<Box<dyn Fn(&mut Discount)>> = vec![
            Box::new(|d| d.is_active = false),
            Box::new(|d| d.end_date = Some(monday_noon() - Duration::hours(1))),
            Box::new(|d| d.min_order_cents = Some(10_000)),
            Box::new(|d| {
                d.max_uses = Some(3);
                d.current_uses = 3;
            }),
            Box::new(|d| d.days_of_week = vec![DayOfWeek::Friday]),
            Box::new(|d| d.code = Some("VIP".to_string())),
        ];

        let amount = input().with_amount(Money::from_cents(500));
        assert!(evaluate(&base, &amount).is_valid);
        for flip in flips {
            let mut d = base.clone();
            flip(&mut d);
            assert!(!evaluate(&d, &amount).is_valid);
        }
    }
}

//! # Discount Amount
//!
//! ```text
//! FIXED       amount = min(value, order amount)
//! PERCENTAGE  base   = Σ unit prices of in-scope products, or the order amount
//!             amount = round_half_up(base × value / 100), capped at base
//! ```
//!
//! Results are clamped to `[0, base]`, so a negative base yields zero.

use std::collections::HashSet;

use super::{Discount, DiscountType, TargetType};
use crate::money::Money;
use crate::types::OrderLine;

/// Computes the discount amount for an order.
///
/// `scoped_prices` holds one unit price per distinct in-scope product; pass an
/// empty slice for order-wide discounts.
pub fn calculate(discount: &Discount, order_amount: Money, scoped_prices: &[Money]) -> Money {
    match discount.discount_type {
        DiscountType::Fixed => Money::from_cents(discount.value)
            .min(order_amount)
            .non_negative(),
        DiscountType::Percentage => {
            let base = if scoped_prices.is_empty() {
                order_amount
            } else {
                scoped_prices.iter().copied().sum::<Money>()
            };
            let base = base.non_negative();
            base.percentage(discount.value).min(base).non_negative()
        }
    }
}

/// Unit prices of the distinct order products covered by the discount's
/// product or category scope, in order of first appearance.
///
/// Restaurant and order-wide discounts have no product scope and return an
/// empty list.
pub fn scoped_prices(discount: &Discount, lines: &[OrderLine]) -> Vec<Money> {
    let in_scope = |line: &OrderLine| match discount.target_type {
        TargetType::Product => discount.scope.product_ids.contains(&line.product_id),
        TargetType::Category => line
            .category_id
            .as_ref()
            .is_some_and(|category| discount.scope.category_ids.contains(category)),
        TargetType::All | TargetType::Restaurant => false,
    };

    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|line| in_scope(*line))
        .filter(|line| seen.insert(line.product_id.as_str()))
        .map(|line| Money::from_cents(line.unit_price_cents))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::fixtures::discount;
    use crate::discount::ScopeKind;

    fn line(product: &str, category: Option<&str>, price: i64) -> OrderLine {
        OrderLine {
            product_id: product.to_string(),
            category_id: category.map(str::to_string),
            unit_price_cents: price,
        }
    }

    #[test]
    fn test_percentage_of_order() {
        // 10% of 1000 → 100
        let d = discount(DiscountType::Percentage, 10);
        assert_eq!(calculate(&d, Money::from_cents(1000), &[]).cents(), 100);
    }

    #[test]
    fn test_fixed_capped_at_order_amount() {
        let d = discount(DiscountType::Fixed, 200);
        assert_eq!(calculate(&d, Money::from_cents(150), &[]).cents(), 150);
        assert_eq!(calculate(&d, Money::from_cents(5000), &[]).cents(), 200);
    }

    #[test]
    fn test_percentage_over_scoped_prices() {
        let d = discount(DiscountType::Percentage, 50);
        let prices = [Money::from_cents(300), Money::from_cents(100)];
        assert_eq!(calculate(&d, Money::from_cents(5000), &prices).cents(), 200);
    }

    #[test]
    fn test_full_percentage_equals_base() {
        let d = discount(DiscountType::Percentage, 100);
        assert_eq!(calculate(&d, Money::from_cents(777), &[]).cents(), 777);
    }

    #[test]
    fn test_never_negative() {
        let fixed = discount(DiscountType::Fixed, 200);
        assert_eq!(calculate(&fixed, Money::from_cents(-50), &[]), Money::zero());

        let pct = discount(DiscountType::Percentage, 10);
        assert_eq!(calculate(&pct, Money::from_cents(-50), &[]), Money::zero());
    }

    #[test]
    fn test_amount_bounds_hold_across_inputs() {
        for value in [0, 1, 33, 50, 99, 100] {
            let d = discount(DiscountType::Percentage, value);
            for total in [0, 1, 7, 99, 1000, 123_457] {
                let amount = calculate(&d, Money::from_cents(total), &[]);
                assert!(amount.cents() <= total);
                assert!(amount.cents() >= 0);
            }
        }
    }

    #[test]
    fn test_scoped_prices_by_product() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.target_type = TargetType::Product;
        d.scope.set(ScopeKind::Product, vec!["p1".to_string(), "p3".to_string()]);

        let lines = vec![
            line("p1", None, 400),
            line("p2", None, 900),
            line("p3", None, 100),
            line("p1", None, 400),
        ];
        assert_eq!(
            scoped_prices(&d, &lines),
            vec![Money::from_cents(400), Money::from_cents(100)]
        );
    }

    #[test]
    fn test_scoped_prices_by_category() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.target_type = TargetType::Category;
        d.scope.set(ScopeKind::Category, vec!["drinks".to_string()]);

        let lines = vec![line("tea", Some("drinks"), 150), line("soup", Some("mains"), 600)];
        assert_eq!(scoped_prices(&d, &lines), vec![Money::from_cents(150)]);
    }

    #[test]
    fn test_order_wide_has_no_scope() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.scope.set(ScopeKind::Product, vec!["p1".to_string()]);
        assert!(scoped_prices(&d, &[line("p1", None, 400)]).is_empty());
    }
}

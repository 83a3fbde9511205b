//! # Validation Module
//!
//! Input validation for discount and order writes.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP (serde)                                                 │
//! │  └── Shape and type checks during deserialization                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business invariants (value ranges, date windows, code format)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── UNIQUE code, CHECK current_uses <= max_uses, foreign keys         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::discount::{Discount, DiscountType};
use crate::error::ValidationError;
use crate::types::NewOrder;
use crate::MAX_PERCENTAGE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_CODE_LEN: usize = 50;
const MAX_CUSTOMER_ID_LEN: usize = 100;

// =============================================================================
// Discount
// =============================================================================

/// Runs every discount invariant, first failure wins.
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    validate_title(&discount.title)?;
    if let Some(description) = &discount.description {
        validate_description(description)?;
    }
    validate_value(discount.discount_type, discount.value)?;
    if let Some(min) = discount.min_order_cents {
        validate_min_order_cents(min)?;
    }
    validate_window(discount.start_date, discount.end_date)?;
    if discount.order_types.is_empty() {
        return Err(ValidationError::Empty {
            field: "orderTypes".to_string(),
        });
    }
    if let Some(code) = &discount.code {
        validate_discount_code(code)?;
    }
    if let Some(max_uses) = discount.max_uses {
        validate_max_uses(max_uses)?;
    }
    Ok(())
}

/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

/// Validates a discount code.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use tavola_core::validation::validate_discount_code;
///
/// assert!(validate_discount_code("SUMMER-10").is_ok());
/// assert!(validate_discount_code("").is_err());
/// assert!(validate_discount_code("has space").is_err());
/// ```
pub fn validate_discount_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// FIXED values are non-negative minor units; PERCENTAGE values are
/// 0..=100 percent.
pub fn validate_value(discount_type: DiscountType, value: i64) -> ValidationResult<()> {
    let max = match discount_type {
        DiscountType::Fixed => i64::MAX,
        DiscountType::Percentage => MAX_PERCENTAGE,
    };

    if !(0..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 0,
            max,
        });
    }

    Ok(())
}

pub fn validate_min_order_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "minOrderCents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

pub fn validate_max_uses(max_uses: i64) -> ValidationResult<()> {
    if max_uses <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "maxUses".to_string(),
        });
    }
    Ok(())
}

/// An update may not lower the cap under uses already redeemed.
pub fn validate_max_uses_not_below_current(
    max_uses: Option<i64>,
    current_uses: i64,
) -> ValidationResult<()> {
    match max_uses {
        Some(max) if max < current_uses => Err(ValidationError::OutOfRange {
            field: "maxUses".to_string(),
            min: current_uses,
            max: i64::MAX,
        }),
        _ => Ok(()),
    }
}

pub fn validate_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ValidationError::InvalidWindow),
        _ => Ok(()),
    }
}

// =============================================================================
// Customers & Orders
// =============================================================================

/// Customer ids come from the loyalty system; only shape is checked.
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    let customer_id = customer_id.trim();

    if customer_id.is_empty() {
        return Err(ValidationError::Required {
            field: "customerId".to_string(),
        });
    }

    if customer_id.len() > MAX_CUSTOMER_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "customerId".to_string(),
            max: MAX_CUSTOMER_ID_LEN,
        });
    }

    Ok(())
}

/// ## Rules
/// - At least one item
/// - Quantities positive, unit prices non-negative
pub fn validate_new_order(order: &NewOrder) -> ValidationResult<()> {
    if order.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    for item in &order.items {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if item.unit_price_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "unitPriceCents".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::fixtures;
    use crate::types::{NewOrderItem, OrderType};
    use chrono::Duration;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Happy hour").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_discount_code() {
        assert!(validate_discount_code("LUNCH_15").is_ok());
        assert!(validate_discount_code(&"A".repeat(51)).is_err());
        assert!(validate_discount_code("semi;colon").is_err());
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value(DiscountType::Fixed, 0).is_ok());
        assert!(validate_value(DiscountType::Fixed, 1_000_000).is_ok());
        assert!(validate_value(DiscountType::Fixed, -1).is_err());

        assert!(validate_value(DiscountType::Percentage, 100).is_ok());
        assert!(validate_value(DiscountType::Percentage, 101).is_err());
    }

    #[test]
    fn test_validate_window() {
        let now = fixtures::monday_noon();
        assert!(validate_window(Some(now), Some(now)).is_ok());
        assert!(validate_window(None, Some(now)).is_ok());
        assert!(matches!(
            validate_window(Some(now + Duration::days(1)), Some(now)),
            Err(ValidationError::InvalidWindow)
        ));
    }

    #[test]
    fn test_validate_max_uses() {
        assert!(validate_max_uses(1).is_ok());
        assert!(validate_max_uses(0).is_err());
        assert!(validate_max_uses_not_below_current(Some(5), 5).is_ok());
        assert!(validate_max_uses_not_below_current(Some(4), 5).is_err());
        assert!(validate_max_uses_not_below_current(None, 5).is_ok());
    }

    #[test]
    fn test_validate_discount_requires_order_types() {
        let mut d = fixtures::discount(DiscountType::Fixed, 100);
        d.order_types.clear();
        assert!(matches!(
            validate_discount(&d),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn test_validate_new_order() {
        let mut order = NewOrder {
            restaurant_id: None,
            order_type: OrderType::DineIn,
            items: vec![],
        };
        assert!(validate_new_order(&order).is_err());

        order.items.push(NewOrderItem {
            product_id: "p1".to_string(),
            quantity: 0,
            unit_price_cents: 100,
        });
        assert!(validate_new_order(&order).is_err());

        order.items[0].quantity = 2;
        assert!(validate_new_order(&order).is_ok());
    }
}

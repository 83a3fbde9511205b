//! # Domain Types
//!
//! Orders, catalog entities and the small enums the discount rules match on.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                 │
//! │  │  Restaurant  │   │   Category   │◄──│   Product    │                 │
//! │  └──────┬───────┘   └──────────────┘   └──────┬───────┘                 │
//! │         │                                     │                         │
//! │  ┌──────▼───────┐                      ┌──────▼───────┐                 │
//! │  │    Order     │─────────────────────►│  OrderItem   │                 │
//! │  │  order_type  │                      │  unit price  │                 │
//! │  │  total/disc  │                      │  quantity    │                 │
//! │  └──────────────┘                      └──────────────┘                 │
//! │                                                                         │
//! │  OrderContext: what the finder sees (type, products, categories, site) │
//! │  OrderLine:    item joined with its product's category                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Order Type
// =============================================================================

/// How the order is served. Discounts list the order types they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
    Banquet,
}

impl OrderType {
    /// Every order type, in declaration order.
    pub const ALL: [OrderType; 4] = [
        OrderType::DineIn,
        OrderType::Takeaway,
        OrderType::Delivery,
        OrderType::Banquet,
    ];

    /// Default for discounts created without an explicit list.
    pub fn all() -> Vec<OrderType> {
        Self::ALL.to_vec()
    }
}

// =============================================================================
// Day Of Week
// =============================================================================

/// A weekday, persisted symbolically (`MONDAY` … `SUNDAY`).
///
/// Declaration order is Monday first, so `Ord` matches the ISO numbering
/// used by [`DayOfWeek::iso_number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    const SUNDAY_FIRST: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    /// Maps the numeric input convention, 0 = Sunday … 6 = Saturday.
    pub fn from_sunday_index(index: i64) -> Option<DayOfWeek> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::SUNDAY_FIRST.get(i).copied())
    }

    /// Monday = 1 … Sunday = 7.
    pub fn iso_number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }

    /// The weekday of `at`, evaluated in UTC.
    pub fn of(at: DateTime<Utc>) -> DayOfWeek {
        use chrono::Datelike;
        at.weekday().into()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts full names and three-letter abbreviations, case-insensitively.
impl FromStr for DayOfWeek {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        DayOfWeek::SUNDAY_FIRST
            .iter()
            .copied()
            .find(|day| day.as_str() == name || day.as_str()[..3] == name)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "daysOfWeek".to_string(),
                reason: format!("unknown weekday '{}'", s),
            })
    }
}

/// Weekday as it arrives over the wire: `0..=6` (Sunday-based) or a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum DayOfWeekInput {
    Index(i64),
    Name(String),
}

impl DayOfWeekInput {
    pub fn normalize(&self) -> Result<DayOfWeek, ValidationError> {
        match self {
            DayOfWeekInput::Index(i) => {
                DayOfWeek::from_sunday_index(*i).ok_or(ValidationError::OutOfRange {
                    field: "daysOfWeek".to_string(),
                    min: 0,
                    max: 6,
                })
            }
            DayOfWeekInput::Name(name) => name.parse(),
        }
    }
}

impl From<DayOfWeek> for DayOfWeekInput {
    fn from(day: DayOfWeek) -> Self {
        DayOfWeekInput::Name(day.as_str().to_string())
    }
}

/// Normalizes a weekday list into sorted, duplicate-free symbolic form.
pub fn normalize_days(input: &[DayOfWeekInput]) -> Result<Vec<DayOfWeek>, ValidationError> {
    let mut days = input
        .iter()
        .map(DayOfWeekInput::normalize)
        .collect::<Result<Vec<_>, _>>()?;
    days.sort();
    days.dedup();
    Ok(days)
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    /// Menu price in minor units.
    pub price_cents: i64,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A restaurant order. Applying a discount lowers `total_cents` and records
/// the amount in `discount_cents`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub restaurant_id: Option<String>,
    pub order_type: OrderType,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub items: Vec<OrderItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line on an order. The unit price is frozen when the item is added.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Input for creating an order; the total is derived from the items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub restaurant_id: Option<String>,
    pub order_type: OrderType,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl NewOrder {
    /// Sum of `unit_price × quantity` over all items.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .map(|item| Money::from_cents(item.unit_price_cents).multiply_quantity(item.quantity))
            .sum()
    }
}

/// An order item joined with its product's category, as the amount
/// calculator needs it to resolve category scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub category_id: Option<String>,
    pub unit_price_cents: i64,
}

// =============================================================================
// Order Context
// =============================================================================

/// What the finder knows about an order: how it is served, what is on it and
/// where it was placed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    pub order_type: OrderType,
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
}

impl OrderContext {
    pub fn new(order_type: OrderType) -> Self {
        OrderContext {
            order_type,
            product_ids: Vec::new(),
            category_ids: Vec::new(),
            restaurant_id: None,
        }
    }

    pub fn with_products<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn at_restaurant(mut self, id: impl Into<String>) -> Self {
        self.restaurant_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sunday_index_mapping() {
        assert_eq!(DayOfWeek::from_sunday_index(0), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::from_sunday_index(1), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::from_sunday_index(6), Some(DayOfWeek::Saturday));
        assert_eq!(DayOfWeek::from_sunday_index(7), None);
        assert_eq!(DayOfWeek::from_sunday_index(-1), None);
    }

    #[test]
    fn test_iso_numbering() {
        assert_eq!(DayOfWeek::Monday.iso_number(), 1);
        assert_eq!(DayOfWeek::Sunday.iso_number(), 7);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("Sat".parse::<DayOfWeek>().unwrap(), DayOfWeek::Saturday);
        assert_eq!("SUNDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("someday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_day_input_from_json() {
        let input: Vec<DayOfWeekInput> = serde_json::from_str(r#"[0, "fri", 3]"#).unwrap();
        let days = normalize_days(&input).unwrap();
        assert_eq!(
            days,
            vec![DayOfWeek::Wednesday, DayOfWeek::Friday, DayOfWeek::Sunday]
        );
    }

    #[test]
    fn test_day_input_out_of_range() {
        let err = normalize_days(&[DayOfWeekInput::Index(9)]).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { min: 0, max: 6, .. }));
    }

    #[test]
    fn test_days_deduplicated() {
        let input = vec![
            DayOfWeekInput::Index(1),
            DayOfWeekInput::Name("Monday".to_string()),
        ];
        assert_eq!(normalize_days(&input).unwrap(), vec![DayOfWeek::Monday]);
    }

    #[test]
    fn test_weekday_of_timestamp() {
        // 2024-01-01 was a Monday
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        assert_eq!(DayOfWeek::of(at), DayOfWeek::Monday);
    }

    #[test]
    fn test_order_type_serde() {
        assert_eq!(
            serde_json::to_string(&OrderType::DineIn).unwrap(),
            "\"DINE_IN\""
        );
        let parsed: OrderType = serde_json::from_str("\"BANQUET\"").unwrap();
        assert_eq!(parsed, OrderType::Banquet);
    }

    #[test]
    fn test_new_order_total() {
        let order = NewOrder {
            restaurant_id: None,
            order_type: OrderType::Takeaway,
            items: vec![
                NewOrderItem {
                    product_id: "p1".to_string(),
                    quantity: 2,
                    unit_price_cents: 250,
                },
                NewOrderItem {
                    product_id: "p2".to_string(),
                    quantity: 1,
                    unit_price_cents: 500,
                },
            ],
        };
        assert_eq!(order.total().cents(), 1000);
    }
}

//! # Discounts
//!
//! The discount model and the pure rules that judge it.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderContext ──► finder (tavola-db) ──► candidates                     │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                              eligibility::evaluate  (per candidate)     │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                              selector::select_best ──► amount::calculate│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`eligibility`] - ordered rule list, verdict + first failing message
//! - [`amount`] - FIXED / PERCENTAGE amount against an order
//! - [`selector`] - deterministic best-discount ranking
//! - [`promo`] - promo code format and generation

pub mod amount;
pub mod eligibility;
pub mod promo;
pub mod selector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{normalize_days, DayOfWeek, DayOfWeekInput, Order, OrderType};
use crate::validation;

pub use amount::calculate as calculate_amount;
pub use eligibility::{Eligibility, EligibilityInput};
pub use promo::PromoCode;
pub use selector::BestDiscount;

// =============================================================================
// Discount Type
// =============================================================================

/// How `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` is an amount in minor units.
    Fixed,
    /// `value` is in whole percentage points, 10 = 10%.
    Percentage,
}

// =============================================================================
// Target Type / Scope
// =============================================================================

/// What a discount is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[default]
    All,
    Restaurant,
    Category,
    Product,
}

/// One of the three scope-association kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Restaurant,
    Category,
    Product,
}

impl ScopeKind {
    pub const ALL: [ScopeKind; 3] = [ScopeKind::Restaurant, ScopeKind::Category, ScopeKind::Product];
}

impl TargetType {
    /// The association kind consulted for this target; `None` for `All`.
    pub fn scope_kind(self) -> Option<ScopeKind> {
        match self {
            TargetType::All => None,
            TargetType::Restaurant => Some(ScopeKind::Restaurant),
            TargetType::Category => Some(ScopeKind::Category),
            TargetType::Product => Some(ScopeKind::Product),
        }
    }
}

/// Scope associations of a discount, one id list per kind.
///
/// All three lists are stored, but only the one matching the discount's
/// [`TargetType`] is ever consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountScope {
    #[serde(default)]
    pub restaurant_ids: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

impl DiscountScope {
    pub fn ids(&self, kind: ScopeKind) -> &[String] {
        match kind {
            ScopeKind::Restaurant => &self.restaurant_ids,
            ScopeKind::Category => &self.category_ids,
            ScopeKind::Product => &self.product_ids,
        }
    }

    pub fn set(&mut self, kind: ScopeKind, mut ids: Vec<String>) {
        ids.sort();
        ids.dedup();
        match kind {
            ScopeKind::Restaurant => self.restaurant_ids = ids,
            ScopeKind::Category => self.category_ids = ids,
            ScopeKind::Product => self.product_ids = ids,
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount rule.
///
/// ## Invariants
/// - `value >= 0`; PERCENTAGE values are whole percents, at most 100
/// - `current_uses <= max_uses` whenever `max_uses` is set
/// - `start_date <= end_date` when both are set
/// - a `code` means the discount is redeemed through per-customer promo codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    pub target_type: TargetType,
    pub min_order_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub order_types: Vec<OrderType>,
    /// Empty means every day.
    pub days_of_week: Vec<DayOfWeek>,
    pub code: Option<String>,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub is_active: bool,
    pub scope: DiscountScope,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Minimum order amount, if any.
    #[inline]
    pub fn min_order(&self) -> Option<Money> {
        self.min_order_cents.map(Money::from_cents)
    }

    /// Both bounds are optional and inclusive.
    pub fn is_time_active(&self, now: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| start <= now)
            && self.end_date.map_or(true, |end| now <= end)
    }

    pub fn accepts_order_type(&self, order_type: OrderType) -> bool {
        self.order_types.contains(&order_type)
    }

    pub fn runs_on(&self, day: DayOfWeek) -> bool {
        self.days_of_week.is_empty() || self.days_of_week.contains(&day)
    }

    /// A missing amount is not held against the discount.
    pub fn meets_min_order(&self, amount: Option<Money>) -> bool {
        match (self.min_order(), amount) {
            (Some(min), Some(amount)) => amount >= min,
            _ => true,
        }
    }

    pub fn has_uses_left(&self) -> bool {
        self.max_uses.map_or(true, |max| self.current_uses < max)
    }

    /// Coded discounts can only be redeemed with a customer's promo code.
    #[inline]
    pub fn requires_promo_code(&self) -> bool {
        self.code.is_some()
    }

    /// Ids of the association kind matching `target_type`; empty for `All`.
    pub fn active_scope(&self) -> &[String] {
        match self.target_type.scope_kind() {
            Some(kind) => self.scope.ids(kind),
            None => &[],
        }
    }

    /// Text stored on the audit row when this discount is applied.
    pub fn application_description(&self, amount: Money) -> String {
        format!("{} (-{})", self.title, amount)
    }
}

// =============================================================================
// Create / Update Inputs
// =============================================================================

fn default_true() -> bool {
    true
}

/// Input for creating a discount, scope lists included.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscount {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub min_order_cents: Option<i64>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "OrderType::all")]
    pub order_types: Vec<OrderType>,
    #[serde(default)]
    pub days_of_week: Vec<DayOfWeekInput>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub restaurant_ids: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

impl NewDiscount {
    /// A minimal active, every-day, all-order-types discount.
    pub fn new(title: impl Into<String>, discount_type: DiscountType, value: i64) -> Self {
        NewDiscount {
            title: title.into(),
            description: None,
            discount_type,
            value,
            target_type: TargetType::All,
            min_order_cents: None,
            start_date: None,
            end_date: None,
            order_types: OrderType::all(),
            days_of_week: Vec::new(),
            code: None,
            max_uses: None,
            is_active: true,
            restaurant_ids: Vec::new(),
            category_ids: Vec::new(),
            product_ids: Vec::new(),
        }
    }

    /// Normalizes and validates the input into a storable discount.
    pub fn into_discount(self, id: String, now: DateTime<Utc>) -> Result<Discount, ValidationError> {
        let mut scope = DiscountScope::default();
        scope.set(ScopeKind::Restaurant, self.restaurant_ids);
        scope.set(ScopeKind::Category, self.category_ids);
        scope.set(ScopeKind::Product, self.product_ids);

        let discount = Discount {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            discount_type: self.discount_type,
            value: self.value,
            target_type: self.target_type,
            min_order_cents: self.min_order_cents,
            start_date: self.start_date,
            end_date: self.end_date,
            order_types: dedup_order_types(self.order_types),
            days_of_week: normalize_days(&self.days_of_week)?,
            code: self.code.map(|c| c.trim().to_string()),
            max_uses: self.max_uses,
            current_uses: 0,
            is_active: self.is_active,
            scope,
            created_at: now,
            updated_at: now,
        };

        validation::validate_discount(&discount)?;
        Ok(discount)
    }
}

/// Partial update. Omitted fields are untouched; for nullable fields an
/// explicit `null` clears the value. Supplied scope lists replace that
/// kind's whole set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPatch {
    #[serde(default)]
    #[ts(optional)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    #[serde(default, rename = "type")]
    #[ts(optional)]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    #[ts(optional)]
    pub value: Option<i64>,
    #[serde(default)]
    #[ts(optional)]
    pub target_type: Option<TargetType>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub min_order_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(as = "Option<Option<String>>", optional)]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(as = "Option<Option<String>>", optional)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    #[ts(optional)]
    pub order_types: Option<Vec<OrderType>>,
    #[serde(default)]
    #[ts(optional)]
    pub days_of_week: Option<Vec<DayOfWeekInput>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[ts(optional)]
    pub max_uses: Option<Option<i64>>,
    #[serde(default)]
    #[ts(optional)]
    pub is_active: Option<bool>,
    #[serde(default)]
    #[ts(optional)]
    pub restaurant_ids: Option<Vec<String>>,
    #[serde(default)]
    #[ts(optional)]
    pub category_ids: Option<Vec<String>>,
    #[serde(default)]
    #[ts(optional)]
    pub product_ids: Option<Vec<String>>,
}

/// Present-but-null becomes `Some(None)`; absence is handled by `default`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl DiscountPatch {
    /// Scope kinds whose lists this patch replaces.
    pub fn replaced_scopes(&self) -> Vec<ScopeKind> {
        ScopeKind::ALL
            .into_iter()
            .filter(|kind| self.scope_list(*kind).is_some())
            .collect()
    }

    fn scope_list(&self, kind: ScopeKind) -> Option<&Vec<String>> {
        match kind {
            ScopeKind::Restaurant => self.restaurant_ids.as_ref(),
            ScopeKind::Category => self.category_ids.as_ref(),
            ScopeKind::Product => self.product_ids.as_ref(),
        }
    }

    /// Merges the patch into `discount` and re-validates the result.
    ///
    /// `current_uses` is never touched here; only redemption moves it.
    pub fn apply_to(&self, discount: &mut Discount, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            discount.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            discount.description = description.clone();
        }
        if let Some(discount_type) = self.discount_type {
            discount.discount_type = discount_type;
        }
        if let Some(value) = self.value {
            discount.value = value;
        }
        if let Some(target_type) = self.target_type {
            discount.target_type = target_type;
        }
        if let Some(min) = self.min_order_cents {
            discount.min_order_cents = min;
        }
        if let Some(start) = self.start_date {
            discount.start_date = start;
        }
        if let Some(end) = self.end_date {
            discount.end_date = end;
        }
        if let Some(order_types) = &self.order_types {
            discount.order_types = dedup_order_types(order_types.clone());
        }
        if let Some(days) = &self.days_of_week {
            discount.days_of_week = normalize_days(days)?;
        }
        if let Some(code) = &self.code {
            discount.code = code.as_ref().map(|c| c.trim().to_string());
        }
        if let Some(max_uses) = self.max_uses {
            discount.max_uses = max_uses;
        }
        if let Some(is_active) = self.is_active {
            discount.is_active = is_active;
        }
        for kind in self.replaced_scopes() {
            if let Some(ids) = self.scope_list(kind) {
                discount.scope.set(kind, ids.clone());
            }
        }
        discount.updated_at = now;

        validation::validate_discount(discount)?;
        validation::validate_max_uses_not_below_current(discount.max_uses, discount.current_uses)
    }
}

fn dedup_order_types(order_types: Vec<OrderType>) -> Vec<OrderType> {
    let mut out = Vec::with_capacity(order_types.len());
    for order_type in order_types {
        if !out.contains(&order_type) {
            out.push(order_type);
        }
    }
    out
}

// =============================================================================
// Discount Application
// =============================================================================

/// Append-only audit row written each time a discount is applied to an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountApplication {
    pub id: String,
    pub discount_id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Result of applying a discount: the amount taken off and the updated order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    pub discount_amount: Money,
    pub order: Order,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Monday, 2024-01-01 12:00 UTC.
    pub fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    pub fn discount(discount_type: DiscountType, value: i64) -> Discount {
        NewDiscount::new("Test", discount_type, value)
            .into_discount("d-test".to_string(), monday_noon())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_scope_kind_mapping() {
        assert_eq!(TargetType::All.scope_kind(), None);
        assert_eq!(TargetType::Product.scope_kind(), Some(ScopeKind::Product));
        assert_eq!(TargetType::Category.scope_kind(), Some(ScopeKind::Category));
        assert_eq!(TargetType::Restaurant.scope_kind(), Some(ScopeKind::Restaurant));
    }

    #[test]
    fn test_active_scope_follows_target_type() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.scope.set(ScopeKind::Product, vec!["p1".to_string()]);
        d.scope.set(ScopeKind::Category, vec!["c1".to_string()]);
        assert!(d.active_scope().is_empty());

        d.target_type = TargetType::Category;
        assert_eq!(d.active_scope(), ["c1".to_string()]);
    }

    #[test]
    fn test_min_order_check() {
        let mut d = discount(DiscountType::Fixed, 100);
        assert!(d.meets_min_order(Some(Money::zero())));

        d.min_order_cents = Some(1000);
        assert!(d.meets_min_order(Some(Money::from_cents(1000))));
        assert!(!d.meets_min_order(Some(Money::from_cents(999))));
        assert!(d.meets_min_order(None));
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let now = monday_noon();
        let mut d = discount(DiscountType::Fixed, 100);
        d.start_date = Some(now);
        d.end_date = Some(now);
        assert!(d.is_time_active(now));
        assert!(!d.is_time_active(now + Duration::seconds(1)));
        assert!(!d.is_time_active(now - Duration::seconds(1)));
    }

    #[test]
    fn test_new_discount_defaults_from_json() {
        let input: NewDiscount =
            serde_json::from_str(r#"{"title":" Lunch ","type":"FIXED","value":200}"#).unwrap();
        let d = input.into_discount("d1".to_string(), monday_noon()).unwrap();
        assert_eq!(d.title, "Lunch");
        assert_eq!(d.target_type, TargetType::All);
        assert_eq!(d.order_types, OrderType::all());
        assert!(d.days_of_week.is_empty());
        assert!(d.is_active);
        assert_eq!(d.current_uses, 0);
    }

    #[test]
    fn test_percentage_value_is_whole_percent() {
        let input: NewDiscount =
            serde_json::from_str(r#"{"title":"Ten","type":"PERCENTAGE","value":10}"#).unwrap();
        let d = input.into_discount("d1".to_string(), monday_noon()).unwrap();
        let off = crate::discount::amount::calculate(&d, Money::from_cents(1000), &[]);
        assert_eq!(off.cents(), 100);

        let too_much = NewDiscount::new("Too much", DiscountType::Percentage, 101);
        assert!(too_much.into_discount("d2".to_string(), monday_noon()).is_err());
    }

    #[test]
    fn test_new_discount_rejects_bad_days() {
        let mut input = NewDiscount::new("Bad days", DiscountType::Fixed, 100);
        input.days_of_week = vec![DayOfWeekInput::Index(7)];
        assert!(input.into_discount("d1".to_string(), monday_noon()).is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: DiscountPatch =
            serde_json::from_str(r#"{"description":null,"value":500}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.code, None);
        assert_eq!(patch.value, Some(500));

        let mut d = discount(DiscountType::Fixed, 100);
        d.description = Some("old".to_string());
        d.code = Some("KEEP".to_string());
        patch.apply_to(&mut d, monday_noon()).unwrap();
        assert_eq!(d.description, None);
        assert_eq!(d.code.as_deref(), Some("KEEP"));
        assert_eq!(d.value, 500);
    }

    #[test]
    fn test_patch_replaces_only_supplied_scopes() {
        let mut d = discount(DiscountType::Percentage, 10);
        d.scope.set(ScopeKind::Product, vec!["p1".to_string()]);
        d.scope.set(ScopeKind::Category, vec!["c1".to_string()]);

        let patch: DiscountPatch = serde_json::from_str(r#"{"productIds":["p2","p3"]}"#).unwrap();
        assert_eq!(patch.replaced_scopes(), vec![ScopeKind::Product]);

        patch.apply_to(&mut d, monday_noon()).unwrap();
        assert_eq!(d.scope.product_ids, vec!["p2".to_string(), "p3".to_string()]);
        assert_eq!(d.scope.category_ids, vec!["c1".to_string()]);
    }

    #[test]
    fn test_patch_cannot_drop_cap_below_current_uses() {
        let mut d = discount(DiscountType::Fixed, 100);
        d.max_uses = Some(10);
        d.current_uses = 5;
        let patch = DiscountPatch {
            max_uses: Some(Some(3)),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut d, monday_noon()).is_err());
    }

    #[test]
    fn test_discount_serializes_type_field() {
        let d = discount(DiscountType::Percentage, 10);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "PERCENTAGE");
        assert_eq!(json["targetType"], "ALL");
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn test_patch_typescript_fields_are_optional() {
        let decl = DiscountPatch::decl();
        assert!(decl.contains("title?: string"));
        assert!(decl.contains("description?: string | null"));
        assert!(decl.contains("startDate?: string | null"));
        assert!(decl.contains("code?: string | null"));
        assert!(decl.contains("maxUses?: "));
        assert!(!decl.contains("maxUses: "));
    }
}

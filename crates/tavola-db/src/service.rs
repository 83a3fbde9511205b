//! # Discount Service
//!
//! The one entry point the HTTP layer talks to. Composes the pure rules from
//! `tavola-core` with the repositories.
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   claim the order row (first write takes the SQLite write lock)         │
//! │   read   order, discount, promo state                                   │
//! │   judge  eligibility::evaluate ── fails ──► DiscountNotApplicable      │
//! │   price  amount::scoped_prices → amount::calculate                      │
//! │   (a) orders.total -= amount, orders.discount = amount                  │
//! │   (b) discounts.current_uses += 1   WHERE under cap  ── 0 rows ──┐      │
//! │   (c) INSERT discount_applications                               │      │
//! │   (d) promo_codes.used = 1          WHERE used = 0   ── 0 rows ──┤      │
//! │  COMMIT                                            ROLLBACK ◄────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every read happens after the write lock is held, so the amount is priced
//! against the order total no other writer can change before COMMIT. The
//! conditional updates in (b) and (d) still guard the counter and the promo
//! code on their own.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{application, discount, order, promo_code};
use tavola_core::discount::eligibility::{self, MSG_LIMIT_REACHED, MSG_PROMO_CODE};
use tavola_core::discount::{amount, selector};
use tavola_core::validation;
use tavola_core::{
    AppliedDiscount, BestDiscount, CoreError, Discount, DiscountApplication, DiscountPatch,
    Eligibility, Money, NewDiscount, NewOrder, Order, OrderContext,
    PromoCode, ValidationError,
};

// =============================================================================
// Errors
// =============================================================================

/// Service failures: a domain rule said no, or the database did.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Turns a storage-level code clash into the domain error.
fn duplicate_code(err: DbError) -> ServiceError {
    match err {
        DbError::UniqueViolation { field, value } if field.contains("discounts.code") => {
            CoreError::DuplicateCode(value).into()
        }
        other => other.into(),
    }
}

fn discount_not_found(id: &str) -> ServiceError {
    CoreError::DiscountNotFound(id.to_string()).into()
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct DiscountService {
    db: Database,
}

impl DiscountService {
    pub fn new(db: Database) -> Self {
        DiscountService { db }
    }

    // -------------------------------------------------------------------------
    // CRUD
    // -------------------------------------------------------------------------

    pub async fn create_discount(&self, input: NewDiscount) -> ServiceResult<Discount> {
        let discount = input.into_discount(Uuid::new_v4().to_string(), Utc::now())?;
        let created = self
            .db
            .discounts()
            .insert(&discount)
            .await
            .map_err(duplicate_code)?;
        Ok(created)
    }

    pub async fn get_discount(&self, id: &str) -> ServiceResult<Discount> {
        self.db
            .discounts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| discount_not_found(id))
    }

    pub async fn get_discount_by_code(&self, code: &str) -> ServiceResult<Discount> {
        self.db
            .discounts()
            .get_by_code(code)
            .await?
            .ok_or_else(|| discount_not_found(code))
    }

    pub async fn list_discounts(&self) -> ServiceResult<Vec<Discount>> {
        Ok(self.db.discounts().list_all().await?)
    }

    /// Merges `patch` into the stored discount and writes it back together
    /// with any replaced scope lists.
    pub async fn update_discount(&self, id: &str, patch: DiscountPatch) -> ServiceResult<Discount> {
        let mut discount = self.get_discount(id).await?;
        patch.apply_to(&mut discount, Utc::now())?;

        let updated = self
            .db
            .discounts()
            .update(&discount, &patch.replaced_scopes())
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => discount_not_found(id),
                other => duplicate_code(other),
            })?;
        Ok(updated)
    }

    pub async fn delete_discount(&self, id: &str) -> ServiceResult<()> {
        self.db.discounts().delete(id).await.map_err(|e| match e {
            DbError::NotFound { .. } => discount_not_found(id),
            other => other.into(),
        })
    }

    // -------------------------------------------------------------------------
    // Finding and judging
    // -------------------------------------------------------------------------

    pub async fn find_for_order(&self, ctx: &OrderContext) -> ServiceResult<Vec<Discount>> {
        Ok(self.db.finder().find_for_order(ctx, Utc::now()).await?)
    }

    /// Runs the eligibility rules for one discount.
    ///
    /// An unknown discount is an error; every rule failure is a verdict.
    pub async fn validate_discount(
        &self,
        discount_id: &str,
        amount: Option<Money>,
        customer_id: Option<&str>,
    ) -> ServiceResult<Eligibility> {
        let mut conn = self.db.pool().acquire().await?;

        let discount = discount::fetch(&mut conn, discount_id)
            .await?
            .ok_or_else(|| discount_not_found(discount_id))?;

        let has_unused = match customer_id {
            Some(customer) if discount.requires_promo_code() => {
                promo_code::has_unused(&mut conn, discount_id, customer).await?
            }
            _ => false,
        };

        let input = eligibility::EligibilityInput::at(Utc::now())
            .with_optional_amount(amount)
            .with_optional_customer(customer_id, has_unused);
        let verdict = eligibility::evaluate(&discount, &input);

        debug!(
            discount_id = %discount_id,
            valid = verdict.is_valid,
            message = ?verdict.message,
            "Discount validated"
        );
        Ok(verdict)
    }

    /// The best discount among those found for `ctx`, keeping only the ones
    /// whose minimum order `amount` meets. Usage caps, weekdays and promo
    /// codes are left to `validate` and `apply`.
    pub async fn best_discount(
        &self,
        ctx: &OrderContext,
        amount: Option<Money>,
    ) -> ServiceResult<BestDiscount> {
        let candidates: Vec<Discount> = self
            .db
            .finder()
            .find_for_order(ctx, Utc::now())
            .await?
            .into_iter()
            .filter(|d| d.meets_min_order(amount))
            .collect();

        let best = selector::select_best(candidates, amount);
        debug!(
            discount_id = ?best.discount.as_ref().map(|d| d.id.as_str()),
            amount = %best.amount,
            "Best discount selected"
        );
        Ok(best)
    }

    // -------------------------------------------------------------------------
    // Application
    // -------------------------------------------------------------------------

    /// Applies a discount to an order. See the module docs for the flow;
    /// any failure leaves the order, the counter, the ledger and the promo
    /// code untouched.
    pub async fn apply_discount(
        &self,
        order_id: &str,
        discount_id: &str,
        customer_id: Option<&str>,
    ) -> ServiceResult<AppliedDiscount> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        if !order::claim(&mut tx, order_id, now).await? {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }
        let order = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        let discount = discount::fetch(&mut tx, discount_id)
            .await?
            .ok_or_else(|| discount_not_found(discount_id))?;

        let has_unused = match customer_id {
            Some(customer) if discount.requires_promo_code() => {
                promo_code::has_unused(&mut tx, discount_id, customer).await?
            }
            _ => false,
        };

        let input = eligibility::EligibilityInput::at(now)
            .with_amount(order.total())
            .with_optional_customer(customer_id, has_unused);
        let verdict = eligibility::evaluate(&discount, &input);
        if !verdict.is_valid {
            let reason = verdict.message.unwrap_or_default();
            debug!(order_id = %order_id, discount_id = %discount_id, reason = %reason, "Discount rejected");
            return Err(CoreError::not_applicable(reason).into());
        }

        let lines = order::fetch_lines(&mut tx, order_id).await?;
        let scoped = amount::scoped_prices(&discount, &lines);
        let off = amount::calculate(&discount, order.total(), &scoped);

        order::apply_amount(&mut tx, order_id, off, now).await?;

        if !discount::increment_usage(&mut tx, discount_id, now).await? {
            warn!(discount_id = %discount_id, "Usage cap reached during apply");
            return Err(CoreError::not_applicable(MSG_LIMIT_REACHED).into());
        }

        let entry = DiscountApplication {
            id: Uuid::new_v4().to_string(),
            discount_id: discount_id.to_string(),
            order_id: order_id.to_string(),
            amount_cents: off.cents(),
            description: discount.application_description(off),
            created_at: now,
        };
        application::insert(&mut tx, &entry).await?;

        if let (true, Some(customer)) = (discount.requires_promo_code(), customer_id) {
            if !promo_code::mark_used(&mut tx, discount_id, customer, now).await? {
                warn!(discount_id = %discount_id, customer_id = %customer, "Promo code spent during apply");
                return Err(CoreError::not_applicable(MSG_PROMO_CODE).into());
            }
        }

        let updated = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            discount_id = %discount_id,
            amount = %off,
            total = %updated.total(),
            "Discount applied"
        );

        Ok(AppliedDiscount {
            discount_amount: off,
            order: updated,
        })
    }

    pub async fn list_applications(&self, discount_id: &str) -> ServiceResult<Vec<DiscountApplication>> {
        self.get_discount(discount_id).await?;
        Ok(self.db.applications().list_for_discount(discount_id).await?)
    }

    // -------------------------------------------------------------------------
    // Promo codes
    // -------------------------------------------------------------------------

    /// Returns the customer's unused code for the discount, issuing one if
    /// needed.
    pub async fn generate_promo_code(
        &self,
        discount_id: &str,
        customer_id: &str,
    ) -> ServiceResult<PromoCode> {
        let discount = self.get_discount(discount_id).await?;
        if !discount.requires_promo_code() {
            return Err(CoreError::PromoCodesUnsupported(discount_id.to_string()).into());
        }
        validation::validate_customer_id(customer_id)?;

        let promo = self
            .db
            .promo_codes()
            .get_or_issue(discount_id, customer_id.trim(), Utc::now())
            .await?;
        Ok(promo)
    }

    pub async fn list_promo_codes(&self, discount_id: &str) -> ServiceResult<Vec<PromoCode>> {
        self.get_discount(discount_id).await?;
        Ok(self.db.promo_codes().list_for_discount(discount_id).await?)
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn create_order(&self, input: &NewOrder) -> ServiceResult<Order> {
        validation::validate_new_order(input)?;
        Ok(self.db.orders().create(input).await?)
    }

    pub async fn get_order(&self, id: &str) -> ServiceResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }
}

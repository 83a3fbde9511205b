//! # Promo Code Repository
//!
//! ## Lifecycle
//! ```text
//! get_or_issue ──► unused ──(mark_used, inside apply)──► used
//!                    ▲
//!                    └── a second get_or_issue returns this same row
//! ```
//!
//! The partial unique index `idx_promo_codes_unused` allows one unused code
//! per (discount, customer); used codes accumulate freely.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tavola_core::PromoCode;

const SELECT_PROMO: &str = r#"
    SELECT id, code, discount_id, customer_id, used, created_at, used_at
    FROM promo_codes
"#;

/// Whether the customer holds an unused code for the discount.
pub(crate) async fn has_unused(
    conn: &mut SqliteConnection,
    discount_id: &str,
    customer_id: &str,
) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM promo_codes
            WHERE discount_id = ?1 AND customer_id = ?2 AND used = 0
        )
        "#,
    )
    .bind(discount_id)
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Flips the customer's unused code to used.
///
/// Returns `false` when there is no unused code left, e.g. because a
/// concurrent application consumed it first.
pub(crate) async fn mark_used(
    conn: &mut SqliteConnection,
    discount_id: &str,
    customer_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE promo_codes SET used = 1, used_at = ?3
        WHERE discount_id = ?1 AND customer_id = ?2 AND used = 0
        "#,
    )
    .bind(discount_id)
    .bind(customer_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone)]
pub struct PromoCodeRepository {
    pool: SqlitePool,
}

impl PromoCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromoCodeRepository { pool }
    }

    pub async fn find_unused(
        &self,
        discount_id: &str,
        customer_id: &str,
    ) -> DbResult<Option<PromoCode>> {
        let sql = format!("{SELECT_PROMO} WHERE discount_id = ?1 AND customer_id = ?2 AND used = 0");
        let promo = sqlx::query_as::<_, PromoCode>(&sql)
            .bind(discount_id)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promo)
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PromoCode>> {
        let sql = format!("{SELECT_PROMO} WHERE code = ?1");
        let promo = sqlx::query_as::<_, PromoCode>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promo)
    }

    /// Returns the customer's unused code, issuing a new one if there is none.
    ///
    /// Two concurrent calls race on `idx_promo_codes_unused`; the loser
    /// re-reads and returns the winner's code.
    pub async fn get_or_issue(
        &self,
        discount_id: &str,
        customer_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<PromoCode> {
        if let Some(existing) = self.find_unused(discount_id, customer_id).await? {
            debug!(discount_id = %discount_id, customer_id = %customer_id, "Reusing unused promo code");
            return Ok(existing);
        }

        let promo = PromoCode::issue(discount_id, customer_id, now);

        let inserted = sqlx::query(
            r#"
            INSERT INTO promo_codes (id, code, discount_id, customer_id, used, created_at, used_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, NULL)
            "#,
        )
        .bind(&promo.id)
        .bind(&promo.code)
        .bind(&promo.discount_id)
        .bind(&promo.customer_id)
        .bind(promo.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                info!(discount_id = %discount_id, customer_id = %customer_id, "Promo code issued");
                Ok(promo)
            }
            Err(e) => {
                let err = DbError::from(e);
                if !err.is_unique_violation_on("promo_codes.discount_id") {
                    return Err(err);
                }
                self.find_unused(discount_id, customer_id)
                    .await?
                    .ok_or(err)
            }
        }
    }

    /// Codes issued for a discount, newest first.
    pub async fn list_for_discount(&self, discount_id: &str) -> DbResult<Vec<PromoCode>> {
        let sql = format!("{SELECT_PROMO} WHERE discount_id = ?1 ORDER BY created_at DESC, id");
        let rows = sqlx::query_as::<_, PromoCode>(&sql)
            .bind(discount_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

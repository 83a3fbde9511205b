//! # Discount Application Ledger
//!
//! Append-only. Rows are written inside the apply transaction and never
//! updated; they go away only when their discount or order is deleted.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use tavola_core::DiscountApplication;

const SELECT_APPLICATION: &str = r#"
    SELECT id, discount_id, order_id, amount_cents, description, created_at
    FROM discount_applications
"#;

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    application: &DiscountApplication,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO discount_applications (
            id, discount_id, order_id, amount_cents, description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&application.id)
    .bind(&application.discount_id)
    .bind(&application.order_id)
    .bind(application.amount_cents)
    .bind(&application.description)
    .bind(application.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ApplicationRepository { pool }
    }

    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<DiscountApplication>> {
        let sql = format!("{SELECT_APPLICATION} WHERE order_id = ?1 ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, DiscountApplication>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Newest first.
    pub async fn list_for_discount(&self, discount_id: &str) -> DbResult<Vec<DiscountApplication>> {
        let sql = format!("{SELECT_APPLICATION} WHERE discount_id = ?1 ORDER BY created_at DESC, id");
        let rows = sqlx::query_as::<_, DiscountApplication>(&sql)
            .bind(discount_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

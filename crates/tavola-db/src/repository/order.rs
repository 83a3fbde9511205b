//! # Order Repository
//!
//! Orders are created with their items in one transaction; the total is
//! derived from the items. Discount application only ever touches
//! `total_cents`, `discount_cents` and `updated_at`.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tavola_core::{Money, NewOrder, Order, OrderItem, OrderLine, OrderType};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    restaurant_id: Option<String>,
    order_type: OrderType,
    total_cents: i64,
    discount_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            restaurant_id: self.restaurant_id,
            order_type: self.order_type,
            total_cents: self.total_cents,
            discount_cents: self.discount_cents,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Loads an order with its items in insertion order.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
        SELECT id, restaurant_id, order_type, total_cents, discount_cents, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<OrderItem> = sqlx::query_as(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price_cents
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(row.into_order(items)))
}

/// Items joined with their product's category, for scope resolution.
pub(crate) async fn fetch_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(
        r#"
        SELECT oi.product_id, p.category_id, oi.unit_price_cents
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ?1
        ORDER BY oi.position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product_id, category_id, unit_price_cents)| OrderLine {
            product_id,
            category_id,
            unit_price_cents,
        })
        .collect())
}

/// Touches the order row. Issued first in a transaction, it takes the
/// SQLite write lock before anything is read. False when the order is absent.
pub(crate) async fn claim(
    conn: &mut SqliteConnection,
    order_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE orders SET updated_at = ?2 WHERE id = ?1")
        .bind(order_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// `total -= amount`, `discount = amount`.
pub(crate) async fn apply_amount(
    conn: &mut SqliteConnection,
    order_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            total_cents = total_cents - ?2,
            discount_cents = ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(order_id)
    .bind(amount.cents())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", order_id));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts the order and its items. Callers validate the input first.
    pub async fn create(&self, input: &NewOrder) -> DbResult<Order> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let total = input.total();

        debug!(id = %id, items = input.items.len(), total = %total, "Creating order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, restaurant_id, order_type, total_cents, discount_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(&input.restaurant_id)
        .bind(input.order_type)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if !input.items.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, position) ",
            );
            qb.push_values(input.items.iter().enumerate(), |mut row, (position, item)| {
                row.push_bind(Uuid::new_v4().to_string())
                    .push_bind(&id)
                    .push_bind(&item.product_id)
                    .push_bind(item.quantity)
                    .push_bind(item.unit_price_cents)
                    .push_bind(position as i64);
            });
            qb.build().execute(&mut *tx).await?;
        }

        let order = fetch(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &id))?;

        tx.commit().await?;

        info!(id = %order.id, total = %total, "Order created");
        Ok(order)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

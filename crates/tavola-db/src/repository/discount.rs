//! # Discount Repository
//!
//! CRUD over `discounts` and the three scope-association tables.
//!
//! ## Storage Layout
//! ```text
//! discounts ──┬── discount_restaurants (discount_id, restaurant_id)
//!             ├── discount_categories  (discount_id, category_id)
//!             └── discount_products    (discount_id, product_id)
//!
//! order_types / days_of_week are JSON arrays of enum names in TEXT columns.
//! ```
//!
//! Scope lists are replaced wholesale (delete-all then insert-all) in the
//! same transaction as the row write.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tavola_core::{
    DayOfWeek, Discount, DiscountScope, DiscountType, OrderType, ScopeKind, TargetType,
};

const SELECT_DISCOUNT: &str = r#"
    SELECT
        id, title, description, discount_type, value, target_type,
        min_order_cents, start_date, end_date, order_types, days_of_week,
        code, max_uses, current_uses, is_active, created_at, updated_at
    FROM discounts
"#;

/// Raw `discounts` row; scope lists are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    title: String,
    description: Option<String>,
    discount_type: DiscountType,
    value: i64,
    target_type: TargetType,
    min_order_cents: Option<i64>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    order_types: String,
    days_of_week: String,
    code: Option<String>,
    max_uses: Option<i64>,
    current_uses: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscountRow {
    fn into_discount(self, scope: DiscountScope) -> DbResult<Discount> {
        let order_types: Vec<OrderType> = serde_json::from_str(&self.order_types)
            .map_err(|e| DbError::corrupt("discounts.order_types", e))?;
        let days_of_week: Vec<DayOfWeek> = serde_json::from_str(&self.days_of_week)
            .map_err(|e| DbError::corrupt("discounts.days_of_week", e))?;

        Ok(Discount {
            id: self.id,
            title: self.title,
            description: self.description,
            discount_type: self.discount_type,
            value: self.value,
            target_type: self.target_type,
            min_order_cents: self.min_order_cents,
            start_date: self.start_date,
            end_date: self.end_date,
            order_types,
            days_of_week,
            code: self.code,
            max_uses: self.max_uses,
            current_uses: self.current_uses,
            is_active: self.is_active,
            scope,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// `(table, id column)` for a scope kind.
fn scope_table(kind: ScopeKind) -> (&'static str, &'static str) {
    match kind {
        ScopeKind::Restaurant => ("discount_restaurants", "restaurant_id"),
        ScopeKind::Category => ("discount_categories", "category_id"),
        ScopeKind::Product => ("discount_products", "product_id"),
    }
}

fn json_column<T: serde::Serialize>(column: &str, value: &T) -> DbResult<String> {
    serde_json::to_string(value).map_err(|e| DbError::corrupt(column, e))
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

async fn load_scope(conn: &mut SqliteConnection, discount_id: &str) -> DbResult<DiscountScope> {
    let mut scope = DiscountScope::default();
    for kind in ScopeKind::ALL {
        let (table, column) = scope_table(kind);
        let sql = format!(
            "SELECT {column} FROM {table} WHERE discount_id = ?1 ORDER BY {column}"
        );
        let ids: Vec<String> = sqlx::query_scalar(&sql)
            .bind(discount_id)
            .fetch_all(&mut *conn)
            .await?;
        scope.set(kind, ids);
    }
    Ok(scope)
}

async fn hydrate(conn: &mut SqliteConnection, row: DiscountRow) -> DbResult<Discount> {
    let scope = load_scope(conn, &row.id).await?;
    row.into_discount(scope)
}

/// Loads one discount with its scope lists.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Discount>> {
    let sql = format!("{SELECT_DISCOUNT} WHERE id = ?1");
    let row: Option<DiscountRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}

async fn replace_scope(
    conn: &mut SqliteConnection,
    discount_id: &str,
    kind: ScopeKind,
    ids: &[String],
) -> DbResult<()> {
    let (table, column) = scope_table(kind);

    sqlx::query(&format!("DELETE FROM {table} WHERE discount_id = ?1"))
        .bind(discount_id)
        .execute(&mut *conn)
        .await?;

    if ids.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("INSERT INTO {table} (discount_id, {column}) "));
    qb.push_values(ids, |mut row, id| {
        row.push_bind(discount_id).push_bind(id.as_str());
    });
    qb.build().execute(&mut *conn).await?;

    Ok(())
}

/// Adds one use if the cap allows it.
///
/// Returns `false` when the discount is already at `max_uses`; the check and
/// the increment are a single statement, so concurrent applications cannot
/// both take the last use.
pub(crate) async fn increment_usage(
    conn: &mut SqliteConnection,
    discount_id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE discounts SET
            current_uses = current_uses + 1,
            updated_at = ?2
        WHERE id = ?1
          AND (max_uses IS NULL OR current_uses < max_uses)
        "#,
    )
    .bind(discount_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Rewrites a unique violation on `discounts.code` with the offending code.
fn code_conflict(err: DbError, code: Option<&str>) -> DbError {
    match code {
        Some(code) if err.is_unique_violation_on("discounts.code") => {
            DbError::duplicate("discounts.code", code)
        }
        _ => err,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Inserts a validated discount together with all three scope lists.
    ///
    /// A code already held by another discount yields
    /// `UniqueViolation { field: "discounts.code", value: <code> }`.
    pub async fn insert(&self, discount: &Discount) -> DbResult<Discount> {
        debug!(id = %discount.id, title = %discount.title, "Inserting discount");

        let order_types = json_column("discounts.order_types", &discount.order_types)?;
        let days_of_week = json_column("discounts.days_of_week", &discount.days_of_week)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, title, description, discount_type, value, target_type,
                min_order_cents, start_date, end_date, order_types, days_of_week,
                code, max_uses, current_uses, is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.title)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.target_type)
        .bind(discount.min_order_cents)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(&order_types)
        .bind(&days_of_week)
        .bind(&discount.code)
        .bind(discount.max_uses)
        .bind(discount.current_uses)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| code_conflict(e.into(), discount.code.as_deref()))?;

        for kind in ScopeKind::ALL {
            replace_scope(&mut tx, &discount.id, kind, discount.scope.ids(kind)).await?;
        }

        let stored = fetch(&mut tx, &discount.id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", &discount.id))?;

        tx.commit().await?;

        info!(id = %stored.id, target = ?stored.target_type, "Discount created");
        Ok(stored)
    }

    /// Gets a discount by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a discount by its (unique) code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Discount>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("{SELECT_DISCOUNT} WHERE code = ?1");
        let row: Option<DiscountRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    /// All discounts, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Discount>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("{SELECT_DISCOUNT} ORDER BY created_at DESC, id");
        let rows: Vec<DiscountRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

        let mut discounts = Vec::with_capacity(rows.len());
        for row in rows {
            discounts.push(hydrate(&mut conn, row).await?);
        }
        Ok(discounts)
    }

    /// Writes every field except `current_uses` and replaces the listed
    /// scope kinds, all in one transaction.
    ///
    /// `current_uses` is owned by [`increment_usage`]; leaving it out keeps a
    /// concurrent redemption from being overwritten by an admin edit.
    pub async fn update(&self, discount: &Discount, replaced: &[ScopeKind]) -> DbResult<Discount> {
        debug!(id = %discount.id, replaced = replaced.len(), "Updating discount");

        let order_types = json_column("discounts.order_types", &discount.order_types)?;
        let days_of_week = json_column("discounts.days_of_week", &discount.days_of_week)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE discounts SET
                title = ?2,
                description = ?3,
                discount_type = ?4,
                value = ?5,
                target_type = ?6,
                min_order_cents = ?7,
                start_date = ?8,
                end_date = ?9,
                order_types = ?10,
                days_of_week = ?11,
                code = ?12,
                max_uses = ?13,
                is_active = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&discount.id)
        .bind(&discount.title)
        .bind(&discount.description)
        .bind(discount.discount_type)
        .bind(discount.value)
        .bind(discount.target_type)
        .bind(discount.min_order_cents)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(&order_types)
        .bind(&days_of_week)
        .bind(&discount.code)
        .bind(discount.max_uses)
        .bind(discount.is_active)
        .bind(discount.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| code_conflict(e.into(), discount.code.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", &discount.id));
        }

        for kind in replaced {
            replace_scope(&mut tx, &discount.id, *kind, discount.scope.ids(*kind)).await?;
        }

        let stored = fetch(&mut tx, &discount.id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", &discount.id))?;

        tx.commit().await?;

        info!(id = %stored.id, "Discount updated");
        Ok(stored)
    }

    /// Deletes a discount; scope rows, promo codes and ledger rows cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        info!(id = %id, "Discount deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_catalog, test_db};
    use chrono::Duration;
    use tavola_core::{DayOfWeekInput, NewDiscount};

    fn build(input: NewDiscount) -> Discount {
        input
            .into_discount(uuid::Uuid::new_v4().to_string(), Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let mut input = NewDiscount::new("Drinks 10%", DiscountType::Percentage, 10);
        input.target_type = TargetType::Category;
        input.category_ids = vec!["cat-drinks".to_string()];
        input.order_types = vec![OrderType::DineIn, OrderType::Takeaway];
        input.days_of_week = vec![DayOfWeekInput::Index(5), DayOfWeekInput::Index(6)];
        input.end_date = Some(Utc::now() + Duration::days(7));

        let created = db.discounts().insert(&build(input)).await.unwrap();
        let loaded = db.discounts().get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.title, "Drinks 10%");
        assert_eq!(loaded.scope.category_ids, vec!["cat-drinks".to_string()]);
        assert_eq!(loaded.order_types, vec![OrderType::DineIn, OrderType::Takeaway]);
        assert_eq!(
            loaded.days_of_week,
            vec![DayOfWeek::Friday, DayOfWeek::Saturday]
        );
        assert!(loaded.end_date.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_reported_with_value() {
        let db = test_db().await;

        let mut first = NewDiscount::new("First", DiscountType::Fixed, 100);
        first.code = Some("SUMMER".to_string());
        db.discounts().insert(&build(first)).await.unwrap();

        let mut second = NewDiscount::new("Second", DiscountType::Fixed, 100);
        second.code = Some("SUMMER".to_string());
        let err = db.discounts().insert(&build(second)).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "discounts.code");
                assert_eq!(value, "SUMMER");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_by_code() {
        let db = test_db().await;

        let mut input = NewDiscount::new("Coded", DiscountType::Fixed, 100);
        input.code = Some("VIP-1".to_string());
        db.discounts().insert(&build(input)).await.unwrap();

        assert!(db.discounts().get_by_code("VIP-1").await.unwrap().is_some());
        assert!(db.discounts().get_by_code("VIP-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_only_listed_scopes() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let mut input = NewDiscount::new("Scoped", DiscountType::Percentage, 5);
        input.target_type = TargetType::Product;
        input.product_ids = vec!["prod-tea".to_string()];
        input.category_ids = vec!["cat-mains".to_string()];
        let mut discount = db.discounts().insert(&build(input)).await.unwrap();

        discount.scope.set(
            ScopeKind::Product,
            vec!["prod-coffee".to_string(), "prod-soup".to_string()],
        );
        discount.title = "Renamed".to_string();
        let updated = db
            .discounts()
            .update(&discount, &[ScopeKind::Product])
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(
            updated.scope.product_ids,
            vec!["prod-coffee".to_string(), "prod-soup".to_string()]
        );
        assert_eq!(updated.scope.category_ids, vec!["cat-mains".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_scope_reference_rolls_back() {
        let db = test_db().await;

        let mut input = NewDiscount::new("Ghost", DiscountType::Fixed, 100);
        input.target_type = TargetType::Product;
        input.product_ids = vec!["no-such-product".to_string()];
        let discount = build(input);

        let err = db.discounts().insert(&discount).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.discounts().get_by_id(&discount.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_usage_respects_cap() {
        let db = test_db().await;

        let mut input = NewDiscount::new("Once", DiscountType::Fixed, 100);
        input.max_uses = Some(1);
        let discount = db.discounts().insert(&build(input)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(increment_usage(&mut conn, &discount.id, Utc::now()).await.unwrap());
        assert!(!increment_usage(&mut conn, &discount.id, Utc::now()).await.unwrap());
        drop(conn);

        let loaded = db.discounts().get_by_id(&discount.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_uses, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let discount = db
            .discounts()
            .insert(&build(NewDiscount::new("Gone", DiscountType::Fixed, 100)))
            .await
            .unwrap();

        db.discounts().delete(&discount.id).await.unwrap();
        assert!(matches!(
            db.discounts().delete(&discount.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = test_db().await;
        let now = Utc::now();

        let mut older = build(NewDiscount::new("Older", DiscountType::Fixed, 100));
        older.created_at = now - Duration::hours(1);
        let newer = build(NewDiscount::new("Newer", DiscountType::Fixed, 100));

        db.discounts().insert(&older).await.unwrap();
        db.discounts().insert(&newer).await.unwrap();

        let titles: Vec<_> = db
            .discounts()
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["Newer".to_string(), "Older".to_string()]);
        assert_eq!(db.discounts().count().await.unwrap(), 2);
    }
}

//! # Discount Finder
//!
//! Collects the discounts that could apply to an order.
//!
//! ## Candidate Sets
//! ```text
//! (a) PRODUCT  scope ∩ product ids            ┐
//!     CATEGORY scope ∋ category of a product  ┘  needs product ids
//! (b) CATEGORY scope ∩ category ids              needs category ids
//! (c) RESTAURANT scope ∋ restaurant id           needs a restaurant id
//! (d) ALL                                        always
//!
//! union a → b → c → d, first occurrence wins
//!   → is_active → time window → order type
//! ```
//!
//! The union order is the tie-break the best-discount selector falls back on.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{discount, push_id_list};
use crate::error::DbResult;
use tavola_core::{Discount, OrderContext};

/// Read-only query side of the discount tables.
#[derive(Debug, Clone)]
pub struct DiscountFinder {
    pool: SqlitePool,
}

impl DiscountFinder {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountFinder { pool }
    }

    /// Active, in-window discounts accepting `ctx.order_type` that match the
    /// context through any candidate set. Never contains duplicates.
    pub async fn find_for_order(
        &self,
        ctx: &OrderContext,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Discount>> {
        let mut conn = self.pool.acquire().await?;

        let mut ids = Vec::new();
        if !ctx.product_ids.is_empty() {
            ids.extend(by_products(&mut conn, &ctx.product_ids).await?);
        }
        if !ctx.category_ids.is_empty() {
            ids.extend(by_categories(&mut conn, &ctx.category_ids).await?);
        }
        if let Some(restaurant_id) = &ctx.restaurant_id {
            ids.extend(by_restaurant(&mut conn, restaurant_id).await?);
        }
        ids.extend(order_wide(&mut conn).await?);

        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));

        let mut found = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(candidate) = discount::fetch(&mut conn, id).await? else {
                continue;
            };
            if candidate.is_active
                && candidate.is_time_active(now)
                && candidate.accepts_order_type(ctx.order_type)
            {
                found.push(candidate);
            }
        }

        debug!(
            order_type = ?ctx.order_type,
            products = ctx.product_ids.len(),
            categories = ctx.category_ids.len(),
            candidates = ids.len(),
            matched = found.len(),
            "Discounts found for order"
        );

        Ok(found)
    }
}

/// Set (a): product-scoped discounts naming one of the products, plus
/// category-scoped discounts covering a product's category.
async fn by_products(conn: &mut SqliteConnection, product_ids: &[String]) -> DbResult<Vec<String>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT d.id FROM discounts d
        WHERE (d.target_type = 'PRODUCT' AND EXISTS (
                SELECT 1 FROM discount_products dp
                WHERE dp.discount_id = d.id AND dp.product_id IN "#,
    );
    push_id_list(&mut qb, product_ids);
    qb.push(
        r#"
            ))
           OR (d.target_type = 'CATEGORY' AND EXISTS (
                SELECT 1 FROM discount_categories dc
                JOIN products p ON p.category_id = dc.category_id
                WHERE dc.discount_id = d.id AND p.id IN "#,
    );
    push_id_list(&mut qb, product_ids);
    qb.push(
        r#"
            ))
        ORDER BY d.created_at, d.id
        "#,
    );

    let ids = qb.build_query_scalar::<String>().fetch_all(&mut *conn).await?;
    Ok(ids)
}

/// Set (b): category-scoped discounts naming one of the categories.
async fn by_categories(
    conn: &mut SqliteConnection,
    category_ids: &[String],
) -> DbResult<Vec<String>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT d.id FROM discounts d
        WHERE d.target_type = 'CATEGORY' AND EXISTS (
            SELECT 1 FROM discount_categories dc
            WHERE dc.discount_id = d.id AND dc.category_id IN "#,
    );
    push_id_list(&mut qb, category_ids);
    qb.push(
        r#"
        )
        ORDER BY d.created_at, d.id
        "#,
    );

    let ids = qb.build_query_scalar::<String>().fetch_all(&mut *conn).await?;
    Ok(ids)
}

/// Set (c).
async fn by_restaurant(conn: &mut SqliteConnection, restaurant_id: &str) -> DbResult<Vec<String>> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT d.id FROM discounts d
        WHERE d.target_type = 'RESTAURANT' AND EXISTS (
            SELECT 1 FROM discount_restaurants dr
            WHERE dr.discount_id = d.id AND dr.restaurant_id = ?1
        )
        ORDER BY d.created_at, d.id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

/// Set (d).
async fn order_wide(conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
    let ids = sqlx::query_scalar(
        "SELECT id FROM discounts WHERE target_type = 'ALL' ORDER BY created_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_catalog, test_db};
    use crate::Database;
    use chrono::Duration;
    use tavola_core::{DiscountType, NewDiscount, OrderType, TargetType};

    async fn create(db: &Database, input: NewDiscount) -> Discount {
        let discount = input
            .into_discount(uuid::Uuid::new_v4().to_string(), Utc::now())
            .unwrap();
        db.discounts().insert(&discount).await.unwrap()
    }

    fn scoped(title: &str, target: TargetType, ids: &[&str]) -> NewDiscount {
        let mut input = NewDiscount::new(title, DiscountType::Percentage, 10);
        input.target_type = target;
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        match target {
            TargetType::Product => input.product_ids = ids,
            TargetType::Category => input.category_ids = ids,
            TargetType::Restaurant => input.restaurant_ids = ids,
            TargetType::All => {}
        }
        input
    }

    fn titles(found: &[Discount]) -> Vec<&str> {
        found.iter().map(|d| d.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_context_returns_only_order_wide() {
        let db = test_db().await;
        seed_catalog(&db).await;
        create(&db, NewDiscount::new("Everything", DiscountType::Fixed, 100)).await;
        create(&db, scoped("Tea", TargetType::Product, &["prod-tea"])).await;

        let ctx = OrderContext::new(OrderType::DineIn);
        let found = db.finder().find_for_order(&ctx, Utc::now()).await.unwrap();
        assert_eq!(titles(&found), vec!["Everything"]);
    }

    #[tokio::test]
    async fn test_union_order_and_no_duplicates() {
        let db = test_db().await;
        seed_catalog(&db).await;
        create(&db, NewDiscount::new("Everything", DiscountType::Fixed, 100)).await;
        create(&db, scoped("Centro", TargetType::Restaurant, &["rest-centro"])).await;
        create(&db, scoped("Drinks", TargetType::Category, &["cat-drinks"])).await;
        create(&db, scoped("Tea", TargetType::Product, &["prod-tea", "prod-coffee"])).await;

        // "Drinks" matches through both (a) and (b); "Tea" through two products
        let ctx = OrderContext::new(OrderType::DineIn)
            .with_products(["prod-tea", "prod-coffee"])
            .with_categories(["cat-drinks"])
            .at_restaurant("rest-centro");
        let found = db.finder().find_for_order(&ctx, Utc::now()).await.unwrap();

        assert_eq!(titles(&found), vec!["Drinks", "Tea", "Centro", "Everything"]);
    }

    #[tokio::test]
    async fn test_category_discount_matches_through_products() {
        let db = test_db().await;
        seed_catalog(&db).await;
        create(&db, scoped("Mains", TargetType::Category, &["cat-mains"])).await;

        let ctx = OrderContext::new(OrderType::Takeaway).with_products(["prod-soup"]);
        let found = db.finder().find_for_order(&ctx, Utc::now()).await.unwrap();
        assert_eq!(titles(&found), vec!["Mains"]);
    }

    #[tokio::test]
    async fn test_empty_category_matches_only_by_category_id() {
        let db = test_db().await;
        seed_catalog(&db).await;
        create(&db, scoped("Desserts", TargetType::Category, &["cat-desserts"])).await;

        let by_product = OrderContext::new(OrderType::DineIn).with_products(["prod-tea"]);
        assert!(db
            .finder()
            .find_for_order(&by_product, Utc::now())
            .await
            .unwrap()
            .is_empty());

        let by_category = OrderContext::new(OrderType::DineIn).with_categories(["cat-desserts"]);
        let found = db
            .finder()
            .find_for_order(&by_category, Utc::now())
            .await
            .unwrap();
        assert_eq!(titles(&found), vec!["Desserts"]);
    }

    #[tokio::test]
    async fn test_filters_inactive_window_and_order_type() {
        let db = test_db().await;
        let now = Utc::now();

        let mut inactive = NewDiscount::new("Inactive", DiscountType::Fixed, 100);
        inactive.is_active = false;
        create(&db, inactive).await;

        let mut future = NewDiscount::new("Future", DiscountType::Fixed, 100);
        future.start_date = Some(now + Duration::days(1));
        create(&db, future).await;

        let mut expired = NewDiscount::new("Expired", DiscountType::Fixed, 100);
        expired.end_date = Some(now - Duration::days(1));
        create(&db, expired).await;

        let mut delivery_only = NewDiscount::new("Delivery", DiscountType::Fixed, 100);
        delivery_only.order_types = vec![OrderType::Delivery];
        create(&db, delivery_only).await;

        create(&db, NewDiscount::new("Open", DiscountType::Fixed, 100)).await;

        let dine_in = OrderContext::new(OrderType::DineIn);
        let found = db.finder().find_for_order(&dine_in, now).await.unwrap();
        assert_eq!(titles(&found), vec!["Open"]);

        let delivery = OrderContext::new(OrderType::Delivery);
        let found = db.finder().find_for_order(&delivery, now).await.unwrap();
        assert_eq!(titles(&found), vec!["Delivery", "Open"]);
    }

    #[tokio::test]
    async fn test_restaurant_set_needs_restaurant_id() {
        let db = test_db().await;
        seed_catalog(&db).await;
        create(&db, scoped("Porto", TargetType::Restaurant, &["rest-porto"])).await;

        let anywhere = OrderContext::new(OrderType::DineIn);
        assert!(db
            .finder()
            .find_for_order(&anywhere, Utc::now())
            .await
            .unwrap()
            .is_empty());

        let elsewhere = OrderContext::new(OrderType::DineIn).at_restaurant("rest-centro");
        assert!(db
            .finder()
            .find_for_order(&elsewhere, Utc::now())
            .await
            .unwrap()
            .is_empty());

        let porto = OrderContext::new(OrderType::DineIn).at_restaurant("rest-porto");
        let found = db.finder().find_for_order(&porto, Utc::now()).await.unwrap();
        assert_eq!(titles(&found), vec!["Porto"]);
    }
}

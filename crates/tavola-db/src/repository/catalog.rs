//! # Catalog Repository
//!
//! Restaurants, categories and products. Discounts only reference these by
//! id; the seed binary and tests are the main writers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tavola_core::{Category, Product, Restaurant};

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    pub async fn insert_restaurant(&self, restaurant: &Restaurant) -> DbResult<()> {
        debug!(id = %restaurant.id, "Inserting restaurant");
        sqlx::query("INSERT INTO restaurants (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&restaurant.id)
            .bind(&restaurant.name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Inserting category");
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, category = ?product.category_id, "Inserting product");
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category_id, price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(product.price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, category_id, price_cents FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn list_restaurants(&self) -> DbResult<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, Restaurant>("SELECT id, name FROM restaurants ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Products of one category, or every product when `category_id` is `None`.
    pub async fn list_products(&self, category_id: Option<&str>) -> DbResult<Vec<Product>> {
        let rows = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, category_id, price_cents
                    FROM products
                    WHERE category_id = ?1
                    ORDER BY name
                    "#,
                )
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>(
                    "SELECT id, name, category_id, price_cents FROM products ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

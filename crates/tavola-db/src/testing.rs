//! Shared fixtures for the crate's tests.

use std::time::Duration;

use tavola_core::{Category, Product, Restaurant};
use tempfile::TempDir;

use crate::pool::{Database, DbConfig};

pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A WAL store on disk with a real pool, for tests that race writers.
/// Keep the directory alive for as long as the database is used.
pub async fn file_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("tavola.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(30));
    let db = Database::new(config).await.unwrap();
    (dir, db)
}

/// Two restaurants, three categories (`cat-desserts` has no products) and
/// four products:
///
/// | product     | category   | price |
/// |-------------|------------|-------|
/// | prod-tea    | cat-drinks |  2.50 |
/// | prod-coffee | cat-drinks |  3.00 |
/// | prod-soup   | cat-mains  |  8.00 |
/// | prod-pasta  | cat-mains  | 12.00 |
pub async fn seed_catalog(db: &Database) {
    let catalog = db.catalog();

    for (id, name) in [("rest-centro", "Centro"), ("rest-porto", "Porto")] {
        catalog
            .insert_restaurant(&Restaurant {
                id: id.to_string(),
                name: name.to_string(),
            })
            .await
            .unwrap();
    }

    for (id, name) in [
        ("cat-drinks", "Drinks"),
        ("cat-mains", "Mains"),
        ("cat-desserts", "Desserts"),
    ] {
        catalog
            .insert_category(&Category {
                id: id.to_string(),
                name: name.to_string(),
            })
            .await
            .unwrap();
    }

    for (id, name, category, price) in [
        ("prod-tea", "Tea", "cat-drinks", 250),
        ("prod-coffee", "Coffee", "cat-drinks", 300),
        ("prod-soup", "Soup", "cat-mains", 800),
        ("prod-pasta", "Pasta", "cat-mains", 1200),
    ] {
        catalog
            .insert_product(&Product {
                id: id.to_string(),
                name: name.to_string(),
                category_id: Some(category.to_string()),
                price_cents: price,
            })
            .await
            .unwrap();
    }
}

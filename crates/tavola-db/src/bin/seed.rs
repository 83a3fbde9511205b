//! # Seed Data Generator
//!
//! Populates a database with a small restaurant catalog, a few orders and a
//! spread of sample discounts for local development.
//!
//! ## Usage
//! ```bash
//! cargo run -p tavola-db --bin seed
//!
//! # Specify database path
//! cargo run -p tavola-db --bin seed -- --db ./data/tavola.db
//! ```
//!
//! ## Generated Data
//! - 2 restaurants
//! - 4 categories, ~5 products each
//! - one order per order type
//! - discounts covering every target type, a coded discount and a capped one

use std::env;

use chrono::{Duration, Utc};
use tavola_core::{
    Category, DayOfWeekInput, DiscountType, NewDiscount, NewOrder, NewOrderItem, OrderType,
    Product, Restaurant, TargetType,
};
use tavola_db::{Database, DbConfig};

const RESTAURANTS: &[(&str, &str)] = &[("rest-centro", "Tavola Centro"), ("rest-porto", "Tavola Porto")];

/// `(category id, name, [(product id, name, price cents)])`
const MENU: &[(&str, &str, &[(&str, &str, i64)])] = &[
    (
        "cat-drinks",
        "Drinks",
        &[
            ("prod-espresso", "Espresso", 180),
            ("prod-cappuccino", "Cappuccino", 320),
            ("prod-tea", "Tea", 250),
            ("prod-lemonade", "Lemonade", 400),
            ("prod-water", "Sparkling Water", 200),
        ],
    ),
    (
        "cat-starters",
        "Starters",
        &[
            ("prod-bruschetta", "Bruschetta", 650),
            ("prod-soup", "Minestrone", 800),
            ("prod-caprese", "Caprese", 900),
        ],
    ),
    (
        "cat-mains",
        "Mains",
        &[
            ("prod-carbonara", "Carbonara", 1350),
            ("prod-margherita", "Pizza Margherita", 1100),
            ("prod-risotto", "Mushroom Risotto", 1450),
            ("prod-lasagna", "Lasagna", 1300),
            ("prod-salmon", "Grilled Salmon", 1900),
        ],
    ),
    (
        "cat-desserts",
        "Desserts",
        &[
            ("prod-tiramisu", "Tiramisu", 700),
            ("prod-pannacotta", "Panna Cotta", 650),
            ("prod-gelato", "Gelato", 500),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tavola_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tavola Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tavola_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tavola Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    seed_catalog(&db).await?;
    seed_orders(&db).await?;
    seed_discounts(&db).await?;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_catalog(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = db.catalog();

    for (id, name) in RESTAURANTS {
        catalog
            .insert_restaurant(&Restaurant {
                id: id.to_string(),
                name: name.to_string(),
            })
            .await?;
    }

    let mut products = 0;
    for (category_id, category_name, items) in MENU {
        catalog
            .insert_category(&Category {
                id: category_id.to_string(),
                name: category_name.to_string(),
            })
            .await?;

        for (id, name, price_cents) in items.iter() {
            catalog
                .insert_product(&Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    category_id: Some(category_id.to_string()),
                    price_cents: *price_cents,
                })
                .await?;
            products += 1;
        }
    }

    println!(
        "✓ Catalog: {} restaurants, {} categories, {} products",
        RESTAURANTS.len(),
        MENU.len(),
        products
    );
    Ok(())
}

async fn seed_orders(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let service = db.discount_service();

    for (index, order_type) in OrderType::ALL.iter().enumerate() {
        let (_, _, mains) = MENU[2];
        let (_, _, drinks) = MENU[0];
        let main = mains[index % mains.len()];
        let drink = drinks[index % drinks.len()];

        let order = service
            .create_order(&NewOrder {
                restaurant_id: Some(RESTAURANTS[index % RESTAURANTS.len()].0.to_string()),
                order_type: *order_type,
                items: vec![
                    NewOrderItem {
                        product_id: main.0.to_string(),
                        quantity: 2,
                        unit_price_cents: main.2,
                    },
                    NewOrderItem {
                        product_id: drink.0.to_string(),
                        quantity: 1,
                        unit_price_cents: drink.2,
                    },
                ],
            })
            .await?;

        println!("  Order {} ({:?}): {}", order.id, order.order_type, order.total());
    }

    println!("✓ Orders: {}", OrderType::ALL.len());
    Ok(())
}

async fn seed_discounts(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let service = db.discount_service();
    let now = Utc::now();

    let mut samples = Vec::new();

    samples.push(NewDiscount::new("Welcome", DiscountType::Fixed, 300));

    let mut happy_hour = NewDiscount::new("Happy Hour Drinks", DiscountType::Percentage, 20);
    happy_hour.target_type = TargetType::Category;
    happy_hour.category_ids = vec!["cat-drinks".to_string()];
    happy_hour.days_of_week = vec![DayOfWeekInput::Name("fri".to_string()), DayOfWeekInput::Index(6)];
    samples.push(happy_hour);

    let mut tiramisu = NewDiscount::new("Tiramisu Tuesday", DiscountType::Percentage, 50);
    tiramisu.target_type = TargetType::Product;
    tiramisu.product_ids = vec!["prod-tiramisu".to_string()];
    tiramisu.days_of_week = vec![DayOfWeekInput::Name("Tuesday".to_string())];
    samples.push(tiramisu);

    let mut porto = NewDiscount::new("Porto Opening", DiscountType::Percentage, 15);
    porto.target_type = TargetType::Restaurant;
    porto.restaurant_ids = vec!["rest-porto".to_string()];
    porto.start_date = Some(now);
    porto.end_date = Some(now + Duration::days(30));
    samples.push(porto);

    let mut delivery = NewDiscount::new("Free Delivery", DiscountType::Fixed, 450);
    delivery.order_types = vec![OrderType::Delivery];
    delivery.min_order_cents = Some(2500);
    samples.push(delivery);

    let mut members = NewDiscount::new("Members Club", DiscountType::Percentage, 10);
    members.code = Some("MEMBERS".to_string());
    samples.push(members);

    let mut first_hundred = NewDiscount::new("First Hundred", DiscountType::Fixed, 500);
    first_hundred.max_uses = Some(100);
    samples.push(first_hundred);

    let count = samples.len();
    for input in samples {
        let discount = service.create_discount(input).await?;
        println!("  Discount {} ({:?})", discount.title, discount.target_type);

        if discount.requires_promo_code() {
            let promo = service.generate_promo_code(&discount.id, "customer-demo").await?;
            println!("    Promo code for customer-demo: {}", promo.code);
        }
    }

    println!("✓ Discounts: {}", count);
    Ok(())
}

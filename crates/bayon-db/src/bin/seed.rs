//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development: café bulk
//! goods, serialized phones with IMEIs, and today's exchange rate.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p bayon-db --bin seed
//!
//! # Specify database path
//! cargo run -p bayon-db --bin seed -- --db ./data/pos.db
//! ```

use std::env;

use chrono::Utc;

use bayon_core::KhrPerUsd;
use bayon_db::repository::product::new_product;
use bayon_db::repository::serial::new_serial_item;
use bayon_db::{Database, DbConfig};

/// Bulk catalog: (sku, name, price cents, cost cents, stock).
const BULK_PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("ESP-SGL", "Single Espresso", 1_50, 50, 200),
    ("ESP-DBL", "Double Espresso", 2_50, 80, 200),
    ("LAT-REG", "Café Latte", 3_00, 95, 150),
    ("ICE-KOP", "Iced Coffee", 2_75, 90, 150),
    ("CRS-BTR", "Butter Croissant", 1_80, 60, 40),
    ("NOM-KRK", "Num Krok", 2_00, 70, 30),
    ("WTR-500", "Water 500ml", 50, 20, 300),
    ("CBL-USBC", "USB-C Cable 1m", 4_50, 1_50, 60),
    ("CHG-20W", "20W Wall Charger", 12_00, 6_00, 25),
];

/// Serialized catalog: (sku, name, price cents, cost cents, imeis).
const PHONES: &[(&str, &str, i64, i64, &[&str])] = &[
    (
        "PHN-A54",
        "Galaxy A54 128GB",
        349_00,
        280_00,
        &["356938035643809", "356938035643810", "356938035643811"],
    ),
    (
        "PHN-R13C",
        "Redmi 13C 256GB",
        129_00,
        98_00,
        &["861536030196001", "861536030196002"],
    ),
    (
        "PHN-IP13",
        "iPhone 13 128GB",
        499_00,
        420_00,
        &["353912100731245"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bayon_dev.db");

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
                println!("Bayon POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bayon_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bayon POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    for (sku, name, price, cost, stock) in BULK_PRODUCTS {
        let product = new_product(sku, name, *price, Some(*cost), *stock, false);
        db.products().insert(&product).await?;
    }
    println!("  {} bulk products", BULK_PRODUCTS.len());

    let mut units = 0;
    for (sku, name, price, cost, imeis) in PHONES {
        let product = new_product(sku, name, *price, Some(*cost), 0, true);
        db.products().insert(&product).await?;

        for imei in imeis.iter() {
            let unit = new_serial_item(&product.id, Some(*imei), None, None);
            db.serial_items().insert(&unit).await?;
            units += 1;
        }
    }
    println!("  {} serialized products, {} units", PHONES.len(), units);

    let today = Utc::now().date_naive();
    db.rates()
        .upsert(today, KhrPerUsd::new(4100), "seed")
        .await?;
    println!("  Exchange rate for {}: 4100 KHR/USD", today);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

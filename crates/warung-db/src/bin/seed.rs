//! # Seed Data Generator
//!
//! Populates the database with a realistic warung setup for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p warung-db --bin seed
//!
//! # Specify database path
//! cargo run -p warung-db --bin seed -- --db ./data/warung.db
//! ```
//!
//! ## Generated Data
//! - Raw materials with stock and low-stock thresholds (coffee, tea,
//!   sugar, milk, rice, noodles, ...)
//! - Menu products with bills of materials wired to those materials
//! - An opening capital entry
//! - One example stock-in so the purchase history isn't empty

use std::collections::HashMap;
use std::env;

use warung_core::BomLine;
use warung_db::{Database, DbConfig};

/// Materials: (name, unit, initial stock, min_stock).
const MATERIALS: &[(&str, &str, i64, Option<i64>)] = &[
    ("Kopi Bubuk", "g", 2_000, Some(300)),
    ("Teh", "g", 1_000, Some(150)),
    ("Gula Pasir", "g", 5_000, Some(500)),
    ("Susu Kental Manis", "ml", 3_000, Some(400)),
    ("Es Batu", "pcs", 200, Some(30)),
    ("Beras", "g", 10_000, Some(1_500)),
    ("Mie Instan", "pcs", 60, Some(10)),
    ("Telur", "pcs", 90, Some(15)),
    ("Minyak Goreng", "ml", 4_000, Some(500)),
    ("Kecap Manis", "ml", 1_500, Some(200)),
];

/// Menu: (name, category, price, bom as (material name, qty per unit)).
const MENU: &[(&str, &str, i64, &[(&str, i64)])] = &[
    (
        "Kopi Hitam",
        "minuman",
        8_000,
        &[("Kopi Bubuk", 15), ("Gula Pasir", 10)],
    ),
    (
        "Kopi Susu",
        "minuman",
        12_000,
        &[("Kopi Bubuk", 15), ("Susu Kental Manis", 40), ("Gula Pasir", 5)],
    ),
    (
        "Es Teh Manis",
        "minuman",
        5_000,
        &[("Teh", 5), ("Gula Pasir", 15), ("Es Batu", 3)],
    ),
    (
        "Teh Tawar",
        "minuman",
        3_000,
        &[("Teh", 5)],
    ),
    (
        "Nasi Goreng",
        "makanan",
        18_000,
        &[
            ("Beras", 200),
            ("Telur", 1),
            ("Minyak Goreng", 30),
            ("Kecap Manis", 20),
        ],
    ),
    (
        "Mie Goreng Telur",
        "makanan",
        15_000,
        &[
            ("Mie Instan", 1),
            ("Telur", 1),
            ("Minyak Goreng", 20),
            ("Kecap Manis", 10),
        ],
    ),
    (
        "Telur Dadar",
        "makanan",
        8_000,
        &[("Telur", 2), ("Minyak Goreng", 25)],
    ),
];

/// Opening capital in rupiah.
const OPENING_CAPITAL: i64 = 2_000_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./warung_dev.db");

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
                println!("Warung POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./warung_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Warung POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.materials().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} materials", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Materials first: the menu BOMs reference them by id
    println!();
    println!("Creating materials...");

    let mut material_ids: HashMap<&str, String> = HashMap::new();
    for &(name, unit, stock, min_stock) in MATERIALS {
        let material = db.materials().insert(name, unit, stock, min_stock).await?;
        material_ids.insert(name, material.id);
        println!("  {} ({} {})", name, stock, unit);
    }

    println!();
    println!("Creating menu products...");

    for &(name, category, price, recipe) in MENU {
        let bom: Vec<BomLine> = recipe
            .iter()
            .map(|&(material_name, qty)| BomLine {
                material_id: material_ids[material_name].clone(),
                qty,
            })
            .collect();

        db.products().insert(name, Some(category), price, &bom).await?;
        println!("  {} - Rp{} ({} ingredients)", name, price, bom.len());
    }

    println!();
    println!("Recording opening capital...");
    db.reports()
        .add_capital("Modal awal", OPENING_CAPITAL)
        .await?;
    println!("  Modal awal: Rp{}", OPENING_CAPITAL);

    // One stock-in so the purchase history has an example row
    println!();
    println!("Recording an example stock-in...");
    let record = db
        .stock_engine()
        .record_purchase(&material_ids["Gula Pasir"], 1_000, 15, Some("Toko grosir"))
        .await?;
    println!(
        "  Gula Pasir +{} (stock {} → {})",
        record.qty, record.previous_stock, record.new_stock
    );

    println!();
    println!(
        "✓ Seed complete: {} materials, {} products",
        db.materials().count().await?,
        db.products().count().await?
    );

    Ok(())
}

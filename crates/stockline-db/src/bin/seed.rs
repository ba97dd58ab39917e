//! # Seed Data Generator
//!
//! Populates a development database with catalog items and, when a staff
//! account exists, a handful of demo sales run through the checkout engine.
//!
//! ## Usage
//! ```bash
//! # Seed ./data/stockline.db with the default catalog
//! cargo run -p stockline-db --bin seed
//!
//! # Specify database path and number of demo sales
//! cargo run -p stockline-db --bin seed -- --db ./data/dev.db --sales 20
//! ```
//!
//! ## Generated Items
//! Stationery and small electronics across categories:
//! - Paper (notebooks, pads, envelopes)
//! - Writing (pens, pencils, markers)
//! - Office (staplers, folders, tape)
//! - Tech (cables, chargers, mice)
//!
//! Each item has:
//! - Unique SKU: `{CATEGORY}-{NAME}-{INDEX}`
//! - Price: 20.00 - 1,500.00
//! - Stock: 0 - 60, with a few items seeded at or below their threshold

use std::env;

use anyhow::Context;
use stockline_core::{Basket, BasketEntry};
use stockline_db::{Customer, Database, DbConfig, NewItem};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Item categories for realistic development data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "PAP",
        &[
            "Notebook A5",
            "Notebook A4",
            "Sticky Notes",
            "Legal Pad",
            "Envelope Pack",
            "Printer Paper Ream",
        ],
    ),
    (
        "WRT",
        &[
            "Blue Ball Pen",
            "Black Gel Pen",
            "HB Pencil",
            "Highlighter Set",
            "Permanent Marker",
            "Whiteboard Marker",
        ],
    ),
    (
        "OFF",
        &[
            "Stapler",
            "Staples Box",
            "Paper Clips",
            "Ring Binder",
            "Plastic Folder",
            "Clear Tape",
        ],
    ),
    (
        "TEC",
        &[
            "USB-C Cable",
            "Wall Charger",
            "Wireless Mouse",
            "USB Flash Drive",
            "Calculator",
            "Earphones",
        ],
    ),
];

/// Base price (minor units) per category.
const BASE_PRICES: &[i64] = &[8000, 2000, 6000, 45000];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./data/stockline.db".to_string();
    let mut sales: usize = 10;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid --sales value '{}'", args[i + 1]))?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/stockline.db)");
                println!("  -s, --sales <N>    Demo sales to record (default: 10)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;

    let existing = db.items().count().await?;
    if existing > 0 {
        warn!(existing = existing, "Catalog already has items; skipping seed");
        return Ok(());
    }

    // Catalog
    let mut item_ids = Vec::new();
    for (category_idx, (code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            let item = generate_item(code, name, category_idx, name_idx);
            match db.items().insert(&item).await {
                Ok(created) => item_ids.push(created.id),
                Err(e) => warn!(sku = %item.sku, error = %e, "Failed to insert item"),
            }
        }
    }
    info!(count = item_ids.len(), "Catalog seeded");
    if item_ids.is_empty() {
        return Ok(());
    }

    // Demo sales need a staff account to attribute them to
    let Some(user) = db.users().oldest().await? else {
        info!("No staff account yet; skipping demo sales (set ADMIN_EMAIL and start the API)");
        return Ok(());
    };

    let mut recorded = 0;
    for n in 0..sales {
        let entries = vec![
            BasketEntry {
                item_id: item_ids[(n * 7) % item_ids.len()],
                quantity: 1 + (n % 3) as i64,
            },
            BasketEntry {
                item_id: item_ids[(n * 11 + 3) % item_ids.len()],
                quantity: 1,
            },
        ];
        let basket = Basket::new(entries)?;

        match db.checkout().execute(user.id, &basket, Customer::default()).await {
            Ok(_) => recorded += 1,
            Err(e) => warn!(error = %e, "Demo sale skipped"),
        }
    }

    info!(recorded = recorded, "Seed complete");
    db.close().await;

    Ok(())
}

/// Generates a single catalog item with deterministic data.
fn generate_item(code: &str, name: &str, category_idx: usize, name_idx: usize) -> NewItem {
    let seed = category_idx * 10 + name_idx;

    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:02}", code, short, seed);

    let base = BASE_PRICES[category_idx % BASE_PRICES.len()];
    let price_cents = base + ((seed * 1_250) % 10_000) as i64;

    // Every fifth item starts at or below its threshold
    let min_stock_level = 5;
    let quantity = if seed % 5 == 0 {
        (seed % 4) as i64
    } else {
        20 + ((seed * 13) % 41) as i64
    };

    NewItem {
        sku,
        name: name.to_string(),
        description: None,
        price_cents,
        quantity,
        min_stock_level,
    }
}

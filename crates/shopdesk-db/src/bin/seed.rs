//! # Seed Data Generator
//!
//! Populates a development database with a store, staff, customers and
//! stocked inventory.
//!
//! ## Usage
//! ```bash
//! # Default: ./shopdesk_dev.db, 200 inventory items
//! cargo run -p shopdesk-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p shopdesk-db --bin seed -- --count 1000 --db ./data/shopdesk.db
//! ```
//!
//! ## Generated Data
//! - One store ("Shopdesk Main Street")
//! - Three staff members: admin, manager and cashier (all assigned to it)
//! - A handful of customers with phone and email
//! - Inventory items across grocery categories: `{CATEGORY}-{NAME}-{SEQ}`
//!   SKUs, selling price below MRP, stock 0 - 100
//!
//! Staff and item ids are printed so they can be used with `x-staff-id` and
//! in record-sale requests.

use chrono::Utc;
use shopdesk_core::{Customer, InventoryItem, Money, StaffMember, StaffRole, Store};
use shopdesk_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// Grocery categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "STP",
        &[
            "Basmati Rice",
            "Sona Masoori Rice",
            "Toor Dal",
            "Moong Dal",
            "Chana Dal",
            "Wheat Atta",
            "Besan",
            "Sugar",
            "Rock Salt",
            "Poha",
        ],
    ),
    (
        "OIL",
        &[
            "Sunflower Oil",
            "Mustard Oil",
            "Groundnut Oil",
            "Desi Ghee",
            "Coconut Oil",
        ],
    ),
    (
        "SPC",
        &[
            "Turmeric Powder",
            "Red Chilli Powder",
            "Coriander Powder",
            "Garam Masala",
            "Cumin Seeds",
            "Mustard Seeds",
        ],
    ),
    (
        "BEV",
        &["Assam Tea", "Filter Coffee", "Green Tea", "Mango Drink", "Lemon Soda"],
    ),
    (
        "SNK",
        &["Bhujia", "Salted Peanuts", "Cream Biscuits", "Rusk", "Banana Chips"],
    ),
];

/// Pack sizes with a price addon in paise
const SIZES: &[(&str, i64)] = &[("500g", 0), ("1kg", 4500), ("2kg", 9500), ("5kg", 24000)];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Asha Verma", "+919876543210", "asha.verma@example.in"),
    ("Ravi Kumar", "+919812345678", "ravi.kumar@example.in"),
    ("Meera Nair", "+919900112233", "meera.nair@example.in"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./shopdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopdesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of inventory items (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./shopdesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopdesk Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.stores().count().await? > 0 {
        println!("⚠ Database already has stores");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Store
    let store = Store {
        id: Uuid::new_v4().to_string(),
        name: "Shopdesk Main Street".to_string(),
        address: Some("12 Main Street, Pune".to_string()),
        phone: Some("+912012345678".to_string()),
        gstin: Some("27ABCDE1234F1Z5".to_string()),
        created_at: now,
    };
    db.stores().insert(&store).await?;
    println!("✓ Store {} ({})", store.name, store.id);

    // Staff
    for (name, role) in [
        ("Admin", StaffRole::Admin),
        ("Store Manager", StaffRole::Manager),
        ("Counter Cashier", StaffRole::Cashier),
    ] {
        let member = StaffMember {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            store_id: Some(store.id.clone()),
            created_at: now,
        };
        db.staff().insert(&member).await?;
        println!("✓ Staff {:?}: {}", role, member.id);
    }

    // Customers
    for (name, phone, email) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: Some(phone.to_string()),
            email: Some(email.to_string()),
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&customer).await?;
        println!("✓ Customer {}: {}", customer.name, customer.id);
    }

    // Inventory
    println!();
    println!("Generating inventory...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category_code, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let item = generate_item(
                    &store.id,
                    category_code,
                    name,
                    size,
                    *addon,
                    category_idx * 1000 + name_idx * 10 + size_idx,
                );

                if let Err(e) = db.inventory().insert(&item).await {
                    eprintln!("Failed to insert {}: {}", item.name, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} items in {:?}", generated, elapsed);
    println!(
        "  Total stock: {} units",
        db.inventory().total_stock().await?
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single inventory item.
fn generate_item(
    store_id: &str,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> InventoryItem {
    let now = Utc::now();

    let code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", category, code, seed);

    // Rs 29 - Rs 249 plus pack size
    let sell = 2900 + ((seed * 37) % 22000) as i64 + price_addon;
    // MRP 5% - 20% above selling price
    let markup_pct = 5 + (seed % 16) as i64;
    let mrp = sell + sell * markup_pct / 100;

    InventoryItem {
        id: Uuid::new_v4().to_string(),
        store_id: store_id.to_string(),
        name: format!("{} {}", name, size),
        brand: Some("Shopdesk Select".to_string()),
        sku: Some(sku),
        sell_price: Money::from_minor(sell),
        mrp_price: Money::from_minor(mrp),
        stock_qty: (seed % 101) as i64,
        created_at: now,
        updated_at: now,
    }
}

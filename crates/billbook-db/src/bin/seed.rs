//! # Seed Data Generator
//!
//! Populates a database with demo products and, optionally, demo sales.
//!
//! ## Usage
//! ```bash
//! # 40 products, no sales
//! cargo run -p billbook-db --bin seed
//!
//! # 200 products and 25 completed bills
//! cargo run -p billbook-db --bin seed -- --count 200 --sales 25
//!
//! # Explicit database / config file
//! cargo run -p billbook-db --bin seed -- --db ./data/shop.db --config ./billbook.toml
//! ```
//!
//! Products go through `ProductStore::create` and sales through the
//! `TransactionCommitter`, so seeded data obeys the same rules as data
//! entered by hand.

use std::env;
use std::path::PathBuf;

use billbook_core::{
    summarize_inventory, summarize_sales, Bill, Money, NewProduct, ProductStore, RangePreset,
    TransactionFilter, TransactionStore,
};
use billbook_db::{AppConfig, Database};
use chrono::Utc;
use tracing::{info, warn};

/// Catalog to draw demo products from: (category, titles).
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Writing",
        &[
            "Gel Pen",
            "Ball Pen",
            "Fountain Pen",
            "HB Pencil",
            "Mechanical Pencil",
            "Highlighter",
            "Permanent Marker",
            "Whiteboard Marker",
        ],
    ),
    (
        "Paper",
        &[
            "Ruled Notebook",
            "Graph Notebook",
            "A4 Ream",
            "Sticky Notes",
            "Index Cards",
            "Drawing Book",
        ],
    ),
    (
        "Desk",
        &[
            "Stapler",
            "Staple Pins",
            "Paper Clips",
            "Scissors",
            "Glue Stick",
            "Correction Tape",
            "Eraser",
            "Sharpener",
            "Ruler 30cm",
        ],
    ),
    (
        "Filing",
        &["Box File", "Clear Folder", "Ring Binder", "Envelope Pack"],
    ),
];

/// Pack sizes appended to titles once the catalog runs out.
const VARIANTS: &[&str] = &["", "Pack of 5", "Pack of 10", "Blue", "Black", "Red"];

struct Args {
    db_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    count: usize,
    sales: usize,
}

fn print_help() {
    println!("Billbook Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>       Database file (default: from config)");
    println!("      --config <PATH>   billbook.toml location (default: platform config dir)");
    println!("  -c, --count <N>       Number of products to create (default: 40)");
    println!("  -s, --sales <N>       Number of demo bills to complete (default: 0)");
    println!("  -h, --help            Show this help message");
}

/// Returns `None` when help was requested.
fn parse_args() -> Result<Option<Args>, String> {
    let mut args = Args {
        db_path: None,
        config_path: None,
        count: 40,
        sales: 0,
    };

    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = |name: &str| iter.next().ok_or(format!("{name} expects a value"));
        match flag.as_str() {
            "--db" | "-d" => args.db_path = Some(PathBuf::from(value("--db")?)),
            "--config" => args.config_path = Some(PathBuf::from(value("--config")?)),
            "--count" | "-c" => {
                args.count = value("--count")?
                    .parse()
                    .map_err(|_| "--count expects a number".to_string())?
            }
            "--sales" | "-s" => {
                args.sales = value("--sales")?
                    .parse()
                    .map_err(|_| "--sales expects a number".to_string())?
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown option '{other}'")),
        }
    }
    Ok(Some(args))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(message) => {
            eprintln!("error: {message}");
            print_help();
            std::process::exit(2);
        }
    };

    let mut config = AppConfig::load(args.config_path.as_deref())?;
    if let Some(path) = args.db_path {
        config.database.path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(config.logging.env_filter())
        .init();

    let symbol = config.store.currency_symbol.clone();

    println!("🌱 Billbook Seed Data Generator");
    println!("===============================");
    println!("Store:    {}", config.store.name);
    println!("Database: {}", config.database.path.display());
    println!("Products: {}", args.count);
    println!("Sales:    {}", args.sales);
    println!();

    let db = Database::new(config.database.clone()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------
    let committer = db.resume_committer().await?;
    let start = std::time::Instant::now();
    let mut created = Vec::with_capacity(args.count);

    for seed in 0..args.count {
        let input = demo_product(seed);
        match committer.products().create(input).await {
            Ok(product) => created.push(product),
            Err(e) => warn!(seed, error = %e, "Failed to create product"),
        }
    }

    println!("✓ Created {} products in {:?}", created.len(), start.elapsed());

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------
    let mut completed = 0;
    for sale in 0..args.sales {
        let mut bill = Bill::new();

        for line in 0..3 {
            if created.is_empty() {
                break;
            }
            let pick = (sale * 7 + line * 3) % created.len();
            let Some(product) = committer.products().get(created[pick].id).await? else {
                continue;
            };
            let quantity = 1 + ((sale + line) % 3) as i64;
            if product.quantity < quantity || bill.items().iter().any(|i| i.product_id == product.id) {
                continue;
            }
            bill.add_item(&product, product.selling_price, quantity)?;
        }

        if bill.is_empty() {
            continue;
        }
        let transaction = committer.commit(&mut bill).await?;
        info!(id = %transaction.id, total = %transaction.total, "Demo sale completed");
        completed += 1;
    }

    if args.sales > 0 {
        println!("✓ Completed {completed} demo bills");
    }

    // -------------------------------------------------------------------------
    // Summary
    // -------------------------------------------------------------------------
    let products = committer.products().list().await?;
    let inventory = summarize_inventory(&products);
    println!();
    println!("Inventory");
    println!("  Products:      {}", inventory.product_count);
    println!("  Out of stock:  {}", inventory.out_of_stock_count);
    println!("  Units:         {}", inventory.total_units);
    println!("  Stock value:   {}", inventory.stock_value.format_with(&symbol));

    let history = committer
        .transactions()
        .list(&TransactionFilter::all())
        .await?;
    let today = RangePreset::Today.range(Utc::now());
    let summary = summarize_sales(&history, today.as_ref());
    println!();
    println!("Sales ({})", RangePreset::Today);
    println!("  Transactions:  {}", summary.transaction_count);
    println!("  Total sales:   {}", summary.total_sales.format_with(&symbol));
    println!("  Total profit:  {}", summary.total_profit.format_with(&symbol));
    println!("  Daily average: {}", summary.daily_average.format_with(&symbol));

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Builds the `seed`-th demo product. Deterministic so reruns look alike.
fn demo_product(seed: usize) -> NewProduct {
    let flat: Vec<(&str, &str)> = CATALOG
        .iter()
        .flat_map(|(category, titles)| titles.iter().map(move |title| (*category, *title)))
        .collect();

    let (category, title) = flat[seed % flat.len()];
    let variant = VARIANTS[(seed / flat.len()) % VARIANTS.len()];
    let title = if variant.is_empty() {
        title.to_string()
    } else {
        format!("{title} ({variant})")
    };

    // ₹5.00 - ₹250.00, bought at 55-75% of the selling price
    let selling = 500 + ((seed * 1_237) % 24_500) as i64;
    let purchase = selling * (55 + (seed % 21) as i64) / 100;

    NewProduct {
        category: category.to_string(),
        title,
        purchase_price: Money::from_cents(purchase),
        selling_price: Money::from_cents(selling),
        quantity: (seed % 26) as i64,
    }
}

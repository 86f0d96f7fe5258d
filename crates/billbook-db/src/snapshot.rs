//! # Snapshots
//!
//! Versioned JSON export/import of the whole shop: every product and the
//! full sales history.
//!
//! ## Document Versions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (no "version" key)   legacy browser-storage layout                     │
//! │                       float prices, "In-Stock"/"Out-of-Stock",          │
//! │                       line totals under "total"                         │
//! │        │                                                                │
//! │        │  legacy::migrate (prices → cents, totals recomputed,           │
//! │        ▼                 status re-derived)                             │
//! │  "version": 2         current layout, Money as integer cents            │
//! │                                                                         │
//! │  anything else        StorageError::UnsupportedSchema                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A document that cannot be read fails loudly. Nothing is ever replaced by
//! an empty list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use billbook_core::{
    derive_status, BillItem, CoreResult, Product, StorageError, Transaction, TransactionFilter,
};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{product, transaction};

/// Version written by [`Snapshot::to_json`].
pub const SNAPSHOT_VERSION: u32 = 2;

const ENTITY: &str = "Snapshot";

/// Everything the shop knows, in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub products: Vec<Product>,
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    /// Creates a current-version snapshot.
    pub fn new(products: Vec<Product>, transactions: Vec<Transaction>) -> Self {
        Snapshot {
            version: SNAPSHOT_VERSION,
            products,
            transactions,
        }
    }

    /// Parses a snapshot, migrating the legacy layout when there is no
    /// `version` key.
    ///
    /// ## Errors
    /// - `Deserialization` for malformed JSON or values that break an
    ///   invariant (negative stock, unbalanced totals, ...)
    /// - `UnsupportedSchema` for any version other than the current one
    pub fn from_json(text: &str) -> Result<Self, StorageError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| StorageError::corrupt(ENTITY, e.to_string()))?;

        let snapshot = match value.get("version") {
            None => {
                info!("Migrating legacy snapshot");
                legacy::migrate(value)?
            }
            Some(version) => {
                let found = version
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| StorageError::corrupt(ENTITY, format!("invalid version {version}")))?;
                if found != SNAPSHOT_VERSION {
                    return Err(StorageError::UnsupportedSchema {
                        found,
                        supported: SNAPSHOT_VERSION,
                    });
                }
                serde_json::from_value(value)
                    .map_err(|e| StorageError::corrupt(ENTITY, e.to_string()))?
            }
        };

        snapshot.normalized()
    }

    /// Serializes as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Query(e.to_string()))
    }

    /// Re-derives statuses and rejects values no store would hold.
    fn normalized(mut self) -> Result<Self, StorageError> {
        for product in &mut self.products {
            if product.quantity < 0 {
                return Err(StorageError::corrupt(
                    ENTITY,
                    format!("product {} has negative quantity", product.id),
                ));
            }
            product.status = derive_status(product.quantity);
        }

        for transaction in &self.transactions {
            let lines_ok = transaction
                .items
                .iter()
                .all(|item| {
                    item.quantity > 0
                        && item.selling_price.checked_mul(item.quantity) == Some(item.line_total)
                });
            if !lines_ok || !transaction.is_balanced() {
                return Err(StorageError::corrupt(
                    ENTITY,
                    format!("transaction {} has inconsistent totals", transaction.id),
                ));
            }
        }

        Ok(self)
    }
}

// =============================================================================
// Legacy Layout
// =============================================================================

mod legacy {
    use serde::Deserialize;

    use super::*;
    use crate::repository::decode_timestamp;
    use billbook_core::{Money, TransactionStatus};

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Document {
        #[serde(default)]
        products: Vec<LegacyProduct>,
        #[serde(default)]
        transactions: Vec<LegacyTransaction>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LegacyProduct {
        id: i64,
        category: String,
        title: String,
        purchase_price: f64,
        selling_price: f64,
        quantity: i64,
        #[serde(default)]
        status: Option<String>,
        created_at: String,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LegacyItem {
        product_id: i64,
        product_title: String,
        purchase_price: f64,
        selling_price: f64,
        quantity: i64,
    }

    #[derive(Deserialize)]
    struct LegacyTransaction {
        id: String,
        items: Vec<LegacyItem>,
        date: String,
        status: String,
    }

    /// Converts a float amount to cents, rounding to the nearest cent.
    fn to_money(field: &str, amount: f64) -> Result<Money, StorageError> {
        let cents = (amount * 100.0).round();
        if !cents.is_finite() || cents < 0.0 || cents > i64::MAX as f64 {
            return Err(StorageError::corrupt(
                ENTITY,
                format!("{field} {amount} is not a valid amount"),
            ));
        }
        Ok(Money::from_cents(cents as i64))
    }

    pub(super) fn migrate(value: serde_json::Value) -> Result<Snapshot, StorageError> {
        let document: Document =
            serde_json::from_value(value).map_err(|e| StorageError::corrupt(ENTITY, e.to_string()))?;

        let mut products = Vec::with_capacity(document.products.len());
        for old in document.products {
            match old.status.as_deref() {
                None | Some("In-Stock" | "Out-of-Stock" | "in_stock" | "out_of_stock") => {}
                Some(other) => {
                    return Err(StorageError::corrupt(
                        ENTITY,
                        format!("product {} has unknown status '{other}'", old.id),
                    ))
                }
            }

            products.push(Product {
                id: old.id,
                category: old.category,
                title: old.title,
                purchase_price: to_money("purchasePrice", old.purchase_price)?,
                selling_price: to_money("sellingPrice", old.selling_price)?,
                quantity: old.quantity,
                status: derive_status(old.quantity),
                created_at: decode_timestamp("Product", &old.created_at)?,
            });
        }

        let mut transactions = Vec::with_capacity(document.transactions.len());
        for old in document.transactions {
            let status = match old.status.as_str() {
                "completed" => TransactionStatus::Completed,
                "cancelled" => TransactionStatus::Cancelled,
                other => {
                    return Err(StorageError::corrupt(
                        ENTITY,
                        format!("transaction {} has unknown status '{other}'", old.id),
                    ))
                }
            };

            let mut items = Vec::with_capacity(old.items.len());
            for item in old.items {
                let selling_price = to_money("sellingPrice", item.selling_price)?;
                let line_total = selling_price.checked_mul(item.quantity).ok_or_else(|| {
                    StorageError::corrupt(
                        ENTITY,
                        format!("transaction {} has a line total out of range", old.id),
                    )
                })?;
                items.push(BillItem {
                    product_id: item.product_id,
                    product_title: item.product_title,
                    purchase_price: to_money("purchasePrice", item.purchase_price)?,
                    selling_price,
                    quantity: item.quantity,
                    line_total,
                });
            }

            let total = Money::checked_sum(items.iter().map(|item| item.line_total)).ok_or_else(|| {
                StorageError::corrupt(
                    ENTITY,
                    format!("transaction {} has a total out of range", old.id),
                )
            })?;

            transactions.push(Transaction {
                total,
                date: decode_timestamp("Transaction", &old.date)?,
                id: old.id,
                items,
                status,
            });
        }

        debug!(
            products = products.len(),
            transactions = transactions.len(),
            "Legacy snapshot migrated"
        );
        Ok(Snapshot::new(products, transactions))
    }
}

// =============================================================================
// Database Import / Export
// =============================================================================

impl Database {
    /// Reads every product and transaction in one consistent view.
    pub async fn export_snapshot(&self) -> CoreResult<Snapshot> {
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        let products = product::fetch_all(&mut tx).await?;
        let transactions = transaction::fetch(&mut tx, &TransactionFilter::all()).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            products = products.len(),
            transactions = transactions.len(),
            "Exported snapshot"
        );
        Ok(Snapshot::new(products, transactions))
    }

    /// Loads a snapshot into an empty database, keeping every id.
    ///
    /// Runs in one SQL transaction: either the whole snapshot lands or
    /// nothing does.
    pub async fn import_snapshot(&self, snapshot: &Snapshot) -> CoreResult<()> {
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM products) + (SELECT COUNT(*) FROM transactions)",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;
        if existing > 0 {
            return Err(DbError::ConstraintViolation(
                "snapshots can only be imported into an empty database".to_string(),
            )
            .into());
        }

        for item in &snapshot.products {
            product::insert_with_id(&mut tx, item).await?;
        }
        for record in &snapshot.transactions {
            transaction::insert(&mut tx, record).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            products = snapshot.products.len(),
            transactions = snapshot.transactions.len(),
            "Imported snapshot"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

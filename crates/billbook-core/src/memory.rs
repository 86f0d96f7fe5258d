//! # In-Memory Stores
//!
//! `ProductStore` and `TransactionStore` backed by `tokio::sync::RwLock`.
//! Used by the test suites and by embedders that keep state elsewhere.
//!
//! Nothing here survives the process; ids are still monotonic for the life
//! of the store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CoreError, CoreResult, StorageError, ValidationError};
use crate::status::derive_status;
use crate::store::{ProductStore, TransactionStore};
use crate::types::{
    now_millis, to_millis, NewProduct, Product, ProductId, Transaction, TransactionFilter,
};
use crate::validation::validate_new_product;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Default)]
struct ProductTable {
    rows: BTreeMap<ProductId, Product>,
    /// Last id handed out. Independent of `rows`, so ids are never reused.
    last_id: ProductId,
}

/// In-memory product store.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<ProductTable>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `products` as-is, except that each status is
    /// re-derived. New ids continue after the largest existing one.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut table = ProductTable::default();
        for mut product in products {
            product.status = derive_status(product.quantity);
            table.last_id = table.last_id.max(product.id);
            table.rows.insert(product.id, product);
        }
        InMemoryProductStore {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self) -> CoreResult<Vec<Product>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, input: NewProduct) -> CoreResult<Product> {
        let input = validate_new_product(input)?;

        let mut table = self.table.write().await;
        table.last_id += 1;
        let product = Product {
            id: table.last_id,
            category: input.category,
            title: input.title,
            purchase_price: input.purchase_price,
            selling_price: input.selling_price,
            quantity: input.quantity,
            status: derive_status(input.quantity),
            created_at: now_millis(),
        };
        table.rows.insert(product.id, product.clone());

        debug!(id = product.id, title = %product.title, "Created product");
        Ok(product)
    }

    async fn update(&self, product: Product) -> CoreResult<Product> {
        let input = validate_new_product(NewProduct::from(&product))?;

        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&product.id)
            .ok_or(CoreError::ProductNotFound(product.id))?;

        stored.category = input.category;
        stored.title = input.title;
        stored.purchase_price = input.purchase_price;
        stored.selling_price = input.selling_price;
        stored.quantity = input.quantity;
        stored.status = derive_status(input.quantity);

        debug!(id = stored.id, quantity = stored.quantity, "Updated product");
        Ok(stored.clone())
    }

    async fn decrement_quantity(&self, id: ProductId, amount: i64) -> CoreResult<Product> {
        if amount < 0 {
            return Err(ValidationError::Negative {
                field: "amount".to_string(),
            }
            .into());
        }

        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&id)
            .ok_or(CoreError::ProductNotFound(id))?;

        stored.quantity = stored.quantity.saturating_sub(amount).max(0);
        stored.status = derive_status(stored.quantity);

        debug!(id, amount, remaining = stored.quantity, "Decremented stock");
        Ok(stored.clone())
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// In-memory, append-only transaction history.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    history: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded transactions.
    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.history.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, mut transaction: Transaction) -> CoreResult<()> {
        transaction.date = to_millis(transaction.date);
        let mut history = self.history.write().await;
        if history.iter().any(|existing| existing.id == transaction.id) {
            return Err(StorageError::Duplicate {
                entity: "Transaction".to_string(),
                id: transaction.id,
            }
            .into());
        }

        debug!(id = %transaction.id, total = %transaction.total, "Appended transaction");
        history.push(transaction);
        Ok(())
    }

    async fn list(&self, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>> {
        let history = self.history.read().await;
        Ok(history
            .iter()
            .filter(|transaction| filter.matches(transaction))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

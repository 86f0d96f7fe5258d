//! # Store Traits
//!
//! The persistence contract the core depends on. `billbook-db` implements it
//! over SQLite; [`crate::memory`] implements it in memory.
//!
//! ## Contract
//! ```text
//! ProductStore                              TransactionStore
//! ────────────                              ────────────────
//! list()                  any order         append(tx)     end of history
//! get(id)                 Option            list(filter)   insertion order
//! create(input)           fresh id, status
//! update(product)         status recomputed
//! decrement_quantity()    floor at 0
//! ```
//!
//! Every implementation must:
//! - assign product ids that are never reused and survive restarts
//! - derive `status` from `quantity` on every write
//! - keep `createdAt` / `date` as ISO-8601 text when persisted as text
//! - report decoding failures as `StorageError::Deserialization`

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{NewProduct, Product, ProductId, Transaction, TransactionFilter};

/// Source of truth for products and their stock.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, in no particular order.
    async fn list(&self) -> CoreResult<Vec<Product>>;

    /// Looks up one product.
    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>>;

    /// Validates `input`, assigns a fresh id, stamps `createdAt` and derives
    /// the status.
    ///
    /// ## Errors
    /// - `Validation` for blank text, prices `<= 0` or quantity `< 0`
    async fn create(&self, input: NewProduct) -> CoreResult<Product>;

    /// Replaces the editable fields of an existing product.
    ///
    /// The stored `createdAt` is kept and `status` is recomputed; the
    /// caller's `status` field is ignored.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the id does not exist
    /// - `Validation` under the same rules as `create`
    async fn update(&self, product: Product) -> CoreResult<Product>;

    /// Sets `quantity = max(0, quantity - amount)` and recomputes status.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the id does not exist
    /// - `Validation` if `amount` is negative
    async fn decrement_quantity(&self, id: ProductId, amount: i64) -> CoreResult<Product>;
}

/// Append-only history of completed bills.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Adds a transaction to the end of the history.
    ///
    /// `date` is kept to the millisecond; finer precision is dropped.
    ///
    /// ## Errors
    /// - `Storage(Duplicate)` if the id is already recorded
    async fn append(&self, transaction: Transaction) -> CoreResult<()>;

    /// Transactions matching `filter`, in insertion order.
    async fn list(&self, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>>;
}

// =============================================================================
// Shared Handles
// =============================================================================

#[async_trait]
impl<S: ProductStore + ?Sized> ProductStore for Arc<S> {
    async fn list(&self) -> CoreResult<Vec<Product>> {
        (**self).list().await
    }

    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        (**self).get(id).await
    }

    async fn create(&self, input: NewProduct) -> CoreResult<Product> {
        (**self).create(input).await
    }

    async fn update(&self, product: Product) -> CoreResult<Product> {
        (**self).update(product).await
    }

    async fn decrement_quantity(&self, id: ProductId, amount: i64) -> CoreResult<Product> {
        (**self).decrement_quantity(id, amount).await
    }
}

#[async_trait]
impl<S: TransactionStore + ?Sized> TransactionStore for Arc<S> {
    async fn append(&self, transaction: Transaction) -> CoreResult<()> {
        (**self).append(transaction).await
    }

    async fn list(&self, filter: &TransactionFilter) -> CoreResult<Vec<Transaction>> {
        (**self).list(filter).await
    }
}

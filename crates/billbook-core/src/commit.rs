//! # Transaction Committer
//!
//! Turns a bill into a recorded sale. This is the only operation that
//! changes stock and history together.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        commit(&mut bill)                                │
//! │                                                                         │
//! │  bill empty? ──yes──► Err(EmptyBill)          nothing touched          │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  for each line, in bill order:                                          │
//! │    products.get(id) ──None──► skip (warn)                              │
//! │       │ Some                                                            │
//! │       ▼                                                                 │
//! │    products.decrement_quantity(id, qty)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  transactions.append(Transaction { id: epoch ms, status: Completed })  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bill.clear()                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! There is no rollback. Once a product has been decremented, any later
//! storage failure is reported as [`CoreError::PartialCommit`] listing the
//! products already changed. A failure before the first decrement is a
//! plain [`CoreError::Storage`]. The bill is left untouched on every error.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::bill::Bill;
use crate::error::{CoreError, CoreResult, StorageError};
use crate::store::{ProductStore, TransactionStore};
use crate::types::{now_millis, ProductId, Transaction, TransactionFilter, TransactionStatus};

/// Applies bills to a product store and a transaction store.
///
/// Stores are owned; pass `Arc<S>` to share them with other components.
#[derive(Debug)]
pub struct TransactionCommitter<P, T> {
    products: P,
    transactions: T,
    /// Last transaction id handed out, in epoch milliseconds.
    last_id: AtomicI64,
}

impl<P, T> TransactionCommitter<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(products: P, transactions: T) -> Self {
        TransactionCommitter {
            products,
            transactions,
            last_id: AtomicI64::new(0),
        }
    }

    /// Builds a committer whose ids continue after the newest transaction
    /// already in `transactions`.
    ///
    /// Use this when reopening an existing history: a fresh [`new`](Self::new)
    /// only guarantees increasing ids within its own lifetime, so a clock set
    /// backwards across a restart could reproduce a stored id.
    pub async fn resume(products: P, transactions: T) -> CoreResult<Self> {
        let newest = transactions
            .list(&TransactionFilter::all())
            .await?
            .iter()
            .filter_map(|tx| tx.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        let committer = TransactionCommitter::new(products, transactions);
        committer.last_id.store(newest, Ordering::SeqCst);
        Ok(committer)
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    /// Commits `bill` and clears it.
    ///
    /// ## Errors
    /// - `EmptyBill` if the bill has no lines (no store is touched)
    /// - `Storage` if a store fails before any stock changed
    /// - `PartialCommit` if a store fails after stock changed
    pub async fn commit(&self, bill: &mut Bill) -> CoreResult<Transaction> {
        if bill.is_empty() {
            return Err(CoreError::EmptyBill);
        }

        let mut decremented: Vec<ProductId> = Vec::new();

        for item in bill.items() {
            let found = self
                .products
                .get(item.product_id)
                .await
                .map_err(|err| abort(&decremented, err))?;

            if found.is_none() {
                warn!(product_id = item.product_id, title = %item.product_title, "Product missing, stock not updated");
                continue;
            }

            match self
                .products
                .decrement_quantity(item.product_id, item.quantity)
                .await
            {
                Ok(product) => decremented.push(product.id),
                Err(CoreError::ProductNotFound(id)) => {
                    warn!(product_id = id, "Product removed during commit, stock not updated");
                }
                Err(err) => return Err(abort(&decremented, err)),
            }
        }

        let date = now_millis();
        let transaction = Transaction {
            id: self.next_id(date).to_string(),
            items: bill.items().to_vec(),
            total: bill.total(),
            date,
            status: TransactionStatus::Completed,
        };

        self.transactions
            .append(transaction.clone())
            .await
            .map_err(|err| abort(&decremented, err))?;

        bill.clear();

        info!(
            id = %transaction.id,
            lines = transaction.items.len(),
            total = %transaction.total,
            "Committed bill"
        );
        Ok(transaction)
    }

    /// Epoch milliseconds of `date`, bumped past the previous id if needed.
    fn next_id(&self, date: DateTime<Utc>) -> i64 {
        let candidate = date.timestamp_millis();
        let mut previous = self.last_id.load(Ordering::SeqCst);
        loop {
            let next = candidate.max(previous.saturating_add(1));
            match self
                .last_id
                .compare_exchange(previous, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }
}

/// Wraps `err` as a partial commit when stock has already changed.
fn abort(decremented: &[ProductId], err: CoreError) -> CoreError {
    if decremented.is_empty() {
        return err;
    }

    let source = match err {
        CoreError::Storage(source) => source,
        CoreError::PartialCommit { source, .. } => source,
        other => StorageError::Query(other.to_string()),
    };
    warn!(
        decremented = ?decremented,
        error = %source,
        "Commit failed after stock was updated"
    );
    CoreError::PartialCommit {
        decremented: decremented.to_vec(),
        source,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

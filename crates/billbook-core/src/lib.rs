//! # billbook-core: Inventory & Billing Rules
//!
//! The part of Billbook that keeps product stock, bill line items and the
//! sales history consistent with each other.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Data Flow                               │
//! │                                                                         │
//! │  UI (inventory editor, billing screen, sales view)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ billbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   Bill ──add_item──► BillItem (validated against stock)        │   │
//! │  │     │                                                           │   │
//! │  │     ▼ commit                                                    │   │
//! │  │   TransactionCommitter                                          │   │
//! │  │     ├──► ProductStore.decrement_quantity (per line)            │   │
//! │  │     └──► TransactionStore.append (one immutable record)        │   │
//! │  │                                                                 │   │
//! │  │   status::derive_status ◄── every quantity change              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │ store traits                                                    │
//! │       ▼                                                                 │
//! │  billbook-db (SQLite) or memory::* (tests, embedding)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer minor-unit money (no floating point)
//! - [`status`] - Quantity → stock status derivation
//! - [`types`] - Product, BillItem, Transaction, filters
//! - [`validation`] - Input rules shared by stores and the bill
//! - [`bill`] - The in-progress bill
//! - [`store`] - Persistence traits
//! - [`memory`] - In-memory store implementations
//! - [`commit`] - Bill → Transaction state transition
//! - [`report`] - Sales and inventory summaries
//! - [`error`] - Error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use billbook_core::memory::{InMemoryProductStore, InMemoryTransactionStore};
//! use billbook_core::{Bill, Money, NewProduct, ProductStore, TransactionCommitter};
//!
//! # async fn demo() -> billbook_core::CoreResult<()> {
//! let committer = TransactionCommitter::new(
//!     InMemoryProductStore::new(),
//!     InMemoryTransactionStore::new(),
//! );
//!
//! let pen = committer
//!     .products()
//!     .create(NewProduct {
//!         category: "stationery".into(),
//!         title: "Gel Pen".into(),
//!         purchase_price: Money::from_cents(600),
//!         selling_price: Money::from_cents(1000),
//!         quantity: 5,
//!     })
//!     .await?;
//!
//! let mut bill = Bill::new();
//! bill.add_item(&pen, Money::from_cents(1000), 3)?;
//! let transaction = committer.commit(&mut bill).await?;
//! assert_eq!(transaction.total, Money::from_cents(3000));
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod commit;
pub mod error;
pub mod memory;
pub mod money;
pub mod report;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::Bill;
pub use commit::TransactionCommitter;
pub use error::{CoreError, CoreResult, ErrorKind, StorageError, ValidationError};
pub use money::Money;
pub use report::{summarize_inventory, summarize_sales, InventorySummary, RangePreset, SalesSummary};
pub use status::{derive_status, StockStatus};
pub use store::{ProductStore, TransactionStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency symbol used by `Money`'s `Display` impl.
///
/// The billing screens this crate was built for price in rupees; use
/// [`Money::format_with`] when a store is configured differently.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Maximum length of product titles and categories.
pub const MAX_TEXT_LEN: usize = 200;

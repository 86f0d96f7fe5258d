//! # Stock Status
//!
//! Stock status is never stored independently of quantity. Every code path
//! that changes a quantity (create, edit, stock decrement, snapshot import)
//! goes through [`derive_status`].
//!
//! ```text
//! quantity == 0  ──►  OutOfStock
//! quantity  > 0  ──►  InStock
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Derived stock indicator of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Label shown in the inventory table.
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    /// Storage form, matching the serde and sqlx encodings.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a stock quantity to its status.
///
/// Total over `i64`: quantities are validated to be non-negative before they
/// reach a store, so only zero is out of stock.
///
/// ## Example
/// ```rust
/// use billbook_core::{derive_status, StockStatus};
///
/// assert_eq!(derive_status(0), StockStatus::OutOfStock);
/// assert_eq!(derive_status(12), StockStatus::InStock);
/// ```
#[inline]
pub const fn derive_status(quantity: i64) -> StockStatus {
    if quantity == 0 {
        StockStatus::OutOfStock
    } else {
        StockStatus::InStock
    }
}

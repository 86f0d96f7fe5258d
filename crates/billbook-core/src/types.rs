//! # Domain Types
//!
//! Core domain types used throughout Billbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    BillItem     │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄──│  product_id     │   │  id (epoch ms)  │       │
//! │  │  title          │   │  product_title  │──►│  items          │       │
//! │  │  quantity       │   │  selling_price  │   │  total          │       │
//! │  │  status         │   │  line_total     │   │  date, status   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  BillItem references its product by id only. Title and prices are      │
//! │  snapshots, so later edits to the product never rewrite history.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialized Form
//! Field names are camelCase (`purchasePrice`, `createdAt`), money is an
//! integer count of paise, timestamps are ISO-8601 text.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::StockStatus;

/// Product identifier. Assigned by the product store, never reused.
pub type ProductId = i64;

/// Truncates `instant` to milliseconds, the precision every store keeps.
pub fn to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// Current instant at store precision.
pub fn now_millis() -> DateTime<Utc> {
    to_millis(Utc::now())
}

// =============================================================================
// Product
// =============================================================================

/// A product held in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: ProductId,

    pub category: String,

    /// Display name shown on the bill.
    pub title: String,

    /// Cost per unit, used for profit and stock valuation.
    pub purchase_price: Money,

    /// Default sale price per unit. The operator may override it per bill line.
    pub selling_price: Money,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Always `derive_status(quantity)`; stores overwrite whatever is passed in.
    pub status: StockStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Value of the units on hand at purchase price.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.purchase_price * self.quantity
    }

    /// Checks whether `quantity` units can be put on a bill.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }
}

/// Input for creating a product. The store assigns id, status and createdAt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub category: String,
    pub title: String,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub quantity: i64,
}

impl From<&Product> for NewProduct {
    fn from(product: &Product) -> Self {
        NewProduct {
            category: product.category.clone(),
            title: product.title.clone(),
            purchase_price: product.purchase_price,
            selling_price: product.selling_price,
            quantity: product.quantity,
        }
    }
}

// =============================================================================
// Bill Item
// =============================================================================

/// A line on a bill.
///
/// Title and purchase price are copied from the product when the line is
/// added; `selling_price` is whatever the operator charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillItem {
    pub product_id: ProductId,
    pub product_title: String,
    pub purchase_price: Money,
    pub selling_price: Money,
    pub quantity: i64,
    /// `selling_price × quantity`
    pub line_total: Money,
}

impl BillItem {
    /// Profit on this line: `(selling_price - purchase_price) × quantity`.
    ///
    /// Negative when the operator sold below cost.
    #[inline]
    pub fn profit(&self) -> Money {
        (self.selling_price - self.purchase_price) * self.quantity
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Status of a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Cancelled,
}

impl TransactionStatus {
    /// Storage form, matching the serde and sqlx encodings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// An immutable record of a completed bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    /// Commit instant in epoch milliseconds, as decimal text.
    pub id: String,
    pub items: Vec<BillItem>,
    pub total: Money,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// Sum of line profits.
    pub fn profit(&self) -> Money {
        self.items.iter().map(BillItem::profit).sum()
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items
            .iter()
            .fold(0, |units, item| units.saturating_add(item.quantity))
    }

    /// Checks that `total` equals the sum of line totals, and that the sum
    /// does not overflow.
    pub fn is_balanced(&self) -> bool {
        Money::checked_sum(self.items.iter().map(|item| item.line_total)) == Some(self.total)
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// An inclusive instant range.
///
/// Constructed through [`DateRange::new`], so `from <= to` always holds,
/// including after deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawDateRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ValidationError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.from, raw.to)
    }
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvertedRange {
                field: "dateRange".to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    #[inline]
    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    #[inline]
    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Inclusive on both bounds.
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// Number of calendar days (UTC) the range touches, at least 1.
    pub fn day_count(&self) -> i64 {
        (self.to.date_naive() - self.from.date_naive()).num_days() + 1
    }
}

/// Criteria for listing transactions. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub date_range: Option<DateRange>,
    pub search_text: Option<String>,
}

impl TransactionFilter {
    /// Filter that matches every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Applies the date range and the search text.
    ///
    /// Search is a case-insensitive substring match over the transaction id,
    /// every item title, and the date rendered as `YYYY-MM-DD` and
    /// `MM/DD/YYYY`. Blank search text matches everything.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(transaction.date) {
                return false;
            }
        }

        let needle = match self.search_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };

        if transaction.id.to_lowercase().contains(&needle) {
            return true;
        }
        if transaction
            .items
            .iter()
            .any(|item| item.product_title.to_lowercase().contains(&needle))
        {
            return true;
        }

        let iso_day = transaction.date.format("%Y-%m-%d").to_string();
        let us_day = transaction.date.format("%m/%d/%Y").to_string();
        iso_day.contains(&needle) || us_day.contains(&needle)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(title: &str, sell: i64, buy: i64, qty: i64) -> BillItem {
        BillItem {
            product_id: 1,
            product_title: title.to_string(),
            purchase_price: Money::from_cents(buy),
            selling_price: Money::from_cents(sell),
            quantity: qty,
            line_total: Money::from_cents(sell * qty),
        }
    }

    fn transaction(id: &str, date: DateTime<Utc>, items: Vec<BillItem>) -> Transaction {
        let total = items.iter().map(|i| i.line_total).sum();
        Transaction {
            id: id.to_string(),
            items,
            total,
            date,
            status: TransactionStatus::Completed,
        }
    }

    #[test]
    fn test_profit() {
        let line = item("Notebook", 5000, 3500, 2);
        assert_eq!(line.profit().cents(), 3000);

        let below_cost = item("Notebook", 3000, 3500, 1);
        assert_eq!(below_cost.profit().cents(), -500);

        let tx = transaction("1", Utc::now(), vec![line, below_cost]);
        assert_eq!(tx.profit().cents(), 2500);
        assert_eq!(tx.unit_count(), 3);
        assert!(tx.is_balanced());
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let a = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 10, 3, 12, 0, 0).unwrap();

        assert!(DateRange::new(b, a).is_err());

        let range = DateRange::new(a, b).unwrap();
        assert!(range.contains(a));
        assert!(range.contains(b));
        assert_eq!(range.day_count(), 3);

        let inverted = r#"{"from":"2026-10-03T00:00:00Z","to":"2026-10-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<DateRange>(inverted).is_err());
    }

    #[test]
    fn test_filter_search() {
        let date = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
        let tx = transaction(
            "1772877600000",
            date,
            vec![item("Blue Gel Pen", 1000, 600, 1)],
        );

        assert!(TransactionFilter::all().matches(&tx));
        assert!(TransactionFilter::all().with_search("   ").matches(&tx));
        assert!(TransactionFilter::all().with_search("gel").matches(&tx));
        assert!(TransactionFilter::all().with_search(" BLUE ").matches(&tx));
        assert!(TransactionFilter::all().with_search("1772877").matches(&tx));
        assert!(TransactionFilter::all().with_search("2026-03-07").matches(&tx));
        assert!(TransactionFilter::all().with_search("03/07/2026").matches(&tx));
        assert!(!TransactionFilter::all().with_search("stapler").matches(&tx));
    }

    #[test]
    fn test_filter_range_is_inclusive() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 59).unwrap();
        let range = DateRange::new(from, to).unwrap();

        let on_start = transaction("a", from, vec![]);
        let on_end = transaction("b", to, vec![]);
        let after = transaction("c", to + chrono::Duration::seconds(1), vec![]);

        let filter = TransactionFilter::all().with_range(range);
        assert!(filter.matches(&on_start));
        assert!(filter.matches(&on_end));
        assert!(!filter.matches(&after));
    }

    #[test]
    fn test_transaction_iso_round_trip() {
        let date = Utc.timestamp_millis_opt(1_772_877_600_123).unwrap();
        let tx = transaction(
            "1772877600123",
            date,
            vec![item("Stapler", 25000, 18000, 1), item("Pins", 500, 300, 4)],
        );

        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"date\":\"2026-03-07T10:00:00.123Z\""));
        assert!(json.contains("\"productTitle\":\"Stapler\""));

        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.date.timestamp_millis(), 1_772_877_600_123);
    }
}

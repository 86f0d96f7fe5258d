//! # Reporting
//!
//! Summaries for the sales view and the dashboard cards. Pure functions
//! over values already loaded from the stores.
//!
//! ```text
//! TransactionStore.list(filter) ──► summarize_sales(txs, range)  ──► SalesSummary
//! ProductStore.list()           ──► summarize_inventory(products) ──► InventorySummary
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::status::StockStatus;
use crate::types::{DateRange, Product, Transaction, TransactionStatus};

// =============================================================================
// Range Presets
// =============================================================================

/// Quick date filters offered by the sales view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RangePreset {
    Today,
    /// Sunday through Saturday.
    ThisWeek,
    ThisMonth,
    AllTime,
}

impl RangePreset {
    /// The range this preset covers around `now` (UTC calendar), or `None`
    /// for all time.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::report::RangePreset;
    /// use chrono::{TimeZone, Utc};
    ///
    /// // Wednesday
    /// let now = Utc.with_ymd_and_hms(2026, 10, 14, 15, 30, 0).unwrap();
    /// let week = RangePreset::ThisWeek.range(now).unwrap();
    /// assert_eq!(week.from(), Utc.with_ymd_and_hms(2026, 10, 11, 0, 0, 0).unwrap());
    /// assert_eq!(week.day_count(), 7);
    /// ```
    pub fn range(&self, now: DateTime<Utc>) -> Option<DateRange> {
        let today = now.date_naive();
        let (first, last) = match self {
            RangePreset::Today => (today, today),
            RangePreset::ThisWeek => {
                let back = u64::from(today.weekday().num_days_from_sunday());
                let sunday = today.checked_sub_days(Days::new(back))?;
                (sunday, sunday.checked_add_days(Days::new(6))?)
            }
            RangePreset::ThisMonth => {
                let first = today.with_day(1)?;
                let next_month = first.checked_add_months(Months::new(1))?;
                (first, next_month.pred_opt()?)
            }
            RangePreset::AllTime => return None,
        };
        DateRange::new(start_of_day(first)?, end_of_day(last)?).ok()
    }

    fn as_str(&self) -> &'static str {
        match self {
            RangePreset::Today => "today",
            RangePreset::ThisWeek => "week",
            RangePreset::ThisMonth => "month",
            RangePreset::AllTime => "all",
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(RangePreset::Today),
            "week" | "this_week" => Ok(RangePreset::ThisWeek),
            "month" | "this_month" => Ok(RangePreset::ThisMonth),
            "all" | "all_time" => Ok(RangePreset::AllTime),
            _ => Err(ValidationError::InvalidFormat {
                field: "range".to_string(),
                reason: "expected today, week, month or all".to_string(),
            }),
        }
    }
}

fn start_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Last millisecond of `day`.
fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    Some(start_of_day(day)? + Duration::days(1) - Duration::milliseconds(1))
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Totals shown above the sales table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub transaction_count: usize,
    pub total_sales: Money,
    pub total_profit: Money,
    pub daily_average: Money,
}

/// Summarizes completed transactions.
///
/// Cancelled transactions and transactions outside `range` are ignored.
/// With a range, the daily average is spread over every calendar day the
/// range covers; without one, it is the average per transaction.
pub fn summarize_sales(transactions: &[Transaction], range: Option<&DateRange>) -> SalesSummary {
    let counted: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.status == TransactionStatus::Completed)
        .filter(|tx| range.map_or(true, |r| r.contains(tx.date)))
        .collect();

    let total_sales: Money = counted.iter().map(|tx| tx.total).sum();
    let total_profit: Money = counted.iter().map(|tx| tx.profit()).sum();

    let divisor = match range {
        Some(range) => range.day_count(),
        None => counted.len() as i64,
    };

    SalesSummary {
        transaction_count: counted.len(),
        total_sales,
        total_profit,
        daily_average: total_sales.divide_rounded(divisor),
    }
}

// =============================================================================
// Inventory Summary
// =============================================================================

/// Dashboard stock figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySummary {
    pub product_count: usize,
    pub out_of_stock_count: usize,
    pub total_units: i64,
    /// Units on hand valued at purchase price.
    pub stock_value: Money,
}

pub fn summarize_inventory(products: &[Product]) -> InventorySummary {
    InventorySummary {
        product_count: products.len(),
        out_of_stock_count: products
            .iter()
            .filter(|p| p.status == StockStatus::OutOfStock)
            .count(),
        total_units: products
            .iter()
            .fold(0, |units, p| units.saturating_add(p.quantity)),
        stock_value: products.iter().map(Product::stock_value).sum(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::derive_status;
    use crate::types::BillItem;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn sale(date: DateTime<Utc>, sell: i64, buy: i64, qty: i64, status: TransactionStatus) -> Transaction {
        Transaction {
            id: date.timestamp_millis().to_string(),
            items: vec![BillItem {
                product_id: 1,
                product_title: "Pen".to_string(),
                purchase_price: Money::from_cents(buy),
                selling_price: Money::from_cents(sell),
                quantity: qty,
                line_total: Money::from_cents(sell * qty),
            }],
            total: Money::from_cents(sell * qty),
            date,
            status,
        }
    }

    #[test]
    fn test_today_range() {
        let range = RangePreset::Today.range(at(2026, 10, 18, 9)).unwrap();
        assert_eq!(range.from(), at(2026, 10, 18, 0));
        assert_eq!(range.to(), at(2026, 10, 19, 0) - Duration::milliseconds(1));
        assert_eq!(range.day_count(), 1);
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2026-10-18 is a Sunday
        let range = RangePreset::ThisWeek.range(at(2026, 10, 18, 9)).unwrap();
        assert_eq!(range.from(), at(2026, 10, 18, 0));
        assert_eq!(range.to().date_naive(), NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());

        let range = RangePreset::ThisWeek.range(at(2026, 10, 24, 23)).unwrap();
        assert_eq!(range.from(), at(2026, 10, 18, 0));
    }

    #[test]
    fn test_month_range() {
        let range = RangePreset::ThisMonth.range(at(2028, 2, 10, 12)).unwrap();
        assert_eq!(range.from(), at(2028, 2, 1, 0));
        assert_eq!(range.to().date_naive(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
        assert_eq!(range.day_count(), 29);

        assert!(RangePreset::AllTime.range(at(2026, 1, 1, 0)).is_none());
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("week".parse::<RangePreset>().unwrap(), RangePreset::ThisWeek);
        assert_eq!(" ALL ".parse::<RangePreset>().unwrap(), RangePreset::AllTime);
        assert!("yesterday".parse::<RangePreset>().is_err());
        assert_eq!(RangePreset::ThisMonth.to_string(), "month");
    }

    #[test]
    fn test_sales_summary_without_range() {
        let txs = vec![
            sale(at(2026, 10, 1, 10), 100, 60, 3, TransactionStatus::Completed),
            sale(at(2026, 10, 2, 10), 50, 30, 2, TransactionStatus::Completed),
            sale(at(2026, 10, 2, 11), 999, 1, 9, TransactionStatus::Cancelled),
        ];

        let summary = summarize_sales(&txs, None);
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_sales, Money::from_cents(400));
        assert_eq!(summary.total_profit, Money::from_cents(120 + 40));
        assert_eq!(summary.daily_average, Money::from_cents(200));
    }

    #[test]
    fn test_sales_summary_with_range_divides_by_days() {
        let range = DateRange::new(at(2026, 10, 1, 0), at(2026, 10, 4, 23)).unwrap();
        let txs = vec![
            sale(at(2026, 10, 1, 10), 100, 60, 3, TransactionStatus::Completed),
            sale(at(2026, 10, 3, 10), 100, 60, 1, TransactionStatus::Completed),
            sale(at(2026, 11, 1, 10), 100, 60, 50, TransactionStatus::Completed),
        ];

        let summary = summarize_sales(&txs, Some(&range));
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_sales, Money::from_cents(400));
        assert_eq!(summary.daily_average, Money::from_cents(100));
    }

    #[test]
    fn test_empty_sales_summary() {
        let summary = summarize_sales(&[], None);
        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.daily_average, Money::zero());
    }

    #[test]
    fn test_inventory_summary() {
        let product = |id: i64, qty: i64, buy: i64| Product {
            id,
            category: "General".to_string(),
            title: format!("P{id}"),
            purchase_price: Money::from_cents(buy),
            selling_price: Money::from_cents(buy * 2),
            quantity: qty,
            status: derive_status(qty),
            created_at: Utc::now(),
        };

        let summary = summarize_inventory(&[product(1, 3, 100), product(2, 0, 500), product(3, 2, 250)]);
        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.out_of_stock_count, 1);
        assert_eq!(summary.total_units, 5);
        assert_eq!(summary.stock_value, Money::from_cents(800));
    }
}

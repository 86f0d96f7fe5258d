//! # Bill
//!
//! The in-progress sale: an ordered list of line items, mutable until it is
//! committed.
//!
//! ## Bill Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bill Operations                                    │
//! │                                                                         │
//! │  Operator Action         Bill Method              State Change          │
//! │  ───────────────         ───────────              ────────────          │
//! │                                                                         │
//! │  Pick product + qty ───► add_item() ───────────► items.push(line)      │
//! │  Type price/qty text ──► add_item_from_input() ► parse, then add_item  │
//! │  Click remove ─────────► remove_item(i) ───────► items.remove(i)       │
//! │  Complete sale ────────► committer.commit() ───► items.clear()         │
//! │                                                                         │
//! │  NOTE: stock is checked when a line is added, against the product      │
//! │        snapshot the caller passes in. It is not re-checked at commit.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::money::Money;
use crate::types::{BillItem, Product};
use crate::error::ValidationError;
use crate::validation::{parse_quantity, validate_sale_line, ValidationResult};

fn too_large() -> ValidationError {
    ValidationError::InvalidFormat {
        field: "unitPrice".to_string(),
        reason: "amount is too large".to_string(),
    }
}

impl BillItem {
    /// Creates a line from a product, freezing its title and purchase price.
    ///
    /// Fails when the line total or the line profit leaves the `Money` range.
    fn snapshot(product: &Product, unit_price: Money, quantity: i64) -> ValidationResult<Self> {
        let line_total = unit_price.checked_mul(quantity).ok_or_else(too_large)?;
        unit_price
            .checked_sub(product.purchase_price)
            .and_then(|margin| margin.checked_mul(quantity))
            .ok_or_else(too_large)?;

        Ok(BillItem {
            product_id: product.id,
            product_title: product.title.clone(),
            purchase_price: product.purchase_price,
            selling_price: unit_price,
            quantity,
            line_total,
        })
    }
}

/// An uncommitted bill.
///
/// ## Invariants
/// - Every item passed `validate_sale_line` when it was added
/// - `item.line_total == item.selling_price × item.quantity`
/// - `total()` and `total_profit()` fit in `Money` without saturating
/// - The same product may appear on several lines; each line is checked
///   against stock on its own
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    items: Vec<BillItem>,
}

impl Bill {
    /// Creates an empty bill.
    pub fn new() -> Self {
        Bill { items: Vec::new() }
    }

    /// Appends a line for `quantity` units of `product` at `unit_price`.
    ///
    /// ## Errors
    /// `ValidationError` naming the failing field when `quantity <= 0`,
    /// `quantity > product.quantity`, or `unit_price <= 0`.
    /// `InvalidFormat` on `unitPrice` when the line would push the bill total
    /// or profit out of range. The bill is unchanged on error.
    pub fn add_item(
        &mut self,
        product: &Product,
        unit_price: Money,
        quantity: i64,
    ) -> ValidationResult<&BillItem> {
        validate_sale_line(product, unit_price, quantity)?;
        let line = BillItem::snapshot(product, unit_price, quantity)?;

        let lines = || self.items.iter().chain(std::iter::once(&line));
        Money::checked_sum(lines().map(|item| item.line_total)).ok_or_else(too_large)?;
        Money::checked_sum(lines().map(BillItem::profit)).ok_or_else(too_large)?;

        let index = self.items.len();
        self.items.push(line);
        Ok(&self.items[index])
    }

    /// Parses the operator's price and quantity text, then adds the line.
    ///
    /// ## Example
    /// ```rust
    /// # use billbook_core::{Bill, Money, Product, StockStatus};
    /// # let product = Product {
    /// #     id: 1,
    /// #     category: "Stationery".into(),
    /// #     title: "Gel Pen".into(),
    /// #     purchase_price: Money::from_cents(600),
    /// #     selling_price: Money::from_cents(1000),
    /// #     quantity: 5,
    /// #     status: StockStatus::InStock,
    /// #     created_at: chrono::Utc::now(),
    /// # };
    /// let mut bill = Bill::new();
    /// bill.add_item_from_input(&product, "10.50", "2").unwrap();
    /// assert_eq!(bill.total(), Money::from_cents(2100));
    ///
    /// assert!(bill.add_item_from_input(&product, "10", "1.5").is_err());
    /// ```
    pub fn add_item_from_input(
        &mut self,
        product: &Product,
        price_text: &str,
        quantity_text: &str,
    ) -> ValidationResult<&BillItem> {
        let quantity = parse_quantity(quantity_text)?;
        let unit_price = Money::parse(price_text, "unitPrice")?;
        self.add_item(product, unit_price, quantity)
    }

    /// Removes the line at `index`. Out-of-range indexes are ignored.
    pub fn remove_item(&mut self, index: usize) -> Option<BillItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Line items in the order they were added.
    pub fn items(&self) -> &[BillItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line totals; zero for an empty bill.
    pub fn total(&self) -> Money {
        self.items.iter().map(|item| item.line_total).sum()
    }

    /// Sum of line profits.
    pub fn total_profit(&self) -> Money {
        self.items.iter().map(BillItem::profit).sum()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0, |units, item| units.saturating_add(item.quantity))
    }

    /// Empties the bill.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::derive_status;
    use chrono::Utc;

    fn product(id: i64, title: &str, quantity: i64) -> Product {
        Product {
            id,
            category: "General".to_string(),
            title: title.to_string(),
            purchase_price: Money::from_cents(60),
            selling_price: Money::from_cents(100),
            quantity,
            status: derive_status(quantity),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_bill_total_is_zero() {
        let bill = Bill::new();
        assert!(bill.is_empty());
        assert_eq!(bill.total(), Money::zero());
        assert_eq!(bill.total_profit(), Money::zero());
    }

    #[test]
    fn test_add_item_snapshots_product() {
        let mut pen = product(1, "Gel Pen", 5);
        let mut bill = Bill::new();

        let line = bill.add_item(&pen, Money::from_cents(100), 3).unwrap().clone();
        assert_eq!(line.product_id, 1);
        assert_eq!(line.product_title, "Gel Pen");
        assert_eq!(line.purchase_price, Money::from_cents(60));
        assert_eq!(line.line_total, Money::from_cents(300));
        assert_eq!(bill.total(), Money::from_cents(300));

        pen.title = "Renamed".to_string();
        assert_eq!(bill.items()[0].product_title, "Gel Pen");
    }

    #[test]
    fn test_operator_can_override_price() {
        let pen = product(1, "Gel Pen", 5);
        let mut bill = Bill::new();
        bill.add_item(&pen, Money::from_cents(90), 2).unwrap();

        assert_eq!(bill.total(), Money::from_cents(180));
        assert_eq!(bill.total_profit(), Money::from_cents(60));
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let mut bill = Bill::new();
        bill.add_item(&product(1, "A", 10), Money::from_cents(125), 3).unwrap();
        bill.add_item(&product(2, "B", 10), Money::from_cents(999), 1).unwrap();
        bill.add_item(&product(1, "A", 10), Money::from_cents(100), 7).unwrap();

        let sum: Money = bill.items().iter().map(|i| i.line_total).sum();
        assert_eq!(bill.total(), sum);
        assert_eq!(bill.total(), Money::from_cents(375 + 999 + 700));
        assert_eq!(bill.total_quantity(), 11);
        assert_eq!(bill.len(), 3);
    }

    #[test]
    fn test_add_item_rejects_bad_lines() {
        let pen = product(1, "Gel Pen", 5);
        let mut bill = Bill::new();

        assert!(matches!(
            bill.add_item(&pen, Money::from_cents(100), 0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            bill.add_item(&pen, Money::from_cents(100), -2),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            bill.add_item(&pen, Money::from_cents(100), 6),
            Err(ValidationError::ExceedsStock { .. })
        ));
        assert!(matches!(
            bill.add_item(&pen, Money::zero(), 1),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(bill.is_empty());
    }

    #[test]
    fn test_add_item_rejects_amounts_out_of_range() {
        let crates = product(1, "Crate", 100_000_000);
        let mut bill = Bill::new();

        let price = Money::parse("1000000000000", "unitPrice").unwrap();
        let err = bill.add_item(&crates, price, 100_000_000).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
        assert_eq!(err.field(), "unitPrice");
        assert!(bill.is_empty());

        // each line fits, the running total does not
        let half = Money::from_cents(i64::MAX / 2 + 1);
        bill.add_item(&crates, half, 1).unwrap();
        let err = bill.add_item(&crates, half, 1).unwrap_err();
        assert_eq!(err.field(), "unitPrice");
        assert_eq!(bill.len(), 1);
        assert_eq!(bill.total(), half);
    }

    #[test]
    fn test_add_item_from_input() {
        let pen = product(1, "Gel Pen", 5);
        let mut bill = Bill::new();

        let err = bill.add_item_from_input(&pen, "100", "2.5").unwrap_err();
        assert_eq!(err.field(), "quantity");

        let err = bill.add_item_from_input(&pen, "abc", "2").unwrap_err();
        assert_eq!(err.field(), "unitPrice");

        let err = bill.add_item_from_input(&pen, "0", "2").unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));

        bill.add_item_from_input(&pen, " 1.25 ", " 4 ").unwrap();
        assert_eq!(bill.total(), Money::from_cents(500));
    }

    #[test]
    fn test_remove_item_ignores_out_of_range() {
        let mut bill = Bill::new();
        bill.add_item(&product(1, "A", 5), Money::from_cents(100), 1).unwrap();
        bill.add_item(&product(2, "B", 5), Money::from_cents(200), 1).unwrap();

        assert!(bill.remove_item(5).is_none());
        assert_eq!(bill.len(), 2);

        let removed = bill.remove_item(0).unwrap();
        assert_eq!(removed.product_title, "A");
        assert_eq!(bill.items()[0].product_title, "B");
        assert_eq!(bill.total(), Money::from_cents(200));

        bill.clear();
        assert!(bill.is_empty());
    }
}

//! # Validation Module
//!
//! Input rules shared by the product stores and the bill.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                      │
//! │  └── Immediate feedback, text → typed values (parse_quantity,          │
//! │      Money::parse)                                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── validate_new_product (ProductStore::create / update)              │
//! │  └── validate_sale_line   (Bill::add_item)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── CHECK (quantity >= 0), CHECK (status matches quantity)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billbook_core::validation::{parse_quantity, validate_stock_quantity};
//!
//! assert_eq!(parse_quantity("3").unwrap(), 3);
//! assert!(parse_quantity("2.5").is_err());
//! assert!(validate_stock_quantity(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, Product};
use crate::MAX_TEXT_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_TEXT_LEN`] characters
///
/// ## Example
/// ```rust
/// use billbook_core::validation::validate_text;
///
/// assert_eq!(validate_text("title", "  Gel Pen ").unwrap(), "Gel Pen");
/// assert!(validate_text("title", "   ").is_err());
/// ```
pub fn validate_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a price is greater than zero.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a stock level. Zero is allowed (out of stock).
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Parses operator-entered text as a positive whole number of units.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Base-10 digits only: `"2.5"`, `"1e2"`, `"abc"` are rejected
/// - Must be greater than zero
pub fn parse_quantity(text: &str) -> ValidationResult<i64> {
    let field = "quantity";
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    if let Some(rest) = text.strip_prefix('-') {
        if is_digits(rest) {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    if !is_digits(text) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        });
    }

    let quantity: i64 = text.parse().map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "number is too large".to_string(),
    })?;

    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(quantity)
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates product input and returns it with trimmed text fields.
///
/// ## Rules
/// - `title`, `category`: required, at most [`MAX_TEXT_LEN`] characters
/// - `purchasePrice`, `sellingPrice`: greater than 0
/// - `quantity`: 0 or more
pub fn validate_new_product(input: NewProduct) -> ValidationResult<NewProduct> {
    let title = validate_text("title", &input.title)?;
    let category = validate_text("category", &input.category)?;
    validate_price("purchasePrice", input.purchase_price)?;
    validate_price("sellingPrice", input.selling_price)?;
    validate_stock_quantity(input.quantity)?;

    Ok(NewProduct {
        category,
        title,
        ..input
    })
}

/// Validates one bill line against the product's stock at the time it is
/// added.
///
/// ## Rules
/// - `quantity` greater than 0
/// - `quantity` no more than `product.quantity`
/// - `unitPrice` greater than 0
pub fn validate_sale_line(product: &Product, unit_price: Money, quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if !product.can_sell(quantity) {
        return Err(ValidationError::ExceedsStock {
            field: "quantity".to_string(),
            requested: quantity,
            available: product.quantity,
        });
    }

    validate_price("unitPrice", unit_price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::derive_status;
    use chrono::Utc;

    fn input() -> NewProduct {
        NewProduct {
            category: "Stationery".to_string(),
            title: "Gel Pen".to_string(),
            purchase_price: Money::from_cents(600),
            selling_price: Money::from_cents(1000),
            quantity: 10,
        }
    }

    fn product(quantity: i64) -> Product {
        Product {
            id: 1,
            category: "Stationery".to_string(),
            title: "Gel Pen".to_string(),
            purchase_price: Money::from_cents(600),
            selling_price: Money::from_cents(1000),
            quantity,
            status: derive_status(quantity),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("title", " Pen ").unwrap(), "Pen");
        assert!(matches!(
            validate_text("title", ""),
            Err(ValidationError::Required { .. })
        ));
        let long = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            validate_text("title", &long),
            Err(ValidationError::TooLong { .. })
        ));
        let multibyte = "₹".repeat(MAX_TEXT_LEN);
        assert!(validate_text("title", &multibyte).is_ok());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert_eq!(parse_quantity(" 12 ").unwrap(), 12);

        for text in ["2.5", "abc", "1e2", "+3", "3 4", "99999999999999999999"] {
            assert!(
                matches!(parse_quantity(text), Err(ValidationError::InvalidFormat { .. })),
                "input {:?}",
                text
            );
        }
        assert!(matches!(parse_quantity(""), Err(ValidationError::Required { .. })));
        assert!(matches!(parse_quantity("0"), Err(ValidationError::MustBePositive { .. })));
        assert!(matches!(parse_quantity("-1"), Err(ValidationError::MustBePositive { .. })));
    }

    #[test]
    fn test_validate_new_product() {
        let cleaned = validate_new_product(NewProduct {
            title: "  Gel Pen  ".to_string(),
            ..input()
        })
        .unwrap();
        assert_eq!(cleaned.title, "Gel Pen");

        let zero_stock = validate_new_product(NewProduct {
            quantity: 0,
            ..input()
        });
        assert!(zero_stock.is_ok());

        let err = validate_new_product(NewProduct {
            purchase_price: Money::zero(),
            ..input()
        })
        .unwrap_err();
        assert_eq!(err.field(), "purchasePrice");

        let err = validate_new_product(NewProduct {
            selling_price: Money::from_cents(-1),
            ..input()
        })
        .unwrap_err();
        assert_eq!(err.field(), "sellingPrice");

        let err = validate_new_product(NewProduct {
            quantity: -1,
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));

        let err = validate_new_product(NewProduct {
            category: " ".to_string(),
            ..input()
        })
        .unwrap_err();
        assert_eq!(err.field(), "category");
    }

    #[test]
    fn test_validate_sale_line() {
        let pen = product(5);
        assert!(validate_sale_line(&pen, Money::from_cents(1000), 5).is_ok());

        assert!(matches!(
            validate_sale_line(&pen, Money::from_cents(1000), 6),
            Err(ValidationError::ExceedsStock { requested: 6, available: 5, .. })
        ));
        assert!(matches!(
            validate_sale_line(&pen, Money::from_cents(1000), 0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert_eq!(
            validate_sale_line(&pen, Money::zero(), 1).unwrap_err().field(),
            "unitPrice"
        );
    }
}

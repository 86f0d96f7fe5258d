//! # Money
//!
//! Prices, line totals and bill totals as a whole number of paise.
//!
//! The operators saturate at the `i64` range instead of panicking. Code that
//! must report overflow (bill lines, the storage decode boundary) uses the
//! `checked_*` forms.
//!
//! ```text
//!   operator types "12.50" ──parse──► Money(1250)
//!   line total       1250 × 3      ──► Money(3750)
//!   stored / JSON    3750          (plain integer, never a float)
//!   shown            ₹37.50        (Display, or format_with(symbol))
//! ```
//!
//! ## Usage
//! ```rust
//! use billbook_core::money::Money;
//!
//! let price = Money::parse("12.50", "sellingPrice").unwrap();
//! assert_eq!(price.cents(), 1250);
//!
//! let line_total = price * 3;
//! assert_eq!(line_total.to_string(), "₹37.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::DEFAULT_CURRENCY_SYMBOL;

/// Number of fractional digits accepted by [`Money::parse`].
const MINOR_DIGITS: usize = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// Signed: profit on a line sold below cost is negative.
///
/// ## Where Money Flows
/// ```text
/// Product.selling_price ──► BillItem.selling_price ──► BillItem.line_total
///                                                            │
///                                   Bill.total() ◄───────────┘
///                                        │
///                                        ▼
///                               Transaction.total ──► SalesSummary
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ₹10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses operator-entered decimal text such as `"12"`, `"12.5"` or
    /// `".75"`.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - Optional leading `-`
    /// - Digits, at most one `.`, at most two fractional digits
    /// - `NaN`, `inf`, exponents and thousands separators are rejected
    ///
    /// `field` names the input in the returned error.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    ///
    /// assert_eq!(Money::parse("7.5", "price").unwrap().cents(), 750);
    /// assert!(Money::parse("NaN", "price").is_err());
    /// assert!(Money::parse("1.999", "price").is_err());
    /// ```
    pub fn parse(text: &str, field: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (major_text, minor_text) = match unsigned.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (unsigned, ""),
        };

        if major_text.is_empty() && minor_text.is_empty() {
            return Err(invalid("must be a number"));
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(major_text) || !all_digits(minor_text) {
            return Err(invalid("must be a number"));
        }
        if minor_text.len() > MINOR_DIGITS {
            return Err(invalid("at most 2 decimal places"));
        }

        let overflow = || invalid("amount is too large");

        let mut cents: i64 = 0;
        for digit in major_text.bytes() {
            cents = cents
                .checked_mul(10)
                .and_then(|c| c.checked_add(i64::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }
        cents = cents.checked_mul(100).ok_or_else(overflow)?;

        let mut minor: i64 = 0;
        for (position, digit) in minor_text.bytes().enumerate() {
            let scale = if position == 0 { 10 } else { 1 };
            minor += i64::from(digit - b'0') * scale;
        }
        cents = cents.checked_add(minor).ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sum of `amounts`, or `None` if any partial sum overflows.
    ///
    /// ```rust
    /// use billbook_core::money::Money;
    ///
    /// let lines = [Money::from_cents(i64::MAX), Money::from_cents(1)];
    /// assert_eq!(Money::checked_sum(lines), None);
    /// ```
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Divides by `divisor`, rounding half away from zero.
    ///
    /// Used for averages. Returns zero when `divisor` is zero.
    pub fn divide_rounded(&self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::zero();
        }
        let numerator = self.0 as i128;
        let divisor = divisor as i128;
        let half = divisor.abs() / 2;
        let adjusted = if (numerator < 0) != (divisor < 0) {
            numerator - half
        } else {
            numerator + half
        };
        // only i64::MIN / -1 leaves the range
        Money(i64::try_from(adjusted / divisor).unwrap_or(i64::MAX))
    }

    /// Formats with an explicit currency symbol: `format_with("$")` → `$10.99`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            symbol,
            self.major().abs(),
            self.minor_part()
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money with the default currency symbol, e.g. `₹10.99`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(DEFAULT_CURRENCY_SYMBOL))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_and_minor_parts() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_cents(500).to_string(), "₹5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-₹5.50");
        assert_eq!(Money::from_cents(0).to_string(), "₹0.00");
        assert_eq!(Money::from_cents(1099).format_with("$"), "$10.99");
    }

    #[test]
    fn test_parse_accepts_decimal_text() {
        assert_eq!(Money::parse("12", "price").unwrap().cents(), 1200);
        assert_eq!(Money::parse("12.5", "price").unwrap().cents(), 1250);
        assert_eq!(Money::parse("12.50", "price").unwrap().cents(), 1250);
        assert_eq!(Money::parse(" 0.07 ", "price").unwrap().cents(), 7);
        assert_eq!(Money::parse(".75", "price").unwrap().cents(), 75);
        assert_eq!(Money::parse("3.", "price").unwrap().cents(), 300);
        assert_eq!(Money::parse("-4.25", "price").unwrap().cents(), -425);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("", "price"),
            Err(ValidationError::Required { .. })
        ));
        for text in ["NaN", "inf", "1e3", "1,000", "abc", ".", "1.2.3", "1.999", "--1"] {
            let err = Money::parse(text, "price").unwrap_err();
            assert_eq!(err.field(), "price", "input {:?}", text);
        }
        assert!(Money::parse("99999999999999999999", "price").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = Money::from_cents(i64::MAX);

        assert_eq!(Money::from_cents(250).checked_mul(4), Some(Money::from_cents(1000)));
        assert_eq!(big.checked_mul(2), None);
        assert_eq!(big.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(100), Money::from_cents(-40)]),
            Some(Money::from_cents(60))
        );
        assert_eq!(Money::checked_sum([big, big]), None);
    }

    #[test]
    fn test_operators_saturate() {
        let big = Money::from_cents(i64::MAX);

        assert_eq!(big * 3, big);
        assert_eq!(big + Money::from_cents(1), big);
        assert_eq!(Money::from_cents(i64::MIN) - Money::from_cents(1), Money::from_cents(i64::MIN));

        let total: Money = [big, big].iter().sum();
        assert_eq!(total, big);
    }

    #[test]
    fn test_divide_rounded() {
        assert_eq!(Money::from_cents(1000).divide_rounded(3).cents(), 333);
        assert_eq!(Money::from_cents(1001).divide_rounded(2).cents(), 501);
        assert_eq!(Money::from_cents(-1001).divide_rounded(2).cents(), -501);
        assert_eq!(Money::from_cents(1000).divide_rounded(0), Money::zero());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::from_cents(-100).is_positive());
        assert_eq!(Money::default(), Money::zero());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "1250");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), 1250);
    }
}

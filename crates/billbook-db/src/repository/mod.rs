//! # Repository Module
//!
//! SQLite implementations of the billbook-core store traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Store Traits over SQLite                             │
//! │                                                                         │
//! │  TransactionCommitter / UI adapter                                     │
//! │       │                                                                 │
//! │       │  products.decrement_quantity(7, 3)                             │
//! │       ▼                                                                 │
//! │  ProductRepository (impl ProductStore)                                 │
//! │  TransactionRepository (impl TransactionStore)                         │
//! │       │                                                                 │
//! │       │  SQL rows ──TryFrom──► domain values (one decode boundary)     │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products and stock
//! - [`TransactionRepository`](transaction::TransactionRepository) - Sales history

use billbook_core::StorageError;
use chrono::{DateTime, SecondsFormat, Utc};

pub mod product;
pub mod transaction;

/// Renders a timestamp the way every table stores it:
/// `2026-10-18T09:30:00.123Z`.
pub(crate) fn encode_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored ISO-8601 timestamp.
pub(crate) fn decode_timestamp(entity: &str, text: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| StorageError::corrupt(entity, format!("invalid timestamp '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_round_trip() {
        let instant = Utc.timestamp_millis_opt(1_792_316_400_123).unwrap();
        let text = encode_timestamp(instant);
        assert_eq!(text, "2026-10-18T09:40:00.123Z");
        assert_eq!(decode_timestamp("Product", &text).unwrap(), instant);

        let offset = decode_timestamp("Product", "2026-10-18T15:10:00.123+05:30").unwrap();
        assert_eq!(offset, instant);

        assert!(matches!(
            decode_timestamp("Product", "yesterday"),
            Err(StorageError::Deserialization { .. })
        ));
    }
}

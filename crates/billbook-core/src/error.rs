//! # Error Types
//!
//! Domain-specific error types for billbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billbook-core errors (this file)                                      │
//! │  ├── CoreError        - Everything a core operation can report         │
//! │  ├── ValidationError  - Bad input, operation not applied               │
//! │  └── StorageError     - Store I/O or decoding failure                  │
//! │                                                                         │
//! │  billbook-db errors (separate crate)                                   │
//! │  └── DbError          - SQLite failures, converted into StorageError   │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                               │
//! │        DbError ─► StorageError ─► CoreError ─► ErrorKind ─► UI message │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable at the UI boundary. The only state that can
//! survive a failed operation is a partially applied commit, and that case
//! has its own variant so callers cannot mistake it for a clean failure.

use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification used by UI adapters to pick a message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, locally correctable.
    Validation,
    /// Referenced entity is missing.
    NotFound,
    /// Commit attempted on an empty bill.
    EmptyBill,
    /// I/O failure; state may be partially applied.
    Storage,
}

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by core operations and store implementations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation failed; nothing was applied.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Product id does not exist in the product store.
    ///
    /// ## When This Occurs
    /// - `ProductStore::update` with an unknown id (fatal for the caller)
    /// - `ProductStore::decrement_quantity` with an unknown id (the committer
    ///   skips the line instead of failing)
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Commit was attempted with no line items.
    #[error("Cannot complete an empty bill")]
    EmptyBill,

    /// A store failed before anything was mutated.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A store failed after the commit had already changed stock.
    ///
    /// ## User Workflow
    /// ```text
    /// commit(bill: [A×3, B×1])
    ///      │
    ///      ├── decrement A ✓
    ///      ├── decrement B ✗ (disk error)
    ///      ▼
    /// PartialCommit { decremented: [A], .. }
    ///      │
    ///      ▼
    /// UI shows: "sale may be partially applied, check stock of A"
    /// ```
    #[error("Sale may be partially applied ({} product(s) already updated): {source}", .decremented.len())]
    PartialCommit {
        decremented: Vec<ProductId>,
        #[source]
        source: StorageError,
    },
}

impl CoreError {
    /// Maps the error onto the four-way taxonomy shown to users.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::ProductNotFound(_) => ErrorKind::NotFound,
            CoreError::EmptyBill => ErrorKind::EmptyBill,
            CoreError::Storage(_) | CoreError::PartialCommit { .. } => ErrorKind::Storage,
        }
    }

    /// True when stock may already reflect a sale that was not recorded.
    pub fn may_be_partial(&self) -> bool {
        matches!(self, CoreError::PartialCommit { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Field names use the names the UI shows (`unitPrice`, `quantity`, ...), so
/// the message can be displayed next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be greater than zero.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Value must not be below zero.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Requested more units than are in stock.
    #[error("{field} {requested} exceeds available stock ({available})")]
    ExceedsStock {
        field: String,
        requested: i64,
        available: i64,
    },

    /// Text could not be parsed (not a number, not an integer, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Range bounds are inverted.
    #[error("{field} start must not be after its end")]
    InvertedRange { field: String },
}

impl ValidationError {
    /// Returns the name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::ExceedsStock { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::InvertedRange { field } => field,
        }
    }
}

// =============================================================================
// Storage Error
// =============================================================================

/// Failures reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing store cannot be reached (closed pool, missing file, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A read or write failed.
    #[error("Storage query failed: {0}")]
    Query(String),

    /// An id that must be unique already exists.
    #[error("{entity} '{id}' already exists")]
    Duplicate { entity: String, id: String },

    /// Persisted data could not be decoded into a valid domain value.
    ///
    /// Raised instead of silently substituting defaults, so data loss is
    /// visible.
    #[error("Stored {entity} is corrupt: {reason}")]
    Deserialization { entity: String, reason: String },

    /// Persisted data uses a schema version this build cannot read.
    #[error("Unsupported schema version {found} (supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

impl StorageError {
    /// Shorthand for a `Deserialization` error.
    pub fn corrupt(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Deserialization {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

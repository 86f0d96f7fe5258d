//! # billbook-db: Storage Layer for Billbook
//!
//! SQLite persistence for the billbook-core store traits, plus the pieces
//! that deal with files: `billbook.toml`, JSON snapshots and the `seed` tool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Data Flow                               │
//! │                                                                         │
//! │  TransactionCommitter / inventory editor / sales view                  │
//! │       │  ProductStore, TransactionStore                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductRepo    │    │  (embedded)  │  │   │
//! │  │   │               │    │ TransactionRepo│    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   config.rs (billbook.toml)    snapshot.rs (JSON import/export) │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - `ProductStore` / `TransactionStore` on SQLite
//! - [`snapshot`] - Versioned JSON export/import, legacy migration
//! - [`config`] - `billbook.toml` + environment overrides
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billbook_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("billbook.db")).await?;
//! let committer = db.committer();
//!
//! let pen = committer.products().create(new_pen).await?;
//! let mut bill = Bill::new();
//! bill.add_item(&pen, pen.selling_price, 2)?;
//! let sale = committer.commit(&mut bill).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod snapshot;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;

//! # Schema Migrations
//!
//! The schema ships inside the binary (`sqlx::migrate!`), so a shop
//! database is upgraded in place the first time a newer build opens it.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, transactions, transaction_items,
//!                              immutability triggers
//! ```
//!
//! Released migration files are frozen. Schema changes go in a new
//! `NNN_description.sql` with the next number.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = TRUE")
            .fetch_one(pool)
            .await?;
    Ok((MIGRATOR.migrations.len(), usize::try_from(applied).unwrap_or_default()))
}

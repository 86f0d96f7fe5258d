//! # Shop Database
//!
//! Opening the SQLite file that holds stock and sales history, and handing
//! out the stores that work on it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [database] in billbook.toml ──► DbConfig                               │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │  Database::new ── open file (create if missing), WAL, foreign keys      │
//! │        │          apply embedded migrations                             │
//! │        ▼                                                                │
//! │  Database ──┬── products()      ProductRepository                       │
//! │             ├── transactions()  TransactionRepository                   │
//! │             ├── committer()     TransactionCommitter over both          │
//! │             └── export_snapshot / import_snapshot                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets the sales view read history while a bill is being committed.
//! `:memory:` databases live exactly as long as their single connection, so
//! the pool never recycles it.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use billbook_core::{CoreResult, TransactionCommitter};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::TransactionRepository;

const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// The `[database]` table of `billbook.toml`. Missing keys take the
/// [`Default`] values.
///
/// ```rust
/// use billbook_db::DbConfig;
///
/// let config = DbConfig::new("shop.db").max_connections(2);
/// assert_eq!(config.max_connections, 2);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,

    pub max_connections: u32,
    pub min_connections: u32,

    /// How long to wait for a free connection, in seconds in TOML.
    #[serde(with = "seconds")]
    pub connect_timeout: Duration,

    /// Idle connections are closed after this long.
    #[serde(with = "seconds")]
    pub idle_timeout: Duration,

    /// How long a writer waits on a locked file before failing.
    #[serde(with = "seconds")]
    pub busy_timeout: Duration,

    /// Apply pending migrations when opening.
    pub run_migrations: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig::new("billbook.db")
    }
}

impl DbConfig {
    /// File-backed database at `path`. One shop rarely needs more than a
    /// handful of connections.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private database that disappears with the handle. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            ..DbConfig::new(IN_MEMORY_PATH)
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(IN_MEMORY_PATH)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }
}

/// `Duration` as whole seconds.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to an open shop database. Clones share one pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("billbook.db")).await?;
/// let committer = db.committer();
/// let pen = committer.products().create(new_pen).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens `config.path`, creating the file on first use, and brings the
    /// schema up to date unless `run_migrations` is off.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.path.display(), "Opening shop database");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout));
        if config.is_in_memory() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {e}", config.path.display())))?;
        debug!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies any migrations the file has not seen yet.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries outside the stores.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// A committer over this database's stores.
    ///
    /// Ids are only forced strictly increasing within this committer. Use
    /// [`resume_committer`](Self::resume_committer) on a database that
    /// already holds sales.
    pub fn committer(&self) -> TransactionCommitter<ProductRepository, TransactionRepository> {
        TransactionCommitter::new(self.products(), self.transactions())
    }

    /// A committer whose ids continue after the newest recorded sale.
    pub async fn resume_committer(
        &self,
    ) -> CoreResult<TransactionCommitter<ProductRepository, TransactionRepository>> {
        TransactionCommitter::resume(self.products(), self.transactions()).await
    }

    /// Closes every connection. Later store calls fail with
    /// `StorageError::Unavailable`.
    pub async fn close(&self) {
        info!("Closing shop database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

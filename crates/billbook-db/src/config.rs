//! # Application Configuration
//!
//! `billbook.toml` loading for the tools built on this crate.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLBOOK_DB_PATH=/srv/shop.db                                      │
//! │     BILLBOOK_STORE_NAME="Corner Stationers"                            │
//! │     BILLBOOK_CURRENCY_SYMBOL=Rs.                                       │
//! │     BILLBOOK_LOG=debug                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/billbook/billbook.toml (Linux)                           │
//! │     ~/Library/Application Support/com.billbook.billbook/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/billbook/billbook.db"
//! max_connections = 5
//! connect_timeout = 30
//!
//! [store]
//! name = "Corner Stationers"
//! currency_symbol = "₹"
//!
//! [logging]
//! filter = "info,billbook=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};

use billbook_core::DEFAULT_CURRENCY_SYMBOL;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::pool::DbConfig;

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "billbook.toml";

/// Log filter used when neither the config file nor the environment sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,billbook=debug,sqlx=warn";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read or written.
    #[error("Config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Values parsed but make no sense together.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[store]`: how the shop presents itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Shop name printed on reports.
    pub name: String,

    /// Symbol passed to `Money::format_with`.
    pub currency_symbol: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: "Billbook".to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Builds the filter, preferring `RUST_LOG` when it is set.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`path`, or the platform default location)
    /// 3. Environment variables
    ///
    /// A missing file is not an error; an unreadable or invalid one is.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses one TOML file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(io_err)?;

        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Checks cross-field rules.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }
        if self.store.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.currency_symbol must not be empty".into(),
            ));
        }

        let db = &self.database;
        if db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }
        // every pooled connection to :memory: would see its own empty database
        if db.is_in_memory() && db.max_connections != 1 {
            return Err(ConfigError::Invalid(
                "an in-memory database needs max_connections = 1".into(),
            ));
        }

        EnvFilter::try_new(&self.logging.filter)
            .map_err(|e| ConfigError::Invalid(format!("logging.filter: {e}")))?;

        Ok(())
    }

    /// Applies `BILLBOOK_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("BILLBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(name) = var("BILLBOOK_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(symbol) = var("BILLBOOK_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(filter) = var("BILLBOOK_LOG") {
            debug!(filter = %filter, "Overriding log filter from environment");
            self.logging.filter = filter;
        }
    }

    /// Returns the platform config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "billbook", "billbook")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Returns the platform data directory location for the database file.
    pub fn default_database_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "billbook", "billbook")
            .map(|dirs| dirs.data_dir().join("billbook.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.currency_symbol, "₹");
        assert_eq!(config.database.path, PathBuf::from("billbook.db"));
    }

    #[test]
    fn test_load_from_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
            [database]
            path = "/srv/shop.db"
            connect_timeout = 5

            [store]
            name = "Corner Stationers"
            "#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/shop.db"));
        assert_eq!(config.database.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.store.name, "Corner Stationers");
        assert_eq!(config.store.currency_symbol, "₹");
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(config, Err(ConfigError::Io { .. })));

        let mut config = AppConfig::default();
        config.apply_overrides(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[store\nname = ").unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.store.name = "Kiosk".to_string();
        config.database = DbConfig::new("/tmp/kiosk.db").max_connections(2);
        config.save(&path).unwrap();

        assert_eq!(AppConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BILLBOOK_DB_PATH", "/data/other.db"),
            ("BILLBOOK_CURRENCY_SYMBOL", "Rs."),
            ("BILLBOOK_LOG", "warn"),
        ]);

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/data/other.db"));
        assert_eq!(config.store.currency_symbol, "Rs.");
        assert_eq!(config.store.name, "Billbook");
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_validation_rules() {
        let mut config = AppConfig::default();
        config.store.name = "   ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.database = DbConfig::new("x.db").max_connections(1).min_connections(2);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database = DbConfig::in_memory().max_connections(4);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.filter = "billbook=notalevel".to_string();
        assert!(config.validate().is_err());
    }
}

//! Runtime configuration for store and logging.
//!
//! # Responsibility
//! - Provide defaults for every setting.
//! - Apply overrides from `CLASSBOOK_*` environment variables.
//!
//! # Invariants
//! - Invalid override values are rejected, never silently replaced by defaults.
//! - An unset `CLASSBOOK_DB_PATH` selects an in-memory store.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "CLASSBOOK_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "CLASSBOOK_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "CLASSBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CLASSBOOK_LOG_DIR";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration error raised while reading overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file path. `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// Upper bound on how long one store operation waits for a lock.
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

/// Logging settings. File logging is enabled only when `log_dir` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.store.db_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = get(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: "expected a positive integer of milliseconds",
                })?;
            config.store.busy_timeout = Duration::from_millis(millis);
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log.level = level;
        }

        if let Some(dir) = get(ENV_LOG_DIR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir,
                    reason: "log directory must be an absolute path",
                });
            }
            config.log.log_dir = Some(path);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_memory_store_and_five_second_timeout() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.store.db_path, None);
        assert_eq!(config.store.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.log.log_dir, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/tmp/classbook.sqlite3"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
            (ENV_LOG_LEVEL, "warn"),
        ]))
        .unwrap();
        assert_eq!(
            config.store.db_path,
            Some(PathBuf::from("/tmp/classbook.sqlite3"))
        );
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "  ")])).unwrap();
        assert_eq!(config.store.db_path, None);
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        for raw in ["0", "soon", "-5"] {
            let err = AppConfig::from_lookup(lookup_from(&[(ENV_BUSY_TIMEOUT_MS, raw)]))
                .expect_err("invalid timeout must be rejected");
            assert!(matches!(
                err,
                ConfigError::InvalidValue { key, .. } if key == ENV_BUSY_TIMEOUT_MS
            ));
        }
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}

//! Store configuration
//!
//! Loaded from a TOML document or from `OCTO_*` environment variables (after
//! reading an optional `.env` file). Missing values fall back to defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{config_error, io_error, Result};

pub const ENV_DB_PATH: &str = "OCTO_DB_PATH";
pub const ENV_CACHE_HOST: &str = "OCTO_CACHE_HOST";
pub const ENV_CACHE_PORT: &str = "OCTO_CACHE_PORT";
pub const ENV_CACHE_TIMEOUT_MS: &str = "OCTO_CACHE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    /// Connect, read and write timeout
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("octocore.db"),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            timeout_ms: 250,
        }
    }
}

impl CacheConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl StoreConfig {
    /// # Errors
    ///
    /// `InvalidInput` when the document is not valid TOML for this shape.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| config_error(e.to_string()))
    }

    /// # Errors
    ///
    /// `Io` when the file cannot be read, otherwise as [`StoreConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| io_error("load_config", e))?;
        Self::from_toml_str(&source)
    }

    /// Defaults overridden by `OCTO_*` variables, reading `.env` first if present
    ///
    /// # Errors
    ///
    /// `InvalidInput` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(host) = lookup(ENV_CACHE_HOST) {
            config.cache.host = host;
        }
        if let Some(port) = lookup(ENV_CACHE_PORT) {
            config.cache.port = parse_number(ENV_CACHE_PORT, &port)?;
        }
        if let Some(timeout) = lookup(ENV_CACHE_TIMEOUT_MS) {
            config.cache.timeout_ms = parse_number(ENV_CACHE_TIMEOUT_MS, &timeout)?;
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| config_error(format!("{} must be a number, got '{}'", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database_path, PathBuf::from("octocore.db"));
        assert_eq!(config.cache.url(), "redis://127.0.0.1:6379/");
        assert_eq!(config.cache.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StoreConfig::from_toml_str(
            r#"
            database_path = "/var/lib/octo/analytics.db"

            [cache]
            host = "cache.internal"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/octo/analytics.db"));
        assert_eq!(config.cache.host, "cache.internal");
        assert_eq!(config.cache.port, 6379);
    }

    #[test]
    fn test_invalid_toml_is_invalid_input() {
        let err = StoreConfig::from_toml_str("cache = 3").unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_INPUT");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_DB_PATH, "scratch.db"),
            (ENV_CACHE_PORT, "6380"),
            (ENV_CACHE_TIMEOUT_MS, "1000"),
        ]
        .into_iter()
        .collect();

        let config = StoreConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("scratch.db"));
        assert_eq!(config.cache.host, "127.0.0.1");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.cache.timeout_ms, 1000);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = StoreConfig::from_lookup(|k| (k == ENV_CACHE_PORT).then(|| "http".to_string()))
            .unwrap_err();
        assert!(err.message().contains(ENV_CACHE_PORT));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("octo.toml");
        std::fs::write(&path, "[cache]\nport = 7000\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.cache.port, 7000);
    }
}

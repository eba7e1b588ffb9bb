//! Configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, a TOML file (either
//! the platform config directory or an explicit `--config` path), then
//! `PKGSYNC_`-prefixed environment variables. `PKGSYNC_RETRY__BACKOFF_MS`
//! style double underscores address nested fields.

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pkgsync_store::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "PKGSYNC_";
const DEFAULT_FEED_URL: &str = "https://packages.nuget.org/api/v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database: PathBuf,
    /// Base URL of the remote package feed.
    pub feed_url: String,
    /// Records per feed page during synchronization.
    pub batch_size: u32,
    /// Identifiers per edge query during graph traversal.
    pub chunk_size: usize,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempt budget per record write, first try included.
    pub max_attempts: u32,
    /// Fixed interval between attempts.
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            batch_size: pkgsync_engine::DEFAULT_BATCH_SIZE,
            chunk_size: pkgsync_graph::DEFAULT_CHUNK_SIZE,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 500 }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(config.max_attempts, Duration::from_millis(config.backoff_ms))
    }
}

impl Config {
    /// Load configuration, optionally from an explicit file.
    ///
    /// An explicit path must exist; the implicit platform path is merged
    /// only when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        figment = match path {
            Some(path) => figment.merge(Toml::file_exact(path)),
            None => match default_config_path() {
                Some(path) => figment.merge(Toml::file(path)),
                None => figment,
            },
        };
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Config)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "pkgsync")
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("pkgsync.db"))
        .unwrap_or_else(|| PathBuf::from("pkgsync.db"))
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.batch_size, pkgsync_engine::DEFAULT_BATCH_SIZE);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "feed_url = \"http://localhost:9000\"\nbatch_size = 25").unwrap();
        writeln!(file, "[retry]\nmax_attempts = 7\nbackoff_ms = 10").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.feed_url, "http://localhost:9000");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.retry.max_attempts, 7);
        // Untouched fields keep their defaults.
        assert_eq!(config.chunk_size, pkgsync_graph::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/pkgsync.toml")));
        assert!(result.is_err());
    }
}

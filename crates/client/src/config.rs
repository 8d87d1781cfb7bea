//! Client configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CURATOR_API_URL` | `http://localhost:8000` |
//! | `CURATOR_STORAGE` | `file` (`file`, `sqlite` or `memory`) |
//! | `CURATOR_STORAGE_PATH` | OS app data dir |
//! | `CURATOR_LOGOUT_PATH` | unset: no remote logout notification |
//! | `CURATOR_HTTP_TIMEOUT_SECS` | `30` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    /// Nothing survives the process; useful for kiosks and tests.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(StorageBackend::File),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage backend '{0}' (expected file, sqlite or memory)")]
    UnknownBackend(String),

    #[error("invalid HTTP timeout '{0}' (expected whole seconds)")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub storage: StorageBackend,
    pub storage_path: Option<PathBuf>,
    pub logout_path: Option<String>,
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage: StorageBackend::default(),
            storage_path: None,
            logout_path: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = get("CURATOR_STORAGE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        let http_timeout = match get("CURATOR_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            api_url: get("CURATOR_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            storage,
            storage_path: get("CURATOR_STORAGE_PATH").map(PathBuf::from),
            logout_path: get("CURATOR_LOGOUT_PATH"),
            http_timeout,
        })
    }
}

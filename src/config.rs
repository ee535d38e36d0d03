//! Client configuration.
//!
//! Settings are layered: built-in defaults, then the JSON config file at
//! `<config dir>/ibot/config.json` (if present), then environment variables.
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `IBOT_BASE_URL` | backend base URL |
//! | `IBOT_TOP_K` | retrieved chunks per query |
//! | `IBOT_IDLE_TIMEOUT_SECS` | max wait for the next stream chunk (`0` disables) |
//! | `IBOT_PARSE_TIMEOUT_SECS` | max wait for document parsing (`0` disables) |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_BASE_URL;
use crate::models::DEFAULT_TOP_K;

pub const ENV_BASE_URL: &str = "IBOT_BASE_URL";
pub const ENV_TOP_K: &str = "IBOT_TOP_K";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "IBOT_IDLE_TIMEOUT_SECS";
pub const ENV_PARSE_TIMEOUT_SECS: &str = "IBOT_PARSE_TIMEOUT_SECS";

/// Default deadline for `doc parse` / `doc reparse`
pub const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Configuration for talking to the backend.
///
/// # Example
///
/// ```
/// use ibot::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_base_url("http://localhost:18080/b/ibot")
///     .with_top_k(8)
///     .with_idle_timeout(Some(Duration::from_secs(60)));
/// assert_eq!(config.top_k, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Retrieved chunks per query (`k`)
    pub top_k: u32,
    /// Owner id sent when creating knowledge bases
    pub user_id: i64,
    /// Max wait for the next chunk of a chat stream
    pub idle_timeout: Option<Duration>,
    /// Poll interval while waiting for document parsing
    pub parse_poll_interval: Duration,
    /// Give up waiting for document parsing after this long
    pub parse_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            top_k: DEFAULT_TOP_K,
            user_id: 1,
            idle_timeout: None,
            parse_poll_interval: Duration::from_secs(2),
            parse_timeout: Some(DEFAULT_PARSE_TIMEOUT),
        }
    }
}

/// On-disk form; every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    top_k: Option<u32>,
    user_id: Option<i64>,
    idle_timeout_secs: Option<u64>,
    parse_poll_interval_secs: Option<u64>,
    parse_timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_parse_poll_interval(mut self, interval: Duration) -> Self {
        self.parse_poll_interval = interval;
        self
    }

    pub fn with_parse_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.parse_timeout = timeout;
        self
    }

    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ibot").join("config.json"))
    }

    /// Defaults, then the default config file, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path().as_deref())
    }

    /// Like [`ClientConfig::load`] with an explicit file; a missing file is skipped.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = path {
            if path.exists() {
                config = config.merge_file(path)?;
                tracing::debug!(path = %path.display(), "loaded config file");
            }
        }
        config.apply_env()
    }

    fn merge_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(url) = file.base_url {
            self = self.with_base_url(url);
        }
        if let Some(top_k) = file.top_k {
            self.top_k = validate_top_k("top_k", top_k)?;
        }
        if let Some(user_id) = file.user_id {
            self.user_id = user_id;
        }
        if let Some(secs) = file.idle_timeout_secs {
            self.idle_timeout = timeout_from_secs(secs);
        }
        if let Some(secs) = file.parse_poll_interval_secs {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "parse_poll_interval_secs".to_string(),
                    value: secs.to_string(),
                });
            }
            self.parse_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.parse_timeout_secs {
            self.parse_timeout = timeout_from_secs(secs);
        }
        Ok(self)
    }

    /// Override settings from `IBOT_*` environment variables.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self = self.with_base_url(url.trim());
            }
        }
        if let Ok(raw) = std::env::var(ENV_TOP_K) {
            let top_k = parse_env::<u32>(ENV_TOP_K, &raw)?;
            self.top_k = validate_top_k(ENV_TOP_K, top_k)?;
        }
        if let Ok(raw) = std::env::var(ENV_IDLE_TIMEOUT_SECS) {
            let secs = parse_env::<u64>(ENV_IDLE_TIMEOUT_SECS, &raw)?;
            self.idle_timeout = timeout_from_secs(secs);
        }
        if let Ok(raw) = std::env::var(ENV_PARSE_TIMEOUT_SECS) {
            let secs = parse_env::<u64>(ENV_PARSE_TIMEOUT_SECS, &raw)?;
            self.parse_timeout = timeout_from_secs(secs);
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn validate_top_k(key: &str, top_k: u32) -> Result<u32, ConfigError> {
    if top_k == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: top_k.to_string(),
        });
    }
    Ok(top_k)
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

//! Watchdog configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use watchdog_client::{ExplorerConfig, ForumConfig, RetryPolicy};
use watchdog_types::NetworkId;
use watchdog_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("{0}")]
    Invalid(String),
}

/// Configuration for an audit run.
///
/// Can be loaded from a TOML file via [`WatchdogConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Network the audited addresses belong to.
    #[serde(default)]
    pub network: NetworkId,

    /// Forum API base URL.
    #[serde(default = "default_forum_api_base")]
    pub forum_api_base: String,

    /// Forum group the polls live in.
    #[serde(default = "default_forum_group")]
    pub forum_group: String,

    #[serde(default = "default_forum_api_key")]
    pub forum_api_key: String,

    /// Sent as the `origin` header on forum calls.
    #[serde(default = "default_forum_origin")]
    pub forum_origin: String,

    /// Explorer API base URL. Defaults to the network's public explorer.
    #[serde(default)]
    pub explorer_api_base: Option<String>,

    /// Explorer web UI base used for report links.
    #[serde(default = "default_explorer_web_base")]
    pub explorer_web_base: String,

    /// Cells per explorer page.
    #[serde(default = "default_explorer_page_size")]
    pub explorer_page_size: u32,

    /// Upper bound on explorer pages per address.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Minimum gap between two outbound calls, in milliseconds.
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,

    /// Retries after the first attempt of a failed call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Reports go to `{output_dir}/{thread_id}/`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_forum_api_base() -> String {
    "https://dao.ckb.community/api".to_string()
}

fn default_forum_group() -> String {
    "neurontest".to_string()
}

fn default_forum_api_key() -> String {
    "metaforo_website".to_string()
}

fn default_forum_origin() -> String {
    "https://dao.ckb.community".to_string()
}

fn default_explorer_web_base() -> String {
    "https://explorer.app5.org".to_string()
}

fn default_explorer_page_size() -> u32 {
    watchdog_client::DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    watchdog_governance::DEFAULT_MAX_PAGES
}

fn default_request_spacing_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    3_000
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./vote_result")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WatchdogConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.explorer_page_size == 0 {
            return Err(ConfigError::Invalid("explorer_page_size must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn request_spacing(&self) -> Duration {
        Duration::from_millis(self.request_spacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn forum(&self) -> ForumConfig {
        ForumConfig {
            api_base: self.forum_api_base.clone(),
            group: self.forum_group.clone(),
            api_key: self.forum_api_key.clone(),
            origin: self.forum_origin.clone(),
            ..ForumConfig::default()
        }
    }

    pub fn explorer(&self) -> ExplorerConfig {
        ExplorerConfig {
            api_base: self
                .explorer_api_base
                .clone()
                .unwrap_or_else(|| self.network.default_explorer_api().to_string()),
            page_size: self.explorer_page_size,
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::default(),
            forum_api_base: default_forum_api_base(),
            forum_group: default_forum_group(),
            forum_api_key: default_forum_api_key(),
            forum_origin: default_forum_origin(),
            explorer_api_base: None,
            explorer_web_base: default_explorer_web_base(),
            explorer_page_size: default_explorer_page_size(),
            max_pages: default_max_pages(),
            request_spacing_ms: default_request_spacing_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            output_dir: default_output_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

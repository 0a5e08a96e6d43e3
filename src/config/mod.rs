//! Configuration handling for the link digest.
//!
//! Everything is read from environment variables with defaults that work
//! for a local run. Library callers that don't want the environment can
//! build [`FetcherConfig`] and [`PipelineConfig`] directly.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::extractor::js::JS_ONLY_DOMAINS;

pub const ENV_USER_AGENT: &str = "LINKDIGEST_USER_AGENT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LINKDIGEST_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "LINKDIGEST_CONNECT_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "LINKDIGEST_MAX_RETRIES";
pub const ENV_BACKOFF_BASE_MS: &str = "LINKDIGEST_BACKOFF_BASE_MS";
pub const ENV_MAX_BODY_BYTES: &str = "LINKDIGEST_MAX_BODY_BYTES";
pub const ENV_POLITENESS_DELAY_MS: &str = "LINKDIGEST_POLITENESS_DELAY_MS";
pub const ENV_CONCURRENCY: &str = "LINKDIGEST_CONCURRENCY";
pub const ENV_MAX_LINKS: &str = "LINKDIGEST_MAX_LINKS";
pub const ENV_LEDGER_PATH: &str = "LINKDIGEST_LEDGER_PATH";
pub const ENV_BOT_USER_ID: &str = "LINKDIGEST_BOT_USER_ID";
pub const ENV_MESSAGES_PATH: &str = "LINKDIGEST_MESSAGES_PATH";
pub const ENV_CHANNEL: &str = "LINKDIGEST_CHANNEL";
pub const ENV_JS_ONLY_HOSTS: &str = "LINKDIGEST_JS_ONLY_HOSTS";

/// Browser-like user agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; LinkDigest/0.1; +https://github.com/linkdigest/linkdigest)";
const DEFAULT_LEDGER_PATH: &str = "master_links.jsonl";
const DEFAULT_MESSAGES_PATH: &str = "messages.json";
const DEFAULT_CHANNEL: &str = "general";

/// Settings for the HTTP fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Total attempts per URL, including the first one.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_body_bytes: u64,
    /// Hosts (and their subdomains) that get a desktop browser user agent.
    pub js_only_hosts: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_body_bytes: 5 * 1024 * 1024,
            js_only_hosts: JS_ONLY_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Settings for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub politeness_delay: Duration,
    pub concurrency: usize,
    pub max_links: Option<usize>,
    pub bot_user_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            politeness_delay: Duration::from_secs(1),
            concurrency: 1,
            max_links: None,
            bot_user_id: None,
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    fetcher: FetcherConfig,
    pipeline: PipelineConfig,
    ledger_path: PathBuf,
    messages_path: PathBuf,
    channel: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = FetcherConfig::default();
        let fetcher = FetcherConfig {
            user_agent: env::var(ENV_USER_AGENT).unwrap_or(defaults.user_agent),
            request_timeout: parse_var(ENV_REQUEST_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            connect_timeout: parse_var(ENV_CONNECT_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            max_retries: parse_var(ENV_MAX_RETRIES)?.unwrap_or(defaults.max_retries),
            backoff_base: parse_var(ENV_BACKOFF_BASE_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
            max_body_bytes: parse_var(ENV_MAX_BODY_BYTES)?.unwrap_or(defaults.max_body_bytes),
            js_only_hosts: env::var(ENV_JS_ONLY_HOSTS)
                .ok()
                .map(|raw| parse_host_list(&raw))
                .unwrap_or(defaults.js_only_hosts),
        };
        if fetcher.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_MAX_RETRIES,
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            politeness_delay: parse_var(ENV_POLITENESS_DELAY_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.politeness_delay),
            concurrency: parse_var(ENV_CONCURRENCY)?.unwrap_or(defaults.concurrency),
            max_links: parse_var(ENV_MAX_LINKS)?,
            bot_user_id: env::var(ENV_BOT_USER_ID).ok().filter(|v| !v.is_empty()),
        };
        if pipeline.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_CONCURRENCY,
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            fetcher,
            pipeline,
            ledger_path: env::var(ENV_LEDGER_PATH)
                .unwrap_or_else(|_| DEFAULT_LEDGER_PATH.to_string())
                .into(),
            messages_path: env::var(ENV_MESSAGES_PATH)
                .unwrap_or_else(|_| DEFAULT_MESSAGES_PATH.to_string())
                .into(),
            channel: env::var(ENV_CHANNEL).unwrap_or_else(|_| DEFAULT_CHANNEL.to_string()),
        })
    }

    pub fn fetcher(&self) -> &FetcherConfig {
        &self.fetcher
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Append-only ledger of processed URLs.
    pub fn ledger_path(&self) -> &PathBuf {
        &self.ledger_path
    }

    /// Chat export read by the batch binary.
    pub fn messages_path(&self) -> &PathBuf {
        &self.messages_path
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            pipeline: PipelineConfig::default(),
            ledger_path: DEFAULT_LEDGER_PATH.into(),
            messages_path: DEFAULT_MESSAGES_PATH.into(),
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

// Comma separated, case-insensitive. An empty value disables substitution.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

fn parse_var<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

use crate::state::{IgnoreMode, IgnoreSet, DEFAULT_PROGRESS_INTERVAL};
use crate::storage::DEFAULT_EXTENSION;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

impl Config {
    /// Builds the ignore set described by the `[ignore]` table
    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::new(self.ignore.ids.iter().cloned(), self.ignore.mode)
    }
}

/// Traversal and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL prefix every node id is appended to
    #[serde(rename = "tree-root")]
    pub tree_root: String,

    /// Id of the node the crawl starts from
    #[serde(rename = "root-id")]
    pub root_id: String,

    /// Maximum recursion depth below the root
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Extra attempts after the first failed request
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds), doubled each attempt
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on the retry delay (milliseconds)
    #[serde(rename = "max-retry-delay-ms", default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Question count between progress notifications
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Where operators of the remote corpus can learn about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory mirrored documents are written to
    pub directory: String,

    /// File extension, without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Ignore list configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IgnoreConfig {
    /// Node ids to skip
    #[serde(default)]
    pub ids: Vec<String>,

    /// How ids are matched against entries
    #[serde(default)]
    pub mode: IgnoreMode,
}

fn default_max_depth() -> u32 {
    256
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_delay_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

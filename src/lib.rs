//! qtree-mirror: mirrors a remote question-tree corpus to disk
//!
//! This crate walks a tree of XML documents served one node per URL
//! (`<tree-root><TextId>/xml`), writes every reachable node to a local
//! directory and sums the `QuestionsNum` values found on leaf nodes.

pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl setup and orchestration
///
/// Per-node failures never surface here; they are recorded in the
/// [`output::CrawlReport`] instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Node id cannot be empty")]
    EmptyNodeId,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{DocumentFetcher, TreeCrawler};
pub use document::{NodeId, TreeDocument};
pub use output::CrawlReport;
pub use state::{IgnoreSet, NodeState, QuestionCounter, VisitedSet};

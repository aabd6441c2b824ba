//! Crawler module for fetching and walking the question tree
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry and backoff
//! - Depth-first traversal with visited and ignore tracking
//! - Cancellation of a running crawl

mod cancel;
mod fetcher;
mod retry;
mod traversal;

pub use cancel::CancelFlag;
pub use fetcher::{build_http_client, DocumentFetcher, FetchError};
pub use retry::RetryPolicy;
pub use traversal::TreeCrawler;

use crate::config::Config;
use crate::document::NodeId;
use crate::output::CrawlReport;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and retry policy
/// 2. Open the output directory
/// 3. Walk the tree from the configured root id
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to completion (individual nodes may have failed)
/// * `Err(CrawlError)` - Setup or storage failed
pub async fn crawl(config: &Config) -> Result<CrawlReport, CrawlError> {
    let mut crawler = TreeCrawler::from_config(config)?;
    crawler
        .crawl(&NodeId::from(config.crawler.root_id.as_str()))
        .await
}

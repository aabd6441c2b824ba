//! Output module for crawl results
//!
//! This module handles:
//! - The structured per-node report returned by a crawl
//! - Statistics derived from that report and their console rendering

mod report;
pub mod stats;

pub use report::{CrawlReport, NodeOutcome};
pub use stats::{compute_statistics, print_statistics, CrawlStatistics};

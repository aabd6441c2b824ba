//! Statistics generation from a crawl report
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics once a traversal has finished.

use crate::output::CrawlReport;
use crate::state::NodeState;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Nodes that reached a terminal state
    pub total_nodes: u64,

    /// Count of nodes by terminal state
    pub nodes_by_state: HashMap<NodeState, u64>,

    /// Files written to the output directory
    pub files_written: u64,

    /// Sum of leaf question counts
    pub total_questions: u64,

    /// Deepest node reached
    pub max_depth_reached: u32,

    /// Ids of failed nodes with their errors
    pub failures: Vec<(String, String)>,

    pub duration_seconds: Option<u64>,

    pub cancelled: bool,
}

/// Computes statistics from a report
pub fn compute_statistics(report: &CrawlReport) -> CrawlStatistics {
    let mut nodes_by_state = HashMap::new();
    for state in NodeState::terminal_states() {
        let count = report.count(state) as u64;
        if count > 0 {
            nodes_by_state.insert(state, count);
        }
    }

    let failures = report
        .failures()
        .map(|o| {
            (
                o.id.to_string(),
                o.error.clone().unwrap_or_else(|| o.state.to_string()),
            )
        })
        .collect();

    CrawlStatistics {
        total_nodes: report.outcomes.len() as u64,
        nodes_by_state,
        files_written: report.persisted_files() as u64,
        total_questions: report.total_questions,
        max_depth_reached: report.outcomes.iter().map(|o| o.depth).max().unwrap_or(0),
        failures,
        duration_seconds: report.duration_seconds(),
        cancelled: report.cancelled,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Nodes processed: {}", stats.total_nodes);
    println!("  Files written: {}", stats.files_written);
    println!("  Total questions: {}", stats.total_questions);
    println!("  Deepest node: {}", stats.max_depth_reached);
    if let Some(seconds) = stats.duration_seconds {
        println!("  Duration: {}s", seconds);
    }
    if stats.cancelled {
        println!("  Crawl was cancelled before completion");
    }
    println!();

    println!("Nodes by State:");
    // Sort states by count (descending)
    let mut state_counts: Vec<_> = stats.nodes_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_nodes > 0 {
            (*count as f64 / stats.total_nodes as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }

    if !stats.failures.is_empty() {
        println!();
        println!("Failures:");
        for (id, error) in &stats.failures {
            println!("  {}: {}", id, error);
        }
    }
}

//! Structured result of one crawl
//!
//! Every node that reaches a terminal state gets exactly one
//! [`NodeOutcome`]. The report replaces console output as the way a
//! caller learns which subtrees were mirrored, skipped or lost.

use crate::document::NodeId;
use crate::state::NodeState;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Terminal outcome of a single node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
    pub id: NodeId,

    /// Terminal state the node ended in
    pub state: NodeState,

    /// Distance from the crawl root
    pub depth: u32,

    /// Questions added to the total (leaf nodes only)
    pub questions: Option<u64>,

    /// Where the document was written, if it was
    pub path: Option<PathBuf>,

    /// Error description for failed nodes
    pub error: Option<String>,
}

impl NodeOutcome {
    pub fn new(id: NodeId, state: NodeState, depth: u32) -> Self {
        Self {
            id,
            state,
            depth,
            questions: None,
            path: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Summary of one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub root: NodeId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Outcomes in the order nodes reached their terminal state
    pub outcomes: Vec<NodeOutcome>,

    /// Sum of `QuestionsNum` over counted leaves
    pub total_questions: u64,

    /// Progress milestones crossed, in order
    pub milestones: Vec<u64>,

    /// True if the crawl stopped early on request
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            total_questions: 0,
            milestones: Vec::new(),
            cancelled: false,
        }
    }

    pub fn record(&mut self, outcome: NodeOutcome) {
        self.outcomes.push(outcome);
    }

    /// Drops the outcome recorded for a node
    ///
    /// Used when a node that was cut off by the depth bound is later
    /// entered through a shorter path.
    pub fn discard(&mut self, id: &str) {
        self.outcomes.retain(|o| o.id.as_str() != id);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of nodes that ended in the given state
    pub fn count(&self, state: NodeState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Number of documents actually written to storage
    pub fn persisted_files(&self) -> usize {
        self.outcomes.iter().filter(|o| o.path.is_some()).count()
    }

    /// Looks up the outcome of a node
    pub fn outcome(&self, id: &str) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| o.id.as_str() == id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.outcomes.iter().filter(|o| o.state.is_error())
    }

    /// Whole seconds between start and finish
    pub fn duration_seconds(&self) -> Option<u64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds().max(0) as u64)
    }
}

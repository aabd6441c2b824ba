//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `NodeState`: lifecycle of a single node (fetching, persisted, leaf, ...)
//! - `VisitedSet`: ids already entered in the current crawl
//! - `IgnoreSet`: caller-supplied ids that are never entered
//! - `QuestionCounter`: running question total with progress milestones

mod counter;
mod node_sets;
mod node_state;

// Re-export main types
pub use counter::{QuestionCounter, DEFAULT_PROGRESS_INTERVAL};
pub use node_sets::{IgnoreMode, IgnoreSet, VisitedSet};
pub use node_state::NodeState;

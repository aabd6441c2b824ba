use crate::document::NodeId;
use serde::Deserialize;
use std::collections::HashSet;

/// Ids already entered during one crawl
///
/// A node is marked before its document is requested, so neither a
/// self-listing nor a cycle between distinct nodes can re-enter it.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    ids: HashSet<NodeId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a node as visited
    ///
    /// Returns false if the node was already present.
    pub fn mark(&mut self, id: &NodeId) -> bool {
        self.ids.insert(id.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// How ignore-list entries are compared against node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreMode {
    /// The id must equal an entry
    #[default]
    Exact,

    /// The id must appear inside an entry
    Substring,
}

/// Caller-supplied ids excluded from traversal
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    entries: Vec<String>,
    mode: IgnoreMode,
}

impl IgnoreSet {
    pub fn new<I, S>(entries: I, mode: IgnoreMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// An ignore set that excludes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Checks whether a node id is excluded
    pub fn is_ignored(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }

        match self.mode {
            IgnoreMode::Exact => self.entries.iter().any(|entry| entry == id),
            IgnoreMode::Substring => self.entries.iter().any(|entry| entry.contains(id)),
        }
    }

    pub fn mode(&self) -> IgnoreMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

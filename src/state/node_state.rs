/// Node state definitions for tracking traversal progress
///
/// Every node moves through
/// `Unvisited -> Fetching -> {Discarded | Persisted} -> {Branch | Leaf}`.
/// Nodes that cannot be fetched end up `Failed`; nodes never fetched
/// because of the ignore list or the depth bound end up `Ignored` or
/// `DepthExceeded`.
use std::fmt;

/// Represents the current state of a node in the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    // ===== Active States =====
    /// Node id is known but its document has not been requested
    Unvisited,

    /// Node document is being fetched
    Fetching,

    /// Node document was written to storage, children not yet examined
    Persisted,

    // ===== Terminal Success States =====
    /// At least one child reached `Persisted`
    Branch,

    /// No child reached `Persisted`; question count was folded in
    Leaf,

    // ===== Terminal Skip States =====
    /// Document listed no `TextId` values - not persisted, not counted
    Discarded,

    /// Node id matched the ignore list
    Ignored,

    // ===== Terminal Error States =====
    /// Fetch or parse failed after the retry policy gave up
    Failed,

    /// Node lies deeper than the configured maximum depth
    DepthExceeded,
}

impl NodeState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (node may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Unvisited | Self::Fetching | Self::Persisted)
    }

    /// Returns true if the node's document reached storage
    ///
    /// Only such nodes count as "real" children of their parent.
    pub fn was_persisted(&self) -> bool {
        matches!(self, Self::Persisted | Self::Branch | Self::Leaf)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::DepthExceeded)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        use NodeState::*;
        matches!(
            (self, next),
            (Unvisited, Fetching)
                | (Unvisited, Ignored)
                | (Unvisited, DepthExceeded)
                | (Fetching, Discarded)
                | (Fetching, Persisted)
                | (Fetching, Failed)
                | (Persisted, Branch)
                | (Persisted, Leaf)
        )
    }

    /// Moves to `next`, asserting the transition is legal in debug builds
    pub fn advance(&mut self, next: NodeState) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal node transition {} -> {}",
            self,
            next
        );
        *self = next;
    }

    /// Short lowercase label, used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::Fetching => "fetching",
            Self::Persisted => "persisted",
            Self::Branch => "branch",
            Self::Leaf => "leaf",
            Self::Discarded => "discarded",
            Self::Ignored => "ignored",
            Self::Failed => "failed",
            Self::DepthExceeded => "depth_exceeded",
        }
    }

    /// Returns all terminal states, in report order
    pub fn terminal_states() -> [Self; 6] {
        [
            Self::Branch,
            Self::Leaf,
            Self::Discarded,
            Self::Ignored,
            Self::Failed,
            Self::DepthExceeded,
        ]
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

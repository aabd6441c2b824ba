//! URL helpers for the question tree
//!
//! Every node lives at `<tree-root><node-id>/xml`. The tree root is used
//! verbatim as a prefix, so it normally ends with a `/`.

use crate::{UrlError, UrlResult};
use ::url::Url;

/// Path suffix appended after the node id
pub const NODE_SUFFIX: &str = "/xml";

/// Builds the document URL for a node
///
/// The id is interpolated as-is into the template and the result is
/// checked for well-formedness.
///
/// # Example
///
/// ```
/// use qtree_mirror::url::node_url;
///
/// let url = node_url("https://db.example.org/tree/", "R").unwrap();
/// assert_eq!(url.as_str(), "https://db.example.org/tree/R/xml");
/// ```
pub fn node_url(tree_root: &str, node_id: &str) -> UrlResult<Url> {
    if node_id.is_empty() {
        return Err(UrlError::EmptyNodeId);
    }

    let raw = format!("{}{}{}", tree_root, node_id, NODE_SUFFIX);
    Url::parse(&raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))
}

/// Validates a tree root prefix
///
/// Only `http` and `https` roots are accepted.
pub fn validate_tree_root(tree_root: &str) -> UrlResult<Url> {
    let url = Url::parse(tree_root).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

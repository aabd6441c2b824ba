//! Document model for question-tree nodes
//!
//! Each node of the remote corpus is a small XML document. The crawler
//! only cares about two tags:
//!
//! - `TextId` - every occurrence names a node. The first one is the
//!   document's own id, the rest are its children (the own id may repeat).
//! - `QuestionsNum` - number of questions on a leaf node. Optional.
//!
//! The raw bytes are kept so the document can be written back verbatim.

mod parser;

pub use parser::{collect_elements, decode_document, parse_document};

use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

/// Tag carrying node identifiers
pub const TEXT_ID_TAG: &str = "TextId";

/// Tag carrying the question count of a leaf node
pub const QUESTIONS_NUM_TAG: &str = "QuestionsNum";

/// Errors raised while parsing a node document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Bytes do not match the encoding named by the BOM or declaration
    #[error("Document is not valid {0}")]
    Undecodable(&'static str),

    #[error("Unclosed element <{0}> at end of document")]
    Unbalanced(String),

    #[error("Document has no root element")]
    Empty,
}

/// Opaque identifier of one node in the remote corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A parsed node document
#[derive(Debug, Clone)]
pub struct TreeDocument {
    /// Value of the first `TextId` element, if non-empty
    pub self_id: Option<NodeId>,

    /// Every non-empty `TextId` value in document order (may include `self_id`)
    pub child_ids: Vec<NodeId>,

    /// First `QuestionsNum` value, when present and numeric
    pub questions_num: Option<u64>,

    raw: Vec<u8>,
}

impl TreeDocument {
    /// Parses a document from raw bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        parse_document(bytes)
    }

    pub(crate) fn from_parts(
        self_id: Option<NodeId>,
        child_ids: Vec<NodeId>,
        questions_num: Option<u64>,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            self_id,
            child_ids,
            questions_num,
            raw,
        }
    }

    /// Returns the text content of every element with the given tag
    pub fn elements_by_tag(&self, tag: &str) -> Result<Vec<String>, DocumentError> {
        let xml = std::str::from_utf8(&self.raw)?;
        Ok(collect_elements(xml, &[tag])?
            .into_iter()
            .map(|(_, text)| text)
            .collect())
    }

    /// Returns the serialized document, byte-for-byte as fetched
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns true if the document names no nodes at all
    pub fn is_discardable(&self) -> bool {
        self.child_ids.is_empty()
    }
}

//! XML parser for node documents
//!
//! This module walks the XML event stream once and gathers the text
//! content of the elements the crawler is interested in. Text of nested
//! elements is included, the same way a DOM `textContent` would be.

use crate::document::{DocumentError, NodeId, TreeDocument, QUESTIONS_NUM_TAG, TEXT_ID_TAG};
use quick_xml::encoding::{decode, detect_encoding};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;

/// Parses a node document from raw bytes
///
/// # Extraction Rules
///
/// - `child_ids`: every `TextId` element, trimmed, empty values dropped
/// - `self_id`: the first `TextId` element, if its value is non-empty
/// - `questions_num`: the first `QuestionsNum` element parsed as an
///   unsigned integer; anything else yields `None`
///
/// # Example
///
/// ```
/// use qtree_mirror::document::parse_document;
///
/// let xml = b"<Node><TextId>R</TextId><TextId>A</TextId></Node>";
/// let doc = parse_document(xml).unwrap();
/// assert_eq!(doc.self_id.unwrap().as_str(), "R");
/// assert_eq!(doc.child_ids.len(), 2);
/// ```
pub fn parse_document(bytes: &[u8]) -> Result<TreeDocument, DocumentError> {
    let xml = decode_document(bytes)?;
    let elements = collect_elements(&xml, &[TEXT_ID_TAG, QUESTIONS_NUM_TAG])?;

    let mut text_ids = Vec::new();
    let mut questions = None;

    for (tag_index, text) in elements {
        if tag_index == 0 {
            text_ids.push(text);
        } else if questions.is_none() {
            questions = Some(text);
        }
    }

    let self_id = text_ids
        .first()
        .filter(|id| !id.is_empty())
        .map(|id| NodeId::new(id.as_str()));

    let child_ids = text_ids
        .into_iter()
        .filter(|id| !id.is_empty())
        .map(NodeId::from)
        .collect();

    let questions_num = questions.and_then(|raw| match raw.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::debug!("Ignoring non-numeric {} value: {:?}", QUESTIONS_NUM_TAG, raw);
            None
        }
    });

    Ok(TreeDocument::from_parts(
        self_id,
        child_ids,
        questions_num,
        bytes.to_vec(),
    ))
}

/// Decodes raw document bytes to text
///
/// A byte order mark or a UTF-16 byte pattern decides the encoding first.
/// Otherwise the `encoding` attribute of the XML declaration is used, and
/// documents without one are read as UTF-8.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, DocumentError> {
    if let Some((encoding, bom_len)) = detect_encoding(bytes) {
        if bom_len > 0 || !encoding.is_ascii_compatible() {
            return decode(&bytes[bom_len..], encoding)
                .map_err(|_| DocumentError::Undecodable(encoding.name()));
        }
    }

    // ASCII-compatible input: the declaration itself is readable as bytes
    let mut reader = Reader::from_reader(bytes);
    let declared = match reader.read_event() {
        Ok(Event::Decl(decl)) => decl.encoder(),
        _ => None,
    };

    match declared.filter(|encoding| encoding.is_ascii_compatible()) {
        Some(encoding) => {
            decode(bytes, encoding).map_err(|_| DocumentError::Undecodable(encoding.name()))
        }
        None => Ok(Cow::Borrowed(std::str::from_utf8(bytes)?)),
    }
}

/// Collects the trimmed text content of every element whose local name
/// is in `tags`
///
/// Returns `(index into tags, text)` pairs in document order. The whole
/// document is read, so a malformed tail is reported even when the
/// interesting elements come first.
pub fn collect_elements(xml: &str, tags: &[&str]) -> Result<Vec<(usize, String)>, DocumentError> {
    let mut reader = Reader::from_str(xml);

    let mut results: Vec<(usize, String)> = Vec::new();
    // (depth at which the element was opened, index into results)
    let mut open_captures: Vec<(usize, usize)> = Vec::new();
    let mut open_elements: Vec<String> = Vec::new();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| DocumentError::Xml {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                saw_root = true;

                if let Some(tag_index) = tags.iter().position(|t| *t == name) {
                    results.push((tag_index, String::new()));
                    open_captures.push((open_elements.len(), results.len() - 1));
                }
                open_elements.push(name);
            }
            Event::Empty(start) => {
                let name = start.local_name();
                saw_root = true;

                if let Some(tag_index) = tags.iter().position(|t| t.as_bytes() == name.as_ref()) {
                    results.push((tag_index, String::new()));
                }
            }
            Event::End(_) => {
                open_elements.pop();
                if let Some(&(depth, _)) = open_captures.last() {
                    if depth == open_elements.len() {
                        open_captures.pop();
                    }
                }
            }
            Event::Text(text) => {
                let text = std::str::from_utf8(&text)?;
                append_text(&mut results, &open_captures, text);
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)?;
                append_text(&mut results, &open_captures, text);
            }
            Event::GeneralRef(reference) => {
                let name = std::str::from_utf8(&reference)?;
                let entity = format!("&{};", name);
                let resolved = unescape(&entity).map_err(|e| DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                append_text(&mut results, &open_captures, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open_elements.pop() {
        return Err(DocumentError::Unbalanced(unclosed));
    }
    if !saw_root {
        return Err(DocumentError::Empty);
    }

    for (_, text) in results.iter_mut() {
        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            *text = trimmed.to_string();
        }
    }

    Ok(results)
}

fn append_text(results: &mut [(usize, String)], open_captures: &[(usize, usize)], text: &str) {
    for &(_, index) in open_captures {
        results[index].1.push_str(text);
    }
}

//! # Document Module
//!
//! A minimal structural view of a PDF: the ordered page list (1-indexed) with
//! each page's object id and media box, plus the raw bytes the view was parsed
//! from. Parsing is delegated to `lopdf`; this module only validates that the
//! page tree can be reached and exposes what the checksum, annotation and
//! signing code need.
//!
//! A [`Document`] is read-only. Operations that change content, such as
//! [`apply_annotation`](crate::annotation::apply_annotation), serialise a new
//! byte stream and parse it into a fresh `Document`.

use crate::error::ParseError;
use lopdf::{Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How far into the stream the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Bound on `/Parent` hops when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// US Letter, used when neither a page nor its ancestors carry a `/MediaBox`.
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// A rectangle in PDF user space (lower-left and upper-right corners).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl Rect {
    /// Build a normalised rectangle from two arbitrary corners.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// One page of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    number: u32,
    id: ObjectId,
    media_box: Rect,
}

impl Page {
    /// 1-indexed page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    /// The page's media box, resolved through `/Parent` inheritance.
    pub fn media_box(&self) -> Rect {
        self.media_box
    }
}

/// Metadata reported before signing or watermarking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub byte_length: usize,
    pub version: String,
}

/// Parsed page-level structure of a PDF.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    inner: lopdf::Document,
    pages: Vec<Page>,
}

impl Document {
    /// Parse a PDF byte stream.
    ///
    /// Fails with [`ParseError::NotAPdf`] when no `%PDF-` header is present
    /// near the start of the stream and with [`ParseError::Corrupt`] when the
    /// body, trailer or page tree cannot be traversed.
    pub fn load(bytes: impl Into<Vec<u8>>) -> Result<Self, ParseError> {
        let bytes = bytes.into();
        if !has_pdf_header(&bytes) {
            return Err(ParseError::NotAPdf);
        }

        let inner =
            lopdf::Document::load_mem(&bytes).map_err(|e| ParseError::Corrupt(e.to_string()))?;
        check_page_tree(&inner)?;

        let pages = inner
            .get_pages()
            .into_iter()
            .map(|(number, id)| Page {
                number,
                id,
                media_box: resolve_media_box(&inner, id),
            })
            .collect::<Vec<_>>();

        log::debug!(
            "parsed PDF {} ({} bytes, {} pages)",
            inner.version,
            bytes.len(),
            pages.len()
        );

        Ok(Self {
            bytes,
            inner,
            pages,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Look up a page by its 1-indexed number.
    pub fn page(&self, number: u32) -> Option<&Page> {
        number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            page_count: self.page_count(),
            byte_length: self.bytes.len(),
            version: self.inner.version.clone(),
        }
    }

    /// The exact bytes this document was parsed from.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub(crate) fn lopdf(&self) -> &lopdf::Document {
        &self.inner
    }
}

/// Number of pages in `doc`.
pub fn page_count(doc: &Document) -> u32 {
    doc.page_count()
}

/// Minimal metadata needed before signing or watermarking.
pub fn info(doc: &Document) -> DocumentInfo {
    doc.info()
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

fn check_page_tree(doc: &lopdf::Document) -> Result<(), ParseError> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| ParseError::Corrupt("trailer has no /Root catalog reference".to_string()))?;
    let catalog = doc
        .get_dictionary(root_id)
        .map_err(|e| ParseError::Corrupt(format!("catalog {root_id:?} unreadable: {e}")))?;
    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| ParseError::Corrupt("catalog has no /Pages reference".to_string()))?;
    let pages = doc
        .get_dictionary(pages_id)
        .map_err(|e| ParseError::Corrupt(format!("page tree root {pages_id:?} unreadable: {e}")))?;

    let leaves = count_leaves(doc, pages_id)?;
    match pages.get(b"Count").and_then(Object::as_i64) {
        Ok(count) if count != leaves as i64 => Err(ParseError::Corrupt(format!(
            "page tree declares /Count {count} but {leaves} pages are reachable"
        ))),
        _ => Ok(()),
    }
}

/// Walk `/Kids` from `root`, counting leaf pages. A node reached twice means
/// the tree is cyclic or shared and cannot be traversed.
fn count_leaves(doc: &lopdf::Document, root: ObjectId) -> Result<usize, ParseError> {
    let mut visited = BTreeSet::new();
    let mut pending = vec![root];
    let mut leaves = 0;

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            return Err(ParseError::Corrupt(format!(
                "page tree node {id:?} is reachable more than once"
            )));
        }
        let node = doc
            .get_dictionary(id)
            .map_err(|e| ParseError::Corrupt(format!("page tree node {id:?} unreadable: {e}")))?;
        let Ok(kids) = node.get(b"Kids") else {
            if !matches!(node.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages") {
                leaves += 1;
            }
            continue;
        };
        let kids = resolve(doc, kids)
            .as_array()
            .map_err(|_| {
                ParseError::Corrupt(format!("page tree node {id:?} has malformed /Kids"))
            })?;
        for kid in kids {
            let kid = kid.as_reference().map_err(|_| {
                ParseError::Corrupt(format!("page tree node {id:?} has a direct kid"))
            })?;
            pending.push(kid);
        }
    }
    Ok(leaves)
}

fn resolve<'a>(doc: &'a lopdf::Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub(crate) fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn parse_rect(doc: &lopdf::Document, object: &Object) -> Option<Rect> {
    let items = resolve(doc, object).as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = as_number(resolve(doc, item))?;
    }
    Some(Rect::from_corners(values[0], values[1], values[2], values[3]))
}

fn resolve_media_box(doc: &lopdf::Document, page_id: ObjectId) -> Rect {
    let mut current = doc.get_dictionary(page_id).ok();
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let Some(dict) = current else { break };
        if let Some(rect) = dict.get(b"MediaBox").ok().and_then(|o| parse_rect(doc, o)) {
            return rect;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    DEFAULT_MEDIA_BOX
}

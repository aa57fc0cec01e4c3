//! The host editor, seen from the engine.
//!
//! `erbalist-core` never talks to an editor API directly. The host implements [`Host`] to
//! expose document snapshots, structural fold ranges and a paint sink, and forwards its events
//! to [`crate::Engine`].

use crate::decorations::{DecorationGroup, PaintRegion};
use crate::error::ErbalistError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Opaque identifier of a host document (its URI).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    /// Create an id from a document URI or path.
    pub fn new(uri: impl AsRef<str>) -> Self {
        Self(Arc::from(uri.as_ref()))
    }

    /// The document URI.
    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

/// An inclusive range of logical lines (`start_line..=end_line`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineRange {
    /// First line (0-based).
    pub start_line: usize,
    /// Last line (0-based, inclusive).
    pub end_line: usize,
}

impl LineRange {
    /// Create a new line range.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Returns `true` if `line` lies within the range.
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// A structural fold range request, stamped with the document generation it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FoldRangeRequest {
    /// The document whose structure is requested.
    pub document: DocumentId,
    /// The document generation at request time.
    pub generation: u64,
}

/// The host's answer to a [`FoldRangeRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldRangeResponse {
    /// Fold ranges are available right away (possibly empty).
    Ready(Vec<LineRange>),
    /// The host will answer later through [`crate::Engine::complete_fold_ranges`].
    Pending,
}

/// How the cursor got where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionKind {
    /// Keyboard navigation or typing.
    #[default]
    Keyboard,
    /// A mouse click.
    Mouse,
    /// A programmatic change (commands, the engine itself).
    Command,
}

/// The host editor collaborator surface.
///
/// Offsets are character offsets. Methods with default bodies are optional capabilities.
pub trait Host {
    /// Returns `true` while the document is open.
    fn is_open(&self, doc: &DocumentId) -> bool;

    /// Full text of an open document.
    fn document_text(&self, doc: &DocumentId) -> Option<String>;

    /// Primary cursor offset of an open document.
    fn cursor_offset(&self, doc: &DocumentId) -> Option<usize>;

    /// Returns `true` if the primary selection is non-empty.
    fn has_selection(&self, _doc: &DocumentId) -> bool {
        false
    }

    /// Ask for structural fold ranges (best-effort, may be empty).
    ///
    /// An `Err` is treated as "no structural data".
    fn request_fold_ranges(
        &mut self,
        _request: FoldRangeRequest,
    ) -> Result<FoldRangeResponse, ErbalistError> {
        Ok(FoldRangeResponse::Ready(Vec::new()))
    }

    /// Replace every region of `group` in `doc` with `regions`.
    fn apply_paint(&mut self, doc: &DocumentId, group: DecorationGroup, regions: Vec<PaintRegion>);

    /// Current settings tree (JSON). `Null` means defaults.
    fn configuration(&self) -> Value {
        Value::Null
    }

    /// Documents currently visible in the host.
    fn visible_documents(&self) -> Vec<DocumentId> {
        Vec::new()
    }

    /// Publish a boolean context flag (drives menus and key bindings in the host).
    fn set_context_flag(&mut self, _key: &str, _value: bool) {}

    /// Toggle soft line wrap for a document.
    fn toggle_word_wrap(&mut self, _doc: &DocumentId) {}

    /// Move the primary cursor.
    fn set_cursor_offset(&mut self, _doc: &DocumentId, _offset: usize) {}

    /// Fold the structural regions starting at these lines.
    fn fold_lines(&mut self, _doc: &DocumentId, _start_lines: &[usize]) {}

    /// Unfold every structural region.
    fn unfold_all(&mut self, _doc: &DocumentId) {}

    /// Persisted toggle state for a document, as written by [`Host::persist_toggles`].
    fn load_persisted_toggles(&self, _doc: &DocumentId) -> Option<String> {
        None
    }

    /// Persist toggle state for a document across sessions.
    fn persist_toggles(&mut self, _doc: &DocumentId, _state: &str) {}
}

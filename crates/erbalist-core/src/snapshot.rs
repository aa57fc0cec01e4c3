//! Document snapshots: the immutable input of one resolution pass.

use crate::line_index::LineIndex;

/// Text plus cursor of one document, captured at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    text: String,
    cursor: usize,
    has_selection: bool,
    char_count: usize,
}

impl DocumentSnapshot {
    /// Capture a snapshot. The cursor is clamped to the text length (in chars).
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let char_count = text.chars().count();
        Self {
            cursor: cursor.min(char_count),
            text,
            has_selection: false,
            char_count,
        }
    }

    /// Mark the primary selection as non-empty.
    pub fn with_selection(mut self, has_selection: bool) -> Self {
        self.has_selection = has_selection;
        self
    }

    /// The document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor offset, in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the primary selection is non-empty.
    pub fn has_selection(&self) -> bool {
        self.has_selection
    }

    /// Text length, in chars.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Build a line index over the snapshot text.
    pub fn line_index(&self) -> LineIndex {
        LineIndex::from_text(&self.text)
    }
}

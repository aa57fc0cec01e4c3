//! Character-offset ranges and byte/char offset conversion.
//!
//! Every public offset in this crate is a Unicode scalar value (`char`) offset. The `regex`
//! crate reports byte offsets, so scanners convert them on the way out.

/// A half-open character-offset range (`start..end`) in a document snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextRange {
    /// Range start offset (inclusive), in `char`s from the start of the document.
    pub start: usize,
    /// Range end offset (exclusive), in `char`s from the start of the document.
    pub end: usize,
}

impl TextRange {
    /// Create a new range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the range in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Cursor containment, inclusive of both boundary offsets.
    ///
    /// A cursor sitting right before the first character or right after the last one counts as
    /// inside.
    pub fn contains_cursor(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Returns `true` if `other` lies entirely within `self`.
    pub fn encloses(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two ranges share at least one character.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Converts monotonically increasing byte offsets of one `&str` into char offsets.
///
/// Scanners emit matches left to right, so each conversion only counts the characters between
/// the previous offset and the requested one. Going backwards restarts from the beginning.
#[derive(Debug, Clone)]
pub(crate) struct CharCounter<'t> {
    text: &'t str,
    byte: usize,
    chars: usize,
}

impl<'t> CharCounter<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Char offset of `byte_offset` (clamped to the text length).
    pub(crate) fn char_offset(&mut self, byte_offset: usize) -> usize {
        let target = byte_offset.min(self.text.len());
        if target < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..target].chars().count();
        self.byte = target;
        self.chars
    }

    /// Char range of a byte range.
    pub(crate) fn range(&mut self, start_byte: usize, end_byte: usize) -> TextRange {
        let start = self.char_offset(start_byte);
        let end = self.char_offset(end_byte);
        TextRange::new(start, end)
    }
}

/// Byte offset of a char offset in `text` (clamped to the text length).
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Slice `text` by a char range.
pub(crate) fn slice(text: &str, range: TextRange) -> &str {
    let start = byte_offset(text, range.start);
    let end = start + byte_offset(&text[start..], range.len());
    &text[start..end]
}

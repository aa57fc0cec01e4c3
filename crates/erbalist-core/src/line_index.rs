//! Logical line index
//!
//! Line-oriented lookups used by the frame scope walk and whole-line painting, backed by a
//! Rope so line/offset conversions stay O(log N) on large templates.

use crate::text::TextRange;
use ropey::Rope;

/// Logical line index - implemented using Rope data structure
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Build line index from text
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Number of logical lines (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Line containing a char offset (clamped to the document end).
    pub fn char_to_line(&self, char_offset: usize) -> usize {
        self.rope.char_to_line(char_offset.min(self.rope.len_chars()))
    }

    /// Char offset of the first character of a line (clamped to the last line).
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line)
    }

    /// Text of a line, without its trailing line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line).to_string();
        // Rope's line() includes the newline
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    /// Char offset right after the last character of a line (before its line break).
    pub fn line_end(&self, line: usize) -> usize {
        let start = self.line_start(line);
        let len = self
            .line_text(line)
            .map(|text| text.chars().count())
            .unwrap_or(0);
        start + len
    }

    /// The char range covering lines `start_line..=end_line`, line breaks of the last line
    /// excluded.
    pub fn lines_range(&self, start_line: usize, end_line: usize) -> TextRange {
        TextRange::new(self.line_start(start_line), self.line_end(end_line))
    }

    /// Leading whitespace width of a line, or `None` for blank lines.
    ///
    /// Tabs count as a single column; templates mixing tabs and spaces get an approximate walk.
    pub fn indent(&self, line: usize) -> Option<usize> {
        let text = self.line_text(line)?;
        if text.trim().is_empty() {
            return None;
        }
        Some(text.chars().take_while(|c| c.is_whitespace()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_lookup_and_indent() {
        let index = LineIndex::from_text("<div>\r\n  <p>\n\n  </p>\n</div>");
        assert_eq!(index.line_count(), 5);
        assert_eq!(index.line_text(0).as_deref(), Some("<div>"));
        assert_eq!(index.indent(1), Some(2));
        assert_eq!(index.indent(2), None);
        assert_eq!(index.char_to_line(8), 1);
        assert_eq!(index.lines_range(1, 1), TextRange::new(7, 12));
        assert_eq!(index.line_text(9), None);
    }
}

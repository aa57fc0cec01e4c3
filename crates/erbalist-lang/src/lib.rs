#![warn(missing_docs)]
//! `erbalist-lang` - data-driven template language configuration for `erbalist-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on any regex or parsing
//! machinery. It describes which documents a host should treat as embedded templates.

/// A template language and the file extensions it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLanguage {
    /// Human readable language name.
    pub name: String,
    /// File extensions (without the leading dot), compared case-insensitively.
    pub extensions: Vec<String>,
}

impl TemplateLanguage {
    /// Embedded Ruby (`.erb`), the language the engine's scanners are written for.
    pub fn erb() -> Self {
        Self {
            name: "Embedded Ruby".to_string(),
            extensions: vec!["erb".to_string()],
        }
    }

    /// Returns `true` if a document name or URI carries one of the language's extensions.
    ///
    /// Only the final path segment is considered, so `app/views/x.html.erb` matches while
    /// `app/views.erb/x.html` does not.
    pub fn matches_path(&self, path: &str) -> bool {
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let Some((stem, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        if stem.is_empty() {
            return false;
        }
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

impl Default for TemplateLanguage {
    fn default() -> Self {
        Self::erb()
    }
}

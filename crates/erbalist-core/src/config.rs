//! Workspace settings consumed by the engine.
//!
//! The host hands the engine its settings as JSON. Only the `erbalist` section is read; every
//! field is optional and falls back to its default.

use crate::error::ErbalistError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Name of the settings section read by [`Settings::from_json`].
pub const SETTINGS_SECTION: &str = "erbalist";

/// When script emphasis dims the surrounding markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HighlightMode {
    /// Always emphasize script tags, wherever the cursor is.
    #[serde(rename = "always")]
    Always,
    /// Only while the cursor is inside a script tag.
    #[default]
    #[serde(rename = "whenInBlock")]
    WhenInBlock,
}

/// Whether per-document toggles survive the editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TogglePersistence {
    /// Persist toggles through the host across sessions.
    Always,
    /// Toggles live for the session only.
    #[default]
    Never,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Script emphasis mode.
    pub highlight_mode: HighlightMode,
    /// Toggle persistence mode.
    pub toggle_persistence: TogglePersistence,
    /// Toggle soft wrap together with class-attribute folding.
    pub toggle_word_wrap_with_folding: bool,
    /// Quiet interval collapsing bursts of edit events, in milliseconds.
    pub edit_debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            highlight_mode: HighlightMode::default(),
            toggle_persistence: TogglePersistence::default(),
            toggle_word_wrap_with_folding: false,
            edit_debounce_ms: 150,
        }
    }
}

impl Settings {
    /// Read settings from a host settings object.
    ///
    /// Accepts either the whole settings tree (the `erbalist` section is picked out) or the
    /// section itself. `null` yields the defaults.
    pub fn from_json(value: &Value) -> Result<Self, ErbalistError> {
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        if section.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(section).map_err(ErbalistError::Config)
    }

    /// The edit debounce interval.
    pub fn edit_debounce(&self) -> Duration {
        Duration::from_millis(self.edit_debounce_ms)
    }

    /// Returns `true` if a changed configuration key affects these settings.
    pub fn affected_by(key: &str) -> bool {
        key == SETTINGS_SECTION
            || key
                .strip_prefix(SETTINGS_SECTION)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

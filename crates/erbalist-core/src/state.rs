//! Per-document state.
//!
//! Each open template document owns a small [`DocumentState`]: its feature toggles, the
//! generation counter used to discard stale structural results, and the class attribute that is
//! temporarily expanded under the cursor. The [`StateStore`] is owned by the engine and mutated
//! only from its event handlers.

use crate::error::ErbalistError;
use crate::host::{DocumentId, FoldRangeRequest};
use crate::text::TextRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-document feature switches. This is also the persisted JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureToggles {
    /// Dim markup around emphasized script tags.
    pub dimming_enabled: bool,
    /// Fold class attributes.
    pub folding_enabled: bool,
    /// Cross-reference turbo frames.
    pub turbo_frames_enabled: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            dimming_enabled: false,
            folding_enabled: false,
            turbo_frames_enabled: true,
        }
    }
}

/// A toggleable feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleFeature {
    /// Script emphasis.
    Dimming,
    /// Class attribute folding.
    ClassFolding,
    /// Turbo frame cross-references.
    TurboFrames,
}

impl ToggleFeature {
    /// Every toggleable feature.
    pub const ALL: [ToggleFeature; 3] = [Self::Dimming, Self::ClassFolding, Self::TurboFrames];

    /// The host context flag mirroring this toggle.
    pub fn context_flag(self) -> &'static str {
        match self {
            Self::Dimming => "erbalist.emphasizedRubyEnabled",
            Self::ClassFolding => "erbalist.classAttributesFolded",
            Self::TurboFrames => "erbalist.turboFramesEnabled",
        }
    }
}

impl FeatureToggles {
    /// Current value of one toggle.
    pub fn get(&self, feature: ToggleFeature) -> bool {
        match feature {
            ToggleFeature::Dimming => self.dimming_enabled,
            ToggleFeature::ClassFolding => self.folding_enabled,
            ToggleFeature::TurboFrames => self.turbo_frames_enabled,
        }
    }

    fn slot(&mut self, feature: ToggleFeature) -> &mut bool {
        match feature {
            ToggleFeature::Dimming => &mut self.dimming_enabled,
            ToggleFeature::ClassFolding => &mut self.folding_enabled,
            ToggleFeature::TurboFrames => &mut self.turbo_frames_enabled,
        }
    }

    /// Flip one toggle and return its new value.
    pub fn toggle(&mut self, feature: ToggleFeature) -> bool {
        let slot = self.slot(feature);
        *slot = !*slot;
        *slot
    }
}

/// State of one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentState {
    /// Feature switches.
    pub toggles: FeatureToggles,
    /// Bumped on every event affecting the document.
    pub generation: u64,
    /// Generation of the structural request still awaiting the host, if any.
    pub pending: Option<u64>,
    /// Class attribute temporarily expanded because the cursor is inside it.
    pub expanded: Option<TextRange>,
}

/// Owner of every [`DocumentState`], keyed by document.
#[derive(Debug, Default)]
pub struct StateStore {
    documents: HashMap<DocumentId, DocumentState>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a document, if it is tracked.
    pub fn get(&self, doc: &DocumentId) -> Option<&DocumentState> {
        self.documents.get(doc)
    }

    /// State of a document, created with defaults on first access.
    pub fn entry(&mut self, doc: &DocumentId) -> &mut DocumentState {
        self.documents.entry(doc.clone()).or_default()
    }

    /// Returns `true` if the document is tracked.
    pub fn contains(&self, doc: &DocumentId) -> bool {
        self.documents.contains_key(doc)
    }

    /// Number of tracked documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document is tracked.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Toggles of a document (defaults if untracked).
    pub fn toggles(&self, doc: &DocumentId) -> FeatureToggles {
        self.get(doc).map(|s| s.toggles).unwrap_or_default()
    }

    /// Flip a feature toggle, returning its new value.
    pub fn toggle(&mut self, doc: &DocumentId, feature: ToggleFeature) -> bool {
        self.entry(doc).toggles.toggle(feature)
    }

    /// Advance the document generation, invalidating any in-flight request.
    pub fn bump_generation(&mut self, doc: &DocumentId) -> u64 {
        let state = self.entry(doc);
        state.generation += 1;
        state.generation
    }

    /// Record a structural request as in flight and return it.
    pub fn begin_request(&mut self, doc: &DocumentId) -> FoldRangeRequest {
        let state = self.entry(doc);
        state.pending = Some(state.generation);
        FoldRangeRequest {
            document: doc.clone(),
            generation: state.generation,
        }
    }

    /// Drop the in-flight request of a document.
    pub fn cancel_request(&mut self, doc: &DocumentId) {
        if let Some(state) = self.documents.get_mut(doc) {
            state.pending = None;
        }
    }

    /// Settle a request: returns `true` only if it is the document's current in-flight request.
    ///
    /// A current request is consumed; stale ones leave the state untouched.
    pub fn settle(&mut self, request: &FoldRangeRequest) -> bool {
        let Some(state) = self.documents.get_mut(&request.document) else {
            return false;
        };
        let current =
            state.generation == request.generation && state.pending == Some(request.generation);
        if current {
            state.pending = None;
        }
        current
    }

    /// Forget a document.
    pub fn remove(&mut self, doc: &DocumentId) -> Option<DocumentState> {
        self.documents.remove(doc)
    }

    /// Serialize a document's toggles for persistence.
    pub fn export_toggles(&self, doc: &DocumentId) -> Result<String, ErbalistError> {
        serde_json::to_string(&self.toggles(doc)).map_err(|source| ErbalistError::PersistedState {
            uri: doc.uri().to_string(),
            source,
        })
    }

    /// Restore a document's toggles from their persisted form.
    pub fn import_toggles(&mut self, doc: &DocumentId, raw: &str) -> Result<(), ErbalistError> {
        let toggles: FeatureToggles =
            serde_json::from_str(raw).map_err(|source| ErbalistError::PersistedState {
                uri: doc.uri().to_string(),
                source,
            })?;
        self.entry(doc).toggles = toggles;
        Ok(())
    }
}

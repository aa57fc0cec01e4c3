//! The event-driven engine.
//!
//! [`Engine`] owns the compiled scanner, the settings, the per-document [`StateStore`] and the
//! host. The host forwards its editor events; every event re-runs the enabled features for the
//! affected document and replaces their decoration groups wholesale.
//!
//! Structural fold ranges are the only asynchronous input. Requests are stamped with the
//! document generation; a completion is applied only while that generation is still current,
//! so a slow answer can never repaint over a newer cursor position, a closed document, or a
//! feature that was toggled off in the meantime.

use crate::config::{Settings, TogglePersistence};
use crate::debounce::Debouncer;
use crate::decorations::{DecorationGroup, PaintRegion};
use crate::error::ErbalistError;
use crate::features::default_features;
use crate::host::{
    DocumentId, FoldRangeRequest, FoldRangeResponse, Host, LineRange, SelectionKind,
};
use crate::line_index::LineIndex;
use crate::processing::{Feature, PaintEdit, PassInput};
use crate::scanner::Scanner;
use crate::snapshot::DocumentSnapshot;
use crate::span::SpanKind;
use crate::state::{DocumentState, StateStore, ToggleFeature};
use erbalist_lang::TemplateLanguage;
use std::time::Instant;

/// Cursor-context decoration engine bound to one host.
pub struct Engine<H: Host> {
    host: H,
    scanner: Scanner,
    language: TemplateLanguage,
    settings: Settings,
    features: Vec<Box<dyn Feature>>,
    state: StateStore,
    debouncer: Debouncer<DocumentId>,
    active: Option<DocumentId>,
}

impl<H: Host> Engine<H> {
    /// Create an engine for ERB templates.
    pub fn new(host: H) -> Result<Self, ErbalistError> {
        Self::with_language(host, TemplateLanguage::erb())
    }

    /// Create an engine gated on a custom template language.
    pub fn with_language(host: H, language: TemplateLanguage) -> Result<Self, ErbalistError> {
        let scanner = Scanner::new()?;
        let settings = load_settings(&host);
        Ok(Self {
            debouncer: Debouncer::new(settings.edit_debounce()),
            host,
            scanner,
            language,
            settings,
            features: default_features(),
            state: StateStore::new(),
            active: None,
        })
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (hosts mutate their own documents between events).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// State of a tracked document.
    pub fn document_state(&self, doc: &DocumentId) -> Option<&DocumentState> {
        self.state.get(doc)
    }

    /// The active document, if any.
    pub fn active_document(&self) -> Option<&DocumentId> {
        self.active.as_ref()
    }

    /// The earliest pending debounce deadline, for hosts that arm a single timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Returns `true` if the engine decorates this document.
    pub fn is_template(&self, doc: &DocumentId) -> bool {
        self.language.matches_path(doc.uri())
    }

    fn is_live(&self, doc: &DocumentId) -> bool {
        if !self.is_template(doc) {
            return false;
        }
        if !self.host.is_open(doc) {
            tracing::debug!(%doc, "ignoring event for closed document");
            return false;
        }
        true
    }

    /// Track a document, restoring persisted toggles on first sight.
    fn ensure_state(&mut self, doc: &DocumentId) {
        if self.state.contains(doc) {
            return;
        }
        self.state.entry(doc);
        if self.settings.toggle_persistence != TogglePersistence::Always {
            return;
        }
        if let Some(raw) = self.host.load_persisted_toggles(doc)
            && let Err(err) = self.state.import_toggles(doc, &raw)
        {
            tracing::warn!(%doc, error = %err, "discarding persisted toggles");
        }
    }

    /// The primary cursor moved.
    #[tracing::instrument(level = "debug", skip(self, doc), fields(doc = %doc))]
    pub fn on_cursor_moved(&mut self, doc: &DocumentId, kind: SelectionKind) {
        if !self.is_live(doc) {
            return;
        }
        self.ensure_state(doc);
        self.state.bump_generation(doc);
        self.debouncer.cancel(doc);
        if kind == SelectionKind::Mouse {
            self.relocate_into_folded(doc);
        }
        self.recompute(doc);
    }

    /// The active document changed (`None` when no editor is focused).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn on_active_document_changed(&mut self, doc: Option<&DocumentId>) {
        if let Some(previous) = self.active.take()
            && Some(&previous) != doc
            && self.state.contains(&previous)
        {
            self.state.bump_generation(&previous);
            self.state.cancel_request(&previous);
            self.debouncer.cancel(&previous);
        }
        self.active = doc.cloned();

        let Some(doc) = doc else {
            return;
        };
        if !self.is_template(doc) {
            let groups: Vec<DecorationGroup> =
                self.features.iter().flat_map(|f| f.groups()).collect();
            apply_edits(&mut self.host, doc, PaintEdit::clear_all(&groups));
            for feature in ToggleFeature::ALL {
                self.host.set_context_flag(feature.context_flag(), false);
            }
            return;
        }
        if !self.host.is_open(doc) {
            return;
        }
        self.ensure_state(doc);
        self.state.bump_generation(doc);
        self.publish_context_flags(doc);
        self.recompute(doc);
    }

    /// The document text changed. Recomputation waits for the quiet interval; see
    /// [`Engine::poll`].
    pub fn on_document_edited(&mut self, doc: &DocumentId, now: Instant) {
        if !self.is_live(doc) {
            return;
        }
        self.ensure_state(doc);
        self.state.bump_generation(doc);
        self.debouncer.schedule(doc.clone(), now);
    }

    /// Recompute every document whose edit burst has gone quiet.
    pub fn poll(&mut self, now: Instant) {
        for doc in self.debouncer.poll(now) {
            if !self.host.is_open(&doc) {
                continue;
            }
            tracing::debug!(%doc, "edit burst settled");
            self.state.bump_generation(&doc);
            self.recompute(&doc);
        }
    }

    /// A configuration key changed.
    pub fn on_configuration_changed(&mut self, key: &str) {
        if !Settings::affected_by(key) {
            return;
        }
        self.settings = load_settings(&self.host);
        self.debouncer.set_quiet(self.settings.edit_debounce());
        tracing::debug!(settings = ?self.settings, "settings reloaded");

        let mut docs = self.host.visible_documents();
        if let Some(active) = &self.active
            && !docs.contains(active)
        {
            docs.push(active.clone());
        }
        for doc in docs {
            if self.is_live(&doc) {
                self.ensure_state(&doc);
                self.state.bump_generation(&doc);
                self.recompute(&doc);
            }
        }
    }

    /// The document was closed; its state is dropped and any in-flight result discarded.
    pub fn on_document_closed(&mut self, doc: &DocumentId) {
        self.state.remove(doc);
        self.debouncer.cancel(doc);
        if self.active.as_ref() == Some(doc) {
            self.active = None;
        }
    }

    /// Toggle script emphasis. Returns the new value, or `None` for inert documents.
    pub fn toggle_dimming(&mut self, doc: &DocumentId) -> Option<bool> {
        self.try_toggle(doc, ToggleFeature::Dimming).ok()
    }

    /// Toggle class attribute folding. Returns the new value, or `None` for inert documents.
    pub fn toggle_class_folding(&mut self, doc: &DocumentId) -> Option<bool> {
        self.try_toggle(doc, ToggleFeature::ClassFolding).ok()
    }

    /// Toggle turbo frame cross-references. Returns the new value, or `None` for inert
    /// documents.
    pub fn toggle_turbo_frames(&mut self, doc: &DocumentId) -> Option<bool> {
        self.try_toggle(doc, ToggleFeature::TurboFrames).ok()
    }

    /// Toggle `feature` for `doc` and repaint. Returns the new value.
    ///
    /// Fails with [`ErbalistError::InvalidDocument`] if the document is closed or is not a
    /// template; nothing is changed in that case.
    pub fn try_toggle(
        &mut self,
        doc: &DocumentId,
        feature: ToggleFeature,
    ) -> Result<bool, ErbalistError> {
        if !self.is_live(doc) {
            return Err(ErbalistError::InvalidDocument(doc.clone()));
        }
        self.ensure_state(doc);
        let enabled = self.state.toggle(doc, feature);
        self.state.bump_generation(doc);
        tracing::debug!(%doc, ?feature, enabled, "toggled");

        self.host.set_context_flag(feature.context_flag(), enabled);
        if self.settings.toggle_persistence == TogglePersistence::Always {
            match self.state.export_toggles(doc) {
                Ok(raw) => self.host.persist_toggles(doc, &raw),
                Err(err) => tracing::warn!(%doc, error = %err, "failed to persist toggles"),
            }
        }
        self.recompute(doc);
        if feature == ToggleFeature::ClassFolding && self.settings.toggle_word_wrap_with_folding {
            self.host.toggle_word_wrap(doc);
        }
        Ok(enabled)
    }

    /// Ask the host to fold every multi-line `<svg>` element.
    ///
    /// Returns the start lines handed to the host.
    pub fn fold_svg(&mut self, doc: &DocumentId) -> Vec<usize> {
        if !self.is_live(doc) {
            return Vec::new();
        }
        let Some(text) = self.host.document_text(doc) else {
            return Vec::new();
        };
        let lines = LineIndex::from_text(&text);
        let mut starts: Vec<usize> = self
            .scanner
            .scan(&text, SpanKind::SvgElement)
            .filter_map(|span| {
                let start = lines.char_to_line(span.range.start);
                let end = lines.char_to_line(span.range.end.saturating_sub(1));
                (end > start).then_some(start)
            })
            .collect();
        starts.dedup();
        if !starts.is_empty() {
            self.host.fold_lines(doc, &starts);
        }
        starts
    }

    /// Ask the host to unfold everything.
    pub fn expand_svg(&mut self, doc: &DocumentId) {
        if self.is_live(doc) {
            self.host.unfold_all(doc);
        }
    }

    /// Deliver structural fold ranges for an earlier [`FoldRangeResponse::Pending`] request.
    ///
    /// Stale completions (the document moved on, was closed, or the feature was toggled off)
    /// are dropped silently. A failed request counts as "no structural data".
    #[tracing::instrument(level = "debug", skip(self, result), fields(doc = %request.document))]
    pub fn complete_fold_ranges(
        &mut self,
        request: FoldRangeRequest,
        result: Result<Vec<LineRange>, ErbalistError>,
    ) {
        if !self.state.settle(&request) {
            tracing::debug!(generation = request.generation, "discarding stale fold ranges");
            return;
        }
        let doc = &request.document;
        if !self.host.is_open(doc) {
            return;
        }
        let structure = result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "structural fold ranges unavailable");
            Vec::new()
        });
        let Some(snapshot) = snapshot(&self.host, doc) else {
            return;
        };
        let Some(state) = self.state.get(doc) else {
            return;
        };
        let input = PassInput {
            snapshot: &snapshot,
            scanner: &self.scanner,
            settings: &self.settings,
            state,
            structure: &structure,
        };
        for feature in self.features.iter().filter(|f| f.needs_structure()) {
            if feature.is_enabled(state) {
                apply_edits(&mut self.host, doc, feature.process(&input));
            }
        }
    }

    fn publish_context_flags(&mut self, doc: &DocumentId) {
        let toggles = self.state.toggles(doc);
        for feature in ToggleFeature::ALL {
            self.host
                .set_context_flag(feature.context_flag(), toggles.get(feature));
        }
    }

    /// A click inside a folded class attribute lands at the start of its value.
    fn relocate_into_folded(&mut self, doc: &DocumentId) {
        if !self.state.toggles(doc).folding_enabled || self.host.has_selection(doc) {
            return;
        }
        let (Some(text), Some(cursor)) =
            (self.host.document_text(doc), self.host.cursor_offset(doc))
        else {
            return;
        };
        let expanded = self.state.get(doc).and_then(|s| s.expanded);
        let target = self
            .scanner
            .scan(&text, SpanKind::AttributeValue)
            .find(|span| span.range.contains_cursor(cursor) && expanded != Some(span.range))
            .and_then(|span| span.value().map(|v| v.range.start));
        if let Some(target) = target
            && target != cursor
        {
            tracing::debug!(%doc, from = cursor, to = target, "click moved into folded attribute");
            self.host.set_cursor_offset(doc, target);
        }
    }

    /// Expand the class attribute under a collapsed cursor; collapse everything else.
    fn update_expansion(&mut self, doc: &DocumentId, snapshot: &DocumentSnapshot) {
        let expanded = if self.state.toggles(doc).folding_enabled && !snapshot.has_selection() {
            self.scanner
                .scan(snapshot.text(), SpanKind::AttributeValue)
                .find(|span| span.range.contains_cursor(snapshot.cursor()))
                .map(|span| span.range)
        } else {
            None
        };
        self.state.entry(doc).expanded = expanded;
    }

    /// Re-run every feature for `doc` and repaint.
    #[tracing::instrument(level = "trace", skip(self, doc), fields(doc = %doc))]
    fn recompute(&mut self, doc: &DocumentId) {
        let Some(snapshot) = snapshot(&self.host, doc) else {
            tracing::debug!("document vanished before recompute");
            return;
        };
        self.update_expansion(doc, &snapshot);

        let Some(state) = self.state.get(doc) else {
            return;
        };
        let wants_structure = self
            .features
            .iter()
            .any(|f| f.needs_structure() && f.is_enabled(state));
        let structure = if wants_structure {
            let request = self.state.begin_request(doc);
            match self.host.request_fold_ranges(request.clone()) {
                Ok(FoldRangeResponse::Ready(ranges)) => {
                    self.state.settle(&request);
                    Some(ranges)
                }
                Ok(FoldRangeResponse::Pending) => {
                    tracing::trace!(generation = request.generation, "awaiting fold ranges");
                    None
                }
                Err(err) => {
                    tracing::warn!(error = %err, "structural fold ranges unavailable");
                    self.state.settle(&request);
                    Some(Vec::new())
                }
            }
        } else {
            self.state.cancel_request(doc);
            Some(Vec::new())
        };

        let Some(state) = self.state.get(doc) else {
            return;
        };
        let input = PassInput {
            snapshot: &snapshot,
            scanner: &self.scanner,
            settings: &self.settings,
            state,
            structure: structure.as_deref().unwrap_or_default(),
        };
        for feature in &self.features {
            if !feature.is_enabled(state) {
                apply_edits(&mut self.host, doc, PaintEdit::clear_all(&feature.groups()));
                continue;
            }
            if feature.needs_structure() && structure.is_none() {
                continue;
            }
            let edits = feature.process(&input);
            tracing::trace!(feature = feature.name(), edits = edits.len(), "processed");
            apply_edits(&mut self.host, doc, edits);
        }
    }
}

fn load_settings<H: Host>(host: &H) -> Settings {
    Settings::from_json(&host.configuration()).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using default settings");
        Settings::default()
    })
}

fn snapshot<H: Host>(host: &H, doc: &DocumentId) -> Option<DocumentSnapshot> {
    let text = host.document_text(doc)?;
    let cursor = host.cursor_offset(doc)?;
    Some(DocumentSnapshot::new(text, cursor).with_selection(host.has_selection(doc)))
}

fn apply_edits<H: Host>(host: &mut H, doc: &DocumentId, edits: Vec<PaintEdit>) {
    for edit in edits {
        let group = edit.group();
        let regions: Vec<PaintRegion> = edit.into_regions();
        host.apply_paint(doc, group, regions);
    }
}

#![allow(dead_code)]

use erbalist_core::{
    DecorationGroup, DocumentId, ErbalistError, FoldRangeRequest, FoldRangeResponse, Host,
    LineRange, PaintRegion,
};
use serde_json::Value;
use std::collections::HashMap;

/// How the mock answers structural fold range requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldMode {
    Ready(Vec<LineRange>),
    Pending,
    Fail,
}

#[derive(Debug, Clone)]
pub struct MockDoc {
    pub text: String,
    pub cursor: usize,
    pub selection: bool,
}

/// A host that records everything the engine asks of it.
#[derive(Debug)]
pub struct MockHost {
    pub docs: HashMap<DocumentId, MockDoc>,
    pub paint: HashMap<(DocumentId, DecorationGroup), Vec<PaintRegion>>,
    pub paint_calls: usize,
    pub flags: HashMap<String, bool>,
    pub config: Value,
    pub fold_mode: FoldMode,
    pub requests: Vec<FoldRangeRequest>,
    pub wrap_toggles: usize,
    pub folded_lines: Vec<usize>,
    pub unfold_calls: usize,
    pub persisted: HashMap<DocumentId, String>,
    pub visible: Vec<DocumentId>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            docs: HashMap::new(),
            paint: HashMap::new(),
            paint_calls: 0,
            flags: HashMap::new(),
            config: Value::Null,
            fold_mode: FoldMode::Ready(Vec::new()),
            requests: Vec::new(),
            wrap_toggles: 0,
            folded_lines: Vec::new(),
            unfold_calls: 0,
            persisted: HashMap::new(),
            visible: Vec::new(),
        }
    }
}

impl MockHost {
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn open(&mut self, uri: &str, text: &str, cursor: usize) -> DocumentId {
        let doc = DocumentId::new(uri);
        self.docs.insert(
            doc.clone(),
            MockDoc {
                text: text.to_string(),
                cursor,
                selection: false,
            },
        );
        doc
    }

    pub fn close(&mut self, doc: &DocumentId) {
        self.docs.remove(doc);
    }

    pub fn move_cursor(&mut self, doc: &DocumentId, cursor: usize) {
        if let Some(d) = self.docs.get_mut(doc) {
            d.cursor = cursor;
        }
    }

    pub fn set_text(&mut self, doc: &DocumentId, text: &str) {
        if let Some(d) = self.docs.get_mut(doc) {
            d.text = text.to_string();
        }
    }

    pub fn regions(&self, doc: &DocumentId, group: DecorationGroup) -> Vec<PaintRegion> {
        self.paint
            .get(&(doc.clone(), group))
            .cloned()
            .unwrap_or_default()
    }

    /// The painted text of every region of a group.
    pub fn painted(&self, doc: &DocumentId, group: DecorationGroup) -> Vec<String> {
        let text = &self.docs[doc].text;
        self.regions(doc, group)
            .iter()
            .map(|r| text.chars().skip(r.range.start).take(r.range.len()).collect())
            .collect()
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }
}

impl Host for MockHost {
    fn is_open(&self, doc: &DocumentId) -> bool {
        self.docs.contains_key(doc)
    }

    fn document_text(&self, doc: &DocumentId) -> Option<String> {
        self.docs.get(doc).map(|d| d.text.clone())
    }

    fn cursor_offset(&self, doc: &DocumentId) -> Option<usize> {
        self.docs.get(doc).map(|d| d.cursor)
    }

    fn has_selection(&self, doc: &DocumentId) -> bool {
        self.docs.get(doc).is_some_and(|d| d.selection)
    }

    fn request_fold_ranges(
        &mut self,
        request: FoldRangeRequest,
    ) -> Result<FoldRangeResponse, ErbalistError> {
        self.requests.push(request);
        match &self.fold_mode {
            FoldMode::Ready(ranges) => Ok(FoldRangeResponse::Ready(ranges.clone())),
            FoldMode::Pending => Ok(FoldRangeResponse::Pending),
            FoldMode::Fail => Err(ErbalistError::HostUnavailable(
                "folding provider crashed".to_string(),
            )),
        }
    }

    fn apply_paint(&mut self, doc: &DocumentId, group: DecorationGroup, regions: Vec<PaintRegion>) {
        self.paint_calls += 1;
        self.paint.insert((doc.clone(), group), regions);
    }

    fn configuration(&self) -> Value {
        self.config.clone()
    }

    fn visible_documents(&self) -> Vec<DocumentId> {
        self.visible.clone()
    }

    fn set_context_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    fn toggle_word_wrap(&mut self, _doc: &DocumentId) {
        self.wrap_toggles += 1;
    }

    fn set_cursor_offset(&mut self, doc: &DocumentId, offset: usize) {
        self.move_cursor(doc, offset);
    }

    fn fold_lines(&mut self, _doc: &DocumentId, start_lines: &[usize]) {
        self.folded_lines.extend_from_slice(start_lines);
    }

    fn unfold_all(&mut self, _doc: &DocumentId) {
        self.unfold_calls += 1;
    }

    fn load_persisted_toggles(&self, doc: &DocumentId) -> Option<String> {
        self.persisted.get(doc).cloned()
    }

    fn persist_toggles(&mut self, doc: &DocumentId, state: &str) {
        self.persisted.insert(doc.clone(), state.to_string());
    }
}

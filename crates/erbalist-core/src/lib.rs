#![warn(missing_docs)]
//! Erbalist Core - headless cursor-context decorations for embedded-template markup
//!
//! # Overview
//!
//! `erbalist-core` decides, from the raw text of an ERB template and a cursor offset, which
//! syntactic context the cursor is in and which ranges of the document should be dimmed,
//! highlighted or folded as a consequence. It never renders and never edits text: the host
//! editor implements [`Host`] and paints the [`PaintRegion`]s it is handed.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Engine (events, toggles, generations)      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Features (dim, fold, modifiers, ...)       │  ← Pipeline clients
//! ├─────────────────────────────────────────────┤
//! │  Planner (paint regions)                    │
//! ├─────────────────────────────────────────────┤
//! │  Linker (related spans, frame scope walk)   │
//! ├─────────────────────────────────────────────┤
//! │  Resolver (active context)                  │
//! ├─────────────────────────────────────────────┤
//! │  Scanner (tagged spans)                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use erbalist_core::{
//!     ContextTarget, DecorationGroup, PlanMode, Scanner, SpanKind, link, plan, resolve_context,
//! };
//!
//! let scanner = Scanner::new().unwrap();
//! let text = r#"<div class="sm:flex md:block">"#;
//! let spans: Vec<_> = scanner.scan(text, SpanKind::AttributeValue).collect();
//!
//! // Cursor inside `sm:flex`.
//! let context = resolve_context(&spans, 16, ContextTarget::Modifiers);
//! let linked = link(&spans, &context);
//! let plan = plan(text, &context, &linked, PlanMode::HighlightBuckets);
//!
//! assert_eq!(plan.regions.len(), 1);
//! assert_eq!(plan.regions[0].group, DecorationGroup::ModifierBucket(0));
//! ```
//!
//! # Module Description
//!
//! - [`scanner`] - regex-driven span scanner
//! - [`resolver`] - active context at the cursor
//! - [`linker`] - related spans and the frame scope walk
//! - [`planner`] - paint regions
//! - [`features`] - the decoration features built on the pipeline
//! - [`engine`] - event handling, toggles and stale-result discarding
//!
//! # Offsets
//!
//! Every public offset is a Unicode scalar (`char`) offset; ranges are half-open. Cursor
//! containment is inclusive at both ends.

pub mod config;
pub mod debounce;
pub mod decorations;
pub mod engine;
pub mod error;
pub mod features;
pub mod host;
pub mod line_index;
pub mod linker;
pub mod planner;
pub mod processing;
pub mod resolver;
pub mod scanner;
pub mod snapshot;
pub mod span;
pub mod state;
pub mod text;

pub use config::{HighlightMode, SETTINGS_SECTION, Settings, TogglePersistence};
pub use debounce::Debouncer;
pub use decorations::{DecorationGroup, FOLDED_GLYPH, MODIFIER_BUCKETS, PaintRegion};
pub use engine::Engine;
pub use error::ErbalistError;
pub use features::{
    ClassFolding, ControllerLinks, FrameLinks, ModifierHighlight, ScriptEmphasis,
    default_features,
};
pub use host::{
    DocumentId, FoldRangeRequest, FoldRangeResponse, Host, LineRange, SelectionKind,
};
pub use line_index::LineIndex;
pub use linker::{FrameScope, FrameWalker, IdentifierRanges, LinkedSpans, link, scope_context};
pub use planner::{PaintPlan, PlanMode, complement, plan};
pub use processing::{Feature, PaintEdit, PassInput};
pub use resolver::{ActiveContext, ContextTarget, innermost_containing, resolve_context};
pub use scanner::{Scan, Scanner, class_tokens};
pub use snapshot::DocumentSnapshot;
pub use span::{Name, Span, SpanKind, SpanPayload, normalize_name};
pub use state::{DocumentState, FeatureToggles, StateStore, ToggleFeature};
pub use text::TextRange;

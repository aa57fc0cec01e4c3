//! Tagged spans produced by the scanner.
//!
//! Spans are derived fresh from the text on every resolution pass and never mutated.

use crate::text::TextRange;

/// The syntactic kind of a [`Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpanKind {
    /// An embedded script tag: `<% ... %>`, `<%= ... %>`, `<%- ... %>`.
    ScriptBlock,
    /// An embedded comment tag: `<%# ... %>`.
    Comment,
    /// A class attribute: `class="..."` or `class: "..."`.
    AttributeValue,
    /// A controller declaration: `data-controller="..."` or `data: { controller: "..." }`.
    ControllerDeclaration,
    /// A controller-scoped attribute: `data-<name>-target|outlet|value="..."` or
    /// `data: { <name>_target: "..." }`.
    ControllerReference,
    /// An action attribute: `data-action="event->controller#method"`.
    ActionReference,
    /// One class token carrying colon-delimited modifiers (`hover:focus:text-red-500`).
    ModifierToken,
    /// A frame declaration: `turbo_frame_tag "id"` or `<turbo-frame id="id">`.
    NamedScopeDeclaration,
    /// A frame reference: `data-turbo-frame="id"` or `data: { turbo_frame: "id" }`.
    NamedScopeReference,
    /// An inline `<svg>...</svg>` element.
    SvgElement,
}

/// A name extracted from a span together with its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    /// The name as written in the document.
    pub text: String,
    /// Where the name sits in the document.
    pub range: TextRange,
}

impl Name {
    /// Create a new located name.
    pub fn new(text: impl Into<String>, range: TextRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }
}

/// Kind-specific data captured while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanPayload {
    /// Nothing captured.
    #[default]
    None,
    /// The quoted value of an attribute (class list, script body).
    Value(Name),
    /// A value holding several names: controller identifiers of a declaration, or the
    /// controllers addressed by an action descriptor list.
    Names {
        /// The full attribute value.
        value: Name,
        /// The names found inside `value`, in document order.
        names: Vec<Name>,
    },
    /// A single identifier: a controller of a reference, a frame id, or a modifier.
    Ident(Name),
    /// The modifiers of a class token, in written order.
    Modifiers {
        /// The whole class token.
        token: Name,
        /// Each modifier; `range` covers the modifier and its trailing colon.
        modifiers: Vec<Name>,
    },
}

/// A tagged half-open text range produced by scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The syntactic kind.
    pub kind: SpanKind,
    /// The full matched range.
    pub range: TextRange,
    /// Kind-specific captured data.
    pub payload: SpanPayload,
}

impl Span {
    /// Create a new span.
    pub fn new(kind: SpanKind, range: TextRange, payload: SpanPayload) -> Self {
        Self {
            kind,
            range,
            payload,
        }
    }

    /// The captured attribute value, if any.
    pub fn value(&self) -> Option<&Name> {
        match &self.payload {
            SpanPayload::Value(value) | SpanPayload::Names { value, .. } => Some(value),
            SpanPayload::Modifiers { token, .. } => Some(token),
            SpanPayload::Ident(_) | SpanPayload::None => None,
        }
    }

    /// The names carried by this span (one for identifiers, many for lists).
    pub fn names(&self) -> &[Name] {
        match &self.payload {
            SpanPayload::Names { names, .. } => names,
            SpanPayload::Modifiers { modifiers, .. } => modifiers,
            SpanPayload::Ident(name) => std::slice::from_ref(name),
            SpanPayload::Value(_) | SpanPayload::None => &[],
        }
    }
}

/// Normalize an identifier for cross-reference comparison.
///
/// Hyphens and underscores are equivalent and comparison is case-insensitive, so `My-Widget`
/// and `my_widget` normalize to the same key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '_' { '-' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

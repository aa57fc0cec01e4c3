//! Context resolver.
//!
//! Given the scanner's spans and a cursor offset, decides which syntactic context is active.
//!
//! Precedence, highest first:
//! 1. a comment containing the cursor suppresses every context;
//! 2. an explicit always-on mode forces the script context;
//! 3. the innermost containing span of the requested kind.
//!
//! Containment is inclusive of both boundaries. When several spans of the same kind contain
//! the cursor (e.g. it sits on a boundary shared by two adjacent spans), the earliest-starting
//! one wins unless a later one nests inside it.

use crate::config::HighlightMode;
use crate::scanner::class_tokens;
use crate::span::{Span, SpanKind, normalize_name};

/// What the resolver asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTarget {
    /// Script emphasis, honoring a highlight mode.
    Script(HighlightMode),
    /// The modifier set of the class token under the cursor.
    Modifiers,
    /// Controller names under the cursor.
    Controllers,
    /// A frame id under the cursor (declaration or reference).
    Frame,
}

/// The context active at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveContext {
    /// Nothing relevant under the cursor.
    None,
    /// The cursor sits in a comment; all decorations of the feature are suppressed.
    Suppressed,
    /// Script emphasis is active. `primary` is `None` when forced by always-on mode.
    Script {
        /// The script block containing the cursor.
        primary: Option<Span>,
    },
    /// Modifiers of the class token under the cursor.
    Modifiers {
        /// The token under the cursor ([`SpanKind::ModifierToken`]).
        token: Span,
        /// Distinct modifiers, in written order.
        modifiers: Vec<String>,
        /// The token's full modifier list, sorted, used for exact-set matching.
        exact_key: Vec<String>,
    },
    /// Normalized controller names.
    Controllers {
        /// The declaration, action or reference span under the cursor.
        primary: Span,
        /// Distinct normalized names, in written order.
        names: Vec<String>,
    },
    /// A frame id.
    Frame {
        /// The declaration or reference the id came from.
        primary: Span,
        /// The normalized frame id.
        id: String,
    },
}

impl ActiveContext {
    /// Returns `true` if the context activates decorations.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None | Self::Suppressed)
    }

    /// The primary span the context was resolved from, if any.
    pub fn primary(&self) -> Option<&Span> {
        match self {
            Self::Script { primary } => primary.as_ref(),
            Self::Modifiers { token, .. } => Some(token),
            Self::Controllers { primary, .. } | Self::Frame { primary, .. } => Some(primary),
            Self::None | Self::Suppressed => None,
        }
    }
}

/// The innermost span of `kind` containing `cursor` (inclusive boundaries).
pub fn innermost_containing(spans: &[Span], cursor: usize, kind: SpanKind) -> Option<&Span> {
    let mut best: Option<&Span> = None;
    for span in spans
        .iter()
        .filter(|s| s.kind == kind && s.range.contains_cursor(cursor))
    {
        best = match best {
            None => Some(span),
            Some(current) => {
                let replace = if current.range.encloses(&span.range) {
                    current.range != span.range
                } else if span.range.encloses(&current.range) {
                    false
                } else {
                    span.range.start < current.range.start
                };
                if replace { Some(span) } else { Some(current) }
            }
        };
    }
    best
}

/// Resolve the active context at `cursor`.
///
/// `spans` should hold every kind relevant to `target`, plus [`SpanKind::Comment`] spans so the
/// comment precedence rule can apply.
pub fn resolve_context(spans: &[Span], cursor: usize, target: ContextTarget) -> ActiveContext {
    if innermost_containing(spans, cursor, SpanKind::Comment).is_some() {
        return ActiveContext::Suppressed;
    }

    match target {
        ContextTarget::Script(HighlightMode::Always) => ActiveContext::Script {
            primary: innermost_containing(spans, cursor, SpanKind::ScriptBlock).cloned(),
        },
        ContextTarget::Script(HighlightMode::WhenInBlock) => {
            match innermost_containing(spans, cursor, SpanKind::ScriptBlock) {
                Some(span) => ActiveContext::Script {
                    primary: Some(span.clone()),
                },
                None => ActiveContext::None,
            }
        }
        ContextTarget::Modifiers => resolve_modifiers(spans, cursor),
        ContextTarget::Controllers => resolve_controllers(spans, cursor),
        ContextTarget::Frame => resolve_frame(spans, cursor),
    }
}

fn resolve_modifiers(spans: &[Span], cursor: usize) -> ActiveContext {
    // Only the value counts: the cursor on `class=` itself selects no token.
    let attribute = spans.iter().find(|s| {
        s.kind == SpanKind::AttributeValue
            && s.value().is_some_and(|v| v.range.contains_cursor(cursor))
    });
    let Some(value) = attribute.and_then(Span::value) else {
        return ActiveContext::None;
    };

    let Some(token) = class_tokens(value)
        .into_iter()
        .find(|token| token.range.contains_cursor(cursor))
    else {
        return ActiveContext::None;
    };

    let mut modifiers: Vec<String> = Vec::new();
    for name in token.names() {
        if !modifiers.contains(&name.text) {
            modifiers.push(name.text.clone());
        }
    }
    if modifiers.is_empty() {
        return ActiveContext::None;
    }

    let mut exact_key: Vec<String> = token.names().iter().map(|n| n.text.clone()).collect();
    exact_key.sort();

    ActiveContext::Modifiers {
        token,
        modifiers,
        exact_key,
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    let normalized = normalize_name(name);
    if !names.contains(&normalized) {
        names.push(normalized);
    }
}

fn resolve_controllers(spans: &[Span], cursor: usize) -> ActiveContext {
    // Declarations first, then action descriptors, then scoped attributes.
    if let Some(decl) = innermost_containing(spans, cursor, SpanKind::ControllerDeclaration) {
        let mut names = Vec::new();
        let on_attribute_name = decl.value().is_some_and(|v| cursor < v.range.start);
        if on_attribute_name {
            decl.names().iter().for_each(|n| push_unique(&mut names, &n.text));
        } else if let Some(name) = decl.names().iter().find(|n| n.range.contains_cursor(cursor)) {
            push_unique(&mut names, &name.text);
        }
        if !names.is_empty() {
            return ActiveContext::Controllers {
                primary: decl.clone(),
                names,
            };
        }
    }

    if let Some(action) = innermost_containing(spans, cursor, SpanKind::ActionReference) {
        let mut names = Vec::new();
        let value_start = action.value().map(|v| v.range.start).unwrap_or(action.range.start);
        if cursor < value_start {
            action.names().iter().for_each(|n| push_unique(&mut names, &n.text));
        } else {
            // A descriptor owns everything from the end of the previous one up to its `#`.
            let mut segment_start = value_start;
            for name in action.names() {
                let segment_end = name.range.end + 1;
                if segment_start <= cursor && cursor <= segment_end {
                    push_unique(&mut names, &name.text);
                    break;
                }
                segment_start = segment_end;
            }
        }
        if !names.is_empty() {
            return ActiveContext::Controllers {
                primary: action.clone(),
                names,
            };
        }
    }

    if let Some(reference) = innermost_containing(spans, cursor, SpanKind::ControllerReference)
        && let Some(name) = reference.names().first()
    {
        return ActiveContext::Controllers {
            primary: reference.clone(),
            names: vec![normalize_name(&name.text)],
        };
    }

    ActiveContext::None
}

fn resolve_frame(spans: &[Span], cursor: usize) -> ActiveContext {
    let hit = innermost_containing(spans, cursor, SpanKind::NamedScopeDeclaration)
        .or_else(|| innermost_containing(spans, cursor, SpanKind::NamedScopeReference));
    match hit.and_then(|span| span.names().first().map(|name| (span, name))) {
        Some((span, name)) => ActiveContext::Frame {
            primary: span.clone(),
            id: normalize_name(&name.text),
        },
        None => ActiveContext::None,
    }
}

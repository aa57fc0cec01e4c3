//! Scope/reference linker.
//!
//! Expands an [`ActiveContext`] into every related span of the document: all declarations and
//! references sharing a controller name or frame id, or every class token carrying one of the
//! active modifiers. Names are compared after [`normalize_name`].
//!
//! For frames the linker also performs the structural scope walk: when the cursor is not on a
//! declaration or reference, the nearest enclosing frame declaration is located from the
//! host's structural fold ranges, or by walking up through decreasing indentation.

use crate::host::LineRange;
use crate::line_index::LineIndex;
use crate::resolver::ActiveContext;
use crate::scanner::{Scanner, class_tokens};
use crate::span::{Span, SpanKind, normalize_name};
use crate::text::TextRange;
use std::collections::BTreeSet;

/// Ranges sharing one secondary identifier (e.g. one modifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRanges {
    /// The identifier.
    pub identifier: String,
    /// Every range carrying it, in document order.
    pub ranges: Vec<TextRange>,
}

/// The result of linking a context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkedSpans {
    /// Every linked span, in document order, without duplicates.
    pub spans: Vec<Span>,
    /// Per-identifier ranges, ordered by first appearance in the document.
    pub by_identifier: Vec<IdentifierRanges>,
    /// Ranges flagged as exact modifier-set matches.
    pub exact_matches: Vec<TextRange>,
}

impl LinkedSpans {
    /// Returns `true` if nothing was linked.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.by_identifier.is_empty() && self.exact_matches.is_empty()
    }

    fn push_span(&mut self, span: &Span) {
        if !self.spans.iter().any(|s| s.range == span.range && s.kind == span.kind) {
            self.spans.push(span.clone());
        }
    }
}

/// Link `context` against the document's spans.
///
/// `spans` must contain the kinds the context refers to; unrelated kinds are ignored.
pub fn link(spans: &[Span], context: &ActiveContext) -> LinkedSpans {
    let mut linked = match context {
        ActiveContext::None | ActiveContext::Suppressed => LinkedSpans::default(),
        ActiveContext::Script { .. } => link_embedded(spans),
        ActiveContext::Modifiers {
            modifiers,
            exact_key,
            ..
        } => link_modifiers(spans, modifiers, exact_key),
        ActiveContext::Controllers { names, .. } => link_names(
            spans,
            &[
                SpanKind::ControllerDeclaration,
                SpanKind::ActionReference,
                SpanKind::ControllerReference,
            ],
            names,
        ),
        ActiveContext::Frame { id, .. } => link_names(
            spans,
            &[SpanKind::NamedScopeDeclaration, SpanKind::NamedScopeReference],
            std::slice::from_ref(id),
        ),
    };
    linked.spans.sort_by_key(|s| (s.range.start, s.range.end));
    linked
}

fn link_embedded(spans: &[Span]) -> LinkedSpans {
    let mut linked = LinkedSpans::default();
    for span in spans
        .iter()
        .filter(|s| matches!(s.kind, SpanKind::ScriptBlock | SpanKind::Comment))
    {
        linked.push_span(span);
    }
    linked
}

fn link_names(spans: &[Span], kinds: &[SpanKind], active: &[String]) -> LinkedSpans {
    let mut linked = LinkedSpans::default();
    for span in spans.iter().filter(|s| kinds.contains(&s.kind)) {
        let hit = span
            .names()
            .iter()
            .any(|name| active.contains(&normalize_name(&name.text)));
        if hit {
            linked.push_span(span);
        }
    }
    linked
}

fn link_modifiers(spans: &[Span], active: &[String], exact_key: &[String]) -> LinkedSpans {
    let mut seen = BTreeSet::new();
    let mut tokens = Vec::new();
    for span in spans {
        let candidates = match span.kind {
            SpanKind::ModifierToken => vec![span.clone()],
            SpanKind::AttributeValue => span.value().map(class_tokens).unwrap_or_default(),
            _ => continue,
        };
        for token in candidates {
            if seen.insert(token.range) {
                tokens.push(token);
            }
        }
    }
    tokens.sort_by_key(|t| t.range.start);

    let mut linked = LinkedSpans::default();
    for token in &tokens {
        let modifiers = token.names();
        let mut matched = false;
        for modifier in modifiers.iter().filter(|m| active.contains(&m.text)) {
            matched = true;
            match linked
                .by_identifier
                .iter_mut()
                .find(|entry| entry.identifier == modifier.text)
            {
                Some(entry) => entry.ranges.push(modifier.range),
                None => linked.by_identifier.push(IdentifierRanges {
                    identifier: modifier.text.clone(),
                    ranges: vec![modifier.range],
                }),
            }
        }

        if active.len() > 1 && modifiers.len() > 1 {
            let mut key: Vec<&str> = modifiers.iter().map(|m| m.text.as_str()).collect();
            key.sort_unstable();
            if key.iter().copied().eq(exact_key.iter().map(String::as_str))
                && let (Some(first), Some(last)) = (modifiers.first(), modifiers.last())
            {
                linked
                    .exact_matches
                    .push(TextRange::new(first.range.start, last.range.end));
            }
        }

        if matched {
            linked.push_span(token);
        }
    }
    linked
}

/// A frame declaration and the lines its block covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameScope {
    /// The declaring span.
    pub declaration: Span,
    /// Lines from the declaration to the end of its block.
    pub lines: LineRange,
}

/// Structural helpers over one document snapshot.
pub struct FrameWalker<'a> {
    scanner: &'a Scanner,
    lines: &'a LineIndex,
    declarations: Vec<(usize, &'a Span)>,
    structure: &'a [LineRange],
}

impl<'a> FrameWalker<'a> {
    /// Create a walker over `spans` (only declarations are used) and optional structural fold
    /// ranges from the host.
    pub fn new(
        scanner: &'a Scanner,
        lines: &'a LineIndex,
        spans: &'a [Span],
        structure: &'a [LineRange],
    ) -> Self {
        let declarations = spans
            .iter()
            .filter(|s| s.kind == SpanKind::NamedScopeDeclaration)
            .map(|s| (lines.char_to_line(s.range.start), s))
            .collect();
        Self {
            scanner,
            lines,
            declarations,
            structure,
        }
    }

    fn declaration_on_line(&self, line: usize) -> Option<&'a Span> {
        self.declarations
            .iter()
            .find(|(l, _)| *l == line)
            .map(|(_, span)| *span)
    }

    fn opens_frame(&self, line: &str) -> bool {
        self.scanner.opens_block(line)
            || (line.contains("<turbo-frame") && !line.contains("</turbo-frame>"))
    }

    /// The nearest frame enclosing `cursor_line`.
    ///
    /// A declaration on the cursor line always wins. Otherwise the innermost structural fold
    /// range starting on a declaration line is used, and without one the indentation walk.
    pub fn enclosing(&self, cursor_line: usize) -> Option<FrameScope> {
        if let Some(decl) = self.declaration_on_line(cursor_line) {
            return Some(self.scope(decl, cursor_line));
        }

        let structural = self
            .structure
            .iter()
            .filter(|r| r.contains_line(cursor_line))
            .filter_map(|r| self.declaration_on_line(r.start_line).map(|d| (r, d)))
            .max_by_key(|(r, _)| (r.start_line, std::cmp::Reverse(r.end_line)));
        if let Some((range, decl)) = structural {
            return Some(FrameScope {
                declaration: decl.clone(),
                lines: *range,
            });
        }

        self.walk_indentation(cursor_line)
    }

    fn walk_indentation(&self, cursor_line: usize) -> Option<FrameScope> {
        let mut threshold = self.lines.indent(cursor_line).unwrap_or(usize::MAX);
        // Indent of a closing marker whose opener has not been passed yet.
        let mut closed_at: Option<usize> = None;
        for line in (0..cursor_line).rev() {
            let Some(indent) = self.lines.indent(line) else {
                continue;
            };
            if indent > threshold {
                continue;
            }
            threshold = indent;
            if closed_at.take() == Some(indent) {
                continue;
            }
            let text = self.lines.line_text(line).unwrap_or_default();
            if closes_block(&text) {
                closed_at = Some(indent);
                continue;
            }
            if let Some(decl) = self.declaration_on_line(line)
                && self.opens_frame(&text)
            {
                return Some(self.scope(decl, line));
            }
        }
        None
    }

    fn scope(&self, declaration: &Span, line: usize) -> FrameScope {
        FrameScope {
            declaration: declaration.clone(),
            lines: LineRange::new(line, self.block_end(line)),
        }
    }

    /// Last line of the block opened on `line`.
    pub fn block_end(&self, line: usize) -> usize {
        if let Some(end) = self
            .structure
            .iter()
            .filter(|r| r.start_line == line)
            .map(|r| r.end_line)
            .max()
        {
            return end;
        }

        let text = self.lines.line_text(line).unwrap_or_default();
        if !self.opens_frame(&text) {
            return line;
        }

        let base = self.lines.indent(line).unwrap_or(0);
        let mut last = line;
        for next in line + 1..self.lines.line_count() {
            let Some(indent) = self.lines.indent(next) else {
                continue;
            };
            if indent <= base {
                let text = self.lines.line_text(next).unwrap_or_default();
                return if closes_block(&text) { next } else { last };
            }
            last = next;
        }
        last
    }
}

/// `</turbo-frame>` or an embedded `end` tag.
fn closes_block(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.starts_with("</turbo-frame") {
        return true;
    }
    let Some(body) = trimmed.strip_prefix("<%") else {
        return false;
    };
    let body = body.trim_start_matches(['-', '=']).trim_start();
    body.strip_prefix("end")
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// The frame context selected by an enclosing scope, for a cursor that is not on a declaration
/// or reference.
pub fn scope_context(scope: &FrameScope) -> Option<ActiveContext> {
    let id = scope.declaration.names().first()?;
    Some(ActiveContext::Frame {
        primary: scope.declaration.clone(),
        id: normalize_name(&id.text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ContextTarget, resolve_context};

    fn scan(text: &str, kinds: &[SpanKind]) -> Vec<Span> {
        Scanner::new().unwrap().scan_kinds(text, kinds).collect()
    }

    #[test]
    fn test_duplicate_frame_declarations_all_link() {
        let text = r#"<%= turbo_frame_tag "cart" %>
<%= turbo_frame_tag "cart" %>
<a data-turbo-frame="cart">x</a>
<%= turbo_frame_tag "other" %>"#;
        let spans = scan(
            text,
            &[SpanKind::NamedScopeDeclaration, SpanKind::NamedScopeReference],
        );
        let cursor = text.find("data-turbo-frame").unwrap() + 2;
        let ctx = resolve_context(&spans, cursor, ContextTarget::Frame);
        let linked = link(&spans, &ctx);
        assert_eq!(linked.spans.len(), 3);
        assert_eq!(linked.spans[2].kind, SpanKind::NamedScopeReference);
    }

    #[test]
    fn test_controller_names_link_across_syntaxes() {
        let text = r#"<div data-controller="My-Widget">
<%= tag.button data: { action: "click->my_widget#go" } %>
<input data-my-widget-target="field">
<div data-controller="other"></div>"#;
        let spans = scan(
            text,
            &[
                SpanKind::ControllerDeclaration,
                SpanKind::ActionReference,
                SpanKind::ControllerReference,
            ],
        );
        let ctx = resolve_context(&spans, 25, ContextTarget::Controllers);
        let linked = link(&spans, &ctx);
        let kinds: Vec<SpanKind> = linked.spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::ControllerDeclaration,
                SpanKind::ActionReference,
                SpanKind::ControllerReference
            ]
        );
    }

    #[test]
    fn test_actions_and_targets_inside_a_controller_hash() {
        let kinds = [
            SpanKind::ControllerDeclaration,
            SpanKind::ControllerReference,
            SpanKind::ActionReference,
            SpanKind::Comment,
        ];

        let text = r#"<%= tag.div data: { controller: "dropdown", action: "click->dropdown#toggle" } %>"#;
        let spans = scan(text, &kinds);
        match resolve_context(&spans, text.find("click").unwrap(), ContextTarget::Controllers) {
            ActiveContext::Controllers { primary, names } => {
                assert_eq!(primary.kind, SpanKind::ActionReference);
                assert_eq!(names, vec!["dropdown"]);
            }
            other => panic!("unexpected context: {other:?}"),
        }

        let text = r#"<%= f.text_field :q, data: { controller: "search", search_target: "input" } %>
<div data-controller="search"></div>"#;
        let spans = scan(text, &kinds);
        let cursor = text.find("search_target").unwrap() + 2;
        let ctx = resolve_context(&spans, cursor, ContextTarget::Controllers);
        assert!(matches!(
            &ctx,
            ActiveContext::Controllers { primary, .. } if primary.kind == SpanKind::ControllerReference
        ));
        let linked = link(&spans, &ctx);
        let ranges: BTreeSet<TextRange> = linked.spans.iter().map(|s| s.range).collect();
        assert_eq!(linked.spans.len(), 3);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_exact_modifier_matches() {
        let text = r#"<div class="hover:focus:text-red-500 focus:hover:bg-blue-200 hover:text-green-500">"#;
        let spans = scan(text, &[SpanKind::AttributeValue]);
        let cursor = text.find("bg-blue").unwrap();
        let ctx = resolve_context(&spans, cursor, ContextTarget::Modifiers);
        let linked = link(&spans, &ctx);

        let exact: Vec<&str> = linked
            .exact_matches
            .iter()
            .map(|r| &text[r.start..r.end])
            .collect();
        assert_eq!(exact, vec!["hover:focus:", "focus:hover:"]);

        let identifiers: Vec<&str> = linked
            .by_identifier
            .iter()
            .map(|e| e.identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["hover", "focus"]);
        assert_eq!(linked.by_identifier[0].ranges.len(), 3);
        assert_eq!(linked.spans.len(), 3);
    }

    #[test]
    fn test_single_modifier_has_no_exact_matches() {
        let text = r#"<div class="hover:a hover:b">"#;
        let spans = scan(text, &[SpanKind::AttributeValue]);
        let ctx = resolve_context(&spans, 13, ContextTarget::Modifiers);
        let linked = link(&spans, &ctx);
        assert!(linked.exact_matches.is_empty());
        assert_eq!(linked.by_identifier[0].ranges.len(), 2);
    }

    #[test]
    fn test_indentation_walk_finds_enclosing_frame() {
        let text = "<div>\n  <%= turbo_frame_tag \"cart\" do %>\n    <ul>\n      <li>item</li>\n    </ul>\n  <% end %>\n  <p>after</p>\n</div>";
        let scanner = Scanner::new().unwrap();
        let spans: Vec<Span> = scanner.scan(text, SpanKind::NamedScopeDeclaration).collect();
        let lines = LineIndex::from_text(text);
        let walker = FrameWalker::new(&scanner, &lines, &spans, &[]);

        let scope = walker.enclosing(3).unwrap();
        assert_eq!(scope.lines, LineRange::new(1, 5));
        assert_eq!(scope.declaration.names()[0].text, "cart");

        assert!(walker.enclosing(6).is_none());
        assert!(walker.enclosing(0).is_none());
    }

    #[test]
    fn test_walk_skips_closed_sibling_blocks() {
        let text = "<%= turbo_frame_tag \"x\" do %>\n  <% if a %>\n    <b>a</b>\n  <% end %>\n  <p>here</p>\n<% end %>";
        let scanner = Scanner::new().unwrap();
        let spans: Vec<Span> = scanner.scan(text, SpanKind::NamedScopeDeclaration).collect();
        let lines = LineIndex::from_text(text);
        let walker = FrameWalker::new(&scanner, &lines, &spans, &[]);
        assert_eq!(walker.enclosing(4).unwrap().lines, LineRange::new(0, 5));
    }

    #[test]
    fn test_closing_marker_stops_the_walk() {
        let text = "<turbo-frame id=\"a\">\n  <p>x</p>\n</turbo-frame>\n<p>outside</p>";
        let scanner = Scanner::new().unwrap();
        let spans: Vec<Span> = scanner.scan(text, SpanKind::NamedScopeDeclaration).collect();
        let lines = LineIndex::from_text(text);
        let walker = FrameWalker::new(&scanner, &lines, &spans, &[]);
        assert_eq!(walker.enclosing(1).unwrap().lines, LineRange::new(0, 2));
        assert!(walker.enclosing(3).is_none());
    }

    #[test]
    fn test_structural_ranges_take_precedence() {
        let text = "<%= turbo_frame_tag \"outer\" do %>\n<%= turbo_frame_tag \"inner\" do %>\n<p>x</p>\n<% end %>\n<% end %>";
        let scanner = Scanner::new().unwrap();
        let spans: Vec<Span> = scanner.scan(text, SpanKind::NamedScopeDeclaration).collect();
        let lines = LineIndex::from_text(text);
        let structure = [LineRange::new(0, 4), LineRange::new(1, 3)];
        let walker = FrameWalker::new(&scanner, &lines, &spans, &structure);

        let scope = walker.enclosing(2).unwrap();
        assert_eq!(scope.lines, LineRange::new(1, 3));
        let ctx = scope_context(&scope).unwrap();
        assert!(matches!(ctx, ActiveContext::Frame { ref id, .. } if id == "inner"));
    }

    #[test]
    fn test_closes_block() {
        assert!(closes_block("  <% end %>"));
        assert!(closes_block("<%- end -%>"));
        assert!(closes_block("</turbo-frame>"));
        assert!(!closes_block("<% ending %>"));
        assert!(!closes_block("<p>end</p>"));
    }
}

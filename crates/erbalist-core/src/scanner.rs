//! Lexical scanner.
//!
//! Finds every region of a given [`SpanKind`] in a text buffer with regex rules. A kind may have
//! several alternate surface syntaxes (an attribute style and an inline-hash style); their
//! matches are merged into a single ordered stream that never overlaps within one kind, the
//! earlier-declared rule winning when two alternates match at the same position. Spans of
//! different kinds may overlap: one `data: { ... }` hash can declare a controller and carry its
//! actions and targets.
//!
//! Matching is non-recursive and non-nesting. Unterminated constructs simply don't match.

use crate::span::{Name, Span, SpanKind, SpanPayload};
use crate::text::{CharCounter, TextRange};
use regex::{Captures, Regex};

/// How a rule turns its captured value into a [`SpanPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadShape {
    /// No payload.
    Bare,
    /// The captured group as a [`SpanPayload::Value`].
    Value,
    /// Whitespace-separated identifiers inside the captured group.
    WordList,
    /// `event->controller#method` descriptors inside the captured group.
    ActionTargets,
    /// The captured group as a single identifier.
    Ident,
}

struct RuleSpec {
    kind: SpanKind,
    pattern: &'static str,
    /// Candidate capture groups; the first one that participated in the match wins.
    groups: &'static [usize],
    shape: PayloadShape,
    accept: Option<fn(&str) -> bool>,
}

fn is_comment_tag(tag: &str) -> bool {
    tag.starts_with("<%#")
}

fn is_script_tag(tag: &str) -> bool {
    !is_comment_tag(tag)
}

const ERB_TAG: &str = r"(?s)<%(?:=|-)?(.*?)%>";

const RULE_SPECS: &[RuleSpec] = &[
    RuleSpec {
        kind: SpanKind::ScriptBlock,
        pattern: ERB_TAG,
        groups: &[1],
        shape: PayloadShape::Value,
        accept: Some(is_script_tag),
    },
    RuleSpec {
        kind: SpanKind::Comment,
        pattern: ERB_TAG,
        groups: &[1],
        shape: PayloadShape::Value,
        accept: Some(is_comment_tag),
    },
    RuleSpec {
        kind: SpanKind::AttributeValue,
        pattern: r#"class ?[=:] ?["']([^"']+)["']"#,
        groups: &[1],
        shape: PayloadShape::Value,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ControllerDeclaration,
        pattern: r#"data-controller=["']([^"']+)["']"#,
        groups: &[1],
        shape: PayloadShape::WordList,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ControllerDeclaration,
        pattern: r#"data:\s*\{[^}]*controller:\s*["']([^"']+)["'][^}]*\}"#,
        groups: &[1],
        shape: PayloadShape::WordList,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ControllerReference,
        pattern: r#"data-([^=\s"']+)-(?:target|outlet|value)=["'][^"']*["']"#,
        groups: &[1],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ControllerReference,
        pattern: r#"data:\s*\{[^}]*?([^:\s"'{,]+?)_(?:target|outlet|value):\s*["'][^"']*["'][^}]*\}"#,
        groups: &[1],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ActionReference,
        pattern: r#"data-action=["']([^"']*)["']"#,
        groups: &[1],
        shape: PayloadShape::ActionTargets,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::ActionReference,
        pattern: r#"data:\s*\{[^}]*action:\s*["']([^"']*)["'][^}]*\}"#,
        groups: &[1],
        shape: PayloadShape::ActionTargets,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::NamedScopeDeclaration,
        pattern: r#"turbo_frame_tag\s*\(?\s*(?:["']([^"']+)["']|:([\w-]+)|([\w.@]+(?:\([^)]*\))?))"#,
        groups: &[1, 2, 3],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::NamedScopeDeclaration,
        pattern: r#"<turbo-frame\b[^>]*?\bid=["']([^"']+)["'][^>]*>"#,
        groups: &[1],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::NamedScopeReference,
        pattern: r#"data-turbo-frame=["']([^"']+)["']"#,
        groups: &[1],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::NamedScopeReference,
        pattern: r#"data:\s*\{[^}]*turbo_frame:\s*["']([^"']+)["'][^}]*\}"#,
        groups: &[1],
        shape: PayloadShape::Ident,
        accept: None,
    },
    RuleSpec {
        kind: SpanKind::SvgElement,
        pattern: r"(?s)<svg\b.*?</svg>",
        groups: &[],
        shape: PayloadShape::Bare,
        accept: None,
    },
];

/// A compiled scanning rule.
#[derive(Debug, Clone)]
struct ScanRule {
    kind: SpanKind,
    regex: Regex,
    groups: &'static [usize],
    shape: PayloadShape,
    accept: Option<fn(&str) -> bool>,
}

impl ScanRule {
    fn accepts(&self, matched: &str) -> bool {
        self.accept.is_none_or(|accept| accept(matched))
    }
}

/// The regex-driven lexical scanner.
///
/// Compile it once and reuse it; scanning itself holds no state between calls.
#[derive(Debug, Clone)]
pub struct Scanner {
    rules: Vec<ScanRule>,
    action_target: Regex,
    block_opener: Regex,
}

impl Scanner {
    /// Compile all scanning rules.
    pub fn new() -> Result<Self, regex::Error> {
        let rules = RULE_SPECS
            .iter()
            .map(|spec| {
                Ok(ScanRule {
                    kind: spec.kind,
                    regex: Regex::new(spec.pattern)?,
                    groups: spec.groups,
                    shape: spec.shape,
                    accept: spec.accept,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            rules,
            action_target: Regex::new(r"(?:^|\s|->)([\w-]+)#")?,
            block_opener: Regex::new(r"\bdo\s*(?:\|[^|]*\|)?\s*-?%>")?,
        })
    }

    /// Scan `text` for spans of one kind.
    ///
    /// The returned iterator is lazy and finite; calling `scan` again restarts from the
    /// beginning.
    pub fn scan<'s, 't>(&'s self, text: &'t str, kind: SpanKind) -> Scan<'s, 't> {
        self.scan_kinds(text, &[kind])
    }

    /// Scan `text` for spans of several kinds at once, merged into one stream ordered by start.
    ///
    /// Spans of one kind never overlap; spans of different kinds may. `ScriptBlock` and
    /// `Comment` share one tag pattern, so `[ScriptBlock, Comment]` yields every embedded tag
    /// exactly once, tagged with its kind.
    pub fn scan_kinds<'s, 't>(&'s self, text: &'t str, kinds: &[SpanKind]) -> Scan<'s, 't> {
        let expand_tokens = kinds.contains(&SpanKind::ModifierToken);
        let cursors = self
            .rules
            .iter()
            .filter(|rule| {
                kinds.contains(&rule.kind)
                    || (expand_tokens && rule.kind == SpanKind::AttributeValue)
            })
            .map(|rule| RuleCursor::new(rule, text))
            .collect();

        Scan {
            scanner: self,
            text,
            counter: CharCounter::new(text),
            cursors,
            expand_tokens,
            emit_attributes: kinds.contains(&SpanKind::AttributeValue),
            pending: Vec::new().into_iter(),
        }
    }

    /// Returns `true` if a line opens an embedded-script block (`... do %>`, `do |f| -%>`).
    pub fn opens_block(&self, line: &str) -> bool {
        self.block_opener.is_match(line)
    }

    fn payload(&self, rule: &ScanRule, caps: &Captures<'_>, counter: &mut CharCounter<'_>) -> SpanPayload {
        let Some(group) = rule.groups.iter().find_map(|&g| caps.get(g)) else {
            return SpanPayload::None;
        };
        let range = counter.range(group.start(), group.end());
        let value = Name::new(group.as_str(), range);

        match rule.shape {
            PayloadShape::Bare => SpanPayload::None,
            PayloadShape::Value => SpanPayload::Value(value),
            PayloadShape::Ident => SpanPayload::Ident(value),
            PayloadShape::WordList => {
                let names = words(&value);
                SpanPayload::Names { value, names }
            }
            PayloadShape::ActionTargets => {
                let mut local = CharCounter::new(&value.text);
                let names = self
                    .action_target
                    .captures_iter(&value.text)
                    .filter_map(|c| c.get(1))
                    .map(|m| {
                        let r = local.range(m.start(), m.end());
                        Name::new(
                            m.as_str(),
                            TextRange::new(value.range.start + r.start, value.range.start + r.end),
                        )
                    })
                    .collect();
                SpanPayload::Names { value, names }
            }
        }
    }
}

/// One rule's look-ahead match.
struct RuleCursor<'s, 't> {
    rule: &'s ScanRule,
    head: Option<Captures<'t>>,
    exhausted: bool,
}

impl<'s, 't> RuleCursor<'s, 't> {
    fn new(rule: &'s ScanRule, text: &'t str) -> Self {
        let mut cursor = Self {
            rule,
            head: None,
            exhausted: false,
        };
        cursor.seek(text, 0);
        cursor
    }

    fn head_start(&self) -> Option<usize> {
        self.head.as_ref().map(|caps| caps.get_match().start())
    }

    /// Find the first accepted match at or after byte offset `pos`.
    fn seek(&mut self, text: &'t str, mut pos: usize) {
        self.head = None;
        while !self.exhausted && pos <= text.len() {
            let Some(caps) = self.rule.regex.captures_at(text, pos) else {
                self.exhausted = true;
                return;
            };
            let whole = caps.get_match();
            if whole.is_empty() {
                pos = next_char_boundary(text, whole.end());
                continue;
            }
            if self.rule.accepts(whole.as_str()) {
                self.head = Some(caps);
                return;
            }
            pos = whole.end();
        }
        self.exhausted = true;
    }
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len() + 1)
}

/// A lazy, finite stream of [`Span`]s produced by [`Scanner::scan`].
pub struct Scan<'s, 't> {
    scanner: &'s Scanner,
    text: &'t str,
    counter: CharCounter<'t>,
    cursors: Vec<RuleCursor<'s, 't>>,
    expand_tokens: bool,
    emit_attributes: bool,
    pending: std::vec::IntoIter<Span>,
}

impl Scan<'_, '_> {
    fn next_match(&mut self) -> Option<Span> {
        let (_, idx) = self
            .cursors
            .iter()
            .enumerate()
            .filter_map(|(idx, cursor)| cursor.head_start().map(|start| (start, idx)))
            .min()?;

        let caps = self.cursors[idx].head.take()?;
        let rule = self.cursors[idx].rule;
        let whole = caps.get_match();

        let start = self.counter.char_offset(whole.start());
        let payload = self.scanner.payload(rule, &caps, &mut self.counter);
        let end = self.counter.char_offset(whole.end());
        let span = Span::new(rule.kind, TextRange::new(start, end), payload);

        // Alternates of the same kind resume after the emitted match; other kinds may overlap it.
        let resume = whole.end();
        for (i, cursor) in self.cursors.iter_mut().enumerate() {
            let overlapped =
                cursor.rule.kind == rule.kind && cursor.head_start().is_some_and(|s| s < resume);
            if i == idx || overlapped {
                cursor.seek(self.text, resume);
            }
        }

        Some(span)
    }
}

impl Iterator for Scan<'_, '_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            if let Some(span) = self.pending.next() {
                return Some(span);
            }

            let span = self.next_match()?;
            if self.expand_tokens && span.kind == SpanKind::AttributeValue {
                let mut expanded: Vec<Span> = span
                    .value()
                    .map(class_tokens)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|token| !token.names().is_empty())
                    .collect();
                if self.emit_attributes {
                    expanded.insert(0, span);
                }
                self.pending = expanded.into_iter();
                continue;
            }
            return Some(span);
        }
    }
}

/// Split an attribute value into whitespace-separated, located words.
fn words(value: &Name) -> Vec<Name> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_start = 0usize;

    for (idx, ch) in value.text.chars().enumerate() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                let start = value.range.start + current_start;
                out.push(Name::new(
                    std::mem::take(&mut current),
                    TextRange::new(start, value.range.start + idx),
                ));
            }
            continue;
        }
        if current.is_empty() {
            current_start = idx;
        }
        current.push(ch);
    }

    if !current.is_empty() {
        let start = value.range.start + current_start;
        let len = current.chars().count();
        out.push(Name::new(current, TextRange::new(start, start + len)));
    }

    out
}

/// Tokenize a class attribute value into [`SpanKind::ModifierToken`] spans.
///
/// Every whitespace-separated class becomes one token. Its colon-delimited prefixes are the
/// modifiers (`hover:focus:text-red-500` carries `hover` and `focus`); each modifier's range
/// covers the modifier name and its trailing colon. Tokens without modifiers are returned too,
/// with an empty modifier list.
pub fn class_tokens(value: &Name) -> Vec<Span> {
    words(value)
        .into_iter()
        .map(|token| {
            let mut modifiers = Vec::new();
            let mut segment_start = 0usize;
            let mut segment = String::new();

            for (idx, ch) in token.text.chars().enumerate() {
                if ch == ':' {
                    if !segment.is_empty() {
                        let start = token.range.start + segment_start;
                        modifiers.push(Name::new(
                            std::mem::take(&mut segment),
                            TextRange::new(start, token.range.start + idx + 1),
                        ));
                    }
                    segment_start = idx + 1;
                    continue;
                }
                segment.push(ch);
            }

            Span::new(
                SpanKind::ModifierToken,
                token.range,
                SpanPayload::Modifiers { token, modifiers },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_ranges(spans: &[Span]) -> Vec<(SpanKind, usize, usize)> {
        spans
            .iter()
            .map(|s| (s.kind, s.range.start, s.range.end))
            .collect()
    }

    #[test]
    fn test_script_and_comment_tags_are_split_by_kind() {
        let scanner = Scanner::new().unwrap();
        let text = "<p><%= a %></p><%# note %><% b -%>";
        let scripts: Vec<Span> = scanner.scan(text, SpanKind::ScriptBlock).collect();
        let comments: Vec<Span> = scanner.scan(text, SpanKind::Comment).collect();
        assert_eq!(
            kinds_and_ranges(&scripts),
            vec![(SpanKind::ScriptBlock, 3, 11), (SpanKind::ScriptBlock, 26, 34)]
        );
        assert_eq!(kinds_and_ranges(&comments), vec![(SpanKind::Comment, 15, 26)]);

        let all: Vec<Span> = scanner
            .scan_kinds(text, &[SpanKind::ScriptBlock, SpanKind::Comment])
            .collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].kind, SpanKind::Comment);
    }

    #[test]
    fn test_unterminated_tag_contributes_nothing() {
        let scanner = Scanner::new().unwrap();
        assert_eq!(scanner.scan("<div><% if x ", SpanKind::ScriptBlock).count(), 0);
    }

    #[test]
    fn test_offsets_are_char_based() {
        let scanner = Scanner::new().unwrap();
        let text = "👋 <div class=\"sm:flex\">";
        let spans: Vec<Span> = scanner.scan(text, SpanKind::AttributeValue).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range, TextRange::new(7, 22));
        let value = spans[0].value().unwrap();
        assert_eq!(value.text, "sm:flex");
        assert_eq!(value.range, TextRange::new(14, 21));
    }

    #[test]
    fn test_controller_alternates_are_merged_in_order() {
        let scanner = Scanner::new().unwrap();
        let text = r#"<%= tag.div data: { controller: "b c" } %><div data-controller="a">"#;
        let spans: Vec<Span> = scanner.scan(text, SpanKind::ControllerDeclaration).collect();
        assert_eq!(spans.len(), 2);
        let first: Vec<&str> = spans[0].names().iter().map(|n| n.text.as_str()).collect();
        let second: Vec<&str> = spans[1].names().iter().map(|n| n.text.as_str()).collect();
        assert_eq!(first, vec!["b", "c"]);
        assert_eq!(second, vec!["a"]);
        assert!(spans[0].range.end <= spans[1].range.start);
    }

    #[test]
    fn test_kinds_sharing_a_data_hash_all_match() {
        let scanner = Scanner::new().unwrap();
        let text = r#"<%= tag.div data: { controller: "dropdown", action: "click->dropdown#toggle" } %>"#;
        let spans: Vec<Span> = scanner
            .scan_kinds(
                text,
                &[
                    SpanKind::ControllerDeclaration,
                    SpanKind::ControllerReference,
                    SpanKind::ActionReference,
                    SpanKind::Comment,
                ],
            )
            .collect();
        let kinds: Vec<SpanKind> = spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SpanKind::ControllerDeclaration, SpanKind::ActionReference]
        );
        assert_eq!(spans[0].range, spans[1].range);
        assert_eq!(spans[1].names()[0].text, "dropdown");
    }

    #[test]
    fn test_action_targets_are_located() {
        let scanner = Scanner::new().unwrap();
        let text = r#"<button data-action="click->cart#add search#run">"#;
        let spans: Vec<Span> = scanner.scan(text, SpanKind::ActionReference).collect();
        assert_eq!(spans.len(), 1);
        let names = spans[0].names();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].text, "cart");
        assert_eq!(&text[names[0].range.start..names[0].range.end], "cart");
        assert_eq!(names[1].text, "search");
        assert_eq!(&text[names[1].range.start..names[1].range.end], "search");
    }

    #[test]
    fn test_controller_reference_hash_style() {
        let scanner = Scanner::new().unwrap();
        let text = r#"<%= f.text_field :q, data: { search_form_target: "input" } %>"#;
        let spans: Vec<Span> = scanner.scan(text, SpanKind::ControllerReference).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].names()[0].text, "search_form");
    }

    #[test]
    fn test_frame_declaration_forms() {
        let scanner = Scanner::new().unwrap();
        let text = "<%= turbo_frame_tag \"cart\" do %>\n<%= turbo_frame_tag :list %>\n<turbo-frame class=\"x\" id=\"side\">\n<%= turbo_frame_tag dom_id(post) %>";
        let ids: Vec<String> = scanner
            .scan(text, SpanKind::NamedScopeDeclaration)
            .map(|s| s.names()[0].text.clone())
            .collect();
        assert_eq!(ids, vec!["cart", "list", "side", "dom_id(post)"]);
    }

    #[test]
    fn test_modifier_tokens() {
        let scanner = Scanner::new().unwrap();
        let text = r#"<div class="p-2 hover:focus:text-red-500 md:block">"#;
        let tokens: Vec<Span> = scanner.scan(text, SpanKind::ModifierToken).collect();
        assert_eq!(tokens.len(), 2);
        let modifiers: Vec<&str> = tokens[0].names().iter().map(|n| n.text.as_str()).collect();
        assert_eq!(modifiers, vec!["hover", "focus"]);
        let hover = &tokens[0].names()[0];
        assert_eq!(&text[hover.range.start..hover.range.end], "hover:");

        let with_attrs: Vec<Span> = scanner
            .scan_kinds(text, &[SpanKind::AttributeValue, SpanKind::ModifierToken])
            .collect();
        assert_eq!(with_attrs.len(), 3);
        assert_eq!(with_attrs[0].kind, SpanKind::AttributeValue);
    }

    #[test]
    fn test_block_opener_detection() {
        let scanner = Scanner::new().unwrap();
        assert!(scanner.opens_block(r#"<%= turbo_frame_tag "x" do %>"#));
        assert!(scanner.opens_block(r#"<%= form_with model: @p do |f| -%>"#));
        assert!(!scanner.opens_block(r#"<%= turbo_frame_tag "x" %>"#));
    }
}

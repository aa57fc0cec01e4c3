//! The decoration features, each a thin client of the scan → resolve → link → plan pipeline.

use crate::decorations::DecorationGroup;
use crate::linker::{FrameWalker, LinkedSpans, link, scope_context};
use crate::planner::{PaintPlan, PlanMode, plan, scope_region};
use crate::processing::{Feature, PaintEdit, PassInput};
use crate::resolver::{ActiveContext, ContextTarget, resolve_context};
use crate::span::{Span, SpanKind};
use crate::state::DocumentState;

/// Scan the kinds a feature needs plus comments, so comment precedence applies.
fn scan_with_comments(input: &PassInput<'_>, kinds: &[SpanKind]) -> Vec<Span> {
    let mut all = kinds.to_vec();
    all.push(SpanKind::Comment);
    input
        .scanner
        .scan_kinds(input.snapshot.text(), &all)
        .collect()
}

/// Dims everything outside embedded script tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptEmphasis;

impl Feature for ScriptEmphasis {
    fn name(&self) -> &'static str {
        "script-emphasis"
    }

    fn groups(&self) -> Vec<DecorationGroup> {
        vec![DecorationGroup::Dim]
    }

    fn is_enabled(&self, state: &DocumentState) -> bool {
        state.toggles.dimming_enabled
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit> {
        let spans = input
            .scanner
            .scan_kinds(input.snapshot.text(), &[SpanKind::ScriptBlock, SpanKind::Comment])
            .collect::<Vec<_>>();
        let context = resolve_context(
            &spans,
            input.snapshot.cursor(),
            ContextTarget::Script(input.settings.highlight_mode),
        );
        let linked = link(&spans, &context);
        let plan = plan(input.snapshot.text(), &context, &linked, PlanMode::DimExceptActive);
        PaintEdit::from_plan(&plan, &self.groups())
    }
}

/// Folds class attributes behind a glyph.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassFolding;

impl Feature for ClassFolding {
    fn name(&self) -> &'static str {
        "class-folding"
    }

    fn groups(&self) -> Vec<DecorationGroup> {
        vec![DecorationGroup::Folded]
    }

    fn is_enabled(&self, state: &DocumentState) -> bool {
        state.toggles.folding_enabled
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit> {
        let linked = LinkedSpans {
            spans: input
                .scanner
                .scan(input.snapshot.text(), SpanKind::AttributeValue)
                .collect(),
            ..Default::default()
        };
        let expanded: Vec<_> = input.state.expanded.into_iter().collect();
        let plan = plan(
            input.snapshot.text(),
            &ActiveContext::None,
            &linked,
            PlanMode::Fold {
                expanded: &expanded,
            },
        );
        PaintEdit::from_plan(&plan, &self.groups())
    }
}

/// Highlights the cursor token's modifiers across every class attribute.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModifierHighlight;

impl Feature for ModifierHighlight {
    fn name(&self) -> &'static str {
        "modifier-highlight"
    }

    fn groups(&self) -> Vec<DecorationGroup> {
        DecorationGroup::modifier_groups()
    }

    fn is_enabled(&self, _state: &DocumentState) -> bool {
        true
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit> {
        let spans = scan_with_comments(input, &[SpanKind::AttributeValue]);
        let context = resolve_context(&spans, input.snapshot.cursor(), ContextTarget::Modifiers);
        let linked = link(&spans, &context);
        let plan = plan(input.snapshot.text(), &context, &linked, PlanMode::HighlightBuckets);
        PaintEdit::from_plan(&plan, &self.groups())
    }
}

/// Links controller declarations, actions and scoped attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControllerLinks;

impl Feature for ControllerLinks {
    fn name(&self) -> &'static str {
        "controller-links"
    }

    fn groups(&self) -> Vec<DecorationGroup> {
        vec![DecorationGroup::Controller]
    }

    fn is_enabled(&self, _state: &DocumentState) -> bool {
        true
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit> {
        let spans = scan_with_comments(
            input,
            &[
                SpanKind::ControllerDeclaration,
                SpanKind::ControllerReference,
                SpanKind::ActionReference,
            ],
        );
        let context = resolve_context(&spans, input.snapshot.cursor(), ContextTarget::Controllers);
        let linked = link(&spans, &context);
        let plan = plan(
            input.snapshot.text(),
            &context,
            &linked,
            PlanMode::HighlightAll(DecorationGroup::Controller),
        );
        PaintEdit::from_plan(&plan, &self.groups())
    }
}

/// Links turbo frame declarations and references, and paints the enclosing frame's block.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameLinks;

impl Feature for FrameLinks {
    fn name(&self) -> &'static str {
        "turbo-frames"
    }

    fn groups(&self) -> Vec<DecorationGroup> {
        vec![DecorationGroup::TurboFrame, DecorationGroup::TurboFrameScope]
    }

    fn is_enabled(&self, state: &DocumentState) -> bool {
        state.toggles.turbo_frames_enabled
    }

    fn needs_structure(&self) -> bool {
        true
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit> {
        let text = input.snapshot.text();
        let cursor = input.snapshot.cursor();
        let spans = scan_with_comments(
            input,
            &[SpanKind::NamedScopeDeclaration, SpanKind::NamedScopeReference],
        );
        let mut context = resolve_context(&spans, cursor, ContextTarget::Frame);
        if context == ActiveContext::Suppressed {
            return PaintEdit::clear_all(&self.groups());
        }

        let lines = input.snapshot.line_index();
        let walker = FrameWalker::new(input.scanner, &lines, &spans, input.structure);
        let cursor_line = lines.char_to_line(cursor);
        let scope = walker.enclosing(cursor_line);
        if context == ActiveContext::None
            && let Some(enclosing) = scope.as_ref().and_then(scope_context)
        {
            context = enclosing;
        }

        let linked = link(&spans, &context);
        let mut plan = plan(
            text,
            &context,
            &linked,
            PlanMode::HighlightAll(DecorationGroup::TurboFrame),
        );
        if let Some(scope) = scope {
            tracing::trace!(
                start = scope.lines.start_line,
                end = scope.lines.end_line,
                "enclosing frame"
            );
            let mut regions = std::mem::take(&mut plan.regions);
            regions.push(scope_region(
                lines.lines_range(scope.lines.start_line, scope.lines.end_line),
            ));
            plan = PaintPlan { regions }.finish();
        }
        PaintEdit::from_plan(&plan, &self.groups())
    }
}

/// The features the engine runs, in paint order.
pub fn default_features() -> Vec<Box<dyn Feature>> {
    vec![
        Box::new(ScriptEmphasis),
        Box::new(ClassFolding),
        Box::new(ModifierHighlight),
        Box::new(ControllerLinks),
        Box::new(FrameLinks),
    ]
}

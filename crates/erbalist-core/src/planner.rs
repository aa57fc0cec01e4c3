//! Decoration planner.
//!
//! Turns a resolved context and its linked spans into paint regions. The planner is a pure
//! function of its inputs: the same snapshot and toggle state always produce the same region
//! list, order included, because the host replaces whole groups on every pass.

use crate::decorations::{DecorationGroup, FOLDED_GLYPH, PaintRegion};
use crate::linker::LinkedSpans;
use crate::resolver::ActiveContext;
use crate::span::{Span, SpanKind, normalize_name};
use crate::text::{TextRange, slice};
use std::collections::BTreeSet;

/// How linked spans are turned into regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode<'a> {
    /// Dim the complement of the linked spans.
    DimExceptActive,
    /// Paint every linked span in one group.
    HighlightAll(DecorationGroup),
    /// Paint per-identifier ranges in rotating buckets, plus exact matches.
    HighlightBuckets,
    /// Fold every linked attribute span, except ranges overlapping `expanded`.
    Fold {
        /// Temporarily expanded ranges.
        expanded: &'a [TextRange],
    },
}

/// The planner's output for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaintPlan {
    /// Regions sorted by range, then group. No two regions share a `(group, range)` pair.
    pub regions: Vec<PaintRegion>,
}

impl PaintPlan {
    /// Returns `true` if the plan paints nothing.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions of one group, in plan order.
    pub fn regions_for(&self, group: DecorationGroup) -> Vec<PaintRegion> {
        self.regions
            .iter()
            .filter(|r| r.group == group)
            .cloned()
            .collect()
    }

    /// Split the plan into one region list per group, including empty lists for groups with no
    /// regions so the host clears them.
    pub fn by_group(&self, groups: &[DecorationGroup]) -> Vec<(DecorationGroup, Vec<PaintRegion>)> {
        groups.iter().map(|&g| (g, self.regions_for(g))).collect()
    }

    /// Append a region; duplicates are dropped by [`PaintPlan::finish`].
    pub fn push(&mut self, region: PaintRegion) {
        self.regions.push(region);
    }

    /// Deduplicate by `(group, range)` and sort deterministically.
    pub fn finish(mut self) -> Self {
        let mut seen = BTreeSet::new();
        self.regions.retain(|r| seen.insert((r.group, r.range)));
        self.regions
            .sort_by_key(|r| (r.range.start, r.range.end, r.group));
        self
    }
}

/// Plan paint regions for `context` over `text`.
pub fn plan(
    text: &str,
    context: &ActiveContext,
    linked: &LinkedSpans,
    mode: PlanMode<'_>,
) -> PaintPlan {
    let mut plan = PaintPlan::default();

    match mode {
        PlanMode::Fold { expanded } => {
            for span in linked.spans.iter().filter(|s| s.kind == SpanKind::AttributeValue) {
                if expanded.iter().any(|e| e.overlaps(&span.range) || *e == span.range) {
                    continue;
                }
                plan.push(PaintRegion::folded(
                    span.range,
                    FOLDED_GLYPH,
                    slice(text, span.range),
                ));
            }
        }
        _ if !context.is_active() => {}
        PlanMode::DimExceptActive => {
            let total = text.chars().count();
            let active: Vec<TextRange> = linked.spans.iter().map(|s| s.range).collect();
            for gap in complement(&active, total) {
                plan.push(PaintRegion::new(gap, DecorationGroup::Dim));
            }
        }
        PlanMode::HighlightAll(group) => {
            for span in &linked.spans {
                let region = PaintRegion::new(span.range, group);
                plan.push(match tooltip(group, span) {
                    Some(tip) => region.with_tooltip(tip),
                    None => region,
                });
            }
        }
        PlanMode::HighlightBuckets => {
            for (idx, entry) in linked.by_identifier.iter().enumerate() {
                let group = DecorationGroup::bucket(idx);
                for range in &entry.ranges {
                    plan.push(PaintRegion::new(*range, group));
                }
            }
            for range in &linked.exact_matches {
                plan.push(PaintRegion::new(*range, DecorationGroup::ModifierExact));
            }
        }
    }

    plan.finish()
}

/// A whole-line region covering a frame's block.
pub fn scope_region(range: TextRange) -> PaintRegion {
    PaintRegion::new(range, DecorationGroup::TurboFrameScope)
}

fn tooltip(group: DecorationGroup, span: &Span) -> Option<String> {
    if group != DecorationGroup::Controller || span.names().is_empty() {
        return None;
    }
    let mut names: Vec<String> = Vec::new();
    for name in span.names() {
        let normalized = normalize_name(&name.text);
        if !names.contains(&normalized) {
            names.push(normalized);
        }
    }
    let label = if span.kind == SpanKind::ControllerReference {
        "Controller"
    } else {
        "Controllers"
    };
    Some(format!("{label}: {}", names.join(", ")))
}

/// Gaps between `active` ranges within `[0, total)`.
///
/// Overlapping or touching active ranges are merged first, so gaps are never empty and never
/// overlap an active range.
pub fn complement(active: &[TextRange], total: usize) -> Vec<TextRange> {
    let mut sorted: Vec<TextRange> = active
        .iter()
        .map(|r| TextRange::new(r.start.min(total), r.end.min(total)))
        .collect();
    sorted.sort();

    let mut gaps = Vec::new();
    let mut pos = 0usize;
    for range in sorted {
        if range.start > pos {
            gaps.push(TextRange::new(pos, range.start));
        }
        pos = pos.max(range.end);
    }
    if pos < total {
        gaps.push(TextRange::new(pos, total));
    }
    gaps
}

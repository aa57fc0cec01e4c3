//! Feature processing interfaces.
//!
//! Every decoration feature is a [`Feature`]: given one [`PassInput`], it produces
//! [`PaintEdit`]s for the decoration groups it owns. The engine applies the edits to the host,
//! group by group, replacing whatever the previous pass painted.

use crate::config::Settings;
use crate::decorations::{DecorationGroup, PaintRegion};
use crate::host::LineRange;
use crate::planner::PaintPlan;
use crate::scanner::Scanner;
use crate::snapshot::DocumentSnapshot;
use crate::state::DocumentState;

/// A change to one decoration group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintEdit {
    /// Replace every region of a group.
    Replace {
        /// The group being replaced.
        group: DecorationGroup,
        /// The full set of regions for the group.
        regions: Vec<PaintRegion>,
    },
    /// Clear a group.
    Clear {
        /// The group being cleared.
        group: DecorationGroup,
    },
}

impl PaintEdit {
    /// The group this edit targets.
    pub fn group(&self) -> DecorationGroup {
        match self {
            Self::Replace { group, .. } | Self::Clear { group } => *group,
        }
    }

    /// The regions the group holds after this edit.
    pub fn into_regions(self) -> Vec<PaintRegion> {
        match self {
            Self::Replace { regions, .. } => regions,
            Self::Clear { .. } => Vec::new(),
        }
    }

    /// One edit per group: `Replace` for groups with regions in `plan`, `Clear` otherwise.
    pub fn from_plan(plan: &PaintPlan, groups: &[DecorationGroup]) -> Vec<PaintEdit> {
        plan.by_group(groups)
            .into_iter()
            .map(|(group, regions)| {
                if regions.is_empty() {
                    PaintEdit::Clear { group }
                } else {
                    PaintEdit::Replace { group, regions }
                }
            })
            .collect()
    }

    /// `Clear` for every group.
    pub fn clear_all(groups: &[DecorationGroup]) -> Vec<PaintEdit> {
        groups
            .iter()
            .map(|&group| PaintEdit::Clear { group })
            .collect()
    }
}

/// Everything a feature may read during one pass.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    /// Text and cursor.
    pub snapshot: &'a DocumentSnapshot,
    /// The compiled scanner.
    pub scanner: &'a Scanner,
    /// Current settings.
    pub settings: &'a Settings,
    /// The document's state.
    pub state: &'a DocumentState,
    /// Structural fold ranges from the host (empty when unavailable).
    pub structure: &'a [LineRange],
}

/// A decoration feature driven by the cursor-context pipeline.
pub trait Feature {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Decoration groups owned by this feature.
    fn groups(&self) -> Vec<DecorationGroup>;

    /// Returns `true` if the feature is switched on for the document.
    fn is_enabled(&self, state: &DocumentState) -> bool;

    /// Returns `true` if the feature reads [`PassInput::structure`].
    fn needs_structure(&self) -> bool {
        false
    }

    /// Compute the edits for this pass.
    ///
    /// Implementations return one edit per owned group so stale regions are always cleared.
    fn process(&self, input: &PassInput<'_>) -> Vec<PaintEdit>;
}

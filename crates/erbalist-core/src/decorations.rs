//! Paint regions: the decoration data model handed to the host.
//!
//! Paint regions never modify the document text. Each region belongs to a
//! [`DecorationGroup`]; the host maps groups to visual styles and replaces a group's regions
//! wholesale on every pass.

use crate::text::TextRange;

/// Number of rotating modifier highlight buckets.
pub const MODIFIER_BUCKETS: u8 = 5;

/// Suggested background colors for [`DecorationGroup::ModifierBucket`], indexed by bucket.
///
/// These are only hints; the host is free to theme buckets however it likes.
pub const MODIFIER_PALETTE: [&str; MODIFIER_BUCKETS as usize] = [
    "rgba(255, 255, 0, 0.2)",
    "rgba(0, 255, 255, 0.2)",
    "rgba(255, 0, 255, 0.2)",
    "rgba(0, 255, 0, 0.2)",
    "rgba(255, 128, 0, 0.2)",
];

/// Glyph rendered in place of a folded class attribute.
pub const FOLDED_GLYPH: &str = "⋯";

/// Which visual treatment a paint region receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecorationGroup {
    /// Dimmed text (everything outside the emphasized script tags).
    Dim,
    /// A folded class attribute, rendered as [`FOLDED_GLYPH`].
    Folded,
    /// A modifier highlight; the bucket index selects a palette color.
    ModifierBucket(u8),
    /// Outline for class tokens whose modifier set exactly matches the cursor token's.
    ModifierExact,
    /// A controller declaration/reference linked to the cursor's controller.
    Controller,
    /// A frame declaration/reference linked to the cursor's frame id.
    TurboFrame,
    /// The whole-line block of the frame enclosing the cursor.
    TurboFrameScope,
}

impl DecorationGroup {
    /// Every modifier group (all buckets plus the exact-match outline), in paint order.
    pub fn modifier_groups() -> Vec<Self> {
        (0..MODIFIER_BUCKETS)
            .map(Self::ModifierBucket)
            .chain(std::iter::once(Self::ModifierExact))
            .collect()
    }

    /// The bucket group for the `index`-th distinct identifier (round-robin over the palette).
    pub fn bucket(index: usize) -> Self {
        Self::ModifierBucket((index % MODIFIER_BUCKETS as usize) as u8)
    }

    /// Returns `true` if regions of this group should be rendered across whole lines.
    pub fn is_whole_line(self) -> bool {
        matches!(self, Self::TurboFrameScope)
    }

    /// Suggested color for palette-driven groups.
    pub fn palette_color(self) -> Option<&'static str> {
        match self {
            Self::ModifierBucket(idx) => MODIFIER_PALETTE.get(idx as usize).copied(),
            _ => None,
        }
    }
}

/// A single paint instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintRegion {
    /// Range in character offsets.
    pub range: TextRange,
    /// The visual treatment.
    pub group: DecorationGroup,
    /// Virtual text rendered instead of the range (folding).
    pub replacement: Option<String>,
    /// Expandable detail payload: the original text hidden behind `replacement`.
    pub detail: Option<String>,
    /// Optional tooltip (plain text).
    pub tooltip: Option<String>,
}

impl PaintRegion {
    /// Create a plain region.
    pub fn new(range: TextRange, group: DecorationGroup) -> Self {
        Self {
            range,
            group,
            replacement: None,
            detail: None,
            tooltip: None,
        }
    }

    /// Create a folded region showing `replacement` with `detail` revealed on demand.
    pub fn folded(range: TextRange, replacement: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            range,
            group: DecorationGroup::Folded,
            replacement: Some(replacement.into()),
            detail: Some(detail.into()),
            tooltip: None,
        }
    }

    /// Attach a tooltip.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

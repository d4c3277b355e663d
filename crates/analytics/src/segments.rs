//! Population segmentation into top, middle and bottom bands.
//!
//! Bands are disjoint and cover the scored population exactly: the top
//! and bottom take roughly a tenth each (never less than one agent when
//! any exist), the middle absorbs the rest.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::composite::ScoredAgent;
use vigil_stats::mean;

/// Performance band within the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentBand {
    Top,
    Middle,
    Bottom,
}

impl std::fmt::Display for SegmentBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentBand::Top => write!(f, "top"),
            SegmentBand::Middle => write!(f, "middle"),
            SegmentBand::Bottom => write!(f, "bottom"),
        }
    }
}

/// Percentile coverage of a band, inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileRange {
    pub min: u8,
    pub max: u8,
}

/// One band of the segmented population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub band: SegmentBand,
    pub members: Vec<ScoredAgent>,
    pub count: usize,
    pub avg_score: f64,
    pub percentile: PercentileRange,
}

/// The population split into three disjoint bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segments {
    pub top: Segment,
    pub middle: Segment,
    pub bottom: Segment,
}

impl Segments {
    pub fn total(&self) -> usize {
        self.top.count + self.middle.count + self.bottom.count
    }
}

fn make_segment(band: SegmentBand, members: Vec<ScoredAgent>, percentile: PercentileRange) -> Segment {
    let scores: Vec<f64> = members.iter().map(|m| m.score).collect();
    Segment {
        band,
        count: members.len(),
        avg_score: mean(&scores),
        members,
        percentile,
    }
}

/// Split a scored population into top 10%, middle 80% and bottom 10%.
///
/// Both outer bands take `ceil(n / 10)` members with a floor of one;
/// the bottom band shrinks first when a tiny population cannot fill
/// both, so no agent ever lands in two bands.
pub fn segment_population(mut scored: Vec<ScoredAgent>) -> Segments {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = scored.len();
    let top_range = PercentileRange { min: 90, max: 100 };
    let middle_range = PercentileRange { min: 10, max: 90 };
    let bottom_range = PercentileRange { min: 0, max: 10 };

    if n == 0 {
        return Segments {
            top: make_segment(SegmentBand::Top, Vec::new(), top_range),
            middle: make_segment(SegmentBand::Middle, Vec::new(), middle_range),
            bottom: make_segment(SegmentBand::Bottom, Vec::new(), bottom_range),
        };
    }

    let tenth = ((n as f64) * 0.1).ceil() as usize;
    let top_count = tenth.max(1).min(n);
    let bottom_count = tenth.max(1).min(n - top_count);

    let bottom = scored.split_off(n - bottom_count);
    let middle = scored.split_off(top_count);
    let top = scored;

    debug!(
        total = n,
        top = top.len(),
        middle = middle.len(),
        bottom = bottom.len(),
        "population segmented"
    );

    Segments {
        top: make_segment(SegmentBand::Top, top, top_range),
        middle: make_segment(SegmentBand::Middle, middle, middle_range),
        bottom: make_segment(SegmentBand::Bottom, bottom, bottom_range),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

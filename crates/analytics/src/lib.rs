//! Population analytics over agent snapshots.
//!
//! Builds on `vigil-stats` to answer the operational questions: who are
//! the strongest and weakest agents (composite scoring, segmentation),
//! what separates them (factor contrasts), how a flagged cohort differs
//! from the population (cohort comparison) and what reschedules drag
//! down with them (reliability correlations).

pub mod cohort;
pub mod composite;
pub mod factors;
pub mod reliability;
pub mod segments;

pub use cohort::{
    compare_cohorts, cohort_recommendations, first_session_metric_specs, ComparisonRecord,
    MetricSpec, Significance,
};
pub use composite::{composite_score, score_population, ScoredAgent};
pub use factors::{
    band_recommendations, differentiating_factors, factor_metric_specs, FactorRecord,
};
pub use reliability::{
    reliability_summary, reschedule_correlations, CorrelationFinding, ReliabilitySummary,
};
pub use segments::{segment_population, PercentileRange, Segment, SegmentBand, Segments};

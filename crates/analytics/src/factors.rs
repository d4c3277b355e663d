//! Differentiating factors between performance bands.
//!
//! Contrasts the top band against the middle band metric by metric with
//! Cohen's d and banded p-values, then turns the ranked factors into
//! per-band follow-up guidance.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_stats::{approx_p_value, cohens_d, mean};

use crate::cohort::{MetricSpec, Significance};
use crate::segments::{Segment, SegmentBand, Segments};

/// One metric contrasted between the top and middle bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRecord {
    pub metric: String,
    pub top_avg: f64,
    pub middle_avg: f64,
    pub bottom_avg: f64,
    pub effect_size: f64,
    pub p_value: f64,
    pub significance: Significance,
    pub insight: String,
}

/// Tier from p-value and effect size: both must clear their bar.
fn significance_for(p_value: f64, effect_size: f64) -> Significance {
    if p_value < 0.01 && effect_size.abs() > 0.8 {
        Significance::High
    } else if p_value < 0.05 && effect_size.abs() > 0.5 {
        Significance::Medium
    } else if p_value < 0.1 {
        Significance::Low
    } else {
        Significance::NotSignificant
    }
}

/// Metric accessors contrasted across performance bands.
pub fn factor_metric_specs() -> Vec<MetricSpec> {
    vec![
        MetricSpec {
            label: "Engagement Score",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_engagement_score),
        },
        MetricSpec {
            label: "Empathy Score",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_empathy_score),
        },
        MetricSpec {
            label: "Clarity Score",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_clarity_score),
        },
        MetricSpec {
            label: "Student Satisfaction",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_student_satisfaction),
        },
        MetricSpec {
            label: "Student Rating",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_rating_30d),
        },
        MetricSpec {
            label: "Recommendation Rate",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.recommendation_rate),
        },
        MetricSpec {
            label: "Reliability Score",
            lower_is_better: false,
            extract: |a| Some(a.reliability_score),
        },
        MetricSpec {
            label: "First Session Rating",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().and_then(|g| g.first_session_avg_rating),
        },
        MetricSpec {
            label: "Technical Issue Rate",
            lower_is_better: true,
            extract: |a| a.aggregate.as_ref().map(|g| g.technical_issue_rate),
        },
        MetricSpec {
            label: "Reschedule Rate",
            lower_is_better: true,
            extract: |a| Some(a.reschedule_rate),
        },
        MetricSpec {
            label: "No-Show Count",
            lower_is_better: true,
            extract: |a| Some(a.no_show_count as f64),
        },
        MetricSpec {
            label: "Months of Experience",
            lower_is_better: false,
            extract: |a| Some(a.months_experience as f64),
        },
    ]
}

fn collect_metric(segment: &Segment, spec: &MetricSpec) -> Vec<f64> {
    segment
        .members
        .iter()
        .filter_map(|m| (spec.extract)(&m.snapshot))
        .filter(|v| v.is_finite())
        .collect()
}

/// Contrast the top band against the middle band on every metric.
///
/// The bottom band average rides along for reporting and falls back to
/// the middle average when that band has no values. Metrics missing
/// from either compared band are skipped. The output is sorted by
/// significance tier, then by effect size magnitude.
pub fn differentiating_factors(segments: &Segments, metrics: &[MetricSpec]) -> Vec<FactorRecord> {
    let mut records = Vec::new();

    for spec in metrics {
        let top = collect_metric(&segments.top, spec);
        let middle = collect_metric(&segments.middle, spec);
        let bottom = collect_metric(&segments.bottom, spec);

        if top.is_empty() || middle.is_empty() {
            continue;
        }

        let top_avg = mean(&top);
        let middle_avg = mean(&middle);
        let bottom_avg = if bottom.is_empty() {
            middle_avg
        } else {
            mean(&bottom)
        };

        let effect_size = cohens_d(&top, &middle);
        let p_value = approx_p_value(&top, &middle);
        let significance = significance_for(p_value, effect_size);

        let insight = if significance == Significance::NotSignificant {
            format!(
                "{} shows no significant difference between top and middle performers",
                spec.label
            )
        } else {
            let percent = if middle_avg.abs() <= f64::EPSILON {
                0.0
            } else {
                (top_avg - middle_avg) / middle_avg * 100.0
            };
            let direction = if top_avg > middle_avg { "higher" } else { "lower" };
            format!(
                "Top performers have {:.1}% {} {} (effect size: {:.2})",
                percent.abs(),
                direction,
                spec.label,
                effect_size
            )
        };

        records.push(FactorRecord {
            metric: spec.label.to_string(),
            top_avg,
            middle_avg,
            bottom_avg,
            effect_size,
            p_value,
            significance,
            insight,
        });
    }

    records.sort_by(|a, b| {
        a.significance.rank().cmp(&b.significance.rank()).then_with(|| {
            b.effect_size
                .abs()
                .partial_cmp(&a.effect_size.abs())
                .unwrap_or(Ordering::Equal)
        })
    });

    debug!(factors = records.len(), "factor contrast complete");

    records
}

// ── Recommendations ─────────────────────────────────────────────────────

/// Follow-up guidance for one band given the ranked factors.
pub fn band_recommendations(band: SegmentBand, factors: &[FactorRecord]) -> Vec<String> {
    match band {
        SegmentBand::Top => vec![
            "Continue current best practices".to_string(),
            "Consider mentoring other agents".to_string(),
            "Share successful strategies with team".to_string(),
        ],
        SegmentBand::Middle => {
            let mut recommendations: Vec<String> = factors
                .iter()
                .filter(|f| matches!(f.significance, Significance::High | Significance::Medium))
                .take(3)
                .filter(|f| f.top_avg > f.middle_avg)
                .map(|f| format!("Focus on improving {} to match top performers", f.metric))
                .collect();
            if recommendations.is_empty() {
                recommendations.push("Maintain current performance levels".to_string());
            }
            recommendations
        }
        SegmentBand::Bottom => {
            let mut recommendations = vec!["Immediate intervention required".to_string()];
            recommendations.extend(
                factors
                    .iter()
                    .take(3)
                    .filter(|f| f.bottom_avg < f.middle_avg)
                    .map(|f| format!("Critical: Address {} performance gap", f.metric)),
            );
            recommendations.push("Consider additional training and support".to_string());
            recommendations
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

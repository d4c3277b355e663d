//! Cohort comparison over named metrics.
//!
//! Compares a flagged cohort against a reference population metric by
//! metric, attaching banded p-values, significance tiers and insight
//! text, then ranks the findings by tier and relative gap.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::AgentSnapshot;
use vigil_stats::{approx_p_value, mean};

// ── Significance tiers ──────────────────────────────────────────────────

/// Significance tier for a compared metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    High,
    Medium,
    Low,
    NotSignificant,
}

impl Significance {
    /// Sort key; smaller ranks ahead.
    pub fn rank(&self) -> u8 {
        match self {
            Significance::High => 0,
            Significance::Medium => 1,
            Significance::Low => 2,
            Significance::NotSignificant => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::High => "high",
            Significance::Medium => "medium",
            Significance::Low => "low",
            Significance::NotSignificant => "not_significant",
        }
    }
}

impl std::fmt::Display for Significance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Metric accessors ────────────────────────────────────────────────────

/// A named numeric accessor over agent snapshots.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub label: &'static str,
    /// Whether a smaller value is the healthier one (failure rates).
    pub lower_is_better: bool,
    pub extract: fn(&AgentSnapshot) -> Option<f64>,
}

/// Metric accessors for first-session cohort studies.
pub fn first_session_metric_specs() -> Vec<MetricSpec> {
    vec![
        MetricSpec {
            label: "Months of Experience",
            lower_is_better: false,
            extract: |a| Some(a.months_experience as f64),
        },
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
            label: "Technical Issue Rate",
            lower_is_better: true,
            extract: |a| a.aggregate.as_ref().map(|g| g.technical_issue_rate),
        },
        MetricSpec {
            label: "Reliability Score",
            lower_is_better: false,
            extract: |a| Some(a.reliability_score),
        },
        MetricSpec {
            label: "Reschedule Rate",
            lower_is_better: true,
            extract: |a| Some(a.reschedule_rate),
        },
    ]
}

// ── Comparison ──────────────────────────────────────────────────────────

/// One metric compared across the two cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub metric: String,
    pub cohort_avg: f64,
    pub reference_avg: f64,
    pub difference: f64,
    pub percent_difference: f64,
    pub p_value: f64,
    pub significance: Significance,
    pub insight: String,
}

/// Tier from p-value and relative gap: both must clear their bar.
fn significance_for(p_value: f64, percent_difference: f64) -> Significance {
    if p_value < 0.01 && percent_difference.abs() > 15.0 {
        Significance::High
    } else if p_value < 0.05 && percent_difference.abs() > 10.0 {
        Significance::Medium
    } else if p_value < 0.1 {
        Significance::Low
    } else {
        Significance::NotSignificant
    }
}

fn collect_metric(agents: &[AgentSnapshot], spec: &MetricSpec) -> Vec<f64> {
    agents
        .iter()
        .filter_map(|a| (spec.extract)(a))
        .filter(|v| v.is_finite())
        .collect()
}

/// Compare `cohort` against `reference` on every metric in `metrics`.
///
/// Metrics with no valid values on either side are skipped. A reference
/// average of zero reports a 0.0% gap rather than dividing by it. The
/// output is sorted by significance tier, then by relative gap size.
pub fn compare_cohorts(
    cohort_label: &str,
    cohort: &[AgentSnapshot],
    reference: &[AgentSnapshot],
    metrics: &[MetricSpec],
) -> Vec<ComparisonRecord> {
    let mut records = Vec::new();

    for spec in metrics {
        let cohort_values = collect_metric(cohort, spec);
        let reference_values = collect_metric(reference, spec);
        if cohort_values.is_empty() || reference_values.is_empty() {
            continue;
        }

        let cohort_avg = mean(&cohort_values);
        let reference_avg = mean(&reference_values);
        let difference = cohort_avg - reference_avg;
        let percent_difference = if reference_avg.abs() <= f64::EPSILON {
            0.0
        } else {
            difference / reference_avg * 100.0
        };

        let p_value = approx_p_value(&cohort_values, &reference_values);
        let significance = significance_for(p_value, percent_difference);

        let insight = if significance == Significance::NotSignificant {
            format!("{} is similar between cohorts", spec.label)
        } else {
            let better = if spec.lower_is_better {
                difference < 0.0
            } else {
                difference > 0.0
            };
            let verdict = if better { "better" } else { "worse" };
            format!(
                "{} cohort has {:.1}% {} {}",
                cohort_label,
                percent_difference.abs(),
                verdict,
                spec.label
            )
        };

        records.push(ComparisonRecord {
            metric: spec.label.to_string(),
            cohort_avg,
            reference_avg,
            difference,
            percent_difference,
            p_value,
            significance,
            insight,
        });
    }

    records.sort_by(|a, b| {
        a.significance.rank().cmp(&b.significance.rank()).then_with(|| {
            b.percent_difference
                .abs()
                .partial_cmp(&a.percent_difference.abs())
                .unwrap_or(Ordering::Equal)
        })
    });

    debug!(
        metrics = metrics.len(),
        compared = records.len(),
        "cohort comparison complete"
    );

    records
}

// ── Recommendations ─────────────────────────────────────────────────────

/// Targeted follow-ups from the strongest significant gaps, plus the
/// standing process steps. Duplicates are dropped, first occurrence
/// wins.
pub fn cohort_recommendations(comparisons: &[ComparisonRecord]) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();

    let significant = comparisons
        .iter()
        .filter(|c| matches!(c.significance, Significance::High | Significance::Medium))
        .take(5);

    for comp in significant {
        if comp.metric.contains("Experience") && comp.cohort_avg < comp.reference_avg {
            recommendations.push(
                "Provide enhanced onboarding for new agents with <6 months experience".to_string(),
            );
        } else if comp.metric.contains("Engagement") {
            recommendations.push(
                "Train agents on first session engagement techniques and ice-breakers".to_string(),
            );
        } else if comp.metric.contains("Technical") && comp.cohort_avg > comp.reference_avg {
            recommendations.push(
                "Conduct technical checks before first sessions and provide IT support".to_string(),
            );
        } else if comp.metric.contains("Empathy") {
            recommendations.push(
                "Focus on empathy and active listening skills in first session training"
                    .to_string(),
            );
        } else if comp.metric.contains("Clarity") {
            recommendations.push(
                "Provide clear communication guidelines and examples for first sessions"
                    .to_string(),
            );
        }
    }

    if recommendations.is_empty() {
        recommendations.push("Continue monitoring first session performance".to_string());
    }

    recommendations.push("Implement first session preparation checklist for all agents".to_string());
    recommendations
        .push("Follow up with agents within 24 hours after their first session".to_string());

    let mut deduped: Vec<String> = Vec::new();
    for rec in recommendations {
        if !deduped.contains(&rec) {
            deduped.push(rec);
        }
    }
    deduped
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{AgentAggregate, ChurnRisk};

    fn make_agent(id: &str, engagement: f64) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: id.into(),
            months_experience: 12,
            total_sessions_completed: 100,
            avg_historical_rating: 4.0,
            subjects_taught: vec![],
            primary_subject: "math".into(),
            reschedule_rate: 0.05,
            no_show_count: 0,
            reliability_score: 0.9,
            certification_level: "certified".into(),
            active_status: true,
            last_login: None,
            aggregate: Some(AgentAggregate {
                total_sessions_30d: 40,
                total_sessions_7d: 10,
                avg_rating_30d: 4.2,
                avg_rating_7d: Some(4.1),
                avg_engagement_score: engagement,
                avg_empathy_score: 7.0,
                avg_clarity_score: 7.0,
                avg_student_satisfaction: 7.5,
                first_session_count: 4,
                first_session_avg_rating: Some(4.0),
                poor_first_session_flag: false,
                recommendation_rate: 0.8,
                technical_issue_rate: 0.05,
                sentiment_trend_7d: Some(0.1),
                churn_probability: 0.2,
                churn_risk_level: ChurnRisk::Low,
                churn_signals_detected: 0,
            }),
        }
    }

    fn engagement_spec() -> MetricSpec {
        MetricSpec {
            label: "Engagement Score",
            lower_is_better: false,
            extract: |a| a.aggregate.as_ref().map(|g| g.avg_engagement_score),
        }
    }

    #[test]
    fn separated_cohorts_flag_high_significance() {
        let cohort: Vec<AgentSnapshot> = [4.0, 4.1, 3.9, 4.05, 3.95]
            .iter()
            .enumerate()
            .map(|(i, &e)| make_agent(&format!("poor{}", i), e))
            .collect();
        let reference: Vec<AgentSnapshot> = [8.0, 8.1, 7.9, 8.05, 7.95]
            .iter()
            .enumerate()
            .map(|(i, &e)| make_agent(&format!("ref{}", i), e))
            .collect();

        let records =
            compare_cohorts("Poor first session", &cohort, &reference, &[engagement_spec()]);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.p_value, 0.001);
        assert_eq!(record.significance, Significance::High);
        assert!((record.percent_difference + 50.0).abs() < 1.0);
        assert_eq!(
            record.insight,
            "Poor first session cohort has 50.0% worse Engagement Score"
        );
    }

    #[test]
    fn quarter_gap_between_even_cohorts_reads_high() {
        // Twenty agents per side, means 3.0 vs 4.0 with matching spread.
        let cohort: Vec<AgentSnapshot> = (0..20)
            .map(|i| {
                let e = if i % 2 == 0 { 2.5 } else { 3.5 };
                make_agent(&format!("poor{}", i), e)
            })
            .collect();
        let reference: Vec<AgentSnapshot> = (0..20)
            .map(|i| {
                let e = if i % 2 == 0 { 3.5 } else { 4.5 };
                make_agent(&format!("ref{}", i), e)
            })
            .collect();

        let records =
            compare_cohorts("Poor first session", &cohort, &reference, &[engagement_spec()]);
        let record = &records[0];

        assert!((record.percent_difference + 25.0).abs() < 1e-9);
        assert_eq!(record.p_value, 0.001);
        assert_eq!(record.significance, Significance::High);
    }

    #[test]
    fn lower_is_better_flips_the_verdict() {
        let spec = MetricSpec {
            label: "Technical Issue Rate",
            lower_is_better: true,
            extract: |a| a.aggregate.as_ref().map(|g| g.technical_issue_rate),
        };

        let mut cohort = Vec::new();
        for (i, rate) in [0.30, 0.31, 0.29, 0.305, 0.295].iter().enumerate() {
            let mut agent = make_agent(&format!("poor{}", i), 6.0);
            agent.aggregate.as_mut().unwrap().technical_issue_rate = *rate;
            cohort.push(agent);
        }
        let mut reference = Vec::new();
        for (i, rate) in [0.10, 0.11, 0.09, 0.105, 0.095].iter().enumerate() {
            let mut agent = make_agent(&format!("ref{}", i), 6.0);
            agent.aggregate.as_mut().unwrap().technical_issue_rate = *rate;
            reference.push(agent);
        }

        let records = compare_cohorts("Poor first session", &cohort, &reference, &[spec]);
        assert!(records[0].insight.contains("worse Technical Issue Rate"));
    }

    #[test]
    fn similar_cohorts_read_as_similar() {
        let cohort: Vec<AgentSnapshot> = [7.0, 7.1, 6.9]
            .iter()
            .enumerate()
            .map(|(i, &e)| make_agent(&format!("a{}", i), e))
            .collect();
        let reference: Vec<AgentSnapshot> = [7.05, 7.15, 6.95]
            .iter()
            .enumerate()
            .map(|(i, &e)| make_agent(&format!("b{}", i), e))
            .collect();

        let records =
            compare_cohorts("Poor first session", &cohort, &reference, &[engagement_spec()]);
        assert_eq!(records[0].significance, Significance::NotSignificant);
        assert_eq!(records[0].insight, "Engagement Score is similar between cohorts");
    }

    #[test]
    fn metrics_without_values_are_skipped() {
        let mut cohort_agent = make_agent("a1", 5.0);
        cohort_agent.aggregate = None;
        let reference = vec![make_agent("b1", 7.0), make_agent("b2", 7.2)];

        let records =
            compare_cohorts("Poor first session", &[cohort_agent], &reference, &[engagement_spec()]);
        assert!(records.is_empty());
    }

    #[test]
    fn records_sort_by_tier_then_gap() {
        let make_record = |metric: &str, significance, pct: f64| ComparisonRecord {
            metric: metric.into(),
            cohort_avg: 0.0,
            reference_avg: 0.0,
            difference: 0.0,
            percent_difference: pct,
            p_value: 0.05,
            significance,
            insight: String::new(),
        };
        let mut records = vec![
            make_record("small_gap", Significance::NotSignificant, -2.0),
            make_record("big_gap", Significance::High, -40.0),
            make_record("mid_gap", Significance::High, 20.0),
        ];
        records.sort_by(|a, b| {
            a.significance.rank().cmp(&b.significance.rank()).then_with(|| {
                b.percent_difference
                    .abs()
                    .partial_cmp(&a.percent_difference.abs())
                    .unwrap_or(Ordering::Equal)
            })
        });
        assert_eq!(records[0].metric, "big_gap");
        assert_eq!(records[1].metric, "mid_gap");
        assert_eq!(records[2].metric, "small_gap");
    }

    #[test]
    fn recommendations_map_gaps_to_actions() {
        let record = ComparisonRecord {
            metric: "Engagement Score".into(),
            cohort_avg: 4.0,
            reference_avg: 8.0,
            difference: -4.0,
            percent_difference: -50.0,
            p_value: 0.001,
            significance: Significance::High,
            insight: String::new(),
        };

        let recs = cohort_recommendations(&[record]);
        assert_eq!(
            recs[0],
            "Train agents on first session engagement techniques and ice-breakers"
        );
        assert!(recs
            .contains(&"Implement first session preparation checklist for all agents".to_string()));
        assert!(recs
            .contains(&"Follow up with agents within 24 hours after their first session".to_string()));
    }

    #[test]
    fn no_significant_gaps_keeps_monitoring() {
        let record = ComparisonRecord {
            metric: "Engagement Score".into(),
            cohort_avg: 7.0,
            reference_avg: 7.1,
            difference: -0.1,
            percent_difference: -1.4,
            p_value: 0.5,
            significance: Significance::NotSignificant,
            insight: String::new(),
        };

        let recs = cohort_recommendations(&[record]);
        assert_eq!(recs[0], "Continue monitoring first session performance");
        assert_eq!(recs.len(), 3);
    }

    #[test]
    fn experience_gap_only_counts_when_cohort_is_greener() {
        let record = ComparisonRecord {
            metric: "Months of Experience".into(),
            cohort_avg: 20.0,
            reference_avg: 10.0,
            difference: 10.0,
            percent_difference: 100.0,
            p_value: 0.001,
            significance: Significance::High,
            insight: String::new(),
        };

        // Cohort is more experienced; the onboarding action should not fire.
        let recs = cohort_recommendations(&[record]);
        assert!(!recs.iter().any(|r| r.contains("onboarding")));
    }
}

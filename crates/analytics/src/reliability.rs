//! Reschedule correlation analysis.
//!
//! Correlates each agent's reschedule rate against quality and risk
//! metrics across the population and labels the strength of every
//! relationship.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::AgentSnapshot;
use vigil_stats::{mean, pearson_correlation, CorrelationStrength};

/// One correlated metric with its strength label and reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFinding {
    pub metric: String,
    pub correlation: f64,
    pub strength: CorrelationStrength,
    pub insight: String,
}

/// Population-level reschedule overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilitySummary {
    pub total_analyzed: usize,
    pub avg_reschedule_rate: f64,
    pub agents_above_threshold: usize,
}

/// Correlate reschedule rates against six quality and risk metrics.
///
/// Agents without an aggregate contribute 0.0 for aggregate-backed
/// metrics so every series stays aligned with the population. Findings
/// come back sorted by correlation magnitude.
pub fn reschedule_correlations(agents: &[AgentSnapshot]) -> Vec<CorrelationFinding> {
    let reschedule: Vec<f64> = agents.iter().map(|a| a.reschedule_rate).collect();

    let aggregate_series = |extract: fn(&vigil_core::AgentAggregate) -> f64| -> Vec<f64> {
        agents
            .iter()
            .map(|a| a.aggregate.as_ref().map(extract).unwrap_or(0.0))
            .collect()
    };

    let churn = aggregate_series(|g| g.churn_probability);
    let rating = aggregate_series(|g| g.avg_rating_30d);
    let reliability: Vec<f64> = agents.iter().map(|a| a.reliability_score).collect();
    let technical = aggregate_series(|g| g.technical_issue_rate);
    let empathy = aggregate_series(|g| g.avg_empathy_score);
    let engagement = aggregate_series(|g| g.avg_engagement_score);

    let churn_r = pearson_correlation(&reschedule, &churn);
    let rating_r = pearson_correlation(&reschedule, &rating);
    let reliability_r = pearson_correlation(&reschedule, &reliability);
    let technical_r = pearson_correlation(&reschedule, &technical);
    let empathy_r = pearson_correlation(&reschedule, &empathy);
    let engagement_r = pearson_correlation(&reschedule, &engagement);

    let mut findings = vec![
        CorrelationFinding {
            metric: "Churn Probability".to_string(),
            correlation: churn_r,
            strength: CorrelationStrength::from_r(churn_r),
            insight: format!(
                "Reschedules {} correlated with churn risk (r={:.2})",
                if churn_r > 0.0 { "positively" } else { "negatively" },
                churn_r
            ),
        },
        CorrelationFinding {
            metric: "Student Rating".to_string(),
            correlation: rating_r,
            strength: CorrelationStrength::from_r(rating_r),
            insight: format!(
                "Reschedules {} correlated with ratings (r={:.2})",
                if rating_r < 0.0 { "negatively" } else { "positively" },
                rating_r
            ),
        },
        CorrelationFinding {
            metric: "Reliability Score".to_string(),
            correlation: reliability_r,
            strength: CorrelationStrength::from_r(reliability_r),
            insight: format!(
                "Reschedules {} correlated with reliability (r={:.2})",
                if reliability_r < 0.0 { "inversely" } else { "positively" },
                reliability_r
            ),
        },
        CorrelationFinding {
            metric: "Technical Issues".to_string(),
            correlation: technical_r,
            strength: CorrelationStrength::from_r(technical_r),
            insight: format!(
                "Reschedules {} correlated with technical issues (r={:.2})",
                if technical_r > 0.0 { "positively" } else { "negatively" },
                technical_r
            ),
        },
        CorrelationFinding {
            metric: "Empathy Score".to_string(),
            correlation: empathy_r,
            strength: CorrelationStrength::from_r(empathy_r),
            insight: format!(
                "Reschedules {} correlated with empathy (r={:.2})",
                if empathy_r < 0.0 { "negatively" } else { "positively" },
                empathy_r
            ),
        },
        CorrelationFinding {
            metric: "Engagement Score".to_string(),
            correlation: engagement_r,
            strength: CorrelationStrength::from_r(engagement_r),
            insight: format!(
                "Reschedules {} correlated with engagement (r={:.2})",
                if engagement_r < 0.0 { "negatively" } else { "positively" },
                engagement_r
            ),
        },
    ];

    findings.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(Ordering::Equal)
    });

    debug!(
        agents = agents.len(),
        findings = findings.len(),
        "reschedule correlation scan complete"
    );

    findings
}

/// Average reschedule rate and the count of agents above `threshold`.
pub fn reliability_summary(agents: &[AgentSnapshot], threshold: f64) -> ReliabilitySummary {
    let rates: Vec<f64> = agents.iter().map(|a| a.reschedule_rate).collect();
    ReliabilitySummary {
        total_analyzed: agents.len(),
        avg_reschedule_rate: mean(&rates),
        agents_above_threshold: rates.iter().filter(|&&r| r > threshold).count(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{AgentAggregate, ChurnRisk};

    fn make_agent(id: &str, reschedule_rate: f64) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: id.into(),
            months_experience: 10,
            total_sessions_completed: 80,
            avg_historical_rating: 4.0,
            subjects_taught: vec![],
            primary_subject: "math".into(),
            reschedule_rate,
            no_show_count: 0,
            reliability_score: 1.0 - reschedule_rate + reschedule_rate * reschedule_rate * 0.2,
            certification_level: "certified".into(),
            active_status: true,
            last_login: None,
            aggregate: Some(AgentAggregate {
                total_sessions_30d: 30,
                total_sessions_7d: 8,
                avg_rating_30d: 5.0 - reschedule_rate * 2.0 + reschedule_rate * reschedule_rate,
                avg_rating_7d: None,
                avg_engagement_score: 8.0 - reschedule_rate * 4.0
                    + reschedule_rate * reschedule_rate * 2.0,
                avg_empathy_score: 8.0 - reschedule_rate * 2.0
                    + reschedule_rate * reschedule_rate,
                avg_clarity_score: 7.0,
                avg_student_satisfaction: 7.0,
                first_session_count: 2,
                first_session_avg_rating: None,
                poor_first_session_flag: false,
                recommendation_rate: 0.7,
                technical_issue_rate: reschedule_rate * reschedule_rate,
                sentiment_trend_7d: None,
                churn_probability: reschedule_rate * 1.5,
                churn_risk_level: ChurnRisk::Medium,
                churn_signals_detected: 1,
            }),
        }
    }

    fn make_population() -> Vec<AgentSnapshot> {
        [0.0, 0.1, 0.2, 0.3, 0.4, 0.5]
            .iter()
            .enumerate()
            .map(|(i, &r)| make_agent(&format!("a{}", i), r))
            .collect()
    }

    #[test]
    fn tightest_coupling_ranks_first() {
        let findings = reschedule_correlations(&make_population());
        assert_eq!(findings.len(), 6);
        // Only the churn series is exactly linear in the reschedule
        // rate; every other constructed series carries a slight bend.
        assert_eq!(findings[0].metric, "Churn Probability");
        assert_eq!(findings[0].strength, CorrelationStrength::Strong);
        assert!((findings[0].correlation - 1.0).abs() < 1e-9);
        assert!(findings[1].correlation.abs() < findings[0].correlation);
    }

    #[test]
    fn insights_carry_direction_words() {
        let findings = reschedule_correlations(&make_population());
        let by_metric = |name: &str| {
            findings
                .iter()
                .find(|f| f.metric == name)
                .unwrap()
                .insight
                .clone()
        };

        assert!(by_metric("Churn Probability").contains("positively"));
        assert!(by_metric("Student Rating").contains("negatively"));
        assert!(by_metric("Reliability Score").contains("inversely"));
        assert!(by_metric("Technical Issues").contains("positively"));
        assert!(by_metric("Empathy Score").contains("negatively"));
        assert!(by_metric("Engagement Score").contains("negatively"));
    }

    #[test]
    fn missing_aggregates_contribute_zeroes() {
        let mut population = make_population();
        for agent in &mut population {
            agent.aggregate = None;
        }
        let findings = reschedule_correlations(&population);
        let churn = findings.iter().find(|f| f.metric == "Churn Probability").unwrap();
        // The zero-filled series has no variance left to correlate.
        assert_eq!(churn.correlation, 0.0);
        assert_eq!(churn.strength, CorrelationStrength::None);
    }

    #[test]
    fn summary_counts_agents_above_threshold() {
        let summary = reliability_summary(&make_population(), 0.15);
        assert_eq!(summary.total_analyzed, 6);
        assert_eq!(summary.agents_above_threshold, 4);
        assert!((summary.avg_reschedule_rate - 0.25).abs() < 1e-10);
    }
}

//! Rule evaluation and composite priority scoring.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use vigil_core::{AgentSnapshot, AlertCategory, AlertDetails, AlertKind, AlertSeverity};

use crate::catalog::RuleCatalog;
use crate::render::MessageRenderer;

/// One rule that fired for an agent.
#[derive(Debug, Clone, Serialize)]
pub struct TriggeredAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: &'static str,
    #[serde(skip)]
    pub message_template: &'static str,
    #[serde(skip)]
    pub render: MessageRenderer,
    pub priority_weight: f64,
    pub cooldown_hours: i64,
    pub details: AlertDetails,
}

/// Evaluate the whole catalog against one agent.
///
/// Returns the triggered rules sorted by priority weight, highest
/// first. Ties keep catalog order.
pub fn evaluate_rules(
    catalog: &RuleCatalog,
    agent: &AgentSnapshot,
    now: DateTime<Utc>,
) -> Vec<TriggeredAlert> {
    let mut triggered: Vec<TriggeredAlert> = catalog
        .iter()
        .filter(|rule| (rule.predicate)(agent, now))
        .map(|rule| TriggeredAlert {
            kind: rule.kind,
            severity: rule.severity,
            category: rule.category,
            title: rule.title,
            message_template: rule.message_template,
            render: rule.render,
            priority_weight: rule.priority_weight,
            cooldown_hours: rule.cooldown_hours,
            details: (rule.details)(agent, now),
        })
        .collect();

    triggered.sort_by(|a, b| {
        b.priority_weight
            .partial_cmp(&a.priority_weight)
            .unwrap_or(Ordering::Equal)
    });

    debug!(
        agent_id = %agent.agent_id,
        triggered = triggered.len(),
        "rule evaluation complete"
    );

    triggered
}

/// Composite priority for one agent, from its sorted triggered rules.
///
/// The strongest rule sets the base; up to four more each add a fifth
/// of their weight. Capped at 100.
pub fn priority_score(triggered: &[TriggeredAlert]) -> f64 {
    if triggered.is_empty() {
        return 0.0;
    }

    let mut score = triggered[0].priority_weight;
    for alert in triggered.iter().skip(1).take(4) {
        score += alert.priority_weight * 0.2;
    }
    score.min(100.0)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_core::{AgentAggregate, ChurnRisk};

    fn make_healthy_agent(now: DateTime<Utc>) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: "agent-1".to_string(),
            months_experience: 12,
            total_sessions_completed: 300,
            avg_historical_rating: 4.4,
            subjects_taught: vec!["math".to_string()],
            primary_subject: "math".to_string(),
            reschedule_rate: 0.05,
            no_show_count: 0,
            reliability_score: 0.9,
            certification_level: "advanced".to_string(),
            active_status: true,
            last_login: Some(now - Duration::hours(24)),
            aggregate: Some(AgentAggregate {
                total_sessions_30d: 40,
                total_sessions_7d: 9,
                avg_rating_30d: 4.4,
                avg_rating_7d: Some(4.5),
                avg_engagement_score: 7.5,
                avg_empathy_score: 7.0,
                avg_clarity_score: 7.2,
                avg_student_satisfaction: 8.0,
                first_session_count: 5,
                first_session_avg_rating: Some(4.2),
                poor_first_session_flag: false,
                recommendation_rate: 0.8,
                technical_issue_rate: 0.05,
                sentiment_trend_7d: Some(0.1),
                churn_probability: 0.1,
                churn_risk_level: ChurnRisk::Low,
                churn_signals_detected: 0,
            }),
        }
    }

    #[test]
    fn healthy_agent_triggers_nothing() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();
        let triggered = evaluate_rules(&catalog, &make_healthy_agent(now), now);

        assert!(triggered.is_empty());
        assert_eq!(priority_score(&triggered), 0.0);
    }

    #[test]
    fn missing_aggregate_silences_aggregate_backed_rules() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        // Profile is clean, so only the aggregate rules could fire.
        let mut agent = make_healthy_agent(now);
        agent.aggregate = None;
        assert!(evaluate_rules(&catalog, &agent, now).is_empty());

        // The profile-backed rule still works without the aggregate.
        agent.reschedule_rate = 0.3;
        let triggered = evaluate_rules(&catalog, &agent, now);
        let kinds: Vec<AlertKind> = triggered.iter().map(|alert| alert.kind).collect();
        assert_eq!(kinds, vec![AlertKind::HighRescheduleRate]);
    }

    #[test]
    fn triggered_rules_sort_by_weight() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        let mut agent = make_healthy_agent(now);
        agent.last_login = Some(now - Duration::days(10));
        let agg = agent.aggregate.as_mut().unwrap();
        agg.churn_risk_level = ChurnRisk::High;
        agg.churn_probability = 0.7;
        agg.avg_rating_7d = Some(3.0);
        agg.technical_issue_rate = 0.2;

        let triggered = evaluate_rules(&catalog, &agent, now);
        let kinds: Vec<AlertKind> = triggered.iter().map(|alert| alert.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::ChurnRiskHigh,
                AlertKind::LowRatingTrend,
                AlertKind::NoLogin7d,
                AlertKind::TechnicalIssuesSpike,
            ]
        );

        // 100 + 0.2 * (85 + 80 + 50) caps out.
        assert_eq!(priority_score(&triggered), 100.0);
    }

    #[test]
    fn weak_engagement_fires_both_engagement_rules() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        let mut agent = make_healthy_agent(now);
        let agg = agent.aggregate.as_mut().unwrap();
        agg.avg_engagement_score = 5.0;
        agg.sentiment_trend_7d = None;

        let triggered = evaluate_rules(&catalog, &agent, now);
        let kinds: Vec<AlertKind> = triggered.iter().map(|alert| alert.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::DecliningEngagement, AlertKind::LowEngagement]
        );

        let below_target = &triggered[1].details;
        assert_eq!(below_target.metric.as_deref(), Some("avg_engagement_score"));
        assert_eq!(below_target.metric_value, Some(5.0));
        assert_eq!(below_target.threshold, Some(6.0));

        // 70 + 0.2 * 60
        let score = priority_score(&triggered);
        assert!((score - 82.0).abs() < 1e-10);
    }

    #[test]
    fn priority_counts_at_most_five_rules() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        // Trips every rule at once.
        let mut agent = make_healthy_agent(now);
        agent.last_login = None;
        agent.reschedule_rate = 0.3;
        let agg = agent.aggregate.as_mut().unwrap();
        agg.total_sessions_7d = 0;
        agg.avg_engagement_score = 4.0;
        agg.avg_rating_7d = Some(2.5);
        agg.technical_issue_rate = 0.4;
        agg.poor_first_session_flag = true;
        agg.first_session_count = 0;
        agg.sentiment_trend_7d = Some(-0.8);
        agg.churn_risk_level = ChurnRisk::High;
        agg.churn_probability = 0.9;
        agg.churn_signals_detected = 5;

        let triggered = evaluate_rules(&catalog, &agent, now);
        assert_eq!(triggered.len(), 10);

        // The tail beyond the fifth rule contributes nothing.
        assert_eq!(
            priority_score(&triggered),
            priority_score(&triggered[..5])
        );
        assert_eq!(priority_score(&triggered), 100.0);
    }

    #[test]
    fn details_carry_the_offending_metric() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        let mut agent = make_healthy_agent(now);
        let agg = agent.aggregate.as_mut().unwrap();
        agg.churn_risk_level = ChurnRisk::High;
        agg.churn_probability = 0.7;

        let triggered = evaluate_rules(&catalog, &agent, now);
        assert_eq!(triggered.len(), 1);
        let details = &triggered[0].details;
        assert_eq!(details.metric.as_deref(), Some("churn_probability"));
        assert_eq!(details.metric_value, Some(0.7));
        assert_eq!(details.threshold, Some(0.6));
    }

    #[test]
    fn moderate_score_sums_diminished_tail() {
        let now = Utc::now();
        let catalog = RuleCatalog::builtin();

        let mut agent = make_healthy_agent(now);
        agent.last_login = Some(now - Duration::days(8));
        agent.aggregate.as_mut().unwrap().technical_issue_rate = 0.2;

        let triggered = evaluate_rules(&catalog, &agent, now);
        // no_login (80) + 0.2 * technical (50)
        assert!((priority_score(&triggered) - 90.0).abs() < 1e-10);
    }
}

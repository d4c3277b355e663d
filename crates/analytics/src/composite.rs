//! Composite performance scoring.
//!
//! Folds weighted aggregate scores, normalized rating and reliability
//! and the penalty rates into a single 0-10 number used to band the
//! population.

use serde::{Deserialize, Serialize};

use vigil_core::AgentSnapshot;

// Weighted contributions; the weights sum to 1.0 before penalties.
const ENGAGEMENT_WEIGHT: f64 = 0.20;
const EMPATHY_WEIGHT: f64 = 0.15;
const CLARITY_WEIGHT: f64 = 0.15;
const SATISFACTION_WEIGHT: f64 = 0.15;
const RATING_WEIGHT: f64 = 0.20;
const RELIABILITY_WEIGHT: f64 = 0.10;
const RECOMMENDATION_WEIGHT: f64 = 0.05;

/// One agent with its composite score attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAgent {
    pub snapshot: AgentSnapshot,
    pub score: f64,
}

/// Composite 0-10 performance score for one agent.
///
/// Ratings (0-5) and the reliability and recommendation fractions are
/// normalized onto the 0-10 scale before weighting. The technical issue
/// and reschedule rates subtract directly, and the result is clamped to
/// `0.0..=10.0`. Agents without an aggregate score 0.0.
pub fn composite_score(agent: &AgentSnapshot) -> f64 {
    let Some(aggregate) = &agent.aggregate else {
        return 0.0;
    };

    let rating_normalized = aggregate.avg_rating_30d / 5.0 * 10.0;
    let reliability_normalized = agent.reliability_score * 10.0;
    let recommendation_normalized = aggregate.recommendation_rate * 10.0;

    let weighted = aggregate.avg_engagement_score * ENGAGEMENT_WEIGHT
        + aggregate.avg_empathy_score * EMPATHY_WEIGHT
        + aggregate.avg_clarity_score * CLARITY_WEIGHT
        + aggregate.avg_student_satisfaction * SATISFACTION_WEIGHT
        + rating_normalized * RATING_WEIGHT
        + reliability_normalized * RELIABILITY_WEIGHT
        + recommendation_normalized * RECOMMENDATION_WEIGHT;

    let penalty = aggregate.technical_issue_rate + agent.reschedule_rate;

    (weighted - penalty).clamp(0.0, 10.0)
}

/// Score every agent that carries an aggregate; agents without one are
/// left out of the result.
pub fn score_population(agents: &[AgentSnapshot]) -> Vec<ScoredAgent> {
    agents
        .iter()
        .filter(|a| a.has_aggregate())
        .map(|a| ScoredAgent {
            snapshot: a.clone(),
            score: composite_score(a),
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{AgentAggregate, ChurnRisk};

    fn make_agent(id: &str) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: id.into(),
            months_experience: 12,
            total_sessions_completed: 200,
            avg_historical_rating: 4.2,
            subjects_taught: vec!["math".into()],
            primary_subject: "math".into(),
            reschedule_rate: 0.0,
            no_show_count: 0,
            reliability_score: 1.0,
            certification_level: "certified".into(),
            active_status: true,
            last_login: None,
            aggregate: None,
        }
    }

    fn make_aggregate() -> AgentAggregate {
        AgentAggregate {
            total_sessions_30d: 40,
            total_sessions_7d: 10,
            avg_rating_30d: 5.0,
            avg_rating_7d: Some(5.0),
            avg_engagement_score: 10.0,
            avg_empathy_score: 10.0,
            avg_clarity_score: 10.0,
            avg_student_satisfaction: 10.0,
            first_session_count: 5,
            first_session_avg_rating: Some(4.8),
            poor_first_session_flag: false,
            recommendation_rate: 1.0,
            technical_issue_rate: 0.0,
            sentiment_trend_7d: Some(0.2),
            churn_probability: 0.05,
            churn_risk_level: ChurnRisk::Low,
            churn_signals_detected: 0,
        }
    }

    #[test]
    fn missing_aggregate_scores_zero() {
        assert_eq!(composite_score(&make_agent("a1")), 0.0);
    }

    #[test]
    fn perfect_agent_scores_ten() {
        let mut agent = make_agent("a1");
        agent.aggregate = Some(make_aggregate());
        assert!((composite_score(&agent) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_score_with_penalties() {
        let mut agent = make_agent("a1");
        agent.reschedule_rate = 0.05;
        agent.reliability_score = 0.8;
        let mut aggregate = make_aggregate();
        aggregate.avg_engagement_score = 8.0;
        aggregate.avg_empathy_score = 7.0;
        aggregate.avg_clarity_score = 6.0;
        aggregate.avg_student_satisfaction = 7.5;
        aggregate.avg_rating_30d = 4.0;
        aggregate.recommendation_rate = 0.6;
        aggregate.technical_issue_rate = 0.1;
        agent.aggregate = Some(aggregate);

        // 1.6 + 1.05 + 0.9 + 1.125 + 1.6 + 0.8 + 0.3 - 0.15
        assert!((composite_score(&agent) - 7.225).abs() < 1e-10);
    }

    #[test]
    fn score_floor_is_zero() {
        let mut agent = make_agent("a1");
        agent.reschedule_rate = 1.0;
        let mut aggregate = make_aggregate();
        aggregate.avg_engagement_score = 0.0;
        aggregate.avg_empathy_score = 0.0;
        aggregate.avg_clarity_score = 0.0;
        aggregate.avg_student_satisfaction = 0.0;
        aggregate.avg_rating_30d = 0.0;
        aggregate.recommendation_rate = 0.0;
        aggregate.technical_issue_rate = 1.0;
        agent.aggregate = Some(aggregate);
        agent.reliability_score = 0.0;

        assert_eq!(composite_score(&agent), 0.0);
    }

    #[test]
    fn population_scoring_skips_agents_without_aggregates() {
        let mut with_aggregate = make_agent("a1");
        with_aggregate.aggregate = Some(make_aggregate());
        let without = make_agent("a2");

        let scored = score_population(&[with_aggregate, without]);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].snapshot.agent_id, "a1");
    }
}

//! Audience assembly and the standing intervention segments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::{AgentSnapshot, ChurnRisk};

use crate::criteria::CriteriaSet;

/// Cap applied when criteria carry no explicit limit.
pub const DEFAULT_AUDIENCE_LIMIT: usize = 1000;

/// One matched agent with the criteria families that selected it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceMember {
    pub agent_id: String,
    pub matched_criteria: Vec<String>,
    pub score: u32,
}

/// Outcome of a targeting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceReport {
    pub members: Vec<AudienceMember>,
    /// Matches before the limit cut.
    pub total_matches: usize,
    pub criteria: CriteriaSet,
}

/// Evaluate `criteria` against the population.
///
/// Members come back sorted by match score and truncated to the
/// criteria limit, or [`DEFAULT_AUDIENCE_LIMIT`] when none is set;
/// `total_matches` counts matches before the cut.
pub fn find_audience(
    criteria: &CriteriaSet,
    agents: &[AgentSnapshot],
    now: DateTime<Utc>,
) -> AudienceReport {
    let (labels, score) = criteria.score_breakdown();

    let mut members: Vec<AudienceMember> = agents
        .iter()
        .filter(|a| criteria.matches(a, now))
        .map(|a| AudienceMember {
            agent_id: a.agent_id.clone(),
            matched_criteria: labels.iter().map(|s| s.to_string()).collect(),
            score,
        })
        .collect();

    let total_matches = members.len();
    members.sort_by(|a, b| b.score.cmp(&a.score));
    members.truncate(criteria.limit.unwrap_or(DEFAULT_AUDIENCE_LIMIT));

    debug!(
        total_matches,
        returned = members.len(),
        "audience targeting complete"
    );

    AudienceReport {
        members,
        total_matches,
        criteria: criteria.clone(),
    }
}

/// Count matches without materializing member records. Ignores any
/// limit on the criteria.
pub fn estimate_audience(
    criteria: &CriteriaSet,
    agents: &[AgentSnapshot],
    now: DateTime<Utc>,
) -> usize {
    agents.iter().filter(|a| criteria.matches(a, now)).count()
}

// ── Standing segments ───────────────────────────────────────────────────

/// A named, ready-made criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredefinedSegment {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub criteria: CriteriaSet,
}

/// The standing intervention segments, in display order.
pub fn predefined_segments() -> Vec<PredefinedSegment> {
    vec![
        PredefinedSegment {
            key: "high_churn_risk",
            name: "High Churn Risk",
            description: "Agents at high risk of churning",
            criteria: CriteriaSet {
                churn_risk_level: Some(vec![ChurnRisk::High]),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "disengaged_agents",
            name: "Disengaged Agents",
            description: "No login in 7+ days",
            criteria: CriteriaSet {
                days_since_login_min: Some(7),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "low_engagement",
            name: "Low Engagement",
            description: "Engagement score below 6.0",
            criteria: CriteriaSet {
                avg_engagement_max: Some(6.0),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "poor_first_sessions",
            name: "Poor First Sessions",
            description: "Struggling with first impressions",
            criteria: CriteriaSet {
                poor_first_session: Some(true),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "technical_issues",
            name: "Technical Issues",
            description: "High technical issue rate (>15%)",
            criteria: CriteriaSet {
                technical_issue_rate_min: Some(0.15),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "high_reschedule_rate",
            name: "High Reschedule Rate",
            description: "Reschedule rate above 15%",
            criteria: CriteriaSet {
                reschedule_rate_min: Some(0.15),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "new_agents",
            name: "New Agents",
            description: "Less than 3 months experience",
            criteria: CriteriaSet {
                months_experience_max: Some(3),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "star_performers",
            name: "Star Performers",
            description: "Top performing agents",
            criteria: CriteriaSet {
                avg_engagement_min: Some(8.0),
                avg_rating_min: Some(4.5),
                churn_risk_level: Some(vec![ChurnRisk::Low]),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "at_risk_quality",
            name: "At-Risk Quality",
            description: "Low engagement with low ratings",
            criteria: CriteriaSet {
                avg_engagement_max: Some(6.5),
                avg_rating_max: Some(4.0),
                active_status: Some(true),
                ..Default::default()
            },
        },
        PredefinedSegment {
            key: "inactive_14d",
            name: "Inactive 14+ Days",
            description: "No login in 14+ days",
            criteria: CriteriaSet {
                days_since_login_min: Some(14),
                active_status: Some(true),
                ..Default::default()
            },
        },
    ]
}

/// Look up one standing segment by key.
pub fn predefined_segment(key: &str) -> Option<PredefinedSegment> {
    predefined_segments().into_iter().find(|s| s.key == key)
}

// ── Tests ───────────────────────────────────────────────────────────────

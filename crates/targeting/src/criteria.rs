//! Sparse targeting criteria.
//!
//! Every field is optional; set fields AND together and unset fields
//! never constrain, so the empty set matches the whole population.
//! Constraints over rolled-up activity require the agent to carry an
//! aggregate; profile constraints work without one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::{AgentSnapshot, ChurnRisk};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaSet {
    // Profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_experience_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_experience_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_level: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_subject: Option<Vec<String>>,

    // Performance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_engagement_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_engagement_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rating_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn_risk_level: Option<Vec<ChurnRisk>>,

    // Behavior
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_login_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_login_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sessions_7d_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sessions_7d_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poor_first_session: Option<bool>,

    // Technical
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_issue_rate_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_issue_rate_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reschedule_rate_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reschedule_rate_max: Option<f64>,

    // Status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_status: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl CriteriaSet {
    /// Whether any constraint needs the rolled-up aggregate.
    fn needs_aggregate(&self) -> bool {
        self.avg_engagement_min.is_some()
            || self.avg_engagement_max.is_some()
            || self.avg_rating_min.is_some()
            || self.avg_rating_max.is_some()
            || self.churn_risk_level.as_ref().map_or(false, |l| !l.is_empty())
            || self.total_sessions_7d_min.is_some()
            || self.total_sessions_7d_max.is_some()
            || self.poor_first_session.is_some()
            || self.technical_issue_rate_min.is_some()
            || self.technical_issue_rate_max.is_some()
    }

    /// Evaluate every set constraint against `agent`.
    ///
    /// Login recency constraints fail for agents that never logged in,
    /// and aggregate-backed constraints fail for agents without an
    /// aggregate.
    pub fn matches(&self, agent: &AgentSnapshot, now: DateTime<Utc>) -> bool {
        if let Some(active) = self.active_status {
            if agent.active_status != active {
                return false;
            }
        }
        if let Some(min) = self.months_experience_min {
            if agent.months_experience < min {
                return false;
            }
        }
        if let Some(max) = self.months_experience_max {
            if agent.months_experience > max {
                return false;
            }
        }
        if let Some(levels) = &self.certification_level {
            if !levels.is_empty() && !levels.contains(&agent.certification_level) {
                return false;
            }
        }
        if let Some(subjects) = &self.primary_subject {
            if !subjects.is_empty() && !subjects.contains(&agent.primary_subject) {
                return false;
            }
        }
        if let Some(min) = self.reschedule_rate_min {
            if agent.reschedule_rate < min {
                return false;
            }
        }
        if let Some(max) = self.reschedule_rate_max {
            if agent.reschedule_rate > max {
                return false;
            }
        }
        if let Some(min_days) = self.days_since_login_min {
            match agent.days_since_login(now) {
                Some(days) if days >= min_days as f64 => {}
                _ => return false,
            }
        }
        if let Some(max_days) = self.days_since_login_max {
            match agent.days_since_login(now) {
                Some(days) if days <= max_days as f64 => {}
                _ => return false,
            }
        }

        if self.needs_aggregate() {
            let Some(agg) = &agent.aggregate else {
                return false;
            };
            if let Some(min) = self.avg_engagement_min {
                if agg.avg_engagement_score < min {
                    return false;
                }
            }
            if let Some(max) = self.avg_engagement_max {
                if agg.avg_engagement_score > max {
                    return false;
                }
            }
            if let Some(min) = self.avg_rating_min {
                if agg.avg_rating_30d < min {
                    return false;
                }
            }
            if let Some(max) = self.avg_rating_max {
                if agg.avg_rating_30d > max {
                    return false;
                }
            }
            if let Some(levels) = &self.churn_risk_level {
                if !levels.is_empty() && !levels.contains(&agg.churn_risk_level) {
                    return false;
                }
            }
            if let Some(min) = self.total_sessions_7d_min {
                if agg.total_sessions_7d < min {
                    return false;
                }
            }
            if let Some(max) = self.total_sessions_7d_max {
                if agg.total_sessions_7d > max {
                    return false;
                }
            }
            if let Some(expected) = self.poor_first_session {
                if agg.poor_first_session_flag != expected {
                    return false;
                }
            }
            if let Some(min) = self.technical_issue_rate_min {
                if agg.technical_issue_rate < min {
                    return false;
                }
            }
            if let Some(max) = self.technical_issue_rate_max {
                if agg.technical_issue_rate > max {
                    return false;
                }
            }
        }

        true
    }

    /// Criteria families present in this set: their labels and summed
    /// specificity weight. The weight depends only on which constraints
    /// are set, so every matched agent shares it.
    pub fn score_breakdown(&self) -> (Vec<&'static str>, u32) {
        let mut matched = Vec::new();
        let mut score = 0;

        if self.avg_engagement_min.is_some() || self.avg_engagement_max.is_some() {
            matched.push("Engagement Score");
            score += 10;
        }
        if self.churn_risk_level.as_ref().map_or(false, |l| !l.is_empty()) {
            matched.push("Churn Risk");
            score += 15;
        }
        if self.days_since_login_min.is_some() {
            matched.push("Login Activity");
            score += 10;
        }
        if self.poor_first_session == Some(true) {
            matched.push("First Session Performance");
            score += 12;
        }
        if self.technical_issue_rate_min.is_some() {
            matched.push("Technical Issues");
            score += 8;
        }
        if self.reschedule_rate_min.is_some() {
            matched.push("Reliability");
            score += 8;
        }

        (matched, score)
    }

    pub fn match_score(&self) -> u32 {
        self.score_breakdown().1
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

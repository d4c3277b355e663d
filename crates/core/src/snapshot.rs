//! Agent snapshot model.
//!
//! A snapshot is the unit every rule predicate, analytics pass and
//! targeting filter operates on: stable profile fields plus an optional
//! rolled-up [`AgentAggregate`] of recent session activity. Agents that
//! have not completed enough sessions carry no aggregate, and every
//! consumer has to tolerate that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Churn risk ──────────────────────────────────────────────────────────

/// Churn risk banding produced upstream of this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChurnRisk {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ChurnRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChurnRisk::Low => write!(f, "Low"),
            ChurnRisk::Medium => write!(f, "Medium"),
            ChurnRisk::High => write!(f, "High"),
        }
    }
}

// ── Aggregate ───────────────────────────────────────────────────────────

/// Rolled-up recent activity for one agent.
///
/// Rates (`recommendation_rate`, `technical_issue_rate`) are fractions in
/// `0.0..=1.0`; scores (`avg_engagement_score` and friends) are on a
/// 0-10 scale; ratings are on a 0-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAggregate {
    pub total_sessions_30d: u32,
    pub total_sessions_7d: u32,
    pub avg_rating_30d: f64,
    /// Absent when the agent had no rated sessions in the last 7 days.
    pub avg_rating_7d: Option<f64>,
    pub avg_engagement_score: f64,
    pub avg_empathy_score: f64,
    pub avg_clarity_score: f64,
    pub avg_student_satisfaction: f64,
    pub first_session_count: u32,
    /// Absent until the agent has held at least one first session.
    pub first_session_avg_rating: Option<f64>,
    pub poor_first_session_flag: bool,
    pub recommendation_rate: f64,
    pub technical_issue_rate: f64,
    /// Rolling sentiment delta; negative values mean souring sessions.
    pub sentiment_trend_7d: Option<f64>,
    /// Churn probability in `0.0..=1.0`.
    pub churn_probability: f64,
    pub churn_risk_level: ChurnRisk,
    pub churn_signals_detected: u32,
}

// ── Snapshot ────────────────────────────────────────────────────────────

/// One agent as seen by the engine at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub months_experience: u32,
    pub total_sessions_completed: u32,
    pub avg_historical_rating: f64,
    pub subjects_taught: Vec<String>,
    pub primary_subject: String,
    /// Fraction of booked sessions the agent rescheduled, `0.0..=1.0`.
    pub reschedule_rate: f64,
    pub no_show_count: u32,
    /// Composite reliability in `0.0..=1.0`.
    pub reliability_score: f64,
    pub certification_level: String,
    pub active_status: bool,
    /// Absent when the agent has never logged in.
    pub last_login: Option<DateTime<Utc>>,
    pub aggregate: Option<AgentAggregate>,
}

impl AgentSnapshot {
    pub fn has_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }

    /// Fractional days since the last login, or `None` for agents that
    /// never logged in.
    pub fn days_since_login(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_login
            .map(|login| (now - login).num_seconds() as f64 / 86_400.0)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

//! Alert vocabulary and persisted record shape.
//!
//! Severity and category are the dedup axes: cooldown suppression treats
//! two alerts as "the same" when both match, regardless of which rule
//! produced them. The rule kind is therefore deliberately absent from
//! [`AlertRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Severity and category ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::High => "high",
            AlertSeverity::Medium => "medium",
            AlertSeverity::Low => "low",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Churn,
    Quality,
    Technical,
    Engagement,
    Reliability,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Churn => "churn",
            AlertCategory::Quality => "quality",
            AlertCategory::Technical => "technical",
            AlertCategory::Engagement => "engagement",
            AlertCategory::Reliability => "reliability",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Rule kind ───────────────────────────────────────────────────────────

/// Stable identifier for each built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ChurnRiskHigh,
    #[serde(rename = "no_login_7d")]
    NoLogin7d,
    #[serde(rename = "no_sessions_14d")]
    NoSessions14d,
    DecliningEngagement,
    LowEngagement,
    LowRatingTrend,
    TechnicalIssuesSpike,
    PoorFirstSession,
    HighRescheduleRate,
    FirstSessionScheduled,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ChurnRiskHigh => "churn_risk_high",
            AlertKind::NoLogin7d => "no_login_7d",
            AlertKind::NoSessions14d => "no_sessions_14d",
            AlertKind::DecliningEngagement => "declining_engagement",
            AlertKind::LowEngagement => "low_engagement",
            AlertKind::LowRatingTrend => "low_rating_trend",
            AlertKind::TechnicalIssuesSpike => "technical_issues_spike",
            AlertKind::PoorFirstSession => "poor_first_session",
            AlertKind::HighRescheduleRate => "high_reschedule_rate",
            AlertKind::FirstSessionScheduled => "first_session_scheduled",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Details and drafts ──────────────────────────────────────────────────

/// Metric triple a rule attaches to explain what tripped it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl AlertDetails {
    pub fn new(metric: &str, metric_value: f64, threshold: f64) -> Self {
        Self {
            metric: Some(metric.to_string()),
            metric_value: Some(metric_value),
            threshold: Some(threshold),
        }
    }
}

/// Everything needed to persist a new alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDraft {
    pub agent_id: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// Persisted alert as stored and returned by an alert store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub agent_id: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ── Tests ───────────────────────────────────────────────────────────────

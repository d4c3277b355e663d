//! Alert rule catalog.
//!
//! Rules are plain data: a kind, a routing envelope (severity,
//! category, title, message template), a predicate over the agent
//! snapshot, a details extractor, and the priority/cooldown knobs.
//! Registration validates the envelope and rejects duplicates, so a
//! catalog that builds is a catalog that runs.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use thiserror::Error;

use vigil_core::{
    AgentSnapshot, AlertCategory, AlertDetails, AlertKind, AlertSeverity, ChurnRisk, VigilError,
};

use crate::render::{
    render_basic, render_churn, render_engagement_comparison, render_login, MessageRenderer,
};

/// Decides whether a rule fires for an agent at `now`.
pub type RulePredicate = fn(&AgentSnapshot, DateTime<Utc>) -> bool;

/// Extracts the metric payload attached to a fired rule.
pub type RuleDetailsFn = fn(&AgentSnapshot, DateTime<Utc>) -> AlertDetails;

/// One declarative alert rule.
#[derive(Debug, Clone)]
pub struct AlertRule {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: &'static str,
    pub message_template: &'static str,
    pub predicate: RulePredicate,
    pub details: RuleDetailsFn,
    pub render: MessageRenderer,
    /// Contribution to the composite priority, 0-100.
    pub priority_weight: f64,
    /// Minimum hours between alerts sharing this rule's category and
    /// severity for one agent.
    pub cooldown_hours: i64,
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("Duplicate rule kind: {0}")]
    DuplicateKind(AlertKind),

    #[error("Rule {kind} has priority weight {weight} outside 0-100")]
    InvalidWeight { kind: AlertKind, weight: f64 },

    #[error("Rule {kind} has a non-positive cooldown")]
    InvalidCooldown { kind: AlertKind },

    #[error("Rule {kind} has an empty title or message template")]
    EmptyText { kind: AlertKind },
}

impl From<CatalogError> for VigilError {
    fn from(err: CatalogError) -> Self {
        VigilError::Catalog(err.to_string())
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// Ordered rule registry keyed by kind.
///
/// Backed by an `IndexMap` so iteration visits rules in registration
/// order.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: IndexMap<AlertKind, AlertRule>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self {
            rules: IndexMap::new(),
        }
    }

    /// Catalog preloaded with the built-in rule set.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for rule in builtin_rules() {
            catalog
                .register(rule)
                .expect("built-in rule set is valid");
        }
        catalog
    }

    /// Add a rule, validating its envelope.
    pub fn register(&mut self, rule: AlertRule) -> Result<(), CatalogError> {
        if rule.title.trim().is_empty() || rule.message_template.trim().is_empty() {
            return Err(CatalogError::EmptyText { kind: rule.kind });
        }
        if !(0.0..=100.0).contains(&rule.priority_weight) {
            return Err(CatalogError::InvalidWeight {
                kind: rule.kind,
                weight: rule.priority_weight,
            });
        }
        if rule.cooldown_hours <= 0 {
            return Err(CatalogError::InvalidCooldown { kind: rule.kind });
        }
        if self.rules.contains_key(&rule.kind) {
            return Err(CatalogError::DuplicateKind(rule.kind));
        }
        self.rules.insert(rule.kind, rule);
        Ok(())
    }

    pub fn get(&self, kind: AlertKind) -> Option<&AlertRule> {
        self.rules.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Kinds routed to `category`, in registration order.
    pub fn kinds_by_category(&self, category: AlertCategory) -> Vec<AlertKind> {
        self.rules
            .values()
            .filter(|rule| rule.category == category)
            .map(|rule| rule.kind)
            .collect()
    }

    /// Kinds carrying `severity`, in registration order.
    pub fn kinds_by_severity(&self, severity: AlertSeverity) -> Vec<AlertKind> {
        self.rules
            .values()
            .filter(|rule| rule.severity == severity)
            .map(|rule| rule.kind)
            .collect()
    }
}

// ── Built-in predicates ─────────────────────────────────────────────

fn churn_risk_high(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent.aggregate.as_ref().map_or(false, |agg| {
        agg.churn_risk_level == ChurnRisk::High && agg.churn_probability > 0.6
    })
}

fn churn_risk_high_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let probability = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.churn_probability)
        .unwrap_or(0.0);
    AlertDetails::new("churn_probability", probability, 0.6)
}

/// An agent with no recorded login at all counts as overdue.
fn no_login_7d(agent: &AgentSnapshot, now: DateTime<Utc>) -> bool {
    match agent.days_since_login(now) {
        Some(days) => days >= 7.0,
        None => true,
    }
}

fn no_login_7d_details(agent: &AgentSnapshot, now: DateTime<Utc>) -> AlertDetails {
    let days = agent
        .days_since_login(now)
        .map(|days| days.floor())
        .unwrap_or(999.0);
    AlertDetails::new("days_since_login", days, 7.0)
}

fn no_sessions_14d(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent.active_status
        && agent
            .aggregate
            .as_ref()
            .map_or(false, |agg| agg.total_sessions_7d == 0)
}

fn no_sessions_14d_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let sessions = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.total_sessions_7d)
        .unwrap_or(0);
    AlertDetails::new("sessions_7d", sessions as f64, 1.0)
}

/// Fires on a sharply negative sentiment trend or a weak engagement
/// average.
fn declining_engagement(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    let Some(agg) = &agent.aggregate else {
        return false;
    };
    if agg.sentiment_trend_7d.map_or(false, |trend| trend < -0.5) {
        return true;
    }
    agg.avg_engagement_score < 5.5
}

fn declining_engagement_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let score = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.avg_engagement_score)
        .unwrap_or(0.0);
    AlertDetails::new("engagement_score", score, 5.5)
}

fn low_engagement(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent
        .aggregate
        .as_ref()
        .map_or(false, |agg| agg.avg_engagement_score < 6.0)
}

fn low_engagement_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let score = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.avg_engagement_score)
        .unwrap_or(0.0);
    AlertDetails::new("avg_engagement_score", score, 6.0)
}

fn low_rating_trend(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent
        .aggregate
        .as_ref()
        .and_then(|agg| agg.avg_rating_7d)
        .map_or(false, |rating| rating < 3.5)
}

fn low_rating_trend_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let rating = agent
        .aggregate
        .as_ref()
        .and_then(|agg| agg.avg_rating_7d)
        .unwrap_or(0.0);
    AlertDetails::new("avg_rating_7d", rating, 3.5)
}

fn technical_issues_spike(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent
        .aggregate
        .as_ref()
        .map_or(false, |agg| agg.technical_issue_rate > 0.15)
}

fn technical_issues_spike_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let rate = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.technical_issue_rate)
        .unwrap_or(0.0);
    AlertDetails::new("technical_issue_rate", rate, 0.15)
}

fn poor_first_session(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent
        .aggregate
        .as_ref()
        .map_or(false, |agg| agg.poor_first_session_flag)
}

fn poor_first_session_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let rating = agent
        .aggregate
        .as_ref()
        .and_then(|agg| agg.first_session_avg_rating)
        .unwrap_or(0.0);
    AlertDetails::new("first_session_avg_rating", rating, 3.5)
}

/// Reads profile data alone, so it also covers agents with no
/// aggregate row yet.
fn high_reschedule_rate(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent.reschedule_rate > 0.15
}

fn high_reschedule_rate_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    AlertDetails::new("reschedule_rate", agent.reschedule_rate, 0.15)
}

fn first_session_scheduled(agent: &AgentSnapshot, _now: DateTime<Utc>) -> bool {
    agent
        .aggregate
        .as_ref()
        .map_or(false, |agg| agg.first_session_count < 3)
}

fn first_session_scheduled_details(agent: &AgentSnapshot, _now: DateTime<Utc>) -> AlertDetails {
    let count = agent
        .aggregate
        .as_ref()
        .map(|agg| agg.first_session_count)
        .unwrap_or(0);
    AlertDetails::new("first_session_count", count as f64, 3.0)
}

// ── Built-in rule set ───────────────────────────────────────────────

/// The built-in rules, in evaluation order.
pub fn builtin_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            kind: AlertKind::ChurnRiskHigh,
            severity: AlertSeverity::Critical,
            category: AlertCategory::Churn,
            title: "Critical Churn Risk Detected",
            message_template: "Agent {agent_id} has {churn_probability}% churn probability with {signals} risk signals detected. Immediate intervention required.",
            predicate: churn_risk_high,
            details: churn_risk_high_details,
            render: render_churn,
            priority_weight: 100.0,
            cooldown_hours: 48,
        },
        AlertRule {
            kind: AlertKind::NoLogin7d,
            severity: AlertSeverity::High,
            category: AlertCategory::Engagement,
            title: "No Login Activity (7+ Days)",
            message_template: "Agent {agent_id} has not logged in for {days_since_login} days. Risk of disengagement.",
            predicate: no_login_7d,
            details: no_login_7d_details,
            render: render_login,
            priority_weight: 80.0,
            cooldown_hours: 72,
        },
        AlertRule {
            kind: AlertKind::NoSessions14d,
            severity: AlertSeverity::Critical,
            category: AlertCategory::Engagement,
            title: "No Sessions Completed (14+ Days)",
            message_template: "Agent {agent_id} has not completed any sessions in the last 14 days. Critical activation issue.",
            predicate: no_sessions_14d,
            details: no_sessions_14d_details,
            render: render_basic,
            priority_weight: 95.0,
            cooldown_hours: 48,
        },
        AlertRule {
            kind: AlertKind::DecliningEngagement,
            severity: AlertSeverity::High,
            category: AlertCategory::Engagement,
            title: "Declining Engagement Trend",
            message_template: "Agent {agent_id} shows declining engagement: 7-day avg ({recent}) vs 30-day avg ({historical}).",
            predicate: declining_engagement,
            details: declining_engagement_details,
            render: render_engagement_comparison,
            priority_weight: 70.0,
            cooldown_hours: 120,
        },
        AlertRule {
            kind: AlertKind::LowEngagement,
            severity: AlertSeverity::Medium,
            category: AlertCategory::Engagement,
            title: "Below Target Engagement Score",
            message_template: "Agent {agent_id} engagement score of {score}/10 is below target. Students may not be participating as actively as desired.",
            predicate: low_engagement,
            details: low_engagement_details,
            render: render_basic,
            priority_weight: 60.0,
            cooldown_hours: 96,
        },
        AlertRule {
            kind: AlertKind::LowRatingTrend,
            severity: AlertSeverity::High,
            category: AlertCategory::Quality,
            title: "Low Rating in Recent Sessions",
            message_template: "Agent {agent_id} received low ratings in last 7 days: {rating}/5.0. Quality concerns detected.",
            predicate: low_rating_trend,
            details: low_rating_trend_details,
            render: render_basic,
            priority_weight: 85.0,
            cooldown_hours: 72,
        },
        AlertRule {
            kind: AlertKind::TechnicalIssuesSpike,
            severity: AlertSeverity::Medium,
            category: AlertCategory::Technical,
            title: "High Technical Issue Rate",
            message_template: "Agent {agent_id} experiencing technical issues in {rate}% of sessions. IT support may be needed.",
            predicate: technical_issues_spike,
            details: technical_issues_spike_details,
            render: render_basic,
            priority_weight: 50.0,
            cooldown_hours: 96,
        },
        AlertRule {
            kind: AlertKind::PoorFirstSession,
            severity: AlertSeverity::High,
            category: AlertCategory::Quality,
            title: "Poor First Session Performance",
            message_template: "Agent {agent_id} has poor first session ratings (avg: {rating}/5.0). 24% higher churn risk.",
            predicate: poor_first_session,
            details: poor_first_session_details,
            render: render_basic,
            priority_weight: 75.0,
            cooldown_hours: 168,
        },
        AlertRule {
            kind: AlertKind::HighRescheduleRate,
            severity: AlertSeverity::Medium,
            category: AlertCategory::Reliability,
            title: "High Reschedule Rate",
            message_template: "Agent {agent_id} has {rate}% reschedule rate (target: <10%). Reliability concerns.",
            predicate: high_reschedule_rate,
            details: high_reschedule_rate_details,
            render: render_basic,
            priority_weight: 55.0,
            cooldown_hours: 168,
        },
        AlertRule {
            kind: AlertKind::FirstSessionScheduled,
            severity: AlertSeverity::Low,
            category: AlertCategory::Engagement,
            title: "First Session Preparation Reminder",
            message_template: "Agent {agent_id} has an upcoming first session. Preparation support recommended.",
            predicate: first_session_scheduled,
            details: first_session_scheduled_details,
            render: render_basic,
            priority_weight: 30.0,
            cooldown_hours: 72,
        },
    ]
}

// ── Tests ───────────────────────────────────────────────────────────

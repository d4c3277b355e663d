//! Per-rule message formatters.
//!
//! Each rule registers one formatter next to its predicate, so the
//! placeholder special cases stay local to the rule that owns them.
//! Placeholders are filled from the agent snapshot; one whose backing
//! data is missing stays as written, so rendering never fails and
//! running a formatter over an already rendered message changes
//! nothing.

use chrono::{DateTime, Utc};

use vigil_core::{AgentSnapshot, AlertDetails};

use crate::evaluator::TriggeredAlert;

/// Fills a rule's message template for one agent.
pub type MessageRenderer =
    fn(&str, &AlertDetails, &AgentSnapshot, DateTime<Utc>) -> String;

/// Percent-style metrics render scaled to 0-100 with one decimal, the
/// rest with two decimals.
fn format_metric_value(metric: &str, value: f64) -> String {
    if metric.contains("rate") || metric.contains("probability") {
        format!("{:.1}", value * 100.0)
    } else {
        format!("{:.2}", value)
    }
}

/// Shared base: fills `{agent_id}` and the generic metric
/// placeholders.
fn fill_common(template: &str, details: &AlertDetails, agent: &AgentSnapshot) -> String {
    let mut message = template.replace("{agent_id}", &agent.agent_id);

    if let (Some(metric), Some(value)) = (&details.metric, details.metric_value) {
        let formatted = format_metric_value(metric, value);
        message = message.replace("{rate}", &formatted);
        message = message.replace("{rating}", &formatted);
        message = message.replace("{score}", &formatted);
    }

    message
}

/// Formatter for rules with no extra placeholders.
pub fn render_basic(
    template: &str,
    details: &AlertDetails,
    agent: &AgentSnapshot,
    _now: DateTime<Utc>,
) -> String {
    fill_common(template, details, agent)
}

/// Churn alerts carry the probability and, when the aggregate counted
/// any, the number of contributing risk signals.
pub fn render_churn(
    template: &str,
    details: &AlertDetails,
    agent: &AgentSnapshot,
    _now: DateTime<Utc>,
) -> String {
    let mut message = fill_common(template, details, agent);

    if let (Some(metric), Some(value)) = (&details.metric, details.metric_value) {
        message = message.replace("{churn_probability}", &format_metric_value(metric, value));
    }
    if let Some(aggregate) = &agent.aggregate {
        if aggregate.churn_signals_detected > 0 {
            message = message.replace("{signals}", &aggregate.churn_signals_detected.to_string());
        }
    }

    message
}

/// Login alerts fill the floored day count. An agent with no recorded
/// login keeps the placeholder.
pub fn render_login(
    template: &str,
    details: &AlertDetails,
    agent: &AgentSnapshot,
    now: DateTime<Utc>,
) -> String {
    let mut message = fill_common(template, details, agent);

    if let Some(days) = agent.days_since_login(now) {
        message = message.replace("{days_since_login}", &(days.floor() as i64).to_string());
    }

    message
}

/// The engagement comparison fills both windows from the same
/// aggregate average until per-window values land in the snapshot.
pub fn render_engagement_comparison(
    template: &str,
    details: &AlertDetails,
    agent: &AgentSnapshot,
    _now: DateTime<Utc>,
) -> String {
    let mut message = fill_common(template, details, agent);

    if let Some(aggregate) = &agent.aggregate {
        let engagement = format!("{:.2}", aggregate.avg_engagement_score);
        message = message.replace("{recent}", &engagement);
        message = message.replace("{historical}", &engagement);
    }

    message
}

/// Render the message for one triggered alert through the formatter
/// its rule registered.
pub fn render_message(alert: &TriggeredAlert, agent: &AgentSnapshot, now: DateTime<Utc>) -> String {
    (alert.render)(alert.message_template, &alert.details, agent, now)
}

// ── Tests ───────────────────────────────────────────────────────────

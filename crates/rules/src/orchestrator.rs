//! Alert generation pipeline.
//!
//! Evaluation is pure and runs across the population in parallel;
//! persistence is sequential per agent so cooldown reads within one
//! run stay coherent. Between the cooldown read and the create there
//! is no lock, so two overlapping runs can double-create an alert.
//! Runs are expected to be scheduled one at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use vigil_core::{
    AlertCategory, AlertDraft, AlertRecord, AlertSeverity, EngineConfig, VigilError,
};

use crate::catalog::{AlertRule, RuleCatalog};
use crate::evaluator::{evaluate_rules, priority_score, TriggeredAlert};
use crate::render::render_message;
use crate::store::{AlertStore, StoreError};

/// One alert produced by a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAlert {
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
    /// Composite priority of the agent at generation time.
    pub priority_score: f64,
}

/// Outcome of a full generation sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub alerts: Vec<GeneratedAlert>,
}

/// Alert volume breakdown over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub total: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_category: HashMap<String, usize>,
    pub acknowledged: usize,
    pub resolved: usize,
    pub unacknowledged: usize,
}

/// Whether an alert created at `last_created` still suppresses its
/// category and severity pair at `now`.
pub fn in_cooldown(last_created: DateTime<Utc>, cooldown_hours: i64, now: DateTime<Utc>) -> bool {
    let hours_since = (now - last_created).num_seconds() as f64 / 3600.0;
    hours_since < cooldown_hours as f64
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Drives rule evaluation against a store.
pub struct AlertOrchestrator {
    catalog: RuleCatalog,
    store: Arc<dyn AlertStore>,
    config: EngineConfig,
}

impl AlertOrchestrator {
    /// Orchestrator over the built-in rule catalog.
    pub fn new(store: Arc<dyn AlertStore>, config: EngineConfig) -> Self {
        Self {
            catalog: RuleCatalog::builtin(),
            store,
            config,
        }
    }

    /// Orchestrator over a custom rule set.
    pub fn with_rules(
        rules: Vec<AlertRule>,
        store: Arc<dyn AlertStore>,
        config: EngineConfig,
    ) -> Result<Self, VigilError> {
        let mut catalog = RuleCatalog::new();
        for rule in rules {
            catalog.register(rule)?;
        }
        Ok(Self {
            catalog,
            store,
            config,
        })
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Wrap a store future with the configured timeout.
    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, VigilError> {
        match timeout(StdDuration::from_secs(self.config.store_timeout_secs), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(VigilError::Store(err.to_string())),
            Err(_) => Err(VigilError::StoreTimeout(self.config.store_timeout_secs)),
        }
    }

    /// Evaluate every active agent and persist the alerts that survive
    /// cooldown suppression.
    ///
    /// A failed population fetch aborts the run. Store failures while
    /// processing a single agent are counted and that agent is skipped
    /// past.
    pub async fn run(&self) -> Result<GenerationSummary, VigilError> {
        let started = Instant::now();
        let agents = self.store_call(self.store.active_agents()).await?;
        let now = Utc::now();

        info!(agents = agents.len(), "evaluating alert rules");

        // Pure phase: evaluate the population in parallel.
        let evaluated: Vec<(usize, Vec<TriggeredAlert>, f64)> = agents
            .par_iter()
            .enumerate()
            .filter_map(|(idx, agent)| {
                let triggered = evaluate_rules(&self.catalog, agent, now);
                if triggered.is_empty() {
                    None
                } else {
                    let priority = priority_score(&triggered);
                    Some((idx, triggered, priority))
                }
            })
            .collect();

        // Persist phase: sequential, in population order.
        let mut summary = GenerationSummary::default();
        let since = now - Duration::days(self.config.alert_history_days as i64);

        for (idx, triggered, priority) in evaluated {
            let agent = &agents[idx];

            let existing = match self
                .store_call(self.store.recent_alerts(&agent.agent_id, since))
                .await
            {
                Ok(existing) => existing,
                Err(err) => {
                    warn!(
                        agent_id = %agent.agent_id,
                        error = %err,
                        "failed to load recent alerts"
                    );
                    summary.errors += 1;
                    continue;
                }
            };

            for alert in &triggered {
                if let Some(last) = existing
                    .iter()
                    .find(|prior| prior.category == alert.category && prior.severity == alert.severity)
                {
                    if in_cooldown(last.created_at, alert.cooldown_hours, now) {
                        summary.skipped += 1;
                        continue;
                    }
                }

                let message = render_message(alert, agent, now);
                let draft = AlertDraft {
                    agent_id: agent.agent_id.clone(),
                    severity: alert.severity,
                    category: alert.category,
                    title: alert.title.to_string(),
                    message: message.clone(),
                    metric: alert.details.metric.clone(),
                    metric_value: alert.details.metric_value,
                    threshold: alert.details.threshold,
                };

                match self.store_call(self.store.create_alert(draft)).await {
                    Ok(_) => {
                        summary.generated += 1;
                        summary.alerts.push(GeneratedAlert {
                            agent_id: agent.agent_id.clone(),
                            severity: alert.severity,
                            category: alert.category,
                            title: alert.title.to_string(),
                            message,
                            metric: alert.details.metric.clone(),
                            metric_value: alert.details.metric_value,
                            threshold: alert.details.threshold,
                            priority_score: priority,
                        });
                    }
                    Err(err) => {
                        warn!(
                            agent_id = %agent.agent_id,
                            error = %err,
                            "failed to persist alert"
                        );
                        summary.errors += 1;
                        break;
                    }
                }
            }
        }

        info!(
            generated = summary.generated,
            skipped = summary.skipped,
            errors = summary.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "alert generation complete"
        );

        Ok(summary)
    }

    /// Evaluate a single agent and persist what survives cooldown.
    ///
    /// Unlike a full run this also covers inactive agents, matching
    /// the on-demand inspection flow. Store failures propagate.
    pub async fn generate_for_agent(
        &self,
        agent_id: &str,
    ) -> Result<Vec<GeneratedAlert>, VigilError> {
        let agent = self
            .store_call(self.store.agent(agent_id))
            .await?
            .ok_or_else(|| VigilError::AgentNotFound(agent_id.to_string()))?;

        let now = Utc::now();
        let triggered = evaluate_rules(&self.catalog, &agent, now);
        if triggered.is_empty() {
            return Ok(Vec::new());
        }
        let priority = priority_score(&triggered);

        let since = now - Duration::days(self.config.alert_history_days as i64);
        let existing = self
            .store_call(self.store.recent_alerts(agent_id, since))
            .await?;

        let mut generated = Vec::new();
        for alert in &triggered {
            if let Some(last) = existing
                .iter()
                .find(|prior| prior.category == alert.category && prior.severity == alert.severity)
            {
                if in_cooldown(last.created_at, alert.cooldown_hours, now) {
                    continue;
                }
            }

            let message = render_message(alert, &agent, now);
            let draft = AlertDraft {
                agent_id: agent.agent_id.clone(),
                severity: alert.severity,
                category: alert.category,
                title: alert.title.to_string(),
                message: message.clone(),
                metric: alert.details.metric.clone(),
                metric_value: alert.details.metric_value,
                threshold: alert.details.threshold,
            };
            self.store_call(self.store.create_alert(draft)).await?;

            generated.push(GeneratedAlert {
                agent_id: agent.agent_id.clone(),
                severity: alert.severity,
                category: alert.category,
                title: alert.title.to_string(),
                message,
                metric: alert.details.metric.clone(),
                metric_value: alert.details.metric_value,
                threshold: alert.details.threshold,
                priority_score: priority,
            });
        }

        Ok(generated)
    }

    /// Alert volume breakdown over the trailing `days`.
    pub async fn alert_statistics(&self, days: u32) -> Result<AlertStatistics, VigilError> {
        let since = Utc::now() - Duration::days(days as i64);
        let alerts = self.store_call(self.store.alerts_since(since)).await?;

        let mut by_severity: HashMap<String, usize> = HashMap::new();
        let mut by_category: HashMap<String, usize> = HashMap::new();
        let mut acknowledged = 0;
        let mut resolved = 0;

        for alert in &alerts {
            *by_severity.entry(alert.severity.to_string()).or_default() += 1;
            *by_category.entry(alert.category.to_string()).or_default() += 1;
            if alert.acknowledged {
                acknowledged += 1;
            }
            if alert.resolved {
                resolved += 1;
            }
        }

        Ok(AlertStatistics {
            total: alerts.len(),
            by_severity,
            by_category,
            acknowledged,
            resolved,
            unacknowledged: alerts.len() - acknowledged,
        })
    }

    /// Alerts for one agent, newest first.
    pub async fn agent_alerts(
        &self,
        agent_id: &str,
        include_resolved: bool,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, VigilError> {
        self.store_call(self.store.agent_alerts(agent_id, include_resolved, limit))
            .await
    }

    /// Mark an alert acknowledged.
    pub async fn acknowledge_alert(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
    ) -> Result<(), VigilError> {
        self.store_call(self.store.acknowledge_alert(alert_id, acknowledged_by))
            .await
    }

    /// Mark an alert resolved.
    pub async fn resolve_alert(&self, alert_id: Uuid) -> Result<(), VigilError> {
        self.store_call(self.store.resolve_alert(alert_id)).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────

//! Alert persistence seam.
//!
//! The orchestrator only ever talks to [`AlertStore`]; the in-memory
//! implementation backs tests and single-process deployments.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use vigil_core::{AgentSnapshot, AlertDraft, AlertRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(Uuid),

    #[error("{0}")]
    Other(String),
}

/// Persistence operations the generation pipeline needs.
///
/// Alert listings come back newest first.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Agents currently eligible for a generation sweep.
    async fn active_agents(&self) -> Result<Vec<AgentSnapshot>, StoreError>;

    /// One agent by id, active or not.
    async fn agent(&self, agent_id: &str) -> Result<Option<AgentSnapshot>, StoreError>;

    /// Alerts for one agent created at or after `since`.
    async fn recent_alerts(
        &self,
        agent_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertRecord>, StoreError>;

    /// Persist a new alert.
    async fn create_alert(&self, draft: AlertDraft) -> Result<AlertRecord, StoreError>;

    /// All alerts created at or after `since`, across agents.
    async fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<AlertRecord>, StoreError>;

    /// Alerts for one agent, optionally including resolved ones.
    async fn agent_alerts(
        &self,
        agent_id: &str,
        include_resolved: bool,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StoreError>;

    /// Mark an alert acknowledged.
    async fn acknowledge_alert(&self, alert_id: Uuid, acknowledged_by: &str)
        -> Result<(), StoreError>;

    /// Mark an alert resolved.
    async fn resolve_alert(&self, alert_id: Uuid) -> Result<(), StoreError>;
}

// ── In-memory store ─────────────────────────────────────────────────

/// In-memory [`AlertStore`].
///
/// Uses `std` locks so synchronous test setup can seed it directly;
/// the async methods only hold a lock briefly and never across an
/// await.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    agents: Arc<RwLock<Vec<AgentSnapshot>>>,
    alerts: Arc<RwLock<Vec<AlertRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agents(agents: Vec<AgentSnapshot>) -> Self {
        let store = Self::new();
        *store.agents.write().expect("agent lock poisoned") = agents;
        store
    }

    pub fn push_agent(&self, agent: AgentSnapshot) {
        self.agents.write().expect("agent lock poisoned").push(agent);
    }

    /// Insert an alert with an explicit creation time, bypassing the
    /// trait. Lets tests seed cooldown state in the past.
    pub fn create_alert_at(&self, draft: AlertDraft, created_at: DateTime<Utc>) -> AlertRecord {
        let record = AlertRecord {
            id: Uuid::new_v4(),
            agent_id: draft.agent_id,
            severity: draft.severity,
            category: draft.category,
            title: draft.title,
            message: draft.message,
            metric: draft.metric,
            metric_value: draft.metric_value,
            threshold: draft.threshold,
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved: false,
            resolved_at: None,
            created_at,
        };
        self.alerts
            .write()
            .expect("alert lock poisoned")
            .push(record.clone());
        record
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.read().expect("alert lock poisoned").len()
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn active_agents(&self) -> Result<Vec<AgentSnapshot>, StoreError> {
        Ok(self
            .agents
            .read()
            .expect("agent lock poisoned")
            .iter()
            .filter(|agent| agent.active_status)
            .cloned()
            .collect())
    }

    async fn agent(&self, agent_id: &str) -> Result<Option<AgentSnapshot>, StoreError> {
        Ok(self
            .agents
            .read()
            .expect("agent lock poisoned")
            .iter()
            .find(|agent| agent.agent_id == agent_id)
            .cloned())
    }

    async fn recent_alerts(
        &self,
        agent_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let mut alerts: Vec<AlertRecord> = self
            .alerts
            .read()
            .expect("alert lock poisoned")
            .iter()
            .filter(|alert| alert.agent_id == agent_id && alert.created_at >= since)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn create_alert(&self, draft: AlertDraft) -> Result<AlertRecord, StoreError> {
        Ok(self.create_alert_at(draft, Utc::now()))
    }

    async fn alerts_since(&self, since: DateTime<Utc>) -> Result<Vec<AlertRecord>, StoreError> {
        Ok(self
            .alerts
            .read()
            .expect("alert lock poisoned")
            .iter()
            .filter(|alert| alert.created_at >= since)
            .cloned()
            .collect())
    }

    async fn agent_alerts(
        &self,
        agent_id: &str,
        include_resolved: bool,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StoreError> {
        let mut alerts: Vec<AlertRecord> = self
            .alerts
            .read()
            .expect("alert lock poisoned")
            .iter()
            .filter(|alert| {
                alert.agent_id == agent_id && (include_resolved || !alert.resolved)
            })
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit);
        Ok(alerts)
    }

    async fn acknowledge_alert(
        &self,
        alert_id: Uuid,
        acknowledged_by: &str,
    ) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write().expect("alert lock poisoned");
        match alerts.iter_mut().find(|alert| alert.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                alert.acknowledged_at = Some(Utc::now());
                alert.acknowledged_by = Some(acknowledged_by.to_string());
                Ok(())
            }
            None => Err(StoreError::AlertNotFound(alert_id)),
        }
    }

    async fn resolve_alert(&self, alert_id: Uuid) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write().expect("alert lock poisoned");
        match alerts.iter_mut().find(|alert| alert.id == alert_id) {
            Some(alert) => {
                alert.resolved = true;
                alert.resolved_at = Some(Utc::now());
                Ok(())
            }
            None => Err(StoreError::AlertNotFound(alert_id)),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

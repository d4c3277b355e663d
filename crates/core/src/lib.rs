//! Shared domain types for the vigil workspace.
//!
//! Everything the other crates agree on lives here: the agent snapshot
//! model handed to rule predicates and analytics, the alert vocabulary
//! (severity, category, kind) and persisted record shape, engine
//! configuration loaded from the environment, and the common error type.

pub mod alert;
pub mod config;
pub mod error;
pub mod snapshot;

pub use alert::{
    AlertCategory, AlertDetails, AlertDraft, AlertKind, AlertRecord, AlertSeverity,
};
pub use config::EngineConfig;
pub use error::VigilError;
pub use snapshot::{AgentAggregate, AgentSnapshot, ChurnRisk};

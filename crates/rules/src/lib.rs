//! Declarative alert rule engine.
//!
//! This crate provides:
//! - A built-in rule catalog keyed by alert kind, evaluated in
//!   registration order
//! - Pure rule evaluation with composite priority scoring
//! - Message rendering from templates with graceful fallback for
//!   missing data
//! - An async store seam with an in-memory implementation
//! - The generation orchestrator with cooldown suppression and run
//!   summaries

pub mod catalog;
pub mod evaluator;
pub mod orchestrator;
pub mod render;
pub mod store;

pub use catalog::{builtin_rules, AlertRule, CatalogError, RuleCatalog};
pub use evaluator::{evaluate_rules, priority_score, TriggeredAlert};
pub use orchestrator::{
    AlertOrchestrator, AlertStatistics, GeneratedAlert, GenerationSummary,
};
pub use render::render_message;
pub use store::{AlertStore, MemoryStore, StoreError};

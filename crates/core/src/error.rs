//! Engine-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Store call timed out after {0}s")]
    StoreTimeout(u64),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Rule catalog error: {0}")]
    Catalog(String),
}

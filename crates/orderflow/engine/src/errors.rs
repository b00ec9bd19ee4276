//! Error types for the engine
//!
//! Guard failures and undefined edges are not errors: they come back as
//! structured [`orderflow_types::TransitionResult`] rejections. The
//! variants here are the conditions that abort an attempt outright.

use orderflow_registry::RegistryError;
use orderflow_store::StoreError;
use orderflow_types::{EffectError, OrderId};

/// Errors that can occur while driving transitions
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown transition: {0}")]
    UnknownTransition(String),

    #[error("invalid transition table: {0}")]
    InvalidTable(String),

    #[error("effect '{effect}' failed: {source}")]
    EffectFailed {
        effect: String,
        #[source]
        source: EffectError,
    },

    #[error("lock contention on order {0}; retry the transition")]
    LockContention(OrderId),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the caller may retry the whole call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockContention(_))
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

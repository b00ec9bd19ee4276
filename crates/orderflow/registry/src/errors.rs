//! Error types for the registry

/// Errors that can occur in registry operations.
///
/// Unknown-key lookups are configuration defects: fatal, surfaced
/// immediately, never retried. Integration tests should catch them long
/// before production traffic does.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown guard: {0}")]
    UnknownGuard(String),

    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("guard already registered: {0}")]
    DuplicateGuard(String),

    #[error("effect already registered: {0}")]
    DuplicateEffect(String),

    #[error("registry lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

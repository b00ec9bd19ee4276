//! The effect contract's failure type
//!
//! Effects wrap their integration-specific causes into [`EffectError`]
//! so the engine can abort the surrounding transition and surface the
//! detail to the caller.

/// Failure raised by an effect implementation
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EffectError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

//! Append-only transition log entries
//!
//! One [`TransitionLogEntry`] is recorded per successfully committed
//! transition, atomically with the status write. Rows are never updated
//! or deleted; they are retained indefinitely for audit.

use crate::{OrderId, OrderStatus, Params};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifier ───────────────────────────────────────────────────────

/// Unique identifier for a transition log entry
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub String);

impl LogEntryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Log Entry ────────────────────────────────────────────────────────

/// One committed transition, as recorded for audit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    /// Unique entry identifier
    pub id: LogEntryId,
    /// The order this entry belongs to
    pub order_id: OrderId,
    /// Status before the transition
    pub from_state: OrderStatus,
    /// Status after the transition
    pub to_state: OrderStatus,
    /// Name of the table entry that produced this row
    pub transition: String,
    /// Display identity of whoever requested the transition
    pub actor: String,
    /// Free-text note supplied by the caller
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    /// Effect keys executed, in declared order
    pub effects: Vec<String>,
    /// Parameter bag the transition ran with
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
    /// Caller-supplied replay token, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,
}

impl TransitionLogEntry {
    /// Create a new entry for a committed transition.
    pub fn new(
        order_id: OrderId,
        from_state: OrderStatus,
        to_state: OrderStatus,
        transition: impl Into<String>,
    ) -> Self {
        Self {
            id: LogEntryId::generate(),
            order_id,
            from_state,
            to_state,
            transition: transition.into(),
            actor: String::new(),
            note: String::new(),
            effects: Vec::new(),
            params: Params::new(),
            idempotency_key: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_effects(mut self, effects: Vec<String>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

//! Transition attempts and results
//!
//! Guard failures and undefined edges are expected conditions: callers
//! branch on the result, they do not catch errors. Both shapes here are
//! ephemeral; only [`crate::TransitionLogEntry`] is persisted.

use crate::{LogEntryId, OrderStatus, Transition, TransitionLogEntry};
use serde::{Deserialize, Serialize};

// ── Rejection ────────────────────────────────────────────────────────

/// Why a transition request was not applied
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// No edge connects the order's current status to the requested target
    NoSuchTransition { from: OrderStatus, to: OrderStatus },
    /// A guard vetoed the transition
    GuardRejected { guard: String, reason: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoSuchTransition { from, to } => {
                write!(f, "no transition defined from {} to {}", from, to)
            }
            Rejection::GuardRejected { guard, reason } => {
                write!(f, "guard '{}' rejected: {}", guard, reason)
            }
        }
    }
}

// ── Transition Attempt ───────────────────────────────────────────────

/// Eligibility of one candidate transition for an order, advisory only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionAttempt {
    pub transition: Transition,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionAttempt {
    pub fn allowed(transition: Transition) -> Self {
        Self {
            transition,
            allowed: true,
            reason: None,
        }
    }

    pub fn blocked(transition: Transition, reason: impl Into<String>) -> Self {
        Self {
            transition,
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

// ── Transition Result ────────────────────────────────────────────────

/// Outcome of a transition request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionResult {
    /// Whether the request was satisfied (applied, replayed, or dry-run
    /// validated)
    pub success: bool,
    /// Status the order held when the request was evaluated
    pub from_state: OrderStatus,
    /// Resulting status, absent on rejection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_state: Option<OrderStatus>,
    /// Satisfied from the idempotency index, nothing re-executed
    pub idempotent: bool,
    /// Validation-only invocation, nothing persisted
    pub dry_run: bool,
    /// Effect keys executed, in declared order
    pub effects: Vec<String>,
    /// Human-readable trace of what happened
    pub messages: Vec<String>,
    /// Structured failure detail when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    /// The audit row written for this transition, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogEntryId>,
}

impl TransitionResult {
    /// A freshly committed transition.
    pub fn applied(from_state: OrderStatus, to_state: OrderStatus) -> Self {
        Self {
            success: true,
            from_state,
            to_state: Some(to_state),
            idempotent: false,
            dry_run: false,
            effects: Vec::new(),
            messages: Vec::new(),
            rejection: None,
            log_id: None,
        }
    }

    /// A structured rejection; no state was mutated.
    pub fn rejected(from_state: OrderStatus, rejection: Rejection, dry_run: bool) -> Self {
        let message = rejection.to_string();
        Self {
            success: false,
            from_state,
            to_state: None,
            idempotent: false,
            dry_run,
            effects: Vec::new(),
            messages: vec![message],
            rejection: Some(rejection),
            log_id: None,
        }
    }

    /// Guard validation passed in dry-run mode; nothing was persisted.
    pub fn dry_run_ok(from_state: OrderStatus, to_state: OrderStatus) -> Self {
        Self {
            success: true,
            from_state,
            to_state: Some(to_state),
            idempotent: false,
            dry_run: true,
            effects: Vec::new(),
            messages: Vec::new(),
            rejection: None,
            log_id: None,
        }
    }

    /// A replay satisfied from the idempotency index.
    pub fn replayed(entry: &TransitionLogEntry) -> Self {
        Self {
            success: true,
            from_state: entry.from_state,
            to_state: Some(entry.to_state),
            idempotent: true,
            dry_run: false,
            effects: entry.effects.clone(),
            messages: vec!["idempotent replay".to_string()],
            rejection: None,
            log_id: Some(entry.id.clone()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn with_effects(mut self, effects: Vec<String>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_log_id(mut self, id: LogEntryId) -> Self {
        self.log_id = Some(id);
        self
    }
}

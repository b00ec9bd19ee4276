//! Transition definitions and execution context
//!
//! A [`Transition`] is a declarative edge in the order lifecycle: which
//! source states it leaves, the single target state, and the ordered
//! guard and effect keys the registry resolves at execution time.
//! Definitions are immutable once compiled into a table.

use crate::{Actor, Order, OrderStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameter bag handed through to guards and effects
pub type Params = HashMap<String, serde_json::Value>;

// ── Transition Definition ────────────────────────────────────────────

/// Declarative transition definition.
///
/// - `name`: unique key for the transition (e.g. `mark_paid`, `ship`)
/// - `from_states`: allowed source states
/// - `to_state`: target state
/// - `guards` / `effects`: registry keys evaluated and executed in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub name: String,
    pub from_states: Vec<OrderStatus>,
    pub to_state: OrderStatus,
    #[serde(default)]
    pub guards: Vec<String>,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Transition {
    /// Create a transition with no guards or effects.
    pub fn new(name: impl Into<String>, from_states: &[OrderStatus], to_state: OrderStatus) -> Self {
        Self {
            name: name.into(),
            from_states: from_states.to_vec(),
            to_state,
            guards: Vec::new(),
            effects: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_guard(mut self, key: impl Into<String>) -> Self {
        self.guards.push(key.into());
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>) -> Self {
        self.effects.push(key.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this transition may leave `state`.
    pub fn applies_from(&self, state: OrderStatus) -> bool {
        self.from_states.contains(&state)
    }
}

// ── Transition Context ───────────────────────────────────────────────

/// Execution context passed to guards and effects.
///
/// Carries a snapshot of the order taken when the context was built; the
/// service rebuilds the context from a fresh read after acquiring the
/// per-order lock.
#[derive(Clone, Debug)]
pub struct TransitionContext {
    pub order: Order,
    pub from_state: OrderStatus,
    pub to_state: OrderStatus,
    pub actor: Actor,
    pub note: String,
    pub params: Params,
    pub idempotency_key: Option<String>,
    pub dry_run: bool,
}

impl TransitionContext {
    /// Build a context for a prospective transition of `order`.
    pub fn new(order: Order, to_state: OrderStatus, actor: Actor) -> Self {
        let from_state = order.status;
        Self {
            order,
            from_state,
            to_state,
            actor,
            note: String::new(),
            params: Params::new(),
            idempotency_key: None,
            dry_run: false,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
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

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

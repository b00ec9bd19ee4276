//! Transition service: the state machine core
//!
//! Drives a transition request end to end: resolve the table edge,
//! evaluate guards, lock the order, re-validate under the lock, execute
//! effects, and commit the status change together with its audit row.
//!
//! The execution order for [`TransitionService::transition`]:
//!
//! 1. Idempotent replay short-circuit, before any locking.
//! 2. Resolve the edge for (current status, requested target).
//! 3. Pre-lock guard pass, to fail fast with a clear reason.
//! 4. Dry-run stops here: nothing persisted either way.
//! 5. Acquire the per-order exclusive lock.
//! 6. Re-read the order, re-check idempotency, re-resolve, re-run
//!    guards: a concurrent transition may have changed the status or
//!    the state guards depend on.
//! 7. Execute effects in declared order; the first failure aborts with
//!    nothing persisted.
//! 8. Commit the new status and the log row as one atomic unit.
//!
//! Guard failures and undefined edges are structured results; effect,
//! lock, and persistence failures are errors.

use crate::{EngineError, EngineResult, TransitionTable};
use orderflow_registry::Registry;
use orderflow_store::{OrderflowStore, StoreError};
use orderflow_types::{
    Actor, Order, OrderId, OrderStatus, Params, Rejection, Transition, TransitionAttempt,
    TransitionContext, TransitionLogEntry, TransitionResult,
};
use std::sync::Arc;

// ── Transition Request ───────────────────────────────────────────────

/// A transition request: plain data in, plain data out
#[derive(Clone, Debug)]
pub struct TransitionRequest {
    pub order_id: OrderId,
    pub to_state: OrderStatus,
    pub actor: Actor,
    pub note: String,
    pub params: Params,
    pub idempotency_key: Option<String>,
    pub dry_run: bool,
}

impl TransitionRequest {
    pub fn new(order_id: OrderId, to_state: OrderStatus, actor: Actor) -> Self {
        Self {
            order_id,
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

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
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

// ── Transition Service ───────────────────────────────────────────────

/// Registry-driven workflow executor for orders
pub struct TransitionService {
    table: TransitionTable,
    registry: Arc<Registry>,
    store: Arc<dyn OrderflowStore>,
}

impl TransitionService {
    pub fn new(
        table: TransitionTable,
        registry: Arc<Registry>,
        store: Arc<dyn OrderflowStore>,
    ) -> Self {
        Self {
            table,
            registry,
            store,
        }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    // ── Advisory Queries ─────────────────────────────────────────────

    /// All transitions defined from `state`. Guards are not consulted.
    pub fn transitions_for_state(&self, state: OrderStatus) -> Vec<&Transition> {
        self.table.transitions_from(state)
    }

    /// One advisory attempt per transition leaving the order's current
    /// status, with guards evaluated and no locking. Mutates nothing.
    pub fn allowed_transitions(
        &self,
        order_id: &OrderId,
        actor: &Actor,
        params: &Params,
    ) -> EngineResult<Vec<TransitionAttempt>> {
        let order = self.store.get_order(order_id)?;
        let mut attempts = Vec::new();
        for transition in self.table.transitions_from(order.status) {
            let ctx = advisory_context(&order, transition.to_state, actor, params);
            attempts.push(self.evaluate(transition, &ctx)?);
        }
        Ok(attempts)
    }

    /// Eligibility of the unique edge from the order's current status to
    /// `to_state`. A missing edge (wrong direction or not in the table)
    /// comes back as a blocked attempt, same as the caller-facing
    /// "no target options" behavior.
    pub fn can_transition(
        &self,
        order_id: &OrderId,
        to_state: OrderStatus,
        actor: &Actor,
        params: &Params,
    ) -> EngineResult<TransitionAttempt> {
        let order = self.store.get_order(order_id)?;
        let Some(transition) = self.table.resolve(order.status, to_state) else {
            let placeholder = Transition::new(
                format!("to:{}", to_state),
                &[order.status],
                to_state,
            );
            return Ok(TransitionAttempt::blocked(
                placeholder,
                format!(
                    "transition from {} to {} is not defined",
                    order.status, to_state
                ),
            ));
        };
        let ctx = advisory_context(&order, to_state, actor, params);
        self.evaluate(transition, &ctx)
    }

    // ── Transition Execution ─────────────────────────────────────────

    /// Execute a transition to the requested target state.
    pub fn transition(&self, request: &TransitionRequest) -> EngineResult<TransitionResult> {
        // Idempotent replay short-circuits before any locking.
        if let Some(entry) = self.find_replay(request)? {
            return Ok(TransitionResult::replayed(&entry));
        }

        let order = self.store.get_order(&request.order_id)?;
        let Some(transition) = self.table.resolve(order.status, request.to_state) else {
            return Ok(reject_no_edge(&order, request));
        };

        // Pre-lock guard pass: fail fast with a clear reason before any
        // lock is taken.
        let ctx = request_context(&order, transition, request);
        if let Some((guard, reason)) = self.run_guards(transition, &ctx)? {
            return Ok(TransitionResult::rejected(
                order.status,
                Rejection::GuardRejected { guard, reason },
                request.dry_run,
            ));
        }

        if request.dry_run {
            return Ok(
                TransitionResult::dry_run_ok(order.status, transition.to_state).with_message(
                    format!(
                        "dry-run ok: {} to {} via {}",
                        order.status, transition.to_state, transition.name
                    ),
                ),
            );
        }

        let lock = match self.store.lock_order(&request.order_id) {
            Ok(lock) => lock,
            Err(StoreError::LockContention(id)) => return Err(EngineError::LockContention(id)),
            Err(other) => return Err(other.into()),
        };

        // Everything below runs under the per-order lock; re-validate
        // against the latest state.
        if let Some(entry) = self.find_replay(request)? {
            return Ok(TransitionResult::replayed(&entry));
        }

        let order = self.store.get_order(&request.order_id)?;
        let Some(transition) = self.table.resolve(order.status, request.to_state) else {
            return Ok(reject_no_edge(&order, request));
        };

        let ctx = request_context(&order, transition, request);
        if let Some((guard, reason)) = self.run_guards(transition, &ctx)? {
            return Ok(TransitionResult::rejected(
                order.status,
                Rejection::GuardRejected { guard, reason },
                false,
            ));
        }

        // Effects run before the status write; a failure here aborts the
        // attempt with nothing persisted.
        let mut executed = Vec::with_capacity(transition.effects.len());
        for key in &transition.effects {
            let effect = self.registry.get_effect(key)?;
            effect.apply(&ctx).map_err(|source| EngineError::EffectFailed {
                effect: key.clone(),
                source,
            })?;
            executed.push(key.clone());
        }

        let mut entry = TransitionLogEntry::new(
            order.id.clone(),
            order.status,
            transition.to_state,
            transition.name.clone(),
        )
        .with_actor(request.actor.label())
        .with_note(request.note.clone())
        .with_effects(executed.clone())
        .with_params(request.params.clone());
        if let Some(key) = request.idempotency_key.clone() {
            entry = entry.with_idempotency_key(key);
        }

        let log_id = self
            .store
            .commit_transition(&lock, transition.to_state, entry)?;
        drop(lock);

        tracing::info!(
            order_id = %order.id,
            transition = %transition.name,
            from = %order.status,
            to = %transition.to_state,
            log_id = %log_id,
            "transition committed"
        );

        Ok(
            TransitionResult::applied(order.status, transition.to_state)
                .with_effects(executed)
                .with_log_id(log_id)
                .with_message(format!(
                    "{} to {} via {}",
                    order.status, transition.to_state, transition.name
                )),
        )
    }

    // ── Internal Helpers ─────────────────────────────────────────────

    fn find_replay(&self, request: &TransitionRequest) -> EngineResult<Option<TransitionLogEntry>> {
        match request.idempotency_key.as_deref() {
            Some(key) => Ok(self.store.find_by_idempotency(&request.order_id, key)?),
            None => Ok(None),
        }
    }

    fn evaluate(
        &self,
        transition: &Transition,
        ctx: &TransitionContext,
    ) -> EngineResult<TransitionAttempt> {
        match self.run_guards(transition, ctx)? {
            Some((_guard, reason)) => Ok(TransitionAttempt::blocked(transition.clone(), reason)),
            None => Ok(TransitionAttempt::allowed(transition.clone())),
        }
    }

    /// First failing guard as (guard key, reason), or `None` when all
    /// pass. Guards run in declared order and short-circuit.
    fn run_guards(
        &self,
        transition: &Transition,
        ctx: &TransitionContext,
    ) -> EngineResult<Option<(String, String)>> {
        for key in &transition.guards {
            let guard = self.registry.get_guard(key)?;
            let verdict = guard.check(ctx);
            if !verdict.allowed {
                let reason = verdict
                    .reason
                    .unwrap_or_else(|| format!("guard failed: {}", key));
                return Ok(Some((key.clone(), reason)));
            }
        }
        Ok(None)
    }
}

fn request_context(
    order: &Order,
    transition: &Transition,
    request: &TransitionRequest,
) -> TransitionContext {
    TransitionContext {
        order: order.clone(),
        from_state: order.status,
        to_state: transition.to_state,
        actor: request.actor.clone(),
        note: request.note.clone(),
        params: request.params.clone(),
        idempotency_key: request.idempotency_key.clone(),
        dry_run: request.dry_run,
    }
}

fn advisory_context(
    order: &Order,
    to_state: OrderStatus,
    actor: &Actor,
    params: &Params,
) -> TransitionContext {
    TransitionContext {
        order: order.clone(),
        from_state: order.status,
        to_state,
        actor: actor.clone(),
        note: String::new(),
        params: params.clone(),
        idempotency_key: None,
        dry_run: true,
    }
}

fn reject_no_edge(order: &Order, request: &TransitionRequest) -> TransitionResult {
    TransitionResult::rejected(
        order.status,
        Rejection::NoSuchTransition {
            from: order.status,
            to: request.to_state,
        },
        request.dry_run,
    )
}

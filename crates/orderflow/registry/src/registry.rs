//! String-keyed guard and effect registry
//!
//! Decouples the transition table from concrete guard and effect
//! implementations: table entries name guards and effects by key, and
//! the registry resolves keys at execution time. Stubs registered at
//! startup can later be replaced by real integrations without touching
//! the table.
//!
//! Registration is write-rare, lookup is read-heavy. Both maps sit
//! behind their own `RwLock`, so a lookup during a live replacement
//! observes either the old or the new binding, never a partial one.

use crate::{RegistryError, RegistryResult};
use orderflow_types::{EffectError, TransitionContext};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ── Guard & Effect Contracts ─────────────────────────────────────────

/// Verdict returned by a guard
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl GuardVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Read-only predicate gating a transition's eligibility.
///
/// Guards must not mutate anything and should stay cheap: the service
/// evaluates them once before locking and again under the lock.
pub trait Guard: Send + Sync {
    fn check(&self, ctx: &TransitionContext) -> GuardVerdict;
}

impl<F> Guard for F
where
    F: Fn(&TransitionContext) -> GuardVerdict + Send + Sync,
{
    fn check(&self, ctx: &TransitionContext) -> GuardVerdict {
        self(ctx)
    }
}

/// Side-effecting action executed as part of a committed transition.
///
/// Implementations must tolerate re-execution: the engine's idempotency
/// short-circuit covers whole requests, not individual effects. A
/// failure must propagate so the surrounding transition aborts.
pub trait Effect: Send + Sync {
    fn apply(&self, ctx: &TransitionContext) -> Result<(), EffectError>;
}

impl<F> Effect for F
where
    F: Fn(&TransitionContext) -> Result<(), EffectError> + Send + Sync,
{
    fn apply(&self, ctx: &TransitionContext) -> Result<(), EffectError> {
        self(ctx)
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registry of named guards and effects
#[derive(Default)]
pub struct Registry {
    guards: RwLock<HashMap<String, Arc<dyn Guard>>>,
    effects: RwLock<HashMap<String, Arc<dyn Effect>>>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guard under `key`. Fails if the key is taken; use
    /// [`Registry::override_guard`] to replace an existing binding.
    pub fn register_guard(
        &self,
        key: impl Into<String>,
        guard: impl Guard + 'static,
    ) -> RegistryResult<()> {
        let key = key.into();
        let mut guards = self
            .guards
            .write()
            .map_err(|_| RegistryError::Poisoned("guards".to_string()))?;
        if guards.contains_key(&key) {
            return Err(RegistryError::DuplicateGuard(key));
        }
        tracing::debug!(guard = %key, "guard registered");
        guards.insert(key, Arc::new(guard));
        Ok(())
    }

    /// Register or replace a guard under `key`. Replacement is logged so
    /// a behavior change is visible in operator logs.
    pub fn override_guard(
        &self,
        key: impl Into<String>,
        guard: impl Guard + 'static,
    ) -> RegistryResult<()> {
        let key = key.into();
        let mut guards = self
            .guards
            .write()
            .map_err(|_| RegistryError::Poisoned("guards".to_string()))?;
        if guards.insert(key.clone(), Arc::new(guard)).is_some() {
            tracing::warn!(guard = %key, "guard overridden");
        } else {
            tracing::debug!(guard = %key, "guard registered");
        }
        Ok(())
    }

    /// Resolve a guard by key.
    pub fn get_guard(&self, key: &str) -> RegistryResult<Arc<dyn Guard>> {
        let guards = self
            .guards
            .read()
            .map_err(|_| RegistryError::Poisoned("guards".to_string()))?;
        guards
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownGuard(key.to_string()))
    }

    /// Register an effect under `key`. Fails if the key is taken; use
    /// [`Registry::override_effect`] to replace an existing binding.
    pub fn register_effect(
        &self,
        key: impl Into<String>,
        effect: impl Effect + 'static,
    ) -> RegistryResult<()> {
        let key = key.into();
        let mut effects = self
            .effects
            .write()
            .map_err(|_| RegistryError::Poisoned("effects".to_string()))?;
        if effects.contains_key(&key) {
            return Err(RegistryError::DuplicateEffect(key));
        }
        tracing::debug!(effect = %key, "effect registered");
        effects.insert(key, Arc::new(effect));
        Ok(())
    }

    /// Register or replace an effect under `key`. Replacement is logged.
    pub fn override_effect(
        &self,
        key: impl Into<String>,
        effect: impl Effect + 'static,
    ) -> RegistryResult<()> {
        let key = key.into();
        let mut effects = self
            .effects
            .write()
            .map_err(|_| RegistryError::Poisoned("effects".to_string()))?;
        if effects.insert(key.clone(), Arc::new(effect)).is_some() {
            tracing::warn!(effect = %key, "effect overridden");
        } else {
            tracing::debug!(effect = %key, "effect registered");
        }
        Ok(())
    }

    /// Resolve an effect by key.
    pub fn get_effect(&self, key: &str) -> RegistryResult<Arc<dyn Effect>> {
        let effects = self
            .effects
            .read()
            .map_err(|_| RegistryError::Poisoned("effects".to_string()))?;
        effects
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownEffect(key.to_string()))
    }

    /// Registered guard keys, sorted.
    pub fn guard_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .guards
            .read()
            .map(|guards| guards.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Registered effect keys, sorted.
    pub fn effect_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .effects
            .read()
            .map(|effects| effects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("guards", &self.guard_keys())
            .field("effects", &self.effect_keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_types::{Actor, Order, OrderId, OrderStatus};

    fn make_ctx() -> TransitionContext {
        TransitionContext::new(
            Order::new(OrderId::new("order-1")),
            OrderStatus::Paid,
            Actor::system("test"),
        )
    }

    fn allow_all(_ctx: &TransitionContext) -> GuardVerdict {
        GuardVerdict::allow()
    }

    fn noop_effect(_ctx: &TransitionContext) -> Result<(), EffectError> {
        Ok(())
    }

    #[test]
    fn test_register_and_get_guard() {
        let registry = Registry::new();
        registry.register_guard("allow_all", allow_all).unwrap();

        let guard = registry.get_guard("allow_all").unwrap();
        assert!(guard.check(&make_ctx()).allowed);
    }

    #[test]
    fn test_duplicate_guard_rejected() {
        let registry = Registry::new();
        registry.register_guard("allow_all", allow_all).unwrap();
        let result = registry.register_guard("allow_all", allow_all);
        assert!(matches!(result, Err(RegistryError::DuplicateGuard(_))));
    }

    #[test]
    fn test_override_replaces_binding() {
        let registry = Registry::new();
        registry.register_guard("gate", allow_all).unwrap();

        registry
            .override_guard("gate", |_ctx: &TransitionContext| {
                GuardVerdict::reject("closed for maintenance")
            })
            .unwrap();

        let verdict = registry.get_guard("gate").unwrap().check(&make_ctx());
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("closed for maintenance"));
    }

    #[test]
    fn test_unknown_keys() {
        let registry = Registry::new();
        assert!(matches!(
            registry.get_guard("missing"),
            Err(RegistryError::UnknownGuard(_))
        ));
        assert!(matches!(
            registry.get_effect("missing"),
            Err(RegistryError::UnknownEffect(_))
        ));
    }

    #[test]
    fn test_effect_registration() {
        let registry = Registry::new();
        registry.register_effect("noop", noop_effect).unwrap();
        assert!(registry
            .get_effect("noop")
            .unwrap()
            .apply(&make_ctx())
            .is_ok());

        let result = registry.register_effect("noop", noop_effect);
        assert!(matches!(result, Err(RegistryError::DuplicateEffect(_))));
    }

    #[test]
    fn test_keys_sorted() {
        let registry = Registry::new();
        registry.register_guard("b_guard", allow_all).unwrap();
        registry.register_guard("a_guard", allow_all).unwrap();
        assert_eq!(registry.guard_keys(), vec!["a_guard", "b_guard"]);
    }
}

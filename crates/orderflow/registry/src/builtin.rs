//! Built-in guards and effects
//!
//! Lightweight defaults registered under the keys the canonical table
//! names. The payment and inventory entries are stubs: swap-in points
//! for real provider integrations. `role_allowed` is real and enforces
//! actor permissions.
//!
//! All effects here are safe to execute more than once.

use crate::{GuardVerdict, Registry, RegistryResult};
use orderflow_types::{EffectError, TransitionContext};

/// Permission required by `role_allowed` when the caller names none.
pub const DEFAULT_TRANSITION_PERM: &str = "orders.transition";

/// Params key naming a custom permission list for `role_allowed`.
pub const REQUIRED_PERMS_PARAM: &str = "required_perms";

// ── Guards ───────────────────────────────────────────────────────────

/// Stub: a real implementation would verify the payment intent status.
pub fn guard_payment_authorized(ctx: &TransitionContext) -> GuardVerdict {
    tracing::debug!(order_id = %ctx.order.id, "payment_authorized: allow (stub)");
    GuardVerdict::allow()
}

/// Stub: a real implementation would check and hold stock reservations.
pub fn guard_inventory_available(ctx: &TransitionContext) -> GuardVerdict {
    tracing::debug!(order_id = %ctx.order.id, "inventory_available: allow (stub)");
    GuardVerdict::allow()
}

/// Require an authenticated actor holding every listed permission.
///
/// Reads `params["required_perms"]` (array of strings); an absent or
/// empty list falls back to [`DEFAULT_TRANSITION_PERM`].
pub fn guard_role_allowed(ctx: &TransitionContext) -> GuardVerdict {
    if !ctx.actor.is_authenticated() {
        return GuardVerdict::reject("authentication required");
    }
    for perm in required_perms(ctx) {
        if !ctx.actor.has_permission(&perm) {
            return GuardVerdict::reject(format!("missing permission: {}", perm));
        }
    }
    GuardVerdict::allow()
}

fn required_perms(ctx: &TransitionContext) -> Vec<String> {
    let named: Vec<String> = ctx
        .params
        .get(REQUIRED_PERMS_PARAM)
        .and_then(|value| value.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    if named.is_empty() {
        vec![DEFAULT_TRANSITION_PERM.to_string()]
    } else {
        named
    }
}

// ── Effects ──────────────────────────────────────────────────────────

/// Stub: capture the authorized payment for the order.
pub fn effect_capture_payment(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, total = %ctx.order.total, "capture_payment (stub)");
    Ok(())
}

/// Stub: refund part or all of a payment based on params.
pub fn effect_refund_payment(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, "refund_payment (stub)");
    Ok(())
}

/// Stub: reserve stock for all items in the order.
pub fn effect_reserve_inventory(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, "reserve_inventory (stub)");
    Ok(())
}

/// Stub: release any reserved stock (on cancel/return).
pub fn effect_release_inventory(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, "release_inventory (stub)");
    Ok(())
}

/// Stub: send a transactional email for the transition.
pub fn effect_send_email(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, to = %ctx.to_state, "send_email (stub)");
    Ok(())
}

/// Stub: emit a webhook event for downstream systems.
pub fn effect_emit_webhook(ctx: &TransitionContext) -> Result<(), EffectError> {
    tracing::debug!(order_id = %ctx.order.id, to = %ctx.to_state, "emit_webhook (stub)");
    Ok(())
}

// ── Installation ─────────────────────────────────────────────────────

/// Register every built-in guard and effect under its canonical key.
///
/// Call once at startup, before constructing the service. Fails if any
/// key is already taken.
pub fn install_builtins(registry: &Registry) -> RegistryResult<()> {
    registry.register_guard("payment_authorized", guard_payment_authorized)?;
    registry.register_guard("inventory_available", guard_inventory_available)?;
    registry.register_guard("role_allowed", guard_role_allowed)?;

    registry.register_effect("capture_payment", effect_capture_payment)?;
    registry.register_effect("refund_payment", effect_refund_payment)?;
    registry.register_effect("reserve_inventory", effect_reserve_inventory)?;
    registry.register_effect("release_inventory", effect_release_inventory)?;
    registry.register_effect("send_email", effect_send_email)?;
    registry.register_effect("emit_webhook", effect_emit_webhook)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_types::{Actor, Order, OrderId, OrderStatus, Params};

    fn make_ctx(actor: Actor) -> TransitionContext {
        TransitionContext::new(
            Order::new(OrderId::new("order-1")),
            OrderStatus::Paid,
            actor,
        )
    }

    #[test]
    fn test_role_allowed_requires_authentication() {
        let verdict = guard_role_allowed(&make_ctx(Actor::Anonymous));
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("authentication required"));
    }

    #[test]
    fn test_role_allowed_default_permission() {
        let with_perm = Actor::user("alice", [DEFAULT_TRANSITION_PERM]);
        assert!(guard_role_allowed(&make_ctx(with_perm)).allowed);

        let without = Actor::user("bob", Vec::<String>::new());
        let verdict = guard_role_allowed(&make_ctx(without));
        assert!(!verdict.allowed);
        assert_eq!(
            verdict.reason.as_deref(),
            Some("missing permission: orders.transition")
        );
    }

    #[test]
    fn test_role_allowed_custom_permissions() {
        let mut params = Params::new();
        params.insert(
            REQUIRED_PERMS_PARAM.to_string(),
            serde_json::json!(["orders.refund"]),
        );
        let actor = Actor::user("carol", ["orders.transition"]);
        let ctx = make_ctx(actor).with_params(params);

        let verdict = guard_role_allowed(&ctx);
        assert!(!verdict.allowed);
        assert_eq!(
            verdict.reason.as_deref(),
            Some("missing permission: orders.refund")
        );
    }

    #[test]
    fn test_role_allowed_empty_list_falls_back() {
        let mut params = Params::new();
        params.insert(REQUIRED_PERMS_PARAM.to_string(), serde_json::json!([]));
        let actor = Actor::user("dave", Vec::<String>::new());
        let ctx = make_ctx(actor).with_params(params);
        assert!(!guard_role_allowed(&ctx).allowed);
    }

    #[test]
    fn test_system_actor_passes_role_allowed() {
        assert!(guard_role_allowed(&make_ctx(Actor::system("scheduler"))).allowed);
    }

    #[test]
    fn test_stub_guards_allow() {
        let ctx = make_ctx(Actor::Anonymous);
        assert!(guard_payment_authorized(&ctx).allowed);
        assert!(guard_inventory_available(&ctx).allowed);
    }

    #[test]
    fn test_install_builtins() {
        let registry = Registry::new();
        install_builtins(&registry).unwrap();

        assert_eq!(
            registry.guard_keys(),
            vec!["inventory_available", "payment_authorized", "role_allowed"]
        );
        assert_eq!(registry.effect_keys().len(), 6);

        // A second installation collides with the existing keys.
        assert!(install_builtins(&registry).is_err());
    }
}

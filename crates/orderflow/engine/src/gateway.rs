//! Feature-gated entry point for order status changes
//!
//! Hosts route status changes through a [`StatusGateway`]. With the
//! engine enabled, requests go through the transition service: guards,
//! effects, audit log. Disabled, the gateway falls back to the legacy
//! direct write: the status changes and nothing else happens. No guards
//! are consulted and no audit rows are produced, so the two paths have
//! observably different behavior; operators must not expect an audit
//! trail for writes made while the engine is off.
//!
//! The flag arrives as explicit configuration, not ambient global
//! state, so tests can exercise both paths side by side.

use crate::{EngineResult, TransitionRequest, TransitionService};
use orderflow_store::OrderflowStore;
use orderflow_types::{Actor, OrderId, OrderStatus, Params, TransitionResult};
use std::sync::Arc;

// ── Configuration ────────────────────────────────────────────────────

/// Gateway configuration, read once per call site
#[derive(Clone, Copy, Debug)]
pub struct GatewayConfig {
    /// Route status changes through the workflow engine
    pub workflow_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            workflow_enabled: true,
        }
    }
}

// ── Bulk Reporting ───────────────────────────────────────────────────

/// Per-order outcome of a bulk sweep
#[derive(Debug)]
pub enum BulkOutcome {
    /// Applied, replayed, or dry-run validated
    Applied(TransitionResult),
    /// Structured rejection: no edge, or a guard veto
    Rejected(TransitionResult),
    /// Engine error, rendered for reporting
    Errored(String),
}

/// Aggregate outcome of a bulk status change sweep
#[derive(Debug, Default)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<(OrderId, BulkOutcome)>,
}

// ── Status Gateway ───────────────────────────────────────────────────

/// Feature-gated facade over the transition service
pub struct StatusGateway {
    service: TransitionService,
    store: Arc<dyn OrderflowStore>,
    config: GatewayConfig,
}

impl StatusGateway {
    pub fn new(
        service: TransitionService,
        store: Arc<dyn OrderflowStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            service,
            store,
            config,
        }
    }

    pub fn service(&self) -> &TransitionService {
        &self.service
    }

    /// Apply one status change, routed per the feature flag.
    pub fn apply(&self, request: &TransitionRequest) -> EngineResult<TransitionResult> {
        if self.config.workflow_enabled {
            return self.service.transition(request);
        }
        self.legacy_apply(request)
    }

    /// Apply the same target to many orders independently. Failures do
    /// not halt the sweep; the report carries per-order outcomes and
    /// aggregate counts.
    pub fn apply_many(
        &self,
        order_ids: &[OrderId],
        to_state: OrderStatus,
        actor: &Actor,
        params: &Params,
        dry_run: bool,
    ) -> BulkReport {
        let mut report = BulkReport::default();
        for order_id in order_ids {
            let mut request =
                TransitionRequest::new(order_id.clone(), to_state, actor.clone())
                    .with_params(params.clone());
            if dry_run {
                request = request.dry_run();
            }

            let outcome = match self.apply(&request) {
                Ok(result) if result.success => {
                    report.succeeded += 1;
                    BulkOutcome::Applied(result)
                }
                Ok(result) => {
                    report.failed += 1;
                    BulkOutcome::Rejected(result)
                }
                Err(err) => {
                    report.failed += 1;
                    BulkOutcome::Errored(err.to_string())
                }
            };
            report.outcomes.push((order_id.clone(), outcome));
        }
        report
    }

    /// Legacy path: direct status write, bypassing guards, effects, and
    /// the audit log entirely.
    fn legacy_apply(&self, request: &TransitionRequest) -> EngineResult<TransitionResult> {
        let order = self.store.get_order(&request.order_id)?;
        if request.dry_run {
            return Ok(
                TransitionResult::dry_run_ok(order.status, request.to_state)
                    .with_message("dry-run ok: legacy direct update"),
            );
        }

        self.store
            .set_status_direct(&request.order_id, request.to_state)?;
        tracing::warn!(
            order_id = %request.order_id,
            from = %order.status,
            to = %request.to_state,
            "legacy direct status update; workflow engine disabled"
        );
        Ok(
            TransitionResult::applied(order.status, request.to_state)
                .with_message("direct status update (workflow engine disabled)"),
        )
    }
}

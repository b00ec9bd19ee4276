//! Persistence contracts the engine requires from its host
//!
//! The engine needs three things from storage: order status reads and
//! writes behind a per-order exclusive lock, an append-only transition
//! log whose insert commits atomically with the status write, and a
//! direct status write for the legacy (engine-disabled) path.
//!
//! Any transactional backend can implement these traits; the invariant
//! to preserve is per-order serialization of the commit window, not the
//! specific locking primitive.

use crate::StoreResult;
use orderflow_types::{LogEntryId, Order, OrderId, OrderStatus, TransitionLogEntry};

// ── Order Lock ───────────────────────────────────────────────────────

/// Exclusive hold on one order, released on drop.
///
/// Holding the token is the precondition for
/// [`OrderStore::commit_transition`]; it serializes transition execution
/// per order.
pub struct OrderLock {
    order_id: OrderId,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl OrderLock {
    /// Build a lock token; `release` runs exactly once, on drop.
    pub fn new(order_id: OrderId, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            order_id,
            release: Some(Box::new(release)),
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }
}

impl Drop for OrderLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for OrderLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLock")
            .field("order_id", &self.order_id)
            .finish()
    }
}

// ── Store Contracts ──────────────────────────────────────────────────

/// Order state storage with per-order exclusive locking.
pub trait OrderStore: Send + Sync {
    /// Insert a new order. Fails with a conflict on duplicate identity.
    fn insert_order(&self, order: Order) -> StoreResult<()>;

    /// Read a snapshot of an order.
    fn get_order(&self, id: &OrderId) -> StoreResult<Order>;

    /// Acquire the exclusive per-order lock, blocking up to the
    /// adapter's configured timeout. Timeout surfaces as
    /// `StoreError::LockContention`; the caller may retry.
    fn lock_order(&self, id: &OrderId) -> StoreResult<OrderLock>;

    /// Persist a status change and its log row as one atomic unit.
    ///
    /// The caller must hold `lock` for the entry's order. Rejects a
    /// duplicate (order, idempotency key) pair.
    fn commit_transition(
        &self,
        lock: &OrderLock,
        to: OrderStatus,
        entry: TransitionLogEntry,
    ) -> StoreResult<LogEntryId>;

    /// Legacy direct write: status only. No guards were consulted and no
    /// log row is produced; callers own the observable difference.
    fn set_status_direct(&self, id: &OrderId, to: OrderStatus) -> StoreResult<()>;
}

/// Append-only transition log queries.
pub trait TransitionLogStore: Send + Sync {
    /// All entries for an order, oldest first.
    fn list_for_order(&self, id: &OrderId) -> StoreResult<Vec<TransitionLogEntry>>;

    /// The entry recorded under (order, idempotency key), if any.
    fn find_by_idempotency(
        &self,
        id: &OrderId,
        key: &str,
    ) -> StoreResult<Option<TransitionLogEntry>>;
}

/// Unified store bundle the engine is constructed over.
pub trait OrderflowStore: OrderStore + TransitionLogStore + Send + Sync {}

impl<T> OrderflowStore for T where T: OrderStore + TransitionLogStore + Send + Sync {}

//! In-memory reference implementation of the store traits.
//!
//! This adapter is deterministic and test-friendly. Production
//! deployments should back the traits with a transactional database;
//! the invariant to preserve is that the status write and the log
//! append commit together.
//!
//! Orders and the transition log live behind a single `RwLock`, so one
//! write guard is the atomic commit unit. Per-order exclusivity comes
//! from a lock table with a condition variable and a configurable
//! acquire timeout.

use crate::traits::{OrderLock, OrderStore, TransitionLogStore};
use crate::{StoreError, StoreResult};
use chrono::Utc;
use orderflow_types::{LogEntryId, Order, OrderId, OrderStatus, TransitionLogEntry};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct StoreInner {
    orders: HashMap<OrderId, Order>,
    log: Vec<TransitionLogEntry>,
}

// ── Lock Table ───────────────────────────────────────────────────────

struct LockTable {
    held: Mutex<HashSet<OrderId>>,
    released: Condvar,
}

impl LockTable {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        })
    }

    /// Block until the order's lock is free or `timeout` elapses.
    fn acquire(self: &Arc<Self>, id: &OrderId, timeout: Duration) -> StoreResult<OrderLock> {
        let held = self
            .held
            .lock()
            .map_err(|_| StoreError::Backend("lock table poisoned".to_string()))?;
        let (mut held, wait) = self
            .released
            .wait_timeout_while(held, timeout, |held| held.contains(id))
            .map_err(|_| StoreError::Backend("lock table poisoned".to_string()))?;
        if wait.timed_out() && held.contains(id) {
            return Err(StoreError::LockContention(id.clone()));
        }
        held.insert(id.clone());

        let table = Arc::clone(self);
        let order_id = id.clone();
        Ok(OrderLock::new(id.clone(), move || {
            if let Ok(mut held) = table.held.lock() {
                held.remove(&order_id);
                table.released.notify_all();
            }
        }))
    }
}

// ── In-Memory Store ──────────────────────────────────────────────────

/// In-memory orderflow store adapter.
pub struct InMemoryOrderflowStore {
    inner: RwLock<StoreInner>,
    locks: Arc<LockTable>,
    lock_timeout: Duration,
}

impl InMemoryOrderflowStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a store with a custom per-order lock acquire timeout.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            locks: LockTable::new(),
            lock_timeout,
        }
    }
}

impl Default for InMemoryOrderflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderflowStore {
    fn insert_order(&self, order: Order) -> StoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        if inner.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        inner.orders.insert(order.id.clone(), order);
        Ok(())
    }

    fn get_order(&self, id: &OrderId) -> StoreResult<Order> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        inner
            .orders
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::OrderNotFound(id.clone()))
    }

    fn lock_order(&self, id: &OrderId) -> StoreResult<OrderLock> {
        // Existence check first so a missing order is not reported as
        // contention.
        {
            let inner = self
                .inner
                .read()
                .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
            if !inner.orders.contains_key(id) {
                return Err(StoreError::OrderNotFound(id.clone()));
            }
        }
        self.locks.acquire(id, self.lock_timeout)
    }

    fn commit_transition(
        &self,
        lock: &OrderLock,
        to: OrderStatus,
        entry: TransitionLogEntry,
    ) -> StoreResult<LogEntryId> {
        if lock.order_id() != &entry.order_id {
            return Err(StoreError::InvariantViolation(format!(
                "lock held for order {} but entry targets order {}",
                lock.order_id(),
                entry.order_id
            )));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;

        if let Some(key) = entry.idempotency_key.as_deref() {
            let duplicate = inner
                .log
                .iter()
                .any(|e| e.order_id == entry.order_id && e.idempotency_key.as_deref() == Some(key));
            if duplicate {
                return Err(StoreError::Conflict(format!(
                    "idempotency key '{}' already recorded for order {}",
                    key, entry.order_id
                )));
            }
        }

        let order = inner
            .orders
            .get_mut(&entry.order_id)
            .ok_or_else(|| StoreError::OrderNotFound(entry.order_id.clone()))?;
        order.status = to;
        order.updated_at = Utc::now();

        let id = entry.id.clone();
        inner.log.push(entry);
        Ok(id)
    }

    fn set_status_direct(&self, id: &OrderId, to: OrderStatus) -> StoreResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        let order = inner
            .orders
            .get_mut(id)
            .ok_or_else(|| StoreError::OrderNotFound(id.clone()))?;
        order.status = to;
        order.updated_at = Utc::now();
        tracing::warn!(order_id = %id, to = %to, "direct status update; no audit row");
        Ok(())
    }
}

impl TransitionLogStore for InMemoryOrderflowStore {
    fn list_for_order(&self, id: &OrderId) -> StoreResult<Vec<TransitionLogEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        // Append order is insertion order, so this is oldest first.
        Ok(inner
            .log
            .iter()
            .filter(|entry| &entry.order_id == id)
            .cloned()
            .collect())
    }

    fn find_by_idempotency(
        &self,
        id: &OrderId,
        key: &str,
    ) -> StoreResult<Option<TransitionLogEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(inner
            .log
            .iter()
            .find(|entry| &entry.order_id == id && entry.idempotency_key.as_deref() == Some(key))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> InMemoryOrderflowStore {
        let store = InMemoryOrderflowStore::new();
        store
            .insert_order(Order::new(OrderId::new("order-1")))
            .unwrap();
        store
    }

    fn make_entry(key: Option<&str>) -> TransitionLogEntry {
        let entry = TransitionLogEntry::new(
            OrderId::new("order-1"),
            OrderStatus::Pending,
            OrderStatus::Paid,
            "mark_paid",
        );
        match key {
            Some(key) => entry.with_idempotency_key(key),
            None => entry,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = make_store();
        let order = store.get_order(&OrderId::new("order-1")).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let missing = store.get_order(&OrderId::new("nope"));
        assert!(matches!(missing, Err(StoreError::OrderNotFound(_))));
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let store = make_store();
        let result = store.insert_order(Order::new(OrderId::new("order-1")));
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn test_commit_writes_status_and_log_together() {
        let store = make_store();
        let id = OrderId::new("order-1");
        let lock = store.lock_order(&id).unwrap();

        store
            .commit_transition(&lock, OrderStatus::Paid, make_entry(None))
            .unwrap();
        drop(lock);

        assert_eq!(store.get_order(&id).unwrap().status, OrderStatus::Paid);
        assert_eq!(store.list_for_order(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_rejects_duplicate_idempotency_key() {
        let store = make_store();
        let id = OrderId::new("order-1");

        let lock = store.lock_order(&id).unwrap();
        store
            .commit_transition(&lock, OrderStatus::Paid, make_entry(Some("key-1")))
            .unwrap();
        let result = store.commit_transition(&lock, OrderStatus::Paid, make_entry(Some("key-1")));
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        assert_eq!(store.list_for_order(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_rejects_mismatched_lock() {
        let store = make_store();
        store
            .insert_order(Order::new(OrderId::new("order-2")))
            .unwrap();

        let lock = store.lock_order(&OrderId::new("order-2")).unwrap();
        let result = store.commit_transition(&lock, OrderStatus::Paid, make_entry(None));
        assert!(matches!(result, Err(StoreError::InvariantViolation(_))));
    }

    #[test]
    fn test_lock_contention_times_out() {
        let store = InMemoryOrderflowStore::with_lock_timeout(Duration::from_millis(20));
        store
            .insert_order(Order::new(OrderId::new("order-1")))
            .unwrap();
        let id = OrderId::new("order-1");

        let held = store.lock_order(&id).unwrap();
        let result = store.lock_order(&id);
        assert!(matches!(result, Err(StoreError::LockContention(_))));

        drop(held);
        assert!(store.lock_order(&id).is_ok());
    }

    #[test]
    fn test_locks_are_per_order() {
        let store = make_store();
        store
            .insert_order(Order::new(OrderId::new("order-2")))
            .unwrap();

        let _one = store.lock_order(&OrderId::new("order-1")).unwrap();
        assert!(store.lock_order(&OrderId::new("order-2")).is_ok());
    }

    #[test]
    fn test_lock_missing_order() {
        let store = make_store();
        let result = store.lock_order(&OrderId::new("nope"));
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[test]
    fn test_list_for_order_oldest_first() {
        let store = make_store();
        let id = OrderId::new("order-1");

        let lock = store.lock_order(&id).unwrap();
        store
            .commit_transition(&lock, OrderStatus::Paid, make_entry(None))
            .unwrap();
        store
            .commit_transition(
                &lock,
                OrderStatus::Shipped,
                TransitionLogEntry::new(id.clone(), OrderStatus::Paid, OrderStatus::Shipped, "ship"),
            )
            .unwrap();
        drop(lock);

        let entries = store.list_for_order(&id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transition, "mark_paid");
        assert_eq!(entries[1].transition, "ship");
    }

    #[test]
    fn test_find_by_idempotency() {
        let store = make_store();
        let id = OrderId::new("order-1");

        let lock = store.lock_order(&id).unwrap();
        store
            .commit_transition(&lock, OrderStatus::Paid, make_entry(Some("key-1")))
            .unwrap();
        drop(lock);

        let found = store.find_by_idempotency(&id, "key-1").unwrap();
        assert!(found.is_some());
        assert!(store.find_by_idempotency(&id, "key-2").unwrap().is_none());
    }

    #[test]
    fn test_direct_update_leaves_no_log() {
        let store = make_store();
        let id = OrderId::new("order-1");

        store.set_status_direct(&id, OrderStatus::Cancelled).unwrap();

        assert_eq!(store.get_order(&id).unwrap().status, OrderStatus::Cancelled);
        assert!(store.list_for_order(&id).unwrap().is_empty());
    }
}

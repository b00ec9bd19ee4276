//! Order identity, status, and actor types
//!
//! The engine owns none of the order's commercial data. It reads and
//! writes `status` and appends transition log rows; the remaining fields
//! on [`Order`] exist for guards, effects, and audit display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for an order, supplied by the host application
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Order Status ─────────────────────────────────────────────────────

/// The fixed order lifecycle states.
///
/// `Pending` is the sole initial state; orders are created in it outside
/// the engine. The terminal states have no outgoing transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Fulfilled,
    Cancelled,
    Refunded,
    Returned,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Fulfilled,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Returned => "returned",
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Returned
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Order ────────────────────────────────────────────────────────────

/// An order as the engine sees it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Identity, owned by the host
    pub id: OrderId,
    /// Current lifecycle status; mutated only through the engine
    pub status: OrderStatus,
    /// Persisted monetary total
    pub total: Decimal,
    /// ISO 4217 currency code
    pub currency: String,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was last updated
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order with a zero total.
    pub fn new(id: OrderId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: OrderStatus::Pending,
            total: Decimal::ZERO,
            currency: "EUR".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = total;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

// ── Actor ────────────────────────────────────────────────────────────

/// Who requested a transition, as recorded in the audit trail
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// An authenticated operator holding named permissions
    User {
        username: String,
        permissions: BTreeSet<String>,
    },
    /// An internal automated caller (webhook consumer, scheduler);
    /// implicitly holds every permission
    System { label: String },
    /// No authenticated identity supplied
    Anonymous,
}

impl Actor {
    /// Create a user actor with the given permissions.
    pub fn user(
        username: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::User {
            username: username.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a system actor.
    pub fn system(label: impl Into<String>) -> Self {
        Self::System {
            label: label.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Actor::Anonymous)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            Actor::User { permissions, .. } => permissions.contains(permission),
            Actor::System { .. } => true,
            Actor::Anonymous => false,
        }
    }

    /// Display identity for audit rows.
    pub fn label(&self) -> &str {
        match self {
            Actor::User { username, .. } => username,
            Actor::System { label } => label,
            Actor::Anonymous => "anonymous",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                &OrderStatus::Cancelled,
                &OrderStatus::Refunded,
                &OrderStatus::Returned
            ]
        );
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Fulfilled.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"shipped\"");
        let back: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(back, OrderStatus::Refunded);
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = Order::new(OrderId::new("order-1"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::ZERO);
        assert_eq!(order.currency, "EUR");
    }

    #[test]
    fn test_order_builders() {
        let order = Order::new(OrderId::new("order-2"))
            .with_total(Decimal::new(4999, 2))
            .with_currency("CZK");
        assert_eq!(order.total.to_string(), "49.99");
        assert_eq!(order.currency, "CZK");
    }

    #[test]
    fn test_actor_permissions() {
        let user = Actor::user("alice", ["orders.transition"]);
        assert!(user.is_authenticated());
        assert!(user.has_permission("orders.transition"));
        assert!(!user.has_permission("orders.delete"));
        assert_eq!(user.label(), "alice");

        let system = Actor::system("payment-webhook");
        assert!(system.is_authenticated());
        assert!(system.has_permission("anything"));

        assert!(!Actor::Anonymous.is_authenticated());
        assert!(!Actor::Anonymous.has_permission("orders.transition"));
        assert_eq!(Actor::Anonymous.label(), "anonymous");
    }

    #[test]
    fn test_order_id_short() {
        let id = OrderId::new("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(OrderId::new("ab").short(), "ab");
    }
}

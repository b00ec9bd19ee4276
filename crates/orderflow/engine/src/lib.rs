//! Order Workflow Engine
//!
//! A registry-driven transition system governing the order lifecycle:
//! pending to paid to shipped to fulfilled, with cancel, refund, and
//! return branches. Transitions carry named guards (read-only
//! eligibility checks) and effects (side actions) resolved through the
//! registry, execute under a per-order exclusive lock, and commit their
//! status change atomically with an append-only audit row.
//!
//! # Architecture
//!
//! The engine composes three collaborators:
//!
//! - [`TransitionTable`] — the fixed, validated list of lifecycle edges
//! - [`orderflow_registry::Registry`] — string keys to guard/effect
//!   implementations, stubs first, real integrations later
//! - [`orderflow_store::OrderflowStore`] — order status plus the
//!   append-only transition log, with per-order locking
//!
//! [`TransitionService`] is the state machine core; [`StatusGateway`]
//! adds the feature flag routing requests to the engine or to the
//! legacy direct-update fallback.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use orderflow_engine::{TransitionRequest, TransitionService, TransitionTable};
//! use orderflow_registry::{install_builtins, Registry};
//! use orderflow_store::{InMemoryOrderflowStore, OrderStore};
//! use orderflow_types::{Actor, Order, OrderId, OrderStatus};
//!
//! let registry = Arc::new(Registry::new());
//! install_builtins(&registry).unwrap();
//!
//! let store = Arc::new(InMemoryOrderflowStore::new());
//! store.insert_order(Order::new(OrderId::new("order-1"))).unwrap();
//!
//! let service = TransitionService::new(TransitionTable::canonical(), registry, store.clone());
//!
//! let actor = Actor::user("ops", ["orders.transition"]);
//! let request = TransitionRequest::new(OrderId::new("order-1"), OrderStatus::Paid, actor);
//! let result = service.transition(&request).unwrap();
//!
//! assert!(result.success);
//! assert_eq!(result.to_state, Some(OrderStatus::Paid));
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod gateway;
pub mod service;
pub mod table;

pub use errors::{EngineError, EngineResult};
pub use gateway::{BulkOutcome, BulkReport, GatewayConfig, StatusGateway};
pub use service::{TransitionRequest, TransitionService};
pub use table::{canonical_transitions, TransitionTable};

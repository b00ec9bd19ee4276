//! Persistence layer contracts for the order workflow engine
//!
//! The engine is a pure function layer over an order row plus an
//! append-only transition log it exclusively owns. This crate defines
//! the contracts a host's storage must satisfy ([`OrderStore`],
//! [`TransitionLogStore`]) and ships [`InMemoryOrderflowStore`], a
//! deterministic reference adapter used by tests and embedded hosts.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryOrderflowStore;
pub use traits::{OrderLock, OrderStore, OrderflowStore, TransitionLogStore};

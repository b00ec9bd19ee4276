//! Order lifecycle domain types
//!
//! The vocabulary shared by the registry, store, and engine crates:
//! order identity and status, declarative transition definitions, the
//! execution context handed to guards and effects, transition attempts
//! and results, and the append-only transition log entry.
//!
//! Nothing here performs I/O; these are plain data types with serde
//! support throughout.

#![deny(unsafe_code)]

pub mod errors;
pub mod log;
pub mod order;
pub mod result;
pub mod transition;

pub use errors::EffectError;
pub use log::{LogEntryId, TransitionLogEntry};
pub use order::{Actor, Order, OrderId, OrderStatus};
pub use result::{Rejection, TransitionAttempt, TransitionResult};
pub use transition::{Params, Transition, TransitionContext};

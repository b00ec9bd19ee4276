//! Guard and effect registry for the order workflow engine
//!
//! Transitions name their guards and effects by string key; this crate
//! resolves those keys to implementations. The indirection exists for
//! stub-first rollout: the built-ins registered at startup are safe
//! no-ops that real payment, inventory, email, and webhook integrations
//! replace later, without changing a single transition definition.
//!
//! Duplicate registration fails; replacing a binding is a separate,
//! explicit call that leaves a warning in the logs.

#![deny(unsafe_code)]

pub mod builtin;
pub mod errors;
pub mod registry;

pub use builtin::{install_builtins, DEFAULT_TRANSITION_PERM, REQUIRED_PERMS_PARAM};
pub use errors::{RegistryError, RegistryResult};
pub use registry::{Effect, Guard, GuardVerdict, Registry};

//! Authentication and session lifecycle.
//!
//! # Responsibility
//! - Define the identity provider contract (`identity`).
//! - Map raw provider failures to a closed taxonomy, once (`errors`).
//! - Own the session state machine (`machine`).
//! - Derive the delete affordance hint (`gate`).
//! - Provide an in-memory identity provider (`memory`).
//!
//! # Invariants
//! - Only the state machine replaces the session descriptor.
//! - Provider failures never escape the machine as anything but state.
//! - No call in this module is retried automatically.

pub mod errors;
pub mod gate;
pub mod identity;
pub mod machine;
pub mod memory;

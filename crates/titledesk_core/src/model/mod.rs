//! Domain records shared across the client core.
//!
//! # Responsibility
//! - Define catalog title records and the session descriptor.
//!
//! # Invariants
//! - Title ids are assigned by the remote catalog and never reused.
//! - A session descriptor is replaced wholesale on every transition.

pub mod session;
pub mod title;

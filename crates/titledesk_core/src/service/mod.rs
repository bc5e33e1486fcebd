//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog writes against the session and the title snapshot.
//!
//! # Invariants
//! - Services never bypass repository contracts.
//! - Privileged calls are authorized from a fresh session lookup.

pub mod mutation;

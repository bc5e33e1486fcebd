//! Incremental title search.
//!
//! # Responsibility
//! - Filter and highlight titles for a typed term (`highlight`).
//! - Order asynchronous fetches so stale responses are dropped (`query`).
//! - Drive debounced input, fetches and view publication (`controller`).
//!
//! # Invariants
//! - Terms are matched literally and case-insensitively; no pattern syntax.
//! - Results keep the collection's insertion order; there is no ranking.

pub mod controller;
pub mod highlight;
pub mod query;

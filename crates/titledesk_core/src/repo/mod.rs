//! Remote catalog access and the client's title snapshot.
//!
//! # Responsibility
//! - Define the wire contract of the remote catalog (`catalog_api`).
//! - Normalize wire responses into records or typed failures (`title_repo`).
//! - Hold the shared title snapshot that search and mutations read and write
//!   (`collection`).
//! - Provide HTTP and in-memory catalog adapters (`http`, `memory`).
//!
//! # Invariants
//! - Repository calls are single remote calls with no local retry.
//! - Repository writes never refresh the snapshot; callers own consistency.

pub mod catalog_api;
pub mod collection;
pub mod http;
pub mod memory;
pub mod title_repo;

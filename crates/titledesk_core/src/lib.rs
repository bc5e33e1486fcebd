//! Core logic for the titledesk catalog client.
//! Session, search and catalog mutations live here; rendering does not.

pub mod client;
pub mod config;
pub mod debounce;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;

pub use client::{http_repository, CatalogClient};
pub use config::{ClientConfig, ConfigError, ConfigResult};
pub use debounce::Debouncer;
pub use logging::{default_log_level, init_logging, logging_status, mask_email};
pub use model::session::{SessionDescriptor, SessionStatus, SessionValidationError};
pub use model::title::{TitleId, TitleRecord};
pub use repo::catalog_api::{CatalogApi, TransportError};
pub use repo::collection::{ListingTicket, Removal, TitleCollection, TitleSnapshot};
pub use repo::http::HttpCatalogApi;
pub use repo::memory::InMemoryCatalogApi;
pub use repo::title_repo::{RemoteTitleRepository, RepoError, RepoResult, TitleRepository};
pub use search::controller::{SearchController, SearchView};
pub use search::highlight::{filter_and_highlight, HighlightedTitle};
pub use search::query::{QueryClock, SearchQuery};
pub use service::mutation::{
    MutationCoordinator, MutationError, MutationFailure, MutationIntent, MutationKind,
    MutationOutcome, MutationResult,
};
pub use session::errors::{classify_provider_error, AuthErrorKind, AuthFailure};
pub use session::gate::{can_delete, AuthorizationGate};
pub use session::identity::{
    fetch_session, AuthenticatedUser, IdentityProvider, ProviderError, ProviderResult,
    SignUpResult,
};
pub use session::machine::{AuthResult, CredentialForm, SessionStateMachine};
pub use session::memory::InMemoryIdentityProvider;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

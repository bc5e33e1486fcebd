//! Client façade wiring session, search and mutations together.
//!
//! # Responsibility
//! - Validate configuration and recover any existing session at startup.
//! - Share one title collection between search and mutations.
//! - Pick the HTTP catalog adapter when an endpoint is configured.
//!
//! # Invariants
//! - Session state and the title collection are disjoint; nothing here
//!   locks one against the other.

use crate::config::{ClientConfig, ConfigResult};
use crate::repo::catalog_api::TransportError;
use crate::repo::collection::TitleCollection;
use crate::repo::http::HttpCatalogApi;
use crate::repo::title_repo::{RemoteTitleRepository, TitleRepository};
use crate::search::controller::SearchController;
use crate::service::mutation::MutationCoordinator;
use crate::session::gate::AuthorizationGate;
use crate::session::identity::IdentityProvider;
use crate::session::machine::SessionStateMachine;
use log::info;
use std::sync::Arc;

/// Builds the HTTP-backed repository when `catalog_endpoint` is set.
///
/// Returns `None` without an endpoint; the caller supplies another catalog.
pub fn http_repository(
    config: &ClientConfig,
) -> Result<Option<Arc<dyn TitleRepository>>, TransportError> {
    if config.catalog_endpoint.is_none() {
        return Ok(None);
    }
    let api = HttpCatalogApi::from_config(config)?;
    info!(
        "event=catalog_adapter module=client status=ok adapter=http api_key={}",
        config.catalog_api_key.is_some()
    );
    Ok(Some(Arc::new(RemoteTitleRepository::new(api))))
}

pub struct CatalogClient<R: ?Sized, P: ?Sized> {
    config: ClientConfig,
    titles: TitleCollection,
    gate: AuthorizationGate,
    session: SessionStateMachine<P>,
    search: SearchController,
    mutations: MutationCoordinator<R, P>,
}

impl<R, P> CatalogClient<R, P>
where
    R: TitleRepository + ?Sized + 'static,
    P: IdentityProvider + ?Sized,
{
    /// Builds the client and recovers a previous session, if any.
    ///
    /// Must run inside a tokio runtime; the search driver is spawned on it.
    pub async fn start(config: ClientConfig, repo: Arc<R>, identity: Arc<P>) -> ConfigResult<Self> {
        config.validate()?;

        let titles = TitleCollection::new();
        let gate = AuthorizationGate::new(config.admin_group.clone());
        let search = SearchController::spawn(Arc::clone(&repo), titles.clone(), &config);
        let mutations = MutationCoordinator::new(
            repo,
            Arc::clone(&identity),
            titles.clone(),
            gate.clone(),
        );
        let mut session =
            SessionStateMachine::with_code_length(identity, config.confirmation_code_length);
        session.recover_session().await;

        info!(
            "event=client_start module=client status=ok session={:?}",
            session.status()
        );
        Ok(Self {
            config,
            titles,
            gate,
            session,
            search,
            mutations,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn titles(&self) -> &TitleCollection {
        &self.titles
    }

    pub fn session(&self) -> &SessionStateMachine<P> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStateMachine<P> {
        &mut self.session
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn mutations(&self) -> &MutationCoordinator<R, P> {
        &self.mutations
    }

    /// Whether to offer the delete control, from the cached session.
    pub fn can_delete(&self) -> bool {
        self.gate.can_delete(self.session.descriptor())
    }
}

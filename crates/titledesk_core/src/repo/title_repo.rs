//! Title repository contract and its catalog-backed implementation.
//!
//! # Responsibility
//! - Expose list/create/delete as single remote calls.
//! - Turn wire payloads into `TitleRecord`s and typed failures.
//!
//! # Invariants
//! - Records without an id are never returned.
//! - A delete acknowledgement carrying errors is a failure.

use crate::model::title::{TitleId, TitleRecord};
use crate::repo::catalog_api::{
    CatalogApi, CreateTitleInput, DeleteTitleInput, TransportError, WireTitle,
};
use async_trait::async_trait;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// The call failed in transit or returned an unusable payload.
    RemoteCallFailed(String),
    /// The server answered with a logical errors array.
    MutationRejectedByServer(Vec<String>),
    /// Rejected locally before any call was made.
    InvalidInput(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteCallFailed(message) => write!(f, "remote call failed: {message}"),
            Self::MutationRejectedByServer(messages) => {
                write!(f, "server rejected mutation: {}", messages.join("; "))
            }
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl Error for RepoError {}

impl From<TransportError> for RepoError {
    fn from(value: TransportError) -> Self {
        Self::RemoteCallFailed(value.message)
    }
}

/// Catalog access used by search and mutation orchestration.
#[async_trait]
pub trait TitleRepository: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<TitleRecord>>;
    async fn create(&self, title: &str) -> RepoResult<TitleRecord>;
    async fn delete(&self, id: &str) -> RepoResult<()>;
}

/// `TitleRepository` over any [`CatalogApi`] transport.
pub struct RemoteTitleRepository<A> {
    api: A,
}

impl<A: CatalogApi> RemoteTitleRepository<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: CatalogApi> TitleRepository for RemoteTitleRepository<A> {
    async fn list(&self) -> RepoResult<Vec<TitleRecord>> {
        let response = self.api.list().await?;
        let total = response.items.len();
        let records: Vec<TitleRecord> = response
            .items
            .into_iter()
            .flatten()
            .filter_map(normalize_wire_title)
            .collect();

        if records.len() != total {
            warn!(
                "event=title_list module=repo status=ok dropped_items={}",
                total - records.len()
            );
        }
        debug!("event=title_list module=repo status=ok count={}", records.len());
        Ok(records)
    }

    async fn create(&self, title: &str) -> RepoResult<TitleRecord> {
        if title.trim().is_empty() {
            return Err(RepoError::InvalidInput("title must not be blank".to_string()));
        }

        let created = self
            .api
            .create(CreateTitleInput {
                title: title.to_string(),
            })
            .await?;

        normalize_wire_title(created).ok_or_else(|| {
            RepoError::RemoteCallFailed("create response did not include an id".to_string())
        })
    }

    async fn delete(&self, id: &str) -> RepoResult<()> {
        let response = self
            .api
            .delete(DeleteTitleInput { id: id.to_string() })
            .await?;

        let errors = response.error_messages();
        if !errors.is_empty() {
            return Err(RepoError::MutationRejectedByServer(errors));
        }
        Ok(())
    }
}

fn normalize_wire_title(wire: WireTitle) -> Option<TitleRecord> {
    let id: TitleId = wire.id.filter(|id| !id.trim().is_empty())?;
    Some(TitleRecord {
        id,
        title: wire.title.unwrap_or_default(),
    })
}

//! Catalog write orchestration.
//!
//! # Responsibility
//! - Create titles and refresh the snapshot afterwards.
//! - Delete titles optimistically, rolling back on failure.
//! - Keep the most recent failure for display.
//!
//! # Invariants
//! - A delete is authorized against a freshly fetched session, never a
//!   cached flag; an unauthorized delete makes no network call.
//! - At most one delete per title id is in flight.
//! - A failed delete leaves the snapshot as it was before the attempt.

use crate::model::title::{TitleId, TitleRecord};
use crate::repo::collection::TitleCollection;
use crate::repo::title_repo::{RepoError, TitleRepository};
use crate::session::gate::AuthorizationGate;
use crate::session::identity::{fetch_session, IdentityProvider};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type MutationResult<T> = Result<T, MutationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// Rejected by the authorization gate before any call was made.
    UnauthorizedOperation,
    /// A delete for this id is already in flight.
    Conflict(TitleId),
    RemoteCallFailed(String),
    MutationRejectedByServer(Vec<String>),
    InvalidInput(String),
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnauthorizedOperation => write!(f, "Unauthorized"),
            Self::Conflict(id) => write!(f, "delete already in progress for title {id}"),
            Self::RemoteCallFailed(message) => write!(f, "remote call failed: {message}"),
            Self::MutationRejectedByServer(messages) => {
                write!(f, "server rejected mutation: {}", messages.join("; "))
            }
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl Error for MutationError {}

impl From<RepoError> for MutationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::RemoteCallFailed(message) => Self::RemoteCallFailed(message),
            RepoError::MutationRejectedByServer(messages) => {
                Self::MutationRejectedByServer(messages)
            }
            RepoError::InvalidInput(message) => Self::InvalidInput(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    Create { title: String },
    Delete { id: TitleId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Delete,
}

impl MutationKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Empty create term; nothing was sent.
    Skipped,
    Created(TitleRecord),
    Deleted(TitleId),
}

/// Failure kept for the presentation layer until cleared or superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub kind: MutationKind,
    pub error: MutationError,
}

pub struct MutationCoordinator<R: ?Sized, P: ?Sized> {
    repo: Arc<R>,
    identity: Arc<P>,
    titles: TitleCollection,
    gate: AuthorizationGate,
    last_failure: Mutex<Option<MutationFailure>>,
}

impl<R, P> MutationCoordinator<R, P>
where
    R: TitleRepository + ?Sized,
    P: IdentityProvider + ?Sized,
{
    pub fn new(
        repo: Arc<R>,
        identity: Arc<P>,
        titles: TitleCollection,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            repo,
            identity,
            titles,
            gate,
            last_failure: Mutex::new(None),
        }
    }

    pub fn titles(&self) -> &TitleCollection {
        &self.titles
    }

    pub fn last_failure(&self) -> Option<MutationFailure> {
        self.last_failure.lock().clone()
    }

    pub fn clear_failure(&self) {
        *self.last_failure.lock() = None;
    }

    /// Ids whose delete has been sent but not yet answered.
    pub fn in_flight_deletes(&self) -> Vec<TitleId> {
        self.titles
            .snapshot()
            .pending_removals
            .into_iter()
            .collect()
    }

    pub async fn submit(&self, intent: MutationIntent) -> MutationResult<MutationOutcome> {
        match intent {
            MutationIntent::Create { title } => self.submit_create(&title).await,
            MutationIntent::Delete { id } => self.submit_delete(&id).await,
        }
    }

    /// Reloads the whole snapshot from the catalog.
    ///
    /// Returns the number of records listed. The listing is not applied if a
    /// later-issued one already was.
    pub async fn refresh_titles(&self) -> MutationResult<usize> {
        let ticket = self.titles.issue_listing();
        let records = self.repo.list().await?;
        let count = records.len();
        if !self.titles.apply_listing(ticket, records) {
            debug!("event=title_refresh module=mutation status=skip reason=superseded");
        }
        Ok(count)
    }

    /// Creates a title, then refreshes the snapshot.
    ///
    /// An empty `title` is a no-op. A failed refresh is logged and does not
    /// fail the create.
    pub async fn submit_create(&self, title: &str) -> MutationResult<MutationOutcome> {
        if title.is_empty() {
            return Ok(MutationOutcome::Skipped);
        }

        let created = match self.repo.create(title).await {
            Ok(created) => created,
            Err(err) => return Err(self.fail(MutationKind::Create, err.into())),
        };
        info!(
            "event=title_create module=mutation status=ok id={}",
            created.id
        );

        if let Err(err) = self.refresh_titles().await {
            warn!(
                "event=title_refresh module=mutation status=error after=create error={}",
                err
            );
        }
        self.clear_failure();
        Ok(MutationOutcome::Created(created))
    }

    /// Deletes a title optimistically.
    ///
    /// # Contract
    /// - Unauthorized sessions fail with `UnauthorizedOperation` and no call.
    /// - A second delete for an id still in flight fails with `Conflict`.
    /// - On failure the record is restored at its previous position.
    pub async fn submit_delete(&self, id: &str) -> MutationResult<MutationOutcome> {
        let session = fetch_session(self.identity.as_ref()).await;
        if !self.gate.can_delete(&session) {
            warn!(
                "event=title_delete module=mutation status=rejected reason=unauthorized id={}",
                id
            );
            return Err(self.fail(MutationKind::Delete, MutationError::UnauthorizedOperation));
        }

        let Some(removal) = self.titles.begin_removal(id) else {
            warn!(
                "event=title_delete module=mutation status=rejected reason=conflict id={}",
                id
            );
            return Err(self.fail(MutationKind::Delete, MutationError::Conflict(id.to_string())));
        };

        match self.repo.delete(id).await {
            Ok(()) => {
                removal.commit();
                info!("event=title_delete module=mutation status=ok id={}", id);
                self.clear_failure();
                Ok(MutationOutcome::Deleted(id.to_string()))
            }
            Err(err) => {
                removal.rollback();
                Err(self.fail(MutationKind::Delete, err.into()))
            }
        }
    }

    fn fail(&self, kind: MutationKind, error: MutationError) -> MutationError {
        warn!(
            "event=title_{} module=mutation status=error error={}",
            kind.as_str(),
            error
        );
        *self.last_failure.lock() = Some(MutationFailure {
            kind,
            error: error.clone(),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::{MutationCoordinator, MutationError, MutationIntent, MutationKind, MutationOutcome};
    use crate::model::title::TitleRecord;
    use crate::repo::collection::TitleCollection;
    use crate::repo::memory::InMemoryCatalogApi;
    use crate::repo::title_repo::RemoteTitleRepository;
    use crate::session::gate::AuthorizationGate;
    use crate::session::memory::InMemoryIdentityProvider;
    use std::sync::Arc;

    type Coordinator =
        MutationCoordinator<RemoteTitleRepository<InMemoryCatalogApi>, InMemoryIdentityProvider>;

    fn coordinator(identity: InMemoryIdentityProvider) -> (Coordinator, TitleCollection) {
        let records = vec![
            TitleRecord::new("41", "Dune"),
            TitleRecord::new("42", "Emma"),
        ];
        let titles = TitleCollection::new();
        titles.replace_all(records.clone());
        let coordinator = MutationCoordinator::new(
            Arc::new(RemoteTitleRepository::new(InMemoryCatalogApi::with_records(
                records,
            ))),
            Arc::new(identity),
            titles.clone(),
            AuthorizationGate::default(),
        );
        (coordinator, titles)
    }

    fn admin() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::new()
            .with_user("admin@example.com", "Passw0rd!", ["Administrators"])
            .with_session("admin@example.com")
    }

    #[tokio::test]
    async fn empty_create_is_a_no_op() {
        let (coordinator, _) = coordinator(admin());
        let outcome = coordinator.submit_create("").await.expect("no-op");
        assert_eq!(outcome, MutationOutcome::Skipped);
    }

    #[tokio::test]
    async fn create_refreshes_the_snapshot() {
        let (coordinator, titles) = coordinator(InMemoryIdentityProvider::new());
        let outcome = coordinator
            .submit(MutationIntent::Create {
                title: "Ulysses".to_string(),
            })
            .await
            .expect("create");

        let MutationOutcome::Created(created) = outcome else {
            panic!("expected a created record");
        };
        assert!(titles.contains(&created.id));
        assert_eq!(titles.records().len(), 3);
    }

    #[tokio::test]
    async fn admin_delete_removes_the_record() {
        let (coordinator, titles) = coordinator(admin());
        coordinator.submit_delete("42").await.expect("delete");
        assert!(!titles.contains("42"));
        assert!(coordinator.in_flight_deletes().is_empty());
        assert!(coordinator.last_failure().is_none());
    }

    #[tokio::test]
    async fn revoked_role_is_seen_before_delete() {
        let identity = Arc::new(admin());
        let titles = TitleCollection::new();
        titles.replace_all(vec![TitleRecord::new("42", "Emma")]);
        let coordinator = MutationCoordinator::new(
            Arc::new(RemoteTitleRepository::new(InMemoryCatalogApi::with_records(
                vec![TitleRecord::new("42", "Emma")],
            ))),
            identity.clone(),
            titles.clone(),
            AuthorizationGate::default(),
        );

        identity.set_groups("admin@example.com", Vec::<String>::new());
        let err = coordinator
            .submit_delete("42")
            .await
            .expect_err("revoked admin must be refused");
        assert_eq!(err, MutationError::UnauthorizedOperation);
        assert!(titles.contains("42"));
        let failure = coordinator.last_failure().expect("failure kept");
        assert_eq!(failure.kind, MutationKind::Delete);
    }
}

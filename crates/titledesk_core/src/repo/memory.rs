//! Process-local catalog.
//!
//! Behaves like the remote catalog: ids are server-assigned UUIDs, deleting an
//! unknown id answers with a logical errors array, and the next call of each
//! kind can be made to fail.

use crate::model::title::TitleRecord;
use crate::repo::catalog_api::{
    ApiMessage, CatalogApi, CreateTitleInput, DeleteTitleInput, DeleteTitleResponse,
    ListTitlesResponse, TransportError, WireTitle,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct CatalogState {
    items: Vec<TitleRecord>,
    fail_next_list: Option<String>,
    fail_next_create: Option<String>,
    fail_next_delete: Option<String>,
    reject_next_delete: Option<String>,
    list_calls: usize,
    create_calls: usize,
    delete_calls: usize,
}

/// In-memory [`CatalogApi`].
#[derive(Default)]
pub struct InMemoryCatalogApi {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalogApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds titles with fresh ids, keeping the given order.
    pub fn with_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = titles
            .into_iter()
            .map(|title| TitleRecord::new(Uuid::new_v4().to_string(), title))
            .collect();
        Self::with_records(items)
    }

    /// Seeds records with caller-chosen ids.
    pub fn with_records(items: Vec<TitleRecord>) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                items,
                ..CatalogState::default()
            }),
        }
    }

    pub fn records(&self) -> Vec<TitleRecord> {
        self.state.lock().items.clone()
    }

    pub fn fail_next_list(&self, message: impl Into<String>) {
        self.state.lock().fail_next_list = Some(message.into());
    }

    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.state.lock().fail_next_create = Some(message.into());
    }

    /// Makes the next delete fail in transit.
    pub fn fail_next_delete(&self, message: impl Into<String>) {
        self.state.lock().fail_next_delete = Some(message.into());
    }

    /// Makes the next delete answer with a logical error.
    pub fn reject_next_delete(&self, message: impl Into<String>) {
        self.state.lock().reject_next_delete = Some(message.into());
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().delete_calls
    }
}

#[async_trait]
impl CatalogApi for InMemoryCatalogApi {
    async fn list(&self) -> Result<ListTitlesResponse, TransportError> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        if let Some(message) = state.fail_next_list.take() {
            return Err(TransportError::new(message));
        }
        Ok(ListTitlesResponse {
            items: state
                .items
                .iter()
                .map(|record| {
                    Some(WireTitle {
                        id: Some(record.id.clone()),
                        title: Some(record.title.clone()),
                    })
                })
                .collect(),
        })
    }

    async fn create(&self, input: CreateTitleInput) -> Result<WireTitle, TransportError> {
        let mut state = self.state.lock();
        state.create_calls += 1;
        if let Some(message) = state.fail_next_create.take() {
            return Err(TransportError::new(message));
        }
        let record = TitleRecord::new(Uuid::new_v4().to_string(), input.title);
        state.items.push(record.clone());
        Ok(WireTitle {
            id: Some(record.id),
            title: Some(record.title),
        })
    }

    async fn delete(&self, input: DeleteTitleInput) -> Result<DeleteTitleResponse, TransportError> {
        let mut state = self.state.lock();
        state.delete_calls += 1;
        if let Some(message) = state.fail_next_delete.take() {
            return Err(TransportError::new(message));
        }
        if let Some(message) = state.reject_next_delete.take() {
            return Ok(rejected(message));
        }
        match state.items.iter().position(|record| record.id == input.id) {
            Some(index) => {
                state.items.remove(index);
                Ok(DeleteTitleResponse::default())
            }
            None => Ok(rejected(format!("title not found: {}", input.id))),
        }
    }
}

fn rejected(message: String) -> DeleteTitleResponse {
    DeleteTitleResponse {
        errors: Some(vec![ApiMessage { message }]),
    }
}

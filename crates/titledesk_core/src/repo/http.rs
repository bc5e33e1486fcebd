//! GraphQL-over-HTTP catalog adapter.
//!
//! # Responsibility
//! - Issue `listTitles` / `createTitle` / `deleteTitle` operations.
//! - Map HTTP and GraphQL failures onto [`TransportError`] or the delete
//!   errors array.
//!
//! # Invariants
//! - GraphQL `errors` on list/create are transport failures.
//! - GraphQL `errors` on delete are surfaced as the logical errors array.

use crate::config::ClientConfig;
use crate::repo::catalog_api::{
    ApiMessage, CatalogApi, CreateTitleInput, DeleteTitleInput, DeleteTitleResponse,
    ListTitlesResponse, TransportError, WireTitle,
};
use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const API_KEY_HEADER: &str = "x-api-key";

const LIST_TITLES_QUERY: &str = "query ListTitles { listTitles { items { id title } } }";
const CREATE_TITLE_MUTATION: &str = "mutation CreateTitle($input: CreateTitleInput!) { \
     createTitle(input: $input) { id title } }";
const DELETE_TITLE_MUTATION: &str = "mutation DeleteTitle($input: DeleteTitleInput!) { \
     deleteTitle(input: $input) { id } }";

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTitlesData {
    list_titles: Option<ListTitlesResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTitleData {
    create_title: Option<WireTitle>,
}

/// Catalog reached through a GraphQL endpoint.
pub struct HttpCatalogApi {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpCatalogApi {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::new(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Builds the adapter from `catalog_endpoint`, failing when it is unset.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let endpoint = config
            .catalog_endpoint
            .clone()
            .ok_or_else(|| TransportError::new("catalog_endpoint is not configured"))?;
        Self::new(
            endpoint,
            config.catalog_api_key.clone(),
            config.request_timeout(),
        )
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<GraphQlEnvelope<T>, TransportError> {
        let started_at = Instant::now();
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key.as_str());
        }

        let response = request.send().await.map_err(|err| {
            warn!(
                "event=catalog_call module=http status=error operation={} duration_ms={} error_code=send_failed",
                operation,
                started_at.elapsed().as_millis()
            );
            TransportError::new(format!("{operation} request failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "event=catalog_call module=http status=error operation={} http_status={} duration_ms={}",
                operation,
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(TransportError::new(format!(
                "{operation} returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let envelope = response
            .json::<GraphQlEnvelope<T>>()
            .await
            .map_err(|err| TransportError::new(format!("{operation} payload invalid: {err}")))?;
        debug!(
            "event=catalog_call module=http status=ok operation={} duration_ms={}",
            operation,
            started_at.elapsed().as_millis()
        );
        Ok(envelope)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list(&self) -> Result<ListTitlesResponse, TransportError> {
        let envelope = self
            .execute::<ListTitlesData>("listTitles", LIST_TITLES_QUERY, json!({}))
            .await?;
        list_from_envelope(envelope)
    }

    async fn create(&self, input: CreateTitleInput) -> Result<WireTitle, TransportError> {
        let envelope = self
            .execute::<CreateTitleData>(
                "createTitle",
                CREATE_TITLE_MUTATION,
                json!({ "input": input }),
            )
            .await?;
        create_from_envelope(envelope)
    }

    async fn delete(&self, input: DeleteTitleInput) -> Result<DeleteTitleResponse, TransportError> {
        let envelope = self
            .execute::<Value>(
                "deleteTitle",
                DELETE_TITLE_MUTATION,
                json!({ "input": input }),
            )
            .await?;
        Ok(delete_from_envelope(envelope))
    }
}

fn graphql_failure(operation: &str, errors: &[ApiMessage]) -> TransportError {
    let messages: Vec<&str> = errors.iter().map(|error| error.message.as_str()).collect();
    TransportError::new(format!("{operation} failed: {}", messages.join("; ")))
}

fn list_from_envelope(
    envelope: GraphQlEnvelope<ListTitlesData>,
) -> Result<ListTitlesResponse, TransportError> {
    if let Some(errors) = envelope.errors.as_deref().filter(|errors| !errors.is_empty()) {
        return Err(graphql_failure("listTitles", errors));
    }
    envelope
        .data
        .and_then(|data| data.list_titles)
        .ok_or_else(|| TransportError::new("listTitles returned no data"))
}

fn create_from_envelope(
    envelope: GraphQlEnvelope<CreateTitleData>,
) -> Result<WireTitle, TransportError> {
    if let Some(errors) = envelope.errors.as_deref().filter(|errors| !errors.is_empty()) {
        return Err(graphql_failure("createTitle", errors));
    }
    envelope
        .data
        .and_then(|data| data.create_title)
        .ok_or_else(|| TransportError::new("createTitle returned no data"))
}

fn delete_from_envelope(envelope: GraphQlEnvelope<Value>) -> DeleteTitleResponse {
    DeleteTitleResponse {
        errors: envelope.errors,
    }
}

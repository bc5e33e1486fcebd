//! Wire contract of the remote catalog API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title as returned on the wire. Both fields may be absent in list payloads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireTitle {
    #[serde(default)]
    pub id: Option<String>,
    /// Older schema revisions named this field `name`.
    #[serde(default, alias = "name")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListTitlesResponse {
    #[serde(default)]
    pub items: Vec<Option<WireTitle>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTitleInput {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTitleInput {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Delete acknowledgement. A non-empty `errors` array is a logical failure
/// even though the call itself completed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteTitleResponse {
    #[serde(default)]
    pub errors: Option<Vec<ApiMessage>>,
}

impl DeleteTitleResponse {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .map(|error| error.message.clone())
            .collect()
    }
}

/// Transport-level failure: the call did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for TransportError {}

/// Remote catalog endpoint consumed by the client.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list(&self) -> Result<ListTitlesResponse, TransportError>;
    async fn create(&self, input: CreateTitleInput) -> Result<WireTitle, TransportError>;
    async fn delete(&self, input: DeleteTitleInput) -> Result<DeleteTitleResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::{DeleteTitleResponse, ListTitlesResponse};

    #[test]
    fn list_payload_accepts_null_items_and_legacy_name() {
        let payload: ListTitlesResponse = serde_json::from_str(
            r#"{"items": [{"id": "1", "name": "Option aaa"}, null, {"id": "2", "title": "Dune"}]}"#,
        )
        .expect("list payload");

        assert_eq!(payload.items.len(), 3);
        let first = payload.items[0].as_ref().expect("first item");
        assert_eq!(first.title.as_deref(), Some("Option aaa"));
        assert!(payload.items[1].is_none());
    }

    #[test]
    fn delete_errors_flatten_to_messages() {
        let payload: DeleteTitleResponse =
            serde_json::from_str(r#"{"errors": [{"message": "conditional check failed"}]}"#)
                .expect("delete payload");
        assert_eq!(payload.error_messages(), vec!["conditional check failed"]);

        let empty: DeleteTitleResponse = serde_json::from_str("{}").expect("empty payload");
        assert!(empty.error_messages().is_empty());
    }
}

use async_trait::async_trait;
use titledesk_core::repo::catalog_api::{
    ApiMessage, CreateTitleInput, DeleteTitleInput, DeleteTitleResponse, ListTitlesResponse,
    WireTitle,
};
use titledesk_core::{
    CatalogApi, InMemoryCatalogApi, RemoteTitleRepository, RepoError, TitleRecord,
    TitleRepository, TransportError,
};

/// Catalog answering with fixed, partly malformed payloads.
struct ScriptedCatalog;

#[async_trait]
impl CatalogApi for ScriptedCatalog {
    async fn list(&self) -> Result<ListTitlesResponse, TransportError> {
        let response: ListTitlesResponse = serde_json::from_str(
            r#"{"items": [
                {"id": "1", "title": "Option aaa"},
                null,
                {"id": null, "title": "orphan"},
                {"id": "2", "name": "Option aab"}
            ]}"#,
        )
        .map_err(|err| TransportError::new(err.to_string()))?;
        Ok(response)
    }

    async fn create(&self, _input: CreateTitleInput) -> Result<WireTitle, TransportError> {
        Ok(WireTitle {
            id: None,
            title: Some("no id".to_string()),
        })
    }

    async fn delete(&self, _input: DeleteTitleInput) -> Result<DeleteTitleResponse, TransportError> {
        Ok(DeleteTitleResponse {
            errors: Some(vec![
                ApiMessage {
                    message: "Not Authorized to access deleteTitle".to_string(),
                },
                ApiMessage {
                    message: "ConditionalCheckFailedException".to_string(),
                },
            ]),
        })
    }
}

#[tokio::test]
async fn list_skips_null_and_idless_items() {
    let repo = RemoteTitleRepository::new(ScriptedCatalog);
    let records = repo.list().await.expect("list");
    assert_eq!(
        records,
        vec![
            TitleRecord::new("1", "Option aaa"),
            TitleRecord::new("2", "Option aab"),
        ]
    );
}

#[tokio::test]
async fn create_without_id_is_a_remote_failure() {
    let repo = RemoteTitleRepository::new(ScriptedCatalog);
    let err = repo.create("Dune").await.expect_err("missing id");
    assert!(matches!(err, RepoError::RemoteCallFailed(_)));
}

#[tokio::test]
async fn delete_errors_array_is_a_rejection() {
    let repo = RemoteTitleRepository::new(ScriptedCatalog);
    let err = repo.delete("42").await.expect_err("errors array");
    assert_eq!(
        err,
        RepoError::MutationRejectedByServer(vec![
            "Not Authorized to access deleteTitle".to_string(),
            "ConditionalCheckFailedException".to_string(),
        ])
    );
}

#[tokio::test]
async fn transport_failures_carry_provider_message() {
    let repo = RemoteTitleRepository::new(InMemoryCatalogApi::with_titles(["Dune"]));
    repo.api().fail_next_list("503 Service Unavailable");

    let err = repo.list().await.expect_err("transport failure");
    assert_eq!(
        err,
        RepoError::RemoteCallFailed("503 Service Unavailable".to_string())
    );
    assert_eq!(repo.list().await.expect("no retry state left").len(), 1);
}

#[tokio::test]
async fn writes_do_not_touch_other_records() {
    let repo = RemoteTitleRepository::new(InMemoryCatalogApi::with_records(vec![
        TitleRecord::new("1", "Dune"),
        TitleRecord::new("2", "Emma"),
    ]));

    let created = repo.create("Ulysses").await.expect("create");
    assert_eq!(created.title, "Ulysses");
    repo.delete("1").await.expect("delete");

    let titles: Vec<String> = repo
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|record| record.title)
        .collect();
    assert_eq!(titles, vec!["Emma", "Ulysses"]);
    assert_eq!(repo.api().list_calls(), 1);
}

mod common;

use azpool_cloud::ResourceKind;
use azpool_core::{
    ErrorCategory, ProvisionError, authenticate, fill_storage_credentials,
    start_task_command_line,
};
use common::{FakeProvider, Method, config, id, ssh_key};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn key_list() -> serde_json::Value {
    json!({
        "keys": [
            {"keyName": "key1", "value": "c2VjcmV0a2V5MQ==", "permissions": "FULL"},
            {"keyName": "key2", "value": "c2VjcmV0a2V5Mg==", "permissions": "FULL"}
        ]
    })
}

#[tokio::test]
async fn test_fetched_key_reaches_start_task() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    let provider = FakeProvider::new();
    let account = id(ResourceKind::StorageAccount, "poolstore");
    provider.set_action(&account, "listKeys", key_list());

    fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap();

    assert_eq!(config.storage_creds.username, "poolstore");
    assert_eq!(config.storage_creds.password, "c2VjcmV0a2V5MQ==");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].target, format!("{}/listKeys", account));

    let command_line = start_task_command_line(&config);
    assert!(command_line.contains("//poolstore.file.core.windows.net/"));
    assert!(command_line.contains("username=poolstore,password=c2VjcmV0a2V5MQ==,"));
}

#[tokio::test]
async fn test_configured_credentials_skip_lookup() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    config.storage_creds.username = "poolstore".to_string();
    config.storage_creds.password = "configured==".to_string();
    let provider = FakeProvider::new();

    fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap();

    assert_eq!(config.storage_creds.password, "configured==");
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_lookup_needs_account_name() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    config.storage_account = String::new();
    let provider = FakeProvider::new();

    let err = fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::EmptyInput { .. }));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_missing_account_is_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    let provider = FakeProvider::new();

    let err = fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(config.storage_creds.password.is_empty());
}

#[tokio::test]
async fn test_empty_key_list_is_access_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    let provider = FakeProvider::new();
    provider.set_action(
        &id(ResourceKind::StorageAccount, "poolstore"),
        "listKeys",
        json!({"keys": []}),
    );

    let err = fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Access);
}

#[tokio::test(start_paused = true)]
async fn test_key_lookup_gives_up_after_deadline() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    let provider = FakeProvider::new();
    provider.stall_actions();

    let err = fill_storage_credentials(&provider, &CancellationToken::new(), &mut config)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Access);
    assert!(err.to_string().contains("within 60s"));
}

#[tokio::test]
async fn test_cancelled_key_lookup() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config(&ssh_key(temp_dir.path()));
    let provider = FakeProvider::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fill_storage_credentials(&provider, &cancel, &mut config)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_authenticated_provider() {
    let provider = FakeProvider::new();
    let account = authenticate(&provider, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(account, "fake account");
}

#[tokio::test]
async fn test_unauthenticated_provider_is_access_error() {
    let provider = FakeProvider::new();
    provider.deny_auth("run az login");

    let err = authenticate(&provider, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Unauthenticated { .. }));
    assert_eq!(err.category(), ErrorCategory::Access);
    assert_eq!(err.to_string(), "not authenticated with Fake cloud: run az login");
}

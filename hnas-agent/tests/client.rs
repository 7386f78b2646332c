mod common;

use common::{ArrayState, FakeArray, ALPHA_ID, API_KEY, VS_ID};
use hnas_agent::hnas::{Auth, DeleteOutcome};
use hnas_agent::{HnasClient, HookError};
use serde_json::json;

#[tokio::test]
async fn test_connection_check_reports_device() {
    let array = FakeArray::spawn(ArrayState::default()).await;
    let device = array.client().check_connection().await.unwrap();
    assert_eq!(device.name.as_deref(), Some("hnas-test-cluster"));
}

#[tokio::test]
async fn test_connection_check_rejected_credentials_is_connection_error() {
    let array = FakeArray::spawn(ArrayState::default()).await;
    let client =
        HnasClient::with_base_url(&array.base_url, Auth::ApiKey("wrong".into()), true).unwrap();
    assert!(matches!(client.check_connection().await, Err(HookError::Connection(_))));
}

#[tokio::test]
async fn test_connection_check_unreachable_is_connection_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HnasClient::with_base_url(
        format!("http://{}/v9/storage", addr),
        Auth::ApiKey(API_KEY.into()),
        true,
    )
    .unwrap();
    assert!(matches!(client.check_connection().await, Err(HookError::Connection(_))));
}

#[tokio::test]
async fn test_find_by_label_first_match_wins() {
    let mut state = ArrayState::default();
    state.filesystems = vec![
        json!({"filesystemId": "first", "label": "dup"}),
        json!({"filesystemId": "second", "label": "dup"}),
        json!({"filesystemId": "other", "label": "DUP"}),
    ];
    let array = FakeArray::spawn(state).await;
    let client = array.client();

    let found = client.find_filesystem_by_label("dup").await.unwrap();
    assert_eq!(found.filesystem_id.as_deref(), Some("first"));

    let found = client.find_filesystem_by_label("DUP").await.unwrap();
    assert_eq!(found.filesystem_id.as_deref(), Some("other"));

    assert!(client.find_filesystem_by_label("missing").await.is_none());
}

#[tokio::test]
async fn test_get_unknown_filesystem_is_none() {
    let array = FakeArray::spawn(ArrayState::with_filesystems()).await;
    let client = array.client();

    assert!(client.get_filesystem("00000000000000000000000000000000").await.is_none());
    let alpha = client.get_filesystem(ALPHA_ID).await.unwrap();
    assert_eq!(alpha.virtual_server_id.as_deref(), Some(VS_ID));
}

#[tokio::test]
async fn test_create_snapshot_sends_tag_and_retention_interval() {
    let array = FakeArray::spawn(ArrayState::with_filesystems()).await;
    let client = array.client();

    let snapshot = client
        .create_snapshot(ALPHA_ID, "veeam_fs-alpha_20240115_030000", Some("veeam"), Some(24))
        .await
        .unwrap();
    assert!(snapshot.object_id.is_some());

    let body = array.state().last_body.clone().unwrap();
    assert_eq!(body["appSearchId"], "veeam");
    assert_eq!(body["retentionInterval"], 24);
    assert_eq!(body["displayName"], "veeam_fs-alpha_20240115_030000");
}

#[tokio::test]
async fn test_create_snapshot_failure_is_none() {
    let array = FakeArray::spawn(ArrayState::with_filesystems()).await;
    let snapshot = array
        .client()
        .create_snapshot("00000000000000000000000000000000", "x", None, None)
        .await;
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn test_delete_missing_snapshot_is_success() {
    let array = FakeArray::spawn(ArrayState::with_filesystems()).await;
    let outcome = array.client().delete_snapshot("snap-404").await;
    assert_eq!(outcome, DeleteOutcome::AlreadyGone);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_delete_server_error_is_failure() {
    let mut state = ArrayState::with_filesystems();
    state.fail_deletes_with = Some(500);
    let array = FakeArray::spawn(state).await;
    let client = array.client();

    assert_eq!(client.delete_snapshot("snap-1").await, DeleteOutcome::Failed);
    assert_eq!(client.delete_share("share-1").await, DeleteOutcome::Failed);
}

#[tokio::test]
async fn test_delete_existing_share() {
    let mut state = ArrayState::with_filesystems();
    state.shares = vec![json!({"objectId": "share-9", "name": "VeeamNASBackup_20240115_030000", "virtualServerId": VS_ID})];
    let array = FakeArray::spawn(state).await;

    assert_eq!(array.client().delete_share("share-9").await, DeleteOutcome::Deleted);
    assert!(array.state().shares.is_empty());
}

#[tokio::test]
async fn test_list_shares_filters_by_prefix() {
    let mut state = ArrayState::with_filesystems();
    state.shares = vec![
        json!({"objectId": "s1", "name": "VeeamNASBackup_20240115_030000", "virtualServerId": VS_ID}),
        json!({"objectId": "s2", "name": "HomeDirs", "virtualServerId": VS_ID}),
        json!({"objectId": "s3", "name": "VeeamNASBackup_20240116_030000", "virtualServerId": "2"}),
    ];
    let array = FakeArray::spawn(state).await;

    let shares = array.client().list_shares(VS_ID, "VeeamNASBackup").await;
    let ids: Vec<_> = shares.iter().map(|s| s.object_id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["s1"]);
}

#[tokio::test]
async fn test_list_snapshots_any_tag_sentinel() {
    let mut state = ArrayState::with_filesystems();
    state.snapshots = vec![
        json!({"objectId": "a", "filesystemId": ALPHA_ID, "appSearchId": "veeam", "creationTime": 1}),
        json!({"objectId": "b", "filesystemId": ALPHA_ID, "appSearchId": "other", "creationTime": 2}),
    ];
    let array = FakeArray::spawn(state).await;
    let client = array.client();

    assert_eq!(client.list_snapshots(ALPHA_ID, Some("veeam")).await.len(), 1);
    assert_eq!(client.list_snapshots(ALPHA_ID, None).await.len(), 2);
    assert!(array
        .state()
        .requests
        .contains(&format!("GET /v9/storage/filesystem-snapshots/{}/null", ALPHA_ID)));
}

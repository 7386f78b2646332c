//! In-process fake of the HNAS v9 storage API for integration tests.

#![allow(dead_code)]

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use hnas_agent::config::{Config, PostConfig, PreConfig};
use hnas_agent::hnas::Auth;
use hnas_agent::HnasClient;
use serde_json::{json, Value};
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";
pub const ALPHA_ID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
pub const BETA_ID: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2";
pub const ORPHAN_ID: &str = "ccccccccccccccccccccccccccccccc3";
pub const VS_ID: &str = "1";

#[derive(Debug, Default)]
pub struct ArrayState {
    pub filesystems: Vec<Value>,
    pub snapshots: Vec<Value>,
    pub shares: Vec<Value>,
    /// Status returned by every DELETE instead of performing it
    pub fail_deletes_with: Option<u16>,
    /// Fail share creation with 500
    pub fail_share_create: bool,
    /// `METHOD path` of every request received
    pub requests: Vec<String>,
    /// Body of the last create request
    pub last_body: Option<Value>,
    next_id: u64,
}

impl ArrayState {
    /// Two filesystems on virtual server 1, plus one without a virtual server.
    pub fn with_filesystems() -> Self {
        Self {
            filesystems: vec![
                json!({"filesystemId": ALPHA_ID, "label": "fs-alpha", "virtualServerId": VS_ID}),
                json!({"filesystemId": BETA_ID, "label": "fs-beta", "virtualServerId": VS_ID}),
                json!({"filesystemId": ORPHAN_ID, "label": "fs-orphan"}),
            ],
            ..Default::default()
        }
    }

    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", kind, self.next_id)
    }

    pub fn snapshot_names(&self) -> Vec<String> {
        self.snapshots
            .iter()
            .map(|s| s["displayName"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn share_names(&self) -> Vec<String> {
        self.shares
            .iter()
            .map(|s| s["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

type Shared = Arc<Mutex<ArrayState>>;

pub struct FakeArray {
    pub state: Shared,
    pub base_url: String,
}

impl FakeArray {
    pub async fn spawn(state: ArrayState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}/v9/storage", addr),
        }
    }

    pub fn client(&self) -> HnasClient {
        HnasClient::with_base_url(&self.base_url, Auth::ApiKey(API_KEY.into()), true).unwrap()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, ArrayState> {
        self.state.lock().unwrap()
    }
}

pub fn common_config(manifest_dir: &FsPath) -> Config {
    Config {
        host: "hnas.test".into(),
        port: 8444,
        username: "apikey".into(),
        password: API_KEY.into(),
        verify_ssl: false,
        log_dir: manifest_dir.join("logs"),
        log_level: "info".into(),
        manifest_path: manifest_dir.join("state/hnas_snapshot_info.json"),
        search_tag: Some("veeam".into()),
        share_prefix: "VeeamNASBackup".into(),
    }
}

pub fn pre_config(manifest_dir: &FsPath, filesystems: &[&str]) -> PreConfig {
    PreConfig {
        common: common_config(manifest_dir),
        filesystems: filesystems.iter().map(|s| s.to_string()).collect(),
        retention_interval: None,
        create_smb_share: true,
    }
}

pub fn post_config(manifest_dir: &FsPath, job_result: &str) -> PostConfig {
    PostConfig {
        common: common_config(manifest_dir),
        job_result: Some(job_result.into()),
        session_result: None,
        cleanup_on_success: true,
        cleanup_on_failure: true,
        retention_days: 7,
        fallback_filesystems: Vec::new(),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/v9/storage/file-devices", get(file_devices))
        .route("/v9/storage/filesystems", get(list_filesystems))
        .route("/v9/storage/filesystems/{id}", get(get_filesystem))
        .route("/v9/storage/filesystem-snapshots", post(create_snapshot))
        .route("/v9/storage/filesystem-snapshots/{id}", delete(delete_snapshot))
        .route("/v9/storage/filesystem-snapshots/{fs}/{tag}", get(list_snapshots))
        .route("/v9/storage/filesystem-shares/cifs", post(create_share))
        .route("/v9/storage/filesystem-shares/cifs/{id}", delete(delete_share))
        .route("/v9/storage/virtual-servers/{vs}/cifs", get(list_shares))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

/// Records the request and rejects anything without the API key.
async fn guard(State(state): State<Shared>, request: Request, next: Next) -> Response {
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("{} {}", request.method(), request.uri().path()));

    let authorized = request
        .headers()
        .get("X-Api-Key")
        .map_or(false, |v| v == API_KEY);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "bad credentials").into_response();
    }
    next.run(request).await
}

async fn file_devices() -> Json<Value> {
    Json(json!({"name": "hnas-test-cluster"}))
}

async fn list_filesystems(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(json!({"filesystems": state.filesystems}))
}

async fn get_filesystem(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.filesystems.iter().find(|fs| fs["filesystemId"] == id.as_str()) {
        Some(fs) => Json(json!({"filesystem": fs})).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_snapshot(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.last_body = Some(body.clone());

    let fs_id = body["filesystemId"].as_str().unwrap_or_default().to_string();
    if !state.filesystems.iter().any(|fs| fs["filesystemId"] == fs_id.as_str()) {
        return (StatusCode::NOT_FOUND, "no such filesystem").into_response();
    }

    let snapshot = json!({
        "objectId": state.next_id("snap"),
        "displayName": body["displayName"],
        "creationTime": chrono::Utc::now().timestamp(),
        "filesystemId": fs_id,
        "appSearchId": body.get("appSearchId").cloned().unwrap_or(Value::Null),
    });
    state.snapshots.push(snapshot.clone());
    Json(json!({"snapshot": snapshot})).into_response()
}

async fn delete_snapshot(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut state = state.lock().unwrap();
    if let Some(code) = state.fail_deletes_with {
        return StatusCode::from_u16(code).unwrap();
    }
    let before = state.snapshots.len();
    state.snapshots.retain(|s| s["objectId"] != id.as_str());
    if state.snapshots.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn list_snapshots(
    State(state): State<Shared>,
    Path((fs, tag)): Path<(String, String)>,
) -> Json<Value> {
    let state = state.lock().unwrap();
    let snapshots: Vec<&Value> = state
        .snapshots
        .iter()
        .filter(|s| s["filesystemId"] == fs.as_str())
        .filter(|s| tag == "null" || s["appSearchId"] == tag.as_str())
        .collect();
    Json(json!({"snapshots": snapshots}))
}

async fn create_share(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.last_body = Some(body.clone());
    if state.fail_share_create {
        return (StatusCode::INTERNAL_SERVER_ERROR, "share service down").into_response();
    }

    let share = json!({
        "objectId": state.next_id("share"),
        "name": body["name"],
        "path": body["filesystemPath"],
        "virtualServerId": body["virtualServerId"],
    });
    state.shares.push(share.clone());
    Json(json!({"filesystemShare": share})).into_response()
}

async fn delete_share(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut state = state.lock().unwrap();
    if let Some(code) = state.fail_deletes_with {
        return StatusCode::from_u16(code).unwrap();
    }
    let before = state.shares.len();
    state.shares.retain(|s| s["objectId"] != id.as_str());
    if state.shares.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn list_shares(State(state): State<Shared>, Path(vs): Path<String>) -> Json<Value> {
    let state = state.lock().unwrap();
    let shares: Vec<&Value> = state
        .shares
        .iter()
        .filter(|s| s["virtualServerId"] == vs.as_str())
        .collect();
    Json(json!({"filesystemShares": shares}))
}

//! Shared test doubles for catalog-sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_common::config::{StoreEndpoint, TomlConfig};
use catalog_sync::error::SyncError;
use catalog_sync::models::GraphqlRequest;
use catalog_sync::services::{GraphqlTransport, ResultDownloader, ScratchFile};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

/// Two products, one metafield on the first
pub const SCENARIO_JSONL: &str = concat!(
    r#"{"id":"p1","title":"Shirt","handle":"shirt","vendor":"Acme","productType":"Apparel","tags":["a","b"]}"#,
    "\n",
    r#"{"namespace":"custom","key":"color","value":"red","__parentId":"p1"}"#,
    "\n",
    r#"{"id":"p2","title":"Hat","handle":"hat","vendor":"Acme","productType":"Headwear","tags":[]}"#,
    "\n",
);

pub const RESULT_URL: &str = "https://storage.example.com/bulk/export.jsonl";

pub fn source() -> StoreEndpoint {
    StoreEndpoint::new("https://source.example.com/admin/api/graphql.json", "source-token")
}

pub fn target() -> StoreEndpoint {
    StoreEndpoint::new("https://target.example.com/admin/api/graphql.json", "target-token")
}

pub fn test_config(scratch_dir: &Path) -> TomlConfig {
    let mut config = catalog_common::config::parse_config(
        r#"
        [source]
        endpoint = "https://source.example.com/admin/api/graphql.json"
        access_token = "source-token"

        [target]
        endpoint = "https://target.example.com/admin/api/graphql.json"
        access_token = "target-token"

        [export]
        poll_interval_secs = 1
        max_wait_secs = 30
        "#,
    )
    .unwrap();
    config.scratch_dir = Some(scratch_dir.to_path_buf());
    config
}

pub fn operation(id: &str, status: &str, url: Option<&str>) -> Value {
    json!({
        "id": id,
        "status": status,
        "createdAt": "2024-01-15T10:00:00Z",
        "completedAt": null,
        "errorCode": if status == "FAILED" { json!("INTERNAL_SERVER_ERROR") } else { Value::Null },
        "fileSize": null,
        "objectCount": "3",
        "url": url,
    })
}

pub fn submit_reply(status: &str) -> Value {
    json!({
        "data": {
            "bulkOperationRunQuery": {
                "bulkOperation": operation("gid://shopify/BulkOperation/1", status, None),
                "userErrors": []
            }
        }
    })
}

pub fn poll_reply(status: &str, url: Option<&str>) -> Value {
    json!({
        "data": {
            "currentBulkOperation": operation("gid://shopify/BulkOperation/1", status, url)
        }
    })
}

/// Replays a fixed list of response bodies in order; the last one repeats
pub struct ScriptedTransport {
    replies: Vec<Value>,
    cursor: AtomicUsize,
    requests: Mutex<Vec<(String, GraphqlRequest)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Value>) -> Self {
        assert!(!replies.is_empty());
        Self {
            replies,
            cursor: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, GraphqlRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn send(
        &self,
        endpoint: &StoreEndpoint,
        request: &GraphqlRequest,
    ) -> Result<Vec<u8>, SyncError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.endpoint.clone(), request.clone()));

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let reply = &self.replies[index.min(self.replies.len() - 1)];
        Ok(reply.to_string().into_bytes())
    }
}

type Responder = dyn Fn(&GraphqlRequest) -> Result<Value, SyncError> + Send + Sync;

/// Answers each request by inspecting it; safe under concurrent calls
pub struct ResponderTransport {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl ResponderTransport {
    pub fn new(
        responder: impl Fn(&GraphqlRequest) -> Result<Value, SyncError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphqlTransport for ResponderTransport {
    async fn send(
        &self,
        _endpoint: &StoreEndpoint,
        request: &GraphqlRequest,
    ) -> Result<Vec<u8>, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(request).map(|value| value.to_string().into_bytes())
    }
}

/// Writes fixed contents into a real scratch file
pub struct FakeDownloader {
    contents: String,
    calls: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
}

impl FakeDownloader {
    pub fn new(contents: &str) -> Self {
        Self {
            contents: contents.to_string(),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultDownloader for FakeDownloader {
    async fn download(&self, url: &str, scratch_dir: &Path) -> Result<ScratchFile, SyncError> {
        assert_eq!(url, RESULT_URL);
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scratch = ScratchFile::create_in(scratch_dir)?;
        let mut writer = scratch.writer()?;
        writer.write_all(self.contents.as_bytes()).await?;
        writer.flush().await?;

        self.paths.lock().unwrap().push(scratch.path_buf());
        Ok(scratch)
    }
}

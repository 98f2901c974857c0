//! 共通フィクスチャ: インメモリの管理プレーンと台本どおりに答えるオペレーター

#![allow(dead_code)]

use async_trait::async_trait;
use azpool_cloud::{
    AuthStatus, CloudError, CloudProvider, Page, PageRequest, ResourceId, ResourceKind,
};
use azpool_config::Config;
use azpool_core::{ProvisionError, Prompter, Selection};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const SUB: &str = "sub";
pub const RG: &str = "render-pool";
pub const REGION: &str = "westeurope";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    List,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub target: String,
    pub body: Option<Value>,
}

/// 指定IDへのGETの失敗の仕方
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    AccessDenied,
}

#[derive(Default)]
struct State {
    /// 挿入順のリソース
    resources: Vec<(String, Value)>,
    /// 先頭ページのパスまたは継続リンクをキーにした一覧ページ
    pages: HashMap<String, Page>,
    get_failures: HashMap<String, Failure>,
    failing_creations: HashSet<String>,
    /// 作成完了前に処理中状態を返すGETの回数
    pending_polls: HashMap<String, usize>,
    cancel_on_put: Option<CancellationToken>,
    /// `POST {id}/{action}` が返すドキュメント
    actions: HashMap<String, Value>,
    stalled_actions: bool,
    auth_failure: Option<String>,
    calls: Vec<Call>,
    next_ip: u8,
}

/// 全呼び出しを記録するインメモリの [`CloudProvider`]
#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<State>,
}

pub fn id(kind: ResourceKind, name: &str) -> ResourceId {
    ResourceId::in_group(SUB, RG, kind, name)
}

pub fn subnet_id() -> ResourceId {
    ResourceId::subnet(SUB, RG, "azpool-vnet", "default")
}

/// 最小のリソースドキュメント
pub fn doc(kind: ResourceKind, name: &str, location: &str) -> Value {
    json!({
        "id": id(kind, name),
        "name": name,
        "location": location,
        "properties": {"provisioningState": "Succeeded"}
    })
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 共有サブネットが既にあるプロバイダ
    pub fn with_subnet() -> Self {
        let provider = Self::new();
        provider.insert(
            &subnet_id(),
            json!({"id": subnet_id(), "name": "default", "properties": {}}),
        );
        provider
    }

    pub fn insert(&self, id: &ResourceId, document: Value) {
        let mut state = self.state.lock().unwrap();
        state.resources.retain(|(k, _)| k != id.as_str());
        state.resources.push((id.as_str().to_string(), document));
    }

    pub fn insert_doc(&self, kind: ResourceKind, name: &str, location: &str) {
        self.insert(&id(kind, name), doc(kind, name, location));
    }

    /// `path` の一覧を継続リンクでつないだページとして返す
    pub fn set_pages(&self, path: &str, pages: Vec<Vec<Value>>) {
        let mut state = self.state.lock().unwrap();
        let count = pages.len();
        for (i, value) in pages.into_iter().enumerate() {
            let key = if i == 0 {
                path.to_string()
            } else {
                format!("https://fake.invalid{}?page={}", path, i)
            };
            let next_link =
                (i + 1 < count).then(|| format!("https://fake.invalid{}?page={}", path, i + 1));
            state.pages.insert(key, Page { value, next_link });
        }
    }

    pub fn fail_get(&self, id: &ResourceId, failure: Failure) {
        let mut state = self.state.lock().unwrap();
        state.get_failures.insert(id.as_str().to_string(), failure);
    }

    pub fn fail_creation(&self, id: &ResourceId) {
        let mut state = self.state.lock().unwrap();
        state.failing_creations.insert(id.as_str().to_string());
    }

    pub fn pending_polls(&self, id: &ResourceId, polls: usize) {
        let mut state = self.state.lock().unwrap();
        state.pending_polls.insert(id.as_str().to_string(), polls);
    }

    pub fn cancel_on_put(&self, token: CancellationToken) {
        self.state.lock().unwrap().cancel_on_put = Some(token);
    }

    pub fn set_action(&self, id: &ResourceId, action: &str, document: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .actions
            .insert(format!("{}/{}", id.as_str(), action), document);
    }

    /// アクションが応答しない
    pub fn stall_actions(&self) {
        self.state.lock().unwrap().stalled_actions = true;
    }

    pub fn deny_auth(&self, reason: &str) {
        self.state.lock().unwrap().auth_failure = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_of(&self, method: Method) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    pub fn puts(&self) -> Vec<Call> {
        self.calls_of(Method::Put)
    }

    fn record(state: &mut State, method: Method, target: &str, body: Option<Value>) {
        state.calls.push(Call {
            method,
            target: target.to_string(),
            body,
        });
    }

    fn lookup(state: &State, id: &str) -> Option<Value> {
        state
            .resources
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(id))
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn display_name(&self) -> &str {
        "Fake cloud"
    }

    async fn check_auth(&self) -> azpool_cloud::Result<AuthStatus> {
        match &self.state.lock().unwrap().auth_failure {
            Some(reason) => Ok(AuthStatus::failed(reason.clone())),
            None => Ok(AuthStatus::ok("fake account")),
        }
    }

    async fn get_resource(&self, id: &ResourceId, _api_version: &str) -> azpool_cloud::Result<Value> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, Method::Get, id.as_str(), None);

        match state.get_failures.get(id.as_str()) {
            Some(Failure::NotFound) => {
                return Err(CloudError::ResourceNotFound(id.to_string()));
            }
            Some(Failure::AccessDenied) => {
                return Err(CloudError::AccessDenied(id.to_string()));
            }
            None => {}
        }

        let Some(mut document) = Self::lookup(&state, id.as_str()) else {
            return Err(CloudError::ResourceNotFound(id.to_string()));
        };
        if let Some(remaining) = state.pending_polls.get_mut(id.as_str()) {
            if *remaining > 0 {
                *remaining -= 1;
                document["properties"]["provisioningState"] = json!("Creating");
            }
        }
        Ok(document)
    }

    async fn put_resource(
        &self,
        id: &ResourceId,
        _api_version: &str,
        body: &Value,
    ) -> azpool_cloud::Result<Value> {
        let mut state = self.state.lock().unwrap();
        Self::record(&mut state, Method::Put, id.as_str(), Some(body.clone()));
        if let Some(token) = &state.cancel_on_put {
            token.cancel();
        }

        let mut document = body.clone();
        document["id"] = json!(id);
        document["name"] = json!(id.short_name());
        let provisioning_state = if state.failing_creations.contains(id.as_str()) {
            "Failed"
        } else {
            "Succeeded"
        };
        document["properties"]["provisioningState"] = json!(provisioning_state);
        if id.as_str().contains("/publicIPAddresses/") {
            state.next_ip += 1;
            document["properties"]["ipAddress"] = json!(format!("20.0.0.{}", state.next_ip));
        }

        state.resources.retain(|(k, _)| k != id.as_str());
        state
            .resources
            .push((id.as_str().to_string(), document.clone()));

        if state.pending_polls.get(id.as_str()).is_some_and(|n| *n > 0) {
            return Ok(json!({}));
        }
        Ok(document)
    }

    async fn invoke_action(
        &self,
        id: &ResourceId,
        _api_version: &str,
        action: &str,
    ) -> azpool_cloud::Result<Value> {
        let target = format!("{}/{}", id.as_str(), action);
        {
            let mut state = self.state.lock().unwrap();
            Self::record(&mut state, Method::Post, &target, None);
            if !state.stalled_actions {
                return state
                    .actions
                    .get(&target)
                    .cloned()
                    .ok_or(CloudError::ResourceNotFound(target));
            }
        }
        std::future::pending().await
    }

    async fn list_page(&self, request: &PageRequest) -> azpool_cloud::Result<Page> {
        let mut state = self.state.lock().unwrap();
        let key = match request {
            PageRequest::First { path, .. } => path.clone(),
            PageRequest::Next(link) => link.clone(),
        };
        Self::record(&mut state, Method::List, &key, None);

        if let Some(page) = state.pages.get(&key) {
            return Ok(page.clone());
        }

        // コレクションパス直下の子
        let prefix = format!("{}/", key.to_ascii_lowercase());
        let value = state
            .resources
            .iter()
            .filter(|(k, _)| {
                k.to_ascii_lowercase()
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|(_, v)| v.clone())
            .collect();
        Ok(Page::last(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Select { label: String, candidates: Vec<String> },
    ReadLine { label: String },
}

/// 決まった台本で答えるオペレーター
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Selection>>,
    shown: Mutex<Vec<Shown>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Selection>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    fn next(&self) -> azpool_core::Result<Selection> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProvisionError::Prompt("no scripted answer left".to_string()))
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn select(
        &self,
        cancel: &CancellationToken,
        label: &str,
        candidates: &[String],
    ) -> azpool_core::Result<Selection> {
        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled);
        }
        self.shown.lock().unwrap().push(Shown::Select {
            label: label.to_string(),
            candidates: candidates.to_vec(),
        });
        self.next()
    }

    async fn read_line(&self, cancel: &CancellationToken, label: &str) -> azpool_core::Result<String> {
        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled);
        }
        self.shown.lock().unwrap().push(Shown::ReadLine {
            label: label.to_string(),
        });
        match self.next()? {
            Selection::Existing(s) | Selection::New(s) => Ok(s),
        }
    }
}

/// 全ての名前を設定し、ポーリング間隔0の設定
pub fn config(ssh_key: &Path) -> Config {
    serde_json::from_value(json!({
        "subscription_id": SUB,
        "location": REGION,
        "resource_group": RG,
        "storage_account": "poolstore",
        "batch_account": "poolbatch",
        "vm": {"ssh_public_key_path": ssh_key.to_string_lossy()},
        "operations": {"poll_interval_secs": 0, "timeout_secs": 60}
    }))
    .unwrap()
}

/// `dir` にSSH公開鍵を書き、そのパスを返す
pub fn ssh_key(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("id_rsa.pub");
    std::fs::write(&path, "ssh-rsa AAAAB3NzaC1yc2E test@azpool\n").unwrap();
    path
}

//! In-memory collaborators for driving the app without network or wallet

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use kvgarden::app::App;
use kvgarden::config::Config;
use kvgarden::domain::write::WriteArgs;
use kvgarden::infrastructure::api::{
    AccountsQuery, ApiError, CallInspector, ContractsQuery, DiffRecord, HistoryPage, KeyRef,
    KvEntry, KvGateway, Listing, SubtreePage,
};
use kvgarden::infrastructure::runtime::{handle_command, RuntimeEvent};
use kvgarden::infrastructure::wallet::{WalletConnector, WalletError};
use kvgarden::store::SessionStore;

pub fn entry(key: &str, value: Value, block: u64) -> KvEntry {
    serde_json::from_value(json!({
        "key": key,
        "value": value,
        "blockHeight": block,
        "accountId": "alice.near",
    }))
    .unwrap()
}

#[derive(Default)]
pub struct MockGateway {
    pub contracts: Vec<String>,
    pub accounts: HashMap<String, Vec<String>>,
    /// account → flat `(key, value)` list the tree queries are answered from
    pub keys: HashMap<String, Vec<(String, Value)>>,
    pub values: HashMap<String, KvEntry>,
    pub history: HashMap<String, Vec<KvEntry>>,
    /// `get_value` keeps answering "not found" until this many calls were made
    pub indexed_after: Option<usize>,
    pub get_calls: AtomicUsize,
    pub requests: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn with_keys(mut self, account: &str, keys: &[(&str, Value)]) -> Self {
        self.keys.entry(account.to_string()).or_default().extend(
            keys.iter()
                .map(|(key, value)| (key.to_string(), value.clone())),
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn log(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl KvGateway for MockGateway {
    async fn list_contracts(&self, query: &ContractsQuery) -> Result<Listing, ApiError> {
        self.log(format!("contracts {:?}", query.account));
        Ok(Listing {
            names: self.contracts.clone(),
            has_more: false,
        })
    }

    async fn list_accounts(&self, query: &AccountsQuery) -> Result<Listing, ApiError> {
        self.log(format!("accounts {}", query.contract));
        Ok(Listing {
            names: self.accounts.get(&query.contract).cloned().unwrap_or_default(),
            has_more: false,
        })
    }

    async fn get_value(&self, key: &KeyRef) -> Result<Option<KvEntry>, ApiError> {
        let calls = self.get_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.log(format!("get {}", key.display()));
        if let Some(after) = self.indexed_after {
            if calls < after {
                return Ok(None);
            }
            return Ok(Some(entry(&key.path, json!("written"), 100)));
        }
        Ok(self.values.get(&key.path).cloned())
    }

    async fn history(&self, key: &KeyRef, _limit: usize) -> Result<HistoryPage, ApiError> {
        self.log(format!("history {}", key.display()));
        Ok(HistoryPage {
            entries: self.history.get(&key.path).cloned().unwrap_or_default(),
            has_more: false,
        })
    }

    async fn writers(&self, _contract: &str, key: &str, _limit: usize) -> Result<Vec<KvEntry>, ApiError> {
        self.log(format!("writers {key}"));
        Ok(self.values.get(key).cloned().into_iter().collect())
    }

    async fn diff(&self, key: &KeyRef, block_a: u64, block_b: u64) -> Result<DiffRecord, ApiError> {
        self.log(format!("diff {} {block_a} {block_b}", key.display()));
        let versions = self.history.get(&key.path).cloned().unwrap_or_default();
        let at = |block: u64| versions.iter().find(|e| e.block_height == block).cloned();
        Ok(DiffRecord {
            a: at(block_a),
            b: at(block_b),
        })
    }

    async fn timeline(
        &self,
        account: Option<&str>,
        contract: &str,
        _limit: usize,
    ) -> Result<Vec<KvEntry>, ApiError> {
        self.log(format!("timeline {account:?} {contract}"));
        Ok(self.values.values().cloned().collect())
    }

    async fn subtree(
        &self,
        account: &str,
        _contract: &str,
        prefix: Option<&str>,
    ) -> Result<SubtreePage, ApiError> {
        let prefix = prefix.unwrap_or_default();
        self.log(format!("subtree {account} {prefix}"));
        let Some(keys) = self.keys.get(account) else {
            return Err(ApiError::Status {
                status: 500,
                operation: "kvQueryTree",
            });
        };
        // bytewise range match, nested from the root
        let end = format!("{prefix}\u{ff}");
        let mut tree = Map::new();
        for (key, value) in keys {
            if key.as_str() >= prefix && key.as_str() < end.as_str() {
                insert_path(&mut tree, key, value.clone());
            }
        }
        Ok(SubtreePage::from_tree(tree, Some(prefix), false))
    }
}

fn insert_path(tree: &mut Map<String, Value>, key: &str, value: Value) {
    let mut segments = key.split('/').peekable();
    let mut node = tree;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(inner) = child else {
            return;
        };
        node = inner;
    }
}

/// Wallet that answers every call the same way
pub struct MockWallet {
    pub answer: Result<Option<String>, WalletError>,
    pub calls: Mutex<Vec<WriteArgs>>,
}

impl MockWallet {
    pub fn signing(tx: &str) -> Self {
        Self {
            answer: Ok(Some(tx.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: WalletError) -> Self {
        Self {
            answer: Err(err),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    async fn call_fastdata(
        &self,
        _signer: &str,
        _contract: &str,
        args: &WriteArgs,
    ) -> Result<Option<String>, WalletError> {
        self.calls.lock().unwrap().push(args.clone());
        self.answer.clone()
    }
}

pub fn test_app(store: Option<SessionStore>) -> App {
    let config = Config {
        api_url: "https://kv.example.com".to_string(),
        ..Config::default()
    };
    App::new(config, store, CallInspector::new()).unwrap()
}

/// Run everything queued in the app's outbox through the worker until the
/// app stops asking for more.
pub async fn settle(app: &mut App, gateway: &MockGateway, wallet: &MockWallet) -> Vec<RuntimeEvent> {
    let mut seen = Vec::new();
    loop {
        let commands = app.take_commands();
        if commands.is_empty() {
            return seen;
        }
        let (tx, rx) = mpsc::channel();
        for cmd in commands {
            handle_command(gateway, wallet, cmd, &tx).await;
        }
        drop(tx);
        for event in rx {
            seen.push(event.clone());
            app.apply_runtime_event(event);
        }
    }
}

/// Fresh on-disk database shared by several store handles in one test
pub fn temp_db(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("kvgarden-{name}-{}.sqlite3", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

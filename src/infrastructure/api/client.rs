//! HTTP gateway to the FastKV data API

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde_json::{Map, Value};

use super::inspector::{ApiCallRecord, CallInspector};
use super::types::{
    decode_envelope, AccountsQuery, ContractsQuery, DiffRecord, HistoryPage,
    KeyRef, KvEntry, Listing, SubtreePage,
};
use super::ApiError;

/// Fixed result cap for tree queries
pub const SUBTREE_LIMIT: usize = 1000;

/// Operations the explorer needs from the data API.
///
/// Each call issues exactly one request and either returns the decoded
/// payload or an [`ApiError`].
#[async_trait]
pub trait KvGateway: Send + Sync + 'static {
    async fn list_contracts(&self, query: &ContractsQuery) -> Result<Listing, ApiError>;

    async fn list_accounts(&self, query: &AccountsQuery) -> Result<Listing, ApiError>;

    /// Current value; `Ok(None)` when the key has never been written
    async fn get_value(&self, key: &KeyRef) -> Result<Option<KvEntry>, ApiError>;

    /// Version history, newest first
    async fn history(&self, key: &KeyRef, limit: usize) -> Result<HistoryPage, ApiError>;

    async fn writers(&self, contract: &str, key: &str, limit: usize)
        -> Result<Vec<KvEntry>, ApiError>;

    async fn diff(&self, key: &KeyRef, block_a: u64, block_b: u64) -> Result<DiffRecord, ApiError>;

    async fn timeline(
        &self,
        account: Option<&str>,
        contract: &str,
        limit: usize,
    ) -> Result<Vec<KvEntry>, ApiError>;

    /// Subtree under `prefix` with deletions excluded, capped at [`SUBTREE_LIMIT`]
    async fn subtree(
        &self,
        account: &str,
        contract: &str,
        prefix: Option<&str>,
    ) -> Result<SubtreePage, ApiError>;
}

/// URL builder shared by the gateway and the "copy url" actions
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(api_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(api_url.trim()).with_context(|| format!("invalid API url {api_url}"))?;
        Ok(Self { base })
    }

    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    pub fn contracts(&self, query: &ContractsQuery) -> Url {
        let mut pairs = vec![("scan", "1".to_string())];
        if let Some(account) = query.account.as_deref().filter(|a| !a.is_empty()) {
            pairs.push(("accountId", account.to_string()));
        }
        if let Some(limit) = query.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(after) = &query.after_contract {
            pairs.push(("after_contract", after.clone()));
        }
        self.build("/v1/kv/contracts", &pairs)
    }

    pub fn accounts(&self, query: &AccountsQuery) -> Url {
        let mut pairs = vec![("contractId", query.contract.clone())];
        if let Some(limit) = query.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = query.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(after) = &query.after_account {
            pairs.push(("after_account", after.clone()));
        }
        self.build("/v1/kv/accounts", &pairs)
    }

    pub fn get(&self, key: &KeyRef) -> Url {
        self.build(
            "/v1/kv/get",
            &[
                ("accountId", key.account.clone()),
                ("contractId", key.contract.clone()),
                ("key", key.path.clone()),
                ("value_format", "json".to_string()),
            ],
        )
    }

    pub fn history(&self, key: &KeyRef, limit: usize) -> Url {
        self.build(
            "/v1/kv/history",
            &[
                ("accountId", key.account.clone()),
                ("contractId", key.contract.clone()),
                ("key", key.path.clone()),
                ("value_format", "json".to_string()),
                ("order", "desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
    }

    pub fn writers(&self, contract: &str, key: &str, limit: usize) -> Url {
        self.build(
            "/v1/kv/writers",
            &[
                ("contractId", contract.to_string()),
                ("key", key.to_string()),
                ("value_format", "json".to_string()),
                ("limit", limit.to_string()),
            ],
        )
    }

    pub fn diff(&self, key: &KeyRef, block_a: u64, block_b: u64) -> Url {
        self.build(
            "/v1/kv/diff",
            &[
                ("accountId", key.account.clone()),
                ("contractId", key.contract.clone()),
                ("key", key.path.clone()),
                ("block_height_a", block_a.to_string()),
                ("block_height_b", block_b.to_string()),
                ("value_format", "json".to_string()),
            ],
        )
    }

    pub fn timeline(&self, account: Option<&str>, contract: &str, limit: usize) -> Url {
        let mut pairs = Vec::new();
        if let Some(account) = account.filter(|a| !a.is_empty()) {
            pairs.push(("accountId", account.to_string()));
        }
        pairs.push(("contractId", contract.to_string()));
        pairs.push(("limit", limit.to_string()));
        pairs.push(("value_format", "json".to_string()));
        self.build("/v1/kv/timeline", &pairs)
    }

    pub fn query_tree(&self, account: &str, contract: &str, prefix: Option<&str>) -> Url {
        let mut pairs = vec![
            ("accountId", account.to_string()),
            ("contractId", contract.to_string()),
            ("format", "tree".to_string()),
            ("value_format", "json".to_string()),
            ("exclude_deleted", "true".to_string()),
            ("limit", SUBTREE_LIMIT.to_string()),
        ];
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            pairs.push(("key_prefix", prefix.to_string()));
        }
        self.build("/v1/kv/query", &pairs)
    }

    fn build(&self, path: &str, pairs: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{path}", self.base.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }
        url
    }
}

/// reqwest-backed [`KvGateway`] that records every call in a [`CallInspector`]
pub struct HttpGateway {
    http: reqwest::Client,
    endpoints: Endpoints,
    inspector: CallInspector,
}

impl HttpGateway {
    pub fn new(api_url: &str, inspector: CallInspector) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            endpoints: Endpoints::new(api_url)?,
            inspector,
        })
    }

    async fn fetch(&self, url: Url, operation: &'static str) -> Result<Value, ApiError> {
        tracing::debug!(%url, operation, "GET");
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                self.record(&url, None);
                tracing::warn!(operation, error = %err, "request failed");
                return Err(ApiError::Transport {
                    operation,
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        self.record(&url, Some(status.as_u16()));
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                operation,
            });
        }

        response.json::<Value>().await.map_err(|err| ApiError::Schema {
            operation,
            detail: format!("invalid JSON body: {err}"),
        })
    }

    fn record(&self, url: &Url, status: Option<u16>) {
        self.inspector.record(ApiCallRecord {
            method: "GET".to_string(),
            url: url.to_string(),
            request_body: None,
            status,
            timestamp: Utc::now(),
        });
    }
}

#[async_trait]
impl KvGateway for HttpGateway {
    async fn list_contracts(&self, query: &ContractsQuery) -> Result<Listing, ApiError> {
        let body = self.fetch(self.endpoints.contracts(query), "kvContracts").await?;
        let (names, meta) = decode_envelope::<Vec<String>>(body, "data", "kvContracts")?;
        Ok(Listing {
            names,
            has_more: meta.has_more,
        })
    }

    async fn list_accounts(&self, query: &AccountsQuery) -> Result<Listing, ApiError> {
        let body = self.fetch(self.endpoints.accounts(query), "kvAccounts").await?;
        let (names, meta) = decode_envelope::<Vec<String>>(body, "data", "kvAccounts")?;
        Ok(Listing {
            names,
            has_more: meta.has_more,
        })
    }

    async fn get_value(&self, key: &KeyRef) -> Result<Option<KvEntry>, ApiError> {
        let body = self.fetch(self.endpoints.get(key), "kvGet").await?;
        let (entry, _) = decode_envelope::<Option<KvEntry>>(body, "data", "kvGet")?;
        Ok(entry)
    }

    async fn history(&self, key: &KeyRef, limit: usize) -> Result<HistoryPage, ApiError> {
        let body = self.fetch(self.endpoints.history(key, limit), "kvHistory").await?;
        let (entries, meta) = decode_envelope::<Vec<KvEntry>>(body, "data", "kvHistory")?;
        Ok(HistoryPage {
            entries,
            has_more: meta.has_more,
        })
    }

    async fn writers(
        &self,
        contract: &str,
        key: &str,
        limit: usize,
    ) -> Result<Vec<KvEntry>, ApiError> {
        let body = self
            .fetch(self.endpoints.writers(contract, key, limit), "kvWriters")
            .await?;
        let (entries, _) = decode_envelope::<Vec<KvEntry>>(body, "data", "kvWriters")?;
        Ok(entries)
    }

    async fn diff(&self, key: &KeyRef, block_a: u64, block_b: u64) -> Result<DiffRecord, ApiError> {
        let body = self
            .fetch(self.endpoints.diff(key, block_a, block_b), "kvDiff")
            .await?;
        let (diff, _) = decode_envelope::<DiffRecord>(body, "data", "kvDiff")?;
        Ok(diff)
    }

    async fn timeline(
        &self,
        account: Option<&str>,
        contract: &str,
        limit: usize,
    ) -> Result<Vec<KvEntry>, ApiError> {
        let body = self
            .fetch(self.endpoints.timeline(account, contract, limit), "kvTimeline")
            .await?;
        let (entries, _) = decode_envelope::<Vec<KvEntry>>(body, "data", "kvTimeline")?;
        Ok(entries)
    }

    async fn subtree(
        &self,
        account: &str,
        contract: &str,
        prefix: Option<&str>,
    ) -> Result<SubtreePage, ApiError> {
        let body = self
            .fetch(self.endpoints.query_tree(account, contract, prefix), "kvQueryTree")
            .await?;
        let (tree, meta) = decode_envelope::<Option<Map<String, Value>>>(body, "tree", "kvQueryTree")?;
        Ok(SubtreePage::from_tree(
            tree.unwrap_or_default(),
            prefix,
            meta.has_more,
        ))
    }
}

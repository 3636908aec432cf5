//! Wire types for the FastKV data API
//!
//! Every endpoint wraps its payload in an envelope (`{data, meta?}` or
//! `{tree, meta?}`). Envelopes are validated on receipt: a missing payload
//! field is a schema error, never an empty result.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiError;

/// Fully qualified key: who wrote it, under which contract, at which path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRef {
    pub account: String,
    pub contract: String,
    pub path: String,
}

impl KeyRef {
    pub fn new(
        account: impl Into<String>,
        contract: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            contract: contract.into(),
            path: path.into(),
        }
    }

    pub fn display(&self) -> String {
        format!("{}/{}", self.account, self.path)
    }
}

/// One stored version of a key
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KvEntry {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(deserialize_with = "lenient_u64")]
    pub block_height: u64,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub block_timestamp: Option<u64>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default, rename = "accountId", alias = "predecessorId")]
    pub writer_account_id: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl KvEntry {
    /// Value rendered for display: JSON strings are pretty-printed when they
    /// hold JSON themselves, everything else is shown as-is.
    pub fn display_value(&self) -> String {
        format_value(&self.value)
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => {
                serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| raw.clone())
            }
            _ => raw.clone(),
        },
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// Single-line preview truncated to `max` characters
pub fn preview_value(value: &Value, max: usize) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if raw.chars().count() > max {
        let cut: String = raw.chars().take(max).collect();
        format!("{cut}...")
    } else {
        raw
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub has_more: bool,
}

/// Names returned by the contract/account listing endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub names: Vec<String>,
    pub has_more: bool,
}

/// Newest-first version list for one key
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub entries: Vec<KvEntry>,
    pub has_more: bool,
}

/// Values of one key at two block heights; `None` means "not found"
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiffRecord {
    #[serde(default)]
    pub a: Option<KvEntry>,
    #[serde(default)]
    pub b: Option<KvEntry>,
}

/// Subtree under a prefix, nested by path segment and relative to `base_path`
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreePage {
    pub entries: Map<String, Value>,
    /// Key path the entries hang from; empty for the account root
    pub base_path: String,
    pub has_more: bool,
}

impl SubtreePage {
    /// Cut a tree-query reply down to the part under `prefix`.
    ///
    /// The backend matches `key_prefix` bytewise and nests its reply from
    /// the root, so `foo` also brings back `foobar/..` and a prefix naming
    /// a leaf brings back that leaf. Siblings are dropped; a leaf becomes a
    /// single entry hanging from its parent path.
    pub fn from_tree(tree: Map<String, Value>, prefix: Option<&str>, has_more: bool) -> Self {
        let segments: Vec<&str> = prefix
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let (entries, base_path) = under_prefix(tree, &segments);
        Self {
            entries,
            base_path,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractsQuery {
    pub account: Option<String>,
    pub limit: Option<usize>,
    pub after_contract: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountsQuery {
    pub contract: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub after_account: Option<String>,
}

/// Pull `field` out of an envelope and decode it, together with `meta`.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    body: Value,
    field: &str,
    operation: &'static str,
) -> Result<(T, Meta), ApiError> {
    let Value::Object(mut object) = body else {
        return Err(ApiError::Schema {
            operation,
            detail: "response is not a JSON object".to_string(),
        });
    };
    let Some(payload) = object.remove(field) else {
        return Err(ApiError::Schema {
            operation,
            detail: format!("missing `{field}` field"),
        });
    };
    let mut meta = match object.remove("meta") {
        Some(Value::Null) | None => Meta::default(),
        Some(raw) => serde_json::from_value::<Meta>(raw).map_err(|err| ApiError::Schema {
            operation,
            detail: format!("bad `meta`: {err}"),
        })?,
    };
    if let Some(Value::Bool(true)) = object.get("has_more") {
        meta.has_more = true;
    }
    let payload = serde_json::from_value::<T>(payload).map_err(|err| ApiError::Schema {
        operation,
        detail: format!("bad `{field}`: {err}"),
    })?;
    Ok((payload, meta))
}

fn under_prefix(tree: Map<String, Value>, segments: &[&str]) -> (Map<String, Value>, String) {
    let Some((last, parents)) = segments.split_last() else {
        return (tree, String::new());
    };
    let full = segments.join("/");
    let mut current = tree;
    for segment in parents {
        match current.remove(*segment) {
            Some(Value::Object(inner)) => current = inner,
            _ => return (Map::new(), full),
        }
    }
    match current.remove(*last) {
        Some(Value::Object(inner)) => (inner, full),
        Some(leaf) => {
            let mut only = Map::new();
            only.insert(last.to_string(), leaf);
            (only, parents.join("/"))
        }
        None => (Map::new(), full),
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom("expected unsigned integer")),
        Value::String(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected integer, got {other}"))),
    }
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_u64()),
        Value::String(s) => Ok(s.trim().parse::<u64>().ok()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_accepts_string_heights_and_writer_alias() {
        let entry: KvEntry = serde_json::from_value(json!({
            "key": "profile/name",
            "value": "alice",
            "blockHeight": "123456",
            "blockTimestamp": 1700000000000000000u64,
            "predecessorId": "alice.near",
        }))
        .unwrap();
        assert_eq!(entry.block_height, 123456);
        assert_eq!(entry.writer_account_id.as_deref(), Some("alice.near"));
        assert!(!entry.is_deleted);
    }

    #[test]
    fn missing_payload_is_schema_error() {
        let err = decode_envelope::<Vec<String>>(json!({"meta": {}}), "data", "kvContracts")
            .unwrap_err();
        assert!(matches!(err, ApiError::Schema { operation: "kvContracts", .. }));
    }

    #[test]
    fn wrong_payload_shape_is_schema_error() {
        let err = decode_envelope::<Vec<String>>(json!({"data": {"x": 1}}), "data", "kvAccounts")
            .unwrap_err();
        assert!(matches!(err, ApiError::Schema { .. }));
    }

    #[test]
    fn has_more_is_read_from_meta_or_top_level() {
        let (_, meta) =
            decode_envelope::<Vec<String>>(json!({"data": [], "meta": {"has_more": true}}), "data", "op")
                .unwrap();
        assert!(meta.has_more);
        let (_, meta) =
            decode_envelope::<Value>(json!({"tree": {}, "has_more": true}), "tree", "op").unwrap();
        assert!(meta.has_more);
    }

    fn reply(tree: Value) -> Map<String, Value> {
        let Value::Object(map) = tree else {
            panic!("reply must be an object");
        };
        map
    }

    #[test]
    fn branch_prefix_is_stripped_and_siblings_dropped() {
        let tree = reply(json!({"foo": {"a": "1", "b": {"c": "2"}}, "foobar": {"x": "3"}}));
        let page = SubtreePage::from_tree(tree, Some("foo"), false);
        assert_eq!(page.base_path, "foo");
        assert_eq!(page.entries, reply(json!({"a": "1", "b": {"c": "2"}})));
    }

    #[test]
    fn trailing_slash_names_the_same_branch() {
        let tree = reply(json!({"profile": {"name": {"first": "Al"}}}));
        let page = SubtreePage::from_tree(tree, Some("profile/name/"), false);
        assert_eq!(page.base_path, "profile/name");
        assert_eq!(page.entries, reply(json!({"first": "Al"})));
    }

    #[test]
    fn leaf_prefix_hangs_from_its_parent() {
        let tree = reply(json!({"profile": {"name": "Alice", "names": {"x": "1"}}}));
        let page = SubtreePage::from_tree(tree, Some("profile/name"), true);
        assert_eq!(page.base_path, "profile");
        assert_eq!(page.entries, reply(json!({"name": "Alice"})));
        assert!(page.has_more);
    }

    #[test]
    fn missing_prefix_is_empty() {
        let tree = reply(json!({"other": {"a": "1"}}));
        let page = SubtreePage::from_tree(tree, Some("foo/bar"), false);
        assert!(page.entries.is_empty());
        assert_eq!(page.base_path, "foo/bar");
    }

    #[test]
    fn no_prefix_keeps_the_whole_tree() {
        let tree = reply(json!({"a": "1", "b": {"c": "2"}}));
        let page = SubtreePage::from_tree(tree.clone(), None, false);
        assert_eq!(page.entries, tree);
        assert_eq!(page.base_path, "");
    }

    #[test]
    fn json_strings_are_pretty_printed() {
        let shown = format_value(&json!("{\"a\":1}"));
        assert!(shown.contains("\n"));
        assert_eq!(format_value(&json!("plain")), "plain");
        assert_eq!(preview_value(&json!("abcdef"), 3), "abc...");
    }
}

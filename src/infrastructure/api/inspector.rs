//! Single-slot record of the most recent API call

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiCallRecord {
    pub method: String,
    pub url: String,
    pub request_body: Option<Value>,
    /// `None` when the request never produced a response
    pub status: Option<u16>,
    pub timestamp: DateTime<Utc>,
}

impl ApiCallRecord {
    /// `GET /v1/kv/get?... — 200`
    pub fn summary(&self, origin: &str) -> String {
        let path = self.url.strip_prefix(origin.trim_end_matches('/')).unwrap_or(&self.url);
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "failed".to_string());
        format!("{} {} — {}", self.method, path, status)
    }

    /// Replay the call from a shell
    pub fn to_curl(&self) -> String {
        match (&self.request_body, self.method.as_str()) {
            (Some(body), "POST") => format!(
                "curl -s -X POST {} -H 'Content-Type: application/json' -d {} | jq",
                sh_quote(&self.url),
                sh_quote(&body.to_string())
            ),
            _ => curl_get(&self.url),
        }
    }
}

pub fn curl_get(url: &str) -> String {
    format!("curl -s {} | jq", sh_quote(url))
}

pub fn sh_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "'\"'\"'"))
}

/// Capacity-1 ring owned by the gateway; last write wins.
#[derive(Debug, Clone, Default)]
pub struct CallInspector {
    slot: Arc<Mutex<Option<ApiCallRecord>>>,
}

impl CallInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: ApiCallRecord) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(record);
        }
    }

    pub fn last(&self) -> Option<ApiCallRecord> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(method: &str, url: &str, body: Option<Value>) -> ApiCallRecord {
        ApiCallRecord {
            method: method.to_string(),
            url: url.to_string(),
            request_body: body,
            status: Some(200),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn last_call_wins() {
        let inspector = CallInspector::new();
        inspector.record(record("GET", "http://h/v1/kv/get?a=1", None));
        inspector.record(record("GET", "http://h/v1/kv/history?a=1", None));
        let last = inspector.last().unwrap();
        assert_eq!(last.url, "http://h/v1/kv/history?a=1");
    }

    #[test]
    fn clones_share_the_slot() {
        let inspector = CallInspector::new();
        let other = inspector.clone();
        other.record(record("GET", "http://h/x", None));
        assert!(inspector.last().is_some());
    }

    #[test]
    fn curl_quotes_single_quotes() {
        let rec = record("GET", "http://h/v1/kv/get?key=it's", None);
        assert_eq!(rec.to_curl(), "curl -s 'http://h/v1/kv/get?key=it'\"'\"'s' | jq");
    }

    #[test]
    fn post_curl_carries_body() {
        let rec = record("POST", "http://h/v1/kv/batch", Some(json!({"k": "v"})));
        assert_eq!(
            rec.to_curl(),
            "curl -s -X POST 'http://h/v1/kv/batch' -H 'Content-Type: application/json' -d '{\"k\":\"v\"}' | jq"
        );
    }

    #[test]
    fn summary_strips_origin() {
        let rec = record("GET", "http://h/v1/kv/get?a=1", None);
        assert_eq!(rec.summary("http://h/"), "GET /v1/kv/get?a=1 — 200");
    }
}

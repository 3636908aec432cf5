//! Recent-activity feed for the current account and contract

use chrono::{DateTime, Utc};

use crate::domain::detail::Pane;
use crate::infrastructure::api::{preview_value, KvEntry};

pub const FEED_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub ticket: u64,
    pub account: Option<String>,
    pub contract: String,
    pub limit: usize,
}

/// Where selecting a feed entry leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTarget {
    pub account: String,
    pub key: String,
}

#[derive(Debug, Default)]
pub struct FeedPanel {
    ticket: u64,
    account: Option<String>,
    entries: Pane<Vec<KvEntry>>,
    cursor: usize,
}

impl FeedPanel {
    pub fn load(&mut self, account: Option<&str>, contract: &str, limit: usize) -> FeedRequest {
        self.ticket += 1;
        self.account = account.map(str::to_string);
        self.entries = Pane::Loading;
        self.cursor = 0;
        FeedRequest {
            ticket: self.ticket,
            account: self.account.clone(),
            contract: contract.to_string(),
            limit,
        }
    }

    pub fn apply(&mut self, ticket: u64, result: Result<Vec<KvEntry>, String>) -> bool {
        if ticket != self.ticket || !self.entries.is_loading() {
            return false;
        }
        self.entries = match result {
            Ok(entries) => Pane::Ready(entries),
            Err(message) => {
                tracing::warn!(error = %message, "feed load failed");
                Pane::Failed(message)
            }
        };
        true
    }

    pub fn entries(&self) -> &Pane<Vec<KvEntry>> {
        &self.entries
    }

    /// Placeholder text when there is nothing to list
    pub fn message(&self) -> Option<&'static str> {
        match &self.entries {
            Pane::Idle => None,
            Pane::Loading => Some("loading_"),
            Pane::Failed(_) => Some("failed to load feed"),
            Pane::Ready(entries) if entries.is_empty() => Some("no recent activity"),
            Pane::Ready(_) => None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, down: bool) {
        let len = self.entries.ready().map_or(0, Vec::len);
        if len == 0 {
            return;
        }
        self.cursor = if down {
            (self.cursor + 1).min(len - 1)
        } else {
            self.cursor.saturating_sub(1)
        };
    }

    pub fn selected_target(&self) -> Option<FeedTarget> {
        let entry = self.entries.ready()?.get(self.cursor)?;
        let account = self
            .account
            .clone()
            .or_else(|| entry.writer_account_id.clone())?;
        Some(FeedTarget {
            account,
            key: entry.key.clone().unwrap_or_default(),
        })
    }
}

/// One rendered feed line: key, age, value preview, block
pub fn feed_line(entry: &KvEntry, now: DateTime<Utc>) -> (String, String, String, String) {
    let age = entry
        .block_timestamp
        .map(|ns| time_ago(ns, now))
        .unwrap_or_default();
    (
        entry.key.clone().unwrap_or_default(),
        age,
        preview_value(&entry.value, FEED_PREVIEW_CHARS),
        format!("block {}", entry.block_height),
    )
}

/// Relative age of a nanosecond block timestamp: `12s ago`, `5m ago`, ...
pub fn time_ago(block_timestamp_ns: u64, now: DateTime<Utc>) -> String {
    let millis = (block_timestamp_ns / 1_000_000) as i64;
    let Some(then) = DateTime::<Utc>::from_timestamp_millis(millis) else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(then);
    let secs = elapsed.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", elapsed.num_minutes())
    } else if secs < 86_400 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn entry(key: &str, writer: &str) -> KvEntry {
        serde_json::from_value(json!({
            "key": key,
            "value": "x".repeat(100),
            "blockHeight": 7,
            "accountId": writer,
        }))
        .unwrap()
    }

    fn ns(at: DateTime<Utc>) -> u64 {
        at.timestamp_nanos_opt().unwrap() as u64
    }

    #[test]
    fn ages_use_the_largest_whole_unit() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(ns(now - Duration::seconds(12)), now), "12s ago");
        assert_eq!(time_ago(ns(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(time_ago(ns(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(time_ago(ns(now - Duration::days(2)), now), "2d ago");
    }

    #[test]
    fn stale_feed_results_are_dropped() {
        let mut feed = FeedPanel::default();
        let first = feed.load(Some("a.near"), "c.near", 20);
        let second = feed.load(Some("b.near"), "c.near", 20);
        assert!(!feed.apply(first.ticket, Ok(vec![entry("k", "a.near")])));
        assert!(feed.apply(second.ticket, Ok(vec![])));
        assert_eq!(feed.message(), Some("no recent activity"));
    }

    #[test]
    fn failure_has_its_own_message() {
        let mut feed = FeedPanel::default();
        let req = feed.load(None, "c.near", 20);
        feed.apply(req.ticket, Err("kvTimeline: 500".into()));
        assert_eq!(feed.message(), Some("failed to load feed"));
    }

    #[test]
    fn selecting_an_entry_targets_its_key() {
        let mut feed = FeedPanel::default();
        let req = feed.load(None, "c.near", 20);
        feed.apply(req.ticket, Ok(vec![entry("a/b", "w.near"), entry("c", "v.near")]));
        feed.move_cursor(true);
        feed.move_cursor(true);
        assert_eq!(
            feed.selected_target(),
            Some(FeedTarget {
                account: "v.near".into(),
                key: "c".into()
            })
        );
        let (_, _, preview, block) = feed_line(&entry("k", "w.near"), Utc::now());
        assert_eq!(preview.chars().count(), FEED_PREVIEW_CHARS + 3);
        assert_eq!(block, "block 7");
    }
}

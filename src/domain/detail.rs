//! Detail panel for one selected key: current value, history, diff, writers
//!
//! Each pane commits only its own result. Every request carries the
//! [`SelectionTicket`] of the selection that issued it; a result whose
//! ticket is not the current one belongs to a superseded selection and is
//! ignored.

use crate::infrastructure::api::{DiffRecord, HistoryPage, KeyRef, KvEntry};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Pane<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Pane<T> {
    fn default() -> Self {
        Pane::Idle
    }
}

impl<T> Pane<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Pane::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Pane::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRequest {
    /// Current value and history, fetched concurrently
    Load {
        ticket: SelectionTicket,
        key: KeyRef,
        history_limit: usize,
    },
    Diff {
        ticket: SelectionTicket,
        key: KeyRef,
        block_a: u64,
        block_b: u64,
    },
    Writers {
        ticket: SelectionTicket,
        contract: String,
        key: String,
        limit: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffSide {
    NotFound,
    Found(KvEntry),
}

impl DiffSide {
    pub fn render(&self) -> String {
        match self {
            DiffSide::NotFound => "(not found)".to_string(),
            DiffSide::Found(entry) => entry.display_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffView {
    pub block_a: u64,
    pub block_b: u64,
    pub a: DiffSide,
    pub b: DiffSide,
}

impl DiffView {
    pub fn from_record(block_a: u64, block_b: u64, record: DiffRecord) -> Self {
        let side = |entry: Option<KvEntry>| entry.map_or(DiffSide::NotFound, DiffSide::Found);
        Self {
            block_a,
            block_b,
            a: side(record.a),
            b: side(record.b),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        match (&self.a, &self.b) {
            (DiffSide::Found(a), DiffSide::Found(b)) => a.value == b.value,
            (DiffSide::NotFound, DiffSide::NotFound) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffEnd {
    A,
    B,
}

#[derive(Debug, Default)]
pub struct DetailPanel {
    seq: u64,
    key: Option<KeyRef>,
    preview: Option<Value>,
    value: Pane<Option<KvEntry>>,
    history: Pane<HistoryPage>,
    history_cursor: Option<usize>,
    diff_a: Option<u64>,
    diff_b: Option<u64>,
    diff_in_flight: Option<(u64, u64)>,
    diff: Pane<DiffView>,
    writers: Pane<Vec<KvEntry>>,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> SelectionTicket {
        SelectionTicket(self.seq)
    }

    pub fn key(&self) -> Option<&KeyRef> {
        self.key.as_ref()
    }

    /// Value shown in the tree at selection time
    pub fn preview(&self) -> Option<&Value> {
        self.preview.as_ref()
    }

    pub fn value(&self) -> &Pane<Option<KvEntry>> {
        &self.value
    }

    pub fn history(&self) -> &Pane<HistoryPage> {
        &self.history
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history_cursor
    }

    pub fn diff(&self) -> &Pane<DiffView> {
        &self.diff
    }

    pub fn diff_endpoints(&self) -> (Option<u64>, Option<u64>) {
        (self.diff_a, self.diff_b)
    }

    pub fn writers(&self) -> &Pane<Vec<KvEntry>> {
        &self.writers
    }

    /// Start a new selection. Anything still in flight for the previous one
    /// is dropped when it lands.
    pub fn select(&mut self, key: KeyRef, preview: Option<Value>, history_limit: usize) -> DetailRequest {
        self.clear();
        self.key = Some(key.clone());
        self.preview = preview;
        self.value = Pane::Loading;
        self.history = Pane::Loading;
        DetailRequest::Load {
            ticket: self.ticket(),
            key,
            history_limit,
        }
    }

    /// Forget the selection and invalidate outstanding requests.
    pub fn clear(&mut self) {
        let seq = self.seq + 1;
        *self = Self {
            seq,
            ..Self::default()
        };
    }

    pub fn apply_value(&mut self, ticket: SelectionTicket, result: Result<Option<KvEntry>, String>) -> bool {
        if ticket != self.ticket() || !self.value.is_loading() {
            return false;
        }
        self.value = match result {
            Ok(entry) => Pane::Ready(entry),
            Err(message) => Pane::Failed(message),
        };
        true
    }

    pub fn apply_history(&mut self, ticket: SelectionTicket, result: Result<HistoryPage, String>) -> bool {
        if ticket != self.ticket() || !self.history.is_loading() {
            return false;
        }
        match result {
            Ok(page) => {
                // B: newest, A: the one before it
                self.diff_b = page.entries.first().map(|e| e.block_height);
                self.diff_a = page
                    .entries
                    .get(1)
                    .or_else(|| page.entries.first())
                    .map(|e| e.block_height);
                self.history = Pane::Ready(page);
            }
            Err(message) => self.history = Pane::Failed(message),
        }
        true
    }

    /// Show a history entry in the value pane. Uses the loaded history,
    /// never a fresh fetch; out-of-range indexes are ignored.
    pub fn show_history_entry(&mut self, index: usize) -> bool {
        match self.history.ready() {
            Some(page) if index < page.entries.len() => {
                self.history_cursor = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn show_current(&mut self) {
        self.history_cursor = None;
    }

    /// Entry shown in the value pane
    pub fn displayed_entry(&self) -> Option<&KvEntry> {
        match (self.history_cursor, self.history.ready()) {
            (Some(index), Some(page)) => page.entries.get(index),
            _ => self.value.ready().and_then(Option::as_ref),
        }
    }

    /// Move one diff endpoint through the loaded history heights.
    pub fn step_diff_endpoint(&mut self, end: DiffEnd, older: bool) {
        let Some(page) = self.history.ready() else {
            return;
        };
        let heights: Vec<u64> = page.entries.iter().map(|e| e.block_height).collect();
        if heights.is_empty() {
            return;
        }
        let slot = match end {
            DiffEnd::A => &mut self.diff_a,
            DiffEnd::B => &mut self.diff_b,
        };
        let pos = slot
            .and_then(|h| heights.iter().position(|x| *x == h))
            .unwrap_or(0);
        let next = if older {
            (pos + 1).min(heights.len() - 1)
        } else {
            pos.saturating_sub(1)
        };
        *slot = Some(heights[next]);
    }

    /// Diff between the seeded endpoints
    pub fn request_diff(&mut self) -> Option<DetailRequest> {
        let (a, b) = (self.diff_a?, self.diff_b?);
        self.request_diff_between(a, b)
    }

    /// Diff between any two heights, inside the loaded history or not.
    pub fn request_diff_between(&mut self, block_a: u64, block_b: u64) -> Option<DetailRequest> {
        let key = self.key.clone()?;
        self.diff_a = Some(block_a);
        self.diff_b = Some(block_b);
        self.diff_in_flight = Some((block_a, block_b));
        self.diff = Pane::Loading;
        Some(DetailRequest::Diff {
            ticket: self.ticket(),
            key,
            block_a,
            block_b,
        })
    }

    pub fn apply_diff(
        &mut self,
        ticket: SelectionTicket,
        block_a: u64,
        block_b: u64,
        result: Result<DiffRecord, String>,
    ) -> bool {
        if ticket != self.ticket() || self.diff_in_flight != Some((block_a, block_b)) {
            return false;
        }
        self.diff_in_flight = None;
        self.diff = match result {
            Ok(record) => Pane::Ready(DiffView::from_record(block_a, block_b, record)),
            Err(message) => Pane::Failed(message),
        };
        true
    }

    pub fn request_writers(&mut self, limit: usize) -> Option<DetailRequest> {
        let key = self.key.clone()?;
        self.writers = Pane::Loading;
        Some(DetailRequest::Writers {
            ticket: self.ticket(),
            contract: key.contract,
            key: key.path,
            limit,
        })
    }

    pub fn apply_writers(&mut self, ticket: SelectionTicket, result: Result<Vec<KvEntry>, String>) -> bool {
        if ticket != self.ticket() || !self.writers.is_loading() {
            return false;
        }
        self.writers = match result {
            Ok(entries) => Pane::Ready(entries),
            Err(message) => Pane::Failed(message),
        };
        true
    }
}

//! Write flow: input validation, the signing/indexing state machine, the
//! pending-write snapshot and the indexer poll schedule.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::infrastructure::wallet::WalletError;

pub const FASTDATA_METHOD: &str = "__fastdata_kv";
pub const WRITE_GAS_TGAS: u64 = 30;

pub const POLL_INITIAL_DELAY: Duration = Duration::from_millis(2000);
pub const POLL_MAX_DELAY: Duration = Duration::from_millis(10_000);
pub const POLL_BACKOFF: f64 = 1.5;
pub const POLL_ATTEMPTS: u32 = 12;

/// Rejected write input; the message is shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("enter a key")]
    MissingKey,
    #[error("enter key-value pairs as JSON")]
    EmptyBatch,
    #[error("invalid JSON")]
    InvalidJson,
    #[error("expected a JSON object like {{\"key\": \"value\"}}")]
    NotAnObject,
    #[error("keys must be non-empty strings")]
    EmptyKey,
    #[error("value for \"{key}\" must be a string or null")]
    BadValue { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Single,
    Batch,
}

/// Raw form inputs, kept exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteForm {
    pub mode: WriteMode,
    pub key: String,
    pub value: String,
    pub batch_json: String,
}

/// Arguments of one `__fastdata_kv` call: key to string-or-null
pub type WriteArgs = Map<String, Value>;

impl WriteForm {
    pub fn build_args(&self) -> Result<WriteArgs, ValidationError> {
        match self.mode {
            WriteMode::Single => {
                let key = self.key.trim();
                if key.is_empty() {
                    return Err(ValidationError::MissingKey);
                }
                let mut args = Map::new();
                args.insert(key.to_string(), Value::String(self.value.clone()));
                Ok(args)
            }
            WriteMode::Batch => {
                let raw = self.batch_json.trim();
                if raw.is_empty() {
                    return Err(ValidationError::EmptyBatch);
                }
                let parsed: Value =
                    serde_json::from_str(raw).map_err(|_| ValidationError::InvalidJson)?;
                let Value::Object(obj) = parsed else {
                    return Err(ValidationError::NotAnObject);
                };
                if obj.is_empty() {
                    return Err(ValidationError::EmptyBatch);
                }
                for (key, value) in &obj {
                    if key.trim().is_empty() {
                        return Err(ValidationError::EmptyKey);
                    }
                    if !matches!(value, Value::String(_) | Value::Null) {
                        return Err(ValidationError::BadValue { key: key.clone() });
                    }
                }
                Ok(obj)
            }
        }
    }

    /// Number of keys the batch input currently holds; 0 when unparsable
    pub fn batch_key_count(&self) -> usize {
        let raw = if self.batch_json.trim().is_empty() {
            "{}"
        } else {
            self.batch_json.as_str()
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => obj.len(),
            _ => 0,
        }
    }

    /// `alice.near → c.near::__fastdata_kv("key", ...)`
    pub fn preview_line(&self, signer: Option<&str>, contract: &str) -> String {
        let account = signer.unwrap_or("you.near");
        match self.mode {
            WriteMode::Batch => {
                let count = self.batch_key_count();
                let plural = if count == 1 { "" } else { "s" };
                format!("{account} → {contract}::{FASTDATA_METHOD}({{ {count} key{plural} }})")
            }
            WriteMode::Single => {
                let key = if self.key.is_empty() { "(key)" } else { &self.key };
                format!("{account} → {contract}::{FASTDATA_METHOD}(\"{key}\", ...)")
            }
        }
    }
}

/// Form snapshot that survives a restart while a wallet call is outstanding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub contract: String,
    pub batch_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_json: Option<String>,
}

impl PendingWrite {
    pub fn capture(contract: &str, form: &WriteForm) -> Self {
        match form.mode {
            WriteMode::Batch => Self {
                contract: contract.to_string(),
                batch_mode: true,
                key: None,
                value: None,
                batch_json: Some(form.batch_json.clone()),
            },
            WriteMode::Single => Self {
                contract: contract.to_string(),
                batch_mode: false,
                key: Some(form.key.clone()),
                value: Some(form.value.clone()),
                batch_json: None,
            },
        }
    }

    pub fn restore(&self) -> WriteForm {
        if self.batch_mode {
            WriteForm {
                mode: WriteMode::Batch,
                batch_json: self.batch_json.clone().unwrap_or_default(),
                ..WriteForm::default()
            }
        } else {
            WriteForm {
                mode: WriteMode::Single,
                key: self.key.clone().unwrap_or_default(),
                value: self.value.clone().unwrap_or_default(),
                ..WriteForm::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePhase {
    Idle,
    Invalid(ValidationError),
    Signing,
    PendingIndex { attempt: u32 },
    Confirmed,
    Rejected,
    Failed(String),
    TimedOut,
}

impl WritePhase {
    pub fn status_line(&self) -> String {
        match self {
            WritePhase::Idle => String::new(),
            WritePhase::Invalid(err) => err.to_string(),
            WritePhase::Signing => "signing transaction...".to_string(),
            WritePhase::PendingIndex { attempt: 0 } => "saved! waiting for indexer...".to_string(),
            WritePhase::PendingIndex { attempt } => format!("waiting for indexer... ({attempt})"),
            WritePhase::Confirmed => "indexed!".to_string(),
            WritePhase::Rejected => "transaction cancelled".to_string(),
            WritePhase::Failed(message) => format!("failed: {message}"),
            WritePhase::TimedOut => {
                "indexing may take a moment — try exploring in a few seconds".to_string()
            }
        }
    }

    /// A write is in flight; submit stays disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, WritePhase::Signing | WritePhase::PendingIndex { .. })
    }
}

/// Everything the worker needs to sign and then watch one write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSubmission {
    pub ticket: u64,
    pub signer: String,
    pub contract: String,
    pub args: WriteArgs,
    pub first_key: String,
    pub snapshot: PendingWrite,
}

/// Where a confirmed write can be viewed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenLocation {
    pub account: String,
    pub contract: String,
    pub key: String,
}

#[derive(Debug, Default)]
pub struct WriteController {
    pub form: WriteForm,
    phase: Option<WritePhase>,
    ticket: u64,
    written: Option<WrittenLocation>,
}

impl WriteController {
    pub fn phase(&self) -> &WritePhase {
        self.phase.as_ref().unwrap_or(&WritePhase::Idle)
    }

    pub fn written(&self) -> Option<&WrittenLocation> {
        self.written.as_ref()
    }

    /// Validate and move to signing. Validation runs before anything is
    /// persisted or sent to the wallet.
    pub fn submit(&mut self, signer: &str, contract: &str) -> Result<WriteSubmission, ValidationError> {
        let args = match self.form.build_args() {
            Ok(args) => args,
            Err(err) => {
                self.phase = Some(WritePhase::Invalid(err.clone()));
                return Err(err);
            }
        };
        let first_key = args.keys().next().cloned().unwrap_or_default();
        self.ticket += 1;
        self.written = None;
        self.phase = Some(WritePhase::Signing);
        tracing::info!(contract, signer, keys = args.len(), "submitting write");
        Ok(WriteSubmission {
            ticket: self.ticket,
            signer: signer.to_string(),
            contract: contract.to_string(),
            args,
            first_key,
            snapshot: PendingWrite::capture(contract, &self.form),
        })
    }

    /// Put a snapshot back into the form. The controller stays idle: the
    /// user re-submits from the restored form.
    pub fn restore(&mut self, pending: &PendingWrite) {
        self.form = pending.restore();
        self.phase = Some(WritePhase::Idle);
    }

    pub fn on_signed(&mut self, ticket: u64) -> bool {
        self.advance(ticket, WritePhase::Signing, WritePhase::PendingIndex { attempt: 0 })
    }

    pub fn on_wallet_error(&mut self, ticket: u64, err: &WalletError) -> bool {
        let next = match err {
            WalletError::Rejected(_) => WritePhase::Rejected,
            other => WritePhase::Failed(other.to_string()),
        };
        self.advance(ticket, WritePhase::Signing, next)
    }

    pub fn on_poll_miss(&mut self, ticket: u64, attempt: u32) -> bool {
        if ticket != self.ticket || !matches!(self.phase(), WritePhase::PendingIndex { .. }) {
            return false;
        }
        self.phase = Some(WritePhase::PendingIndex { attempt });
        true
    }

    pub fn on_indexed(&mut self, ticket: u64, location: WrittenLocation) -> bool {
        if ticket != self.ticket || !matches!(self.phase(), WritePhase::PendingIndex { .. }) {
            return false;
        }
        tracing::info!(account = %location.account, key = %location.key, "write indexed");
        self.written = Some(location);
        self.phase = Some(WritePhase::Confirmed);
        true
    }

    pub fn on_timed_out(&mut self, ticket: u64) -> bool {
        if ticket != self.ticket || !matches!(self.phase(), WritePhase::PendingIndex { .. }) {
            return false;
        }
        self.phase = Some(WritePhase::TimedOut);
        true
    }

    fn advance(&mut self, ticket: u64, from: WritePhase, to: WritePhase) -> bool {
        if ticket != self.ticket || self.phase() != &from {
            return false;
        }
        self.phase = Some(to);
        true
    }
}

/// Delays before each indexer check: 2s, then ×1.5 per step, capped at
/// 10s, twelve checks in total.
#[derive(Debug, Clone)]
pub struct IndexPollSchedule {
    next: Duration,
    remaining: u32,
}

impl Default for IndexPollSchedule {
    fn default() -> Self {
        Self {
            next: POLL_INITIAL_DELAY,
            remaining: POLL_ATTEMPTS,
        }
    }
}

impl Iterator for IndexPollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        self.next = current.mul_f64(POLL_BACKOFF).min(POLL_MAX_DELAY);
        Some(current)
    }
}

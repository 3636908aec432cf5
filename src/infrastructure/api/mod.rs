//! FastKV data API: typed requests, envelope validation, call inspector

mod client;
mod inspector;
mod types;

pub use client::{Endpoints, HttpGateway, KvGateway, SUBTREE_LIMIT};
pub use inspector::{curl_get, sh_quote, ApiCallRecord, CallInspector};
pub use types::{
    format_value, preview_value, AccountsQuery, ContractsQuery, DiffRecord, HistoryPage, KeyRef,
    KvEntry, Listing, Meta, SubtreePage,
};

/// Failure of a single gateway call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response
    #[error("{operation}: {status}")]
    Status { status: u16, operation: &'static str },
    /// The request never produced a response
    #[error("{operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    /// The response did not have the expected shape
    #[error("{operation}: unexpected response ({detail})")]
    Schema {
        operation: &'static str,
        detail: String,
    },
}

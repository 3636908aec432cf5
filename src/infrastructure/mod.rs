//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - reqwest-based gateway to the FastKV data API
//! - NEAR CLI wallet connector
//! - Tokio runtime bridge for async operations

pub mod api;
pub mod runtime;
pub mod wallet;

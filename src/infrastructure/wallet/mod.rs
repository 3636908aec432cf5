//! Wallet collaborator: signs and sends `__fastdata_kv` calls
//!
//! Sign-in is local bookkeeping (the session store remembers the account);
//! the only call that leaves the process is the contract call itself.

mod near_cli;

use async_trait::async_trait;

use crate::domain::write::WriteArgs;

pub use near_cli::NearCliWallet;

/// Phrases a wallet uses when the user declined to sign
const REJECTION_PHRASES: [&str; 3] = ["User denied", "rejected", "cancelled"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user declined; not a bug
    #[error("transaction cancelled")]
    Rejected(String),
    #[error("{0}")]
    Failed(String),
    /// No wallet to talk to (binary missing, not signed in)
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
}

impl WalletError {
    pub fn from_message(message: &str) -> Self {
        let message = message.trim();
        if REJECTION_PHRASES.iter().any(|phrase| message.contains(phrase)) {
            WalletError::Rejected(message.to_string())
        } else if message.is_empty() {
            WalletError::Failed("unknown error".to_string())
        } else {
            WalletError::Failed(message.to_string())
        }
    }
}

#[async_trait]
pub trait WalletConnector: Send + Sync + 'static {
    /// Sign and send one `__fastdata_kv` call. Returns the transaction hash
    /// when the wallet reports one.
    async fn call_fastdata(
        &self,
        signer: &str,
        contract: &str,
        args: &WriteArgs,
    ) -> Result<Option<String>, WalletError>;
}

/// NEAR account id: 2-64 chars of `a-z0-9` separated by single `-`, `_` or `.`
pub fn is_valid_account_id(id: &str) -> bool {
    if id.len() < 2 || id.len() > 64 {
        return false;
    }
    let mut prev_separator = true;
    for c in id.chars() {
        match c {
            'a'..='z' | '0'..='9' => prev_separator = false,
            '-' | '_' | '.' => {
                if prev_separator {
                    return false;
                }
                prev_separator = true;
            }
            _ => return false,
        }
    }
    !prev_separator
}

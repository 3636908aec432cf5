use async_trait::async_trait;
use tokio::process::Command;

use super::{WalletConnector, WalletError};
use crate::domain::write::{WriteArgs, FASTDATA_METHOD, WRITE_GAS_TGAS};

/// Signs through the `near` CLI with keys from the system keychain
#[derive(Debug, Clone)]
pub struct NearCliWallet {
    binary: String,
    network: String,
}

impl NearCliWallet {
    pub fn new(binary: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            network: network.into(),
        }
    }

    pub fn command_args(&self, signer: &str, contract: &str, args: &WriteArgs) -> Vec<String> {
        let json = serde_json::Value::Object(args.clone()).to_string();
        vec![
            "contract".into(),
            "call-function".into(),
            "as-transaction".into(),
            contract.into(),
            FASTDATA_METHOD.into(),
            "json-args".into(),
            json,
            "prepaid-gas".into(),
            format!("{WRITE_GAS_TGAS} Tgas"),
            "attached-deposit".into(),
            "0 NEAR".into(),
            "sign-as".into(),
            signer.into(),
            "network-config".into(),
            self.network.clone(),
            "sign-with-keychain".into(),
            "send".into(),
        ]
    }
}

#[async_trait]
impl WalletConnector for NearCliWallet {
    async fn call_fastdata(
        &self,
        signer: &str,
        contract: &str,
        args: &WriteArgs,
    ) -> Result<Option<String>, WalletError> {
        tracing::info!(signer, contract, binary = %self.binary, "calling {FASTDATA_METHOD}");
        let output = Command::new(&self.binary)
            .args(self.command_args(signer, contract, args))
            .output()
            .await
            .map_err(|err| WalletError::Unavailable(format!("{}: {err}", self.binary)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            tracing::warn!(status = ?output.status.code(), "wallet call failed");
            let message = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(WalletError::from_message(message));
        }
        Ok(transaction_id(&stdout).or_else(|| transaction_id(&stderr)))
    }
}

fn transaction_id(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (_, rest) = line.split_once("Transaction ID:")?;
        rest.split_whitespace().next().map(str::to_string)
    })
}

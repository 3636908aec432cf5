//! Async worker - runs in the Tokio runtime and performs all I/O

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;

use crate::domain::detail::{DetailRequest, SelectionTicket};
use crate::domain::tree::{TreePayload, TreeRequest, LISTING_CAP};
use crate::domain::write::{IndexPollSchedule, WriteSubmission, WrittenLocation};
use crate::infrastructure::api::{AccountsQuery, ContractsQuery, KeyRef, KvGateway};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent};
use crate::infrastructure::wallet::WalletConnector;

/// Run the async worker loop. Each command runs in its own task so a slow
/// request never holds up the ones behind it.
pub async fn run_async_worker(
    gateway: Arc<dyn KvGateway>,
    wallet: Arc<dyn WalletConnector>,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut poll_interval = interval(Duration::from_millis(20));

    loop {
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                    tracing::debug!("worker shutting down");
                    return Ok(());
                }
                Ok(cmd) => {
                    let gateway = gateway.clone();
                    let wallet = wallet.clone();
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        handle_command(gateway.as_ref(), wallet.as_ref(), cmd, &evt_tx).await;
                    });
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        poll_interval.tick().await;
    }
}

/// Perform one command and report its results.
pub async fn handle_command(
    gateway: &dyn KvGateway,
    wallet: &dyn WalletConnector,
    cmd: RuntimeCommand,
    evt_tx: &Sender<RuntimeEvent>,
) {
    match cmd {
        RuntimeCommand::Tree(fetch) => {
            let result = match fetch.request {
                TreeRequest::Contracts { account } => gateway
                    .list_contracts(&ContractsQuery {
                        account,
                        limit: Some(LISTING_CAP),
                        after_contract: None,
                    })
                    .await
                    .map(TreePayload::Names),
                TreeRequest::Accounts { contract } => gateway
                    .list_accounts(&AccountsQuery {
                        contract,
                        limit: Some(LISTING_CAP),
                        ..AccountsQuery::default()
                    })
                    .await
                    .map(TreePayload::Names),
                TreeRequest::Subtree {
                    account,
                    contract,
                    prefix,
                } => gateway
                    .subtree(&account, &contract, prefix.as_deref())
                    .await
                    .map(TreePayload::Subtree),
            };
            let _ = evt_tx.send(RuntimeEvent::TreeLoaded {
                ticket: fetch.ticket,
                result: result.map_err(|err| err.to_string()),
            });
        }

        RuntimeCommand::Detail(DetailRequest::Load {
            ticket,
            key,
            history_limit,
        }) => load_detail(gateway, ticket, &key, history_limit, evt_tx).await,

        RuntimeCommand::Detail(DetailRequest::Diff {
            ticket,
            key,
            block_a,
            block_b,
        }) => {
            let result = gateway.diff(&key, block_a, block_b).await;
            let _ = evt_tx.send(RuntimeEvent::DiffLoaded {
                ticket,
                block_a,
                block_b,
                result: result.map_err(|err| err.to_string()),
            });
        }

        RuntimeCommand::Detail(DetailRequest::Writers {
            ticket,
            contract,
            key,
            limit,
        }) => {
            let result = gateway.writers(&contract, &key, limit).await;
            let _ = evt_tx.send(RuntimeEvent::WritersLoaded {
                ticket,
                result: result.map_err(|err| err.to_string()),
            });
        }

        RuntimeCommand::Feed(req) => {
            let result = gateway
                .timeline(req.account.as_deref(), &req.contract, req.limit)
                .await;
            let _ = evt_tx.send(RuntimeEvent::FeedLoaded {
                ticket: req.ticket,
                result: result.map_err(|err| err.to_string()),
            });
        }

        RuntimeCommand::Write(submission) => submit_write(gateway, wallet, submission, evt_tx).await,

        RuntimeCommand::Shutdown => {}
    }
}

/// Value and history run concurrently; each result is reported on its own
/// as soon as both have settled.
async fn load_detail(
    gateway: &dyn KvGateway,
    ticket: SelectionTicket,
    key: &KeyRef,
    history_limit: usize,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let value = async {
        let result = gateway.get_value(key).await;
        let _ = evt_tx.send(RuntimeEvent::ValueLoaded {
            ticket,
            result: result.map_err(|err| err.to_string()),
        });
    };
    let history = async {
        let result = gateway.history(key, history_limit).await;
        let _ = evt_tx.send(RuntimeEvent::HistoryLoaded {
            ticket,
            result: result.map_err(|err| err.to_string()),
        });
    };
    tokio::join!(value, history);
}

async fn submit_write(
    gateway: &dyn KvGateway,
    wallet: &dyn WalletConnector,
    submission: WriteSubmission,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let ticket = submission.ticket;
    match wallet
        .call_fastdata(&submission.signer, &submission.contract, &submission.args)
        .await
    {
        Ok(tx_hash) => {
            let _ = evt_tx.send(RuntimeEvent::WriteSigned { ticket, tx_hash });
            let key = KeyRef::new(
                submission.signer,
                submission.contract,
                submission.first_key,
            );
            poll_until_indexed(gateway, ticket, key, evt_tx).await;
        }
        Err(error) => {
            tracing::warn!(%error, "write failed");
            let _ = evt_tx.send(RuntimeEvent::WriteFailed { ticket, error });
        }
    }
}

/// Check the written key on the [`IndexPollSchedule`], sleeping before each
/// check. Returns `true` once the indexer has it.
pub async fn poll_until_indexed(
    gateway: &dyn KvGateway,
    ticket: u64,
    key: KeyRef,
    evt_tx: &Sender<RuntimeEvent>,
) -> bool {
    for (index, delay) in IndexPollSchedule::default().enumerate() {
        tokio::time::sleep(delay).await;
        match gateway.get_value(&key).await {
            Ok(Some(_)) => {
                let _ = evt_tx.send(RuntimeEvent::WriteIndexed {
                    ticket,
                    location: WrittenLocation {
                        account: key.account,
                        contract: key.contract,
                        key: key.path,
                    },
                });
                return true;
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(error = %err, "indexer check failed, retrying"),
        }
        let _ = evt_tx.send(RuntimeEvent::IndexPending {
            ticket,
            attempt: index as u32 + 1,
        });
    }
    let _ = evt_tx.send(RuntimeEvent::IndexTimedOut { ticket });
    false
}

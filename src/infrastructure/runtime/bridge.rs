//! Runtime bridge - connects the sync TUI thread with the async Tokio runtime
//!
//! The UI thread owns all explorer state. It sends [`RuntimeCommand`]s and
//! drains [`RuntimeEvent`]s; every event echoes the ticket of the command
//! that produced it so the owner can drop results it no longer wants.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::domain::detail::{DetailRequest, SelectionTicket};
use crate::domain::feed::FeedRequest;
use crate::domain::tree::{TreeFetch, TreePayload, TreeTicket};
use crate::domain::write::{WriteSubmission, WrittenLocation};
use crate::infrastructure::api::{DiffRecord, HistoryPage, KvEntry, KvGateway};
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::infrastructure::wallet::{WalletConnector, WalletError};

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Populate the tree root or expand one node
    Tree(TreeFetch),
    /// Value/history, diff or writers for the selected key
    Detail(DetailRequest),
    /// Recent activity
    Feed(FeedRequest),
    /// Sign, send, then poll until indexed
    Write(WriteSubmission),
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TreeLoaded {
        ticket: TreeTicket,
        result: Result<TreePayload, String>,
    },
    ValueLoaded {
        ticket: SelectionTicket,
        result: Result<Option<KvEntry>, String>,
    },
    HistoryLoaded {
        ticket: SelectionTicket,
        result: Result<HistoryPage, String>,
    },
    DiffLoaded {
        ticket: SelectionTicket,
        block_a: u64,
        block_b: u64,
        result: Result<DiffRecord, String>,
    },
    WritersLoaded {
        ticket: SelectionTicket,
        result: Result<Vec<KvEntry>, String>,
    },
    FeedLoaded {
        ticket: u64,
        result: Result<Vec<KvEntry>, String>,
    },
    /// The wallet accepted and sent the call
    WriteSigned {
        ticket: u64,
        tx_hash: Option<String>,
    },
    WriteFailed {
        ticket: u64,
        error: WalletError,
    },
    /// An indexer check came back empty
    IndexPending { ticket: u64, attempt: u32 },
    WriteIndexed {
        ticket: u64,
        location: WrittenLocation,
    },
    IndexTimedOut { ticket: u64 },
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    pub fn new(
        gateway: Arc<dyn KvGateway>,
        wallet: Arc<dyn WalletConnector>,
    ) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("kvgarden-worker".into())
            .spawn(move || {
                runtime.block_on(async {
                    if let Err(err) = run_async_worker(gateway, wallet, cmd_rx, evt_tx.clone()).await
                    {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}

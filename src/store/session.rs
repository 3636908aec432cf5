use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::domain::write::PendingWrite;

const PENDING_WRITE: &str = "pending_write";
const WALLET_SESSION: &str = "wallet_session";
const VIEW_STATE: &str = "view_state";

/// Signed-in account and the contract the session was opened for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub account_id: String,
    pub contract: String,
}

/// Single-row slots that survive a restart
#[derive(Debug)]
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    // === Pending write ===

    pub fn save_pending(&self, pending: &PendingWrite) -> Result<()> {
        let json = serde_json::to_string(pending).context("encode pending write")?;
        self.put(PENDING_WRITE, &json)
    }

    /// Read and delete the snapshot in one step. A corrupt snapshot counts
    /// as nothing to restore; it is deleted all the same.
    pub fn take_pending(&self) -> Result<Option<PendingWrite>> {
        let tx = self.conn.unchecked_transaction()?;
        let raw: Option<String> = tx
            .query_row(
                "SELECT value FROM slots WHERE name = ?1",
                params![PENDING_WRITE],
                |row| row.get(0),
            )
            .optional()?;
        tx.execute("DELETE FROM slots WHERE name = ?1", params![PENDING_WRITE])?;
        tx.commit()?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(pending) => Ok(Some(pending)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding corrupt pending write");
                Ok(None)
            }
        }
    }

    pub fn clear_pending(&self) -> Result<()> {
        self.delete(PENDING_WRITE)
    }

    // === Wallet session ===

    pub fn save_wallet(&self, session: &WalletSession) -> Result<()> {
        let json = serde_json::to_string(session).context("encode wallet session")?;
        self.put(WALLET_SESSION, &json)
    }

    pub fn load_wallet(&self) -> Result<Option<WalletSession>> {
        Ok(self
            .get(WALLET_SESSION)?
            .and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    pub fn clear_wallet(&self) -> Result<()> {
        self.delete(WALLET_SESSION)
    }

    // === View state ===

    pub fn save_view(&self, view: &str) -> Result<()> {
        self.put(VIEW_STATE, view)
    }

    pub fn load_view(&self) -> Result<Option<String>> {
        self.get(VIEW_STATE)
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO slots(name, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
            params![name, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM slots WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                name       TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingWrite {
        PendingWrite {
            contract: "c.near".into(),
            batch_mode: true,
            key: None,
            value: None,
            batch_json: Some(r#"{"a":"1"}"#.into()),
        }
    }

    #[test]
    fn pending_write_is_consumed_once() {
        let store = SessionStore::open_in_memory().unwrap();
        store.save_pending(&pending()).unwrap();
        assert_eq!(store.take_pending().unwrap(), Some(pending()));
        assert_eq!(store.take_pending().unwrap(), None);
    }

    #[test]
    fn corrupt_pending_write_is_dropped_silently() {
        let store = SessionStore::open_in_memory().unwrap();
        store.put(PENDING_WRITE, "{not json").unwrap();
        assert_eq!(store.take_pending().unwrap(), None);
        assert_eq!(store.get(PENDING_WRITE).unwrap(), None);
    }

    #[test]
    fn slots_overwrite_in_place() {
        let store = SessionStore::open_in_memory().unwrap();
        store.save_view("contract=a.near").unwrap();
        store.save_view("contract=b.near").unwrap();
        assert_eq!(store.load_view().unwrap().as_deref(), Some("contract=b.near"));

        let session = WalletSession {
            account_id: "me.near".into(),
            contract: "c.near".into(),
        };
        store.save_wallet(&session).unwrap();
        assert_eq!(store.load_wallet().unwrap(), Some(session));
        store.clear_wallet().unwrap();
        assert_eq!(store.load_wallet().unwrap(), None);
    }
}

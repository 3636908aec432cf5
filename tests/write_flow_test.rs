//! Write flow: validation, wallet guard, pending-write restore and the
//! indexer poll, driven through the app and the worker.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{settle, temp_db, test_app, MockGateway, MockWallet};
use kvgarden::domain::nav::ViewMode;
use kvgarden::domain::write::{PendingWrite, ValidationError, WriteForm, WriteMode, WritePhase, WrittenLocation};
use kvgarden::infrastructure::api::KeyRef;
use kvgarden::infrastructure::runtime::{poll_until_indexed, RuntimeCommand, RuntimeEvent};
use kvgarden::infrastructure::wallet::WalletError;
use kvgarden::store::{SessionStore, WalletSession};

fn signed_in_app(store: Option<SessionStore>) -> kvgarden::app::App {
    let mut app = test_app(store);
    app.connect("alice.near");
    app.set_view(ViewMode::Write);
    app
}

#[test]
fn invalid_input_never_reaches_the_wallet() {
    let mut app = signed_in_app(None);
    app.take_commands();

    app.submit_write();
    assert_eq!(app.write.phase(), &WritePhase::Invalid(ValidationError::MissingKey));

    app.toggle_write_mode();
    app.submit_write();
    assert_eq!(app.write.phase(), &WritePhase::Invalid(ValidationError::EmptyBatch));

    app.write.form.batch_json = "{}".into();
    app.submit_write();
    assert_eq!(app.write.phase().status_line(), "enter key-value pairs as JSON");

    app.write.form.batch_json = "[1, 2]".into();
    app.submit_write();
    assert_eq!(app.write.phase(), &WritePhase::Invalid(ValidationError::NotAnObject));

    app.write.form.batch_json = r#"{"a": "x", "b": 1}"#.into();
    app.submit_write();
    assert_eq!(
        app.write.phase().status_line(),
        "value for \"b\" must be a string or null"
    );

    assert!(app.take_commands().is_empty());
}

#[test]
fn submitting_needs_a_wallet_for_the_same_contract() {
    let mut app = test_app(None);
    app.set_view(ViewMode::Write);
    app.write.form.key = "k".into();
    app.submit_write();
    assert_eq!(
        app.status_text().map(|(text, _)| text),
        Some("connect a wallet first (:connect <account>)")
    );

    app.connect("alice.near");
    assert_eq!(app.form.account, "alice.near");
    app.form.contract = "other.near".into();
    app.explore();
    app.set_view(ViewMode::Write);
    app.take_commands();

    app.submit_write();
    assert_eq!(
        app.status_text().map(|(text, _)| text),
        Some("wallet connected to contextual.near — reconnect for other.near")
    );
    assert_eq!(app.write.phase(), &WritePhase::Idle);
    assert!(app.take_commands().is_empty());
}

#[test]
fn batch_preview_counts_keys_in_input_order() {
    let mut app = signed_in_app(None);
    app.toggle_write_mode();
    app.write.form.batch_json = r#"{"z": "1", "a": null}"#.into();
    assert_eq!(
        app.write_preview(),
        "alice.near → contextual.near::__fastdata_kv({ 2 keys })"
    );

    app.submit_write();
    let commands = app.take_commands();
    let [RuntimeCommand::Write(submission)] = commands.as_slice() else {
        panic!("expected one write, got {commands:?}");
    };
    assert_eq!(submission.first_key, "z");
    assert_eq!(submission.args.get("a"), Some(&json!(null)));
    assert!(app.write.phase().is_busy());

    // a second submit while signing is ignored
    app.submit_write();
    assert!(app.take_commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn confirmed_write_links_to_the_written_key() {
    let path = temp_db("confirmed");
    let mut app = signed_in_app(Some(SessionStore::open(&path).unwrap()));
    app.take_commands();
    app.write.form.key = "profile/name".into();
    app.write.form.value = "Alice".into();

    app.submit_write();
    let probe = SessionStore::open(&path).unwrap();
    let pending = probe.take_pending().unwrap().expect("snapshot saved before signing");
    assert_eq!(pending.key.as_deref(), Some("profile/name"));
    assert_eq!(pending.contract, "contextual.near");

    let gateway = MockGateway {
        indexed_after: Some(4),
        ..MockGateway::default()
    };
    let wallet = MockWallet::signing("8Gx1tx");
    let started = tokio::time::Instant::now();
    let events = settle(&mut app, &gateway, &wallet).await;

    assert_eq!(started.elapsed().as_millis(), 2000 + 3000 + 4500 + 6750);
    let misses: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::IndexPending { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(misses, vec![1, 2, 3]);
    assert_eq!(app.write.phase(), &WritePhase::Confirmed);
    assert_eq!(app.last_tx.as_deref(), Some("8Gx1tx"));
    assert_eq!(
        app.write.written(),
        Some(&WrittenLocation {
            account: "alice.near".into(),
            contract: "contextual.near".into(),
            key: "profile/name".into(),
        })
    );
    assert_eq!(wallet.calls.lock().unwrap()[0].get("profile/name"), Some(&json!("Alice")));

    app.view_written_data();
    assert_eq!(app.nav.view_mode, ViewMode::Tree);
    assert_eq!(app.nav.key_prefix.as_deref(), Some("profile/name"));
    let _ = std::fs::remove_file(&path);
}

#[tokio::test(start_paused = true)]
async fn indexer_that_never_catches_up_times_out_softly() {
    let gateway = MockGateway {
        indexed_after: Some(100),
        ..MockGateway::default()
    };
    let (tx, rx) = std::sync::mpsc::channel();
    let started = tokio::time::Instant::now();

    let indexed = poll_until_indexed(&gateway, 7, KeyRef::new("alice.near", "c.near", "k"), &tx).await;

    assert!(!indexed);
    assert_eq!(started.elapsed().as_millis(), 2000 + 3000 + 4500 + 6750 + 8 * 10_000);
    drop(tx);
    let events: Vec<RuntimeEvent> = rx.into_iter().collect();
    assert_eq!(events.len(), 13);
    assert!(matches!(events.last(), Some(RuntimeEvent::IndexTimedOut { ticket: 7 })));

    let mut app = signed_in_app(None);
    app.write.form.key = "k".into();
    app.submit_write();
    let ticket = match app.take_commands().pop() {
        Some(RuntimeCommand::Write(submission)) => submission.ticket,
        other => panic!("expected a write, got {other:?}"),
    };
    app.apply_runtime_event(RuntimeEvent::WriteSigned { ticket, tx_hash: None });
    app.apply_runtime_event(RuntimeEvent::IndexTimedOut { ticket });
    assert_eq!(
        app.write.phase().status_line(),
        "indexing may take a moment — try exploring in a few seconds"
    );
    assert!(!app.write.phase().is_busy());
}

#[tokio::test]
async fn cancelled_signature_clears_the_pending_write() {
    let path = temp_db("cancelled");
    let mut app = signed_in_app(Some(SessionStore::open(&path).unwrap()));
    app.take_commands();
    app.write.form.key = "k".into();
    app.submit_write();

    let gateway = MockGateway::default();
    let wallet = MockWallet::failing(WalletError::from_message("User denied transaction signature"));
    settle(&mut app, &gateway, &wallet).await;

    assert_eq!(app.write.phase(), &WritePhase::Rejected);
    assert_eq!(app.write.phase().status_line(), "transaction cancelled");
    assert!(gateway.requests().is_empty());
    let probe = SessionStore::open(&path).unwrap();
    assert_eq!(probe.take_pending().unwrap(), None);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn pending_write_is_restored_before_anything_is_fetched() {
    let path = temp_db("restore");
    let seed = SessionStore::open(&path).unwrap();
    seed.save_wallet(&WalletSession {
        account_id: "alice.near".into(),
        contract: "c.near".into(),
    })
    .unwrap();
    let form = WriteForm {
        mode: WriteMode::Batch,
        batch_json: r#"{"a": "1"}"#.into(),
        ..WriteForm::default()
    };
    seed.save_pending(&PendingWrite::capture("c.near", &form)).unwrap();

    let mut app = test_app(Some(SessionStore::open(&path).unwrap()));
    app.bootstrap(None);

    assert!(app.take_commands().is_empty());
    assert_eq!(app.nav.view_mode, ViewMode::Write);
    assert_eq!(app.write.form, form);
    assert_eq!(app.target_contract().as_deref(), Some("c.near"));
    assert_eq!(app.write.phase(), &WritePhase::Idle);
    // consumed exactly once
    assert_eq!(seed.take_pending().unwrap(), None);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn pending_write_waits_for_a_wallet_session() {
    let path = temp_db("no-session");
    let seed = SessionStore::open(&path).unwrap();
    let form = WriteForm {
        key: "k".into(),
        value: "v".into(),
        ..WriteForm::default()
    };
    seed.save_pending(&PendingWrite::capture("c.near", &form)).unwrap();

    let mut app = test_app(Some(SessionStore::open(&path).unwrap()));
    app.bootstrap(None);

    assert_eq!(app.nav.view_mode, ViewMode::Tree);
    assert!(matches!(app.take_commands().as_slice(), [RuntimeCommand::Tree(_)]));
    assert!(seed.take_pending().unwrap().is_some());
    let _ = std::fs::remove_file(&path);
}

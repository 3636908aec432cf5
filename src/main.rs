use std::fs;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use kvgarden::app::{App, Field, Focus, InputMode, StatusLevel};
use kvgarden::config;
use kvgarden::core::{Action, NavigateTarget};
use kvgarden::domain::detail::DiffEnd;
use kvgarden::domain::nav::ViewMode;
use kvgarden::domain::write::WriteMode;
use kvgarden::infrastructure::api::{CallInspector, HttpGateway};
use kvgarden::infrastructure::runtime::RuntimeBridge;
use kvgarden::infrastructure::wallet::NearCliWallet;
use kvgarden::store::SessionStore;
use kvgarden::ui;

#[derive(Debug, Parser)]
#[command(
    name = "kvgarden",
    version,
    about = "kvgarden: a terminal explorer for NEAR FastKV data"
)]
struct Args {
    /// FastKV API base URL (e.g. https://kv.main.fastnear.com)
    #[arg(long)]
    api: Option<String>,

    /// Contract to explore on start
    #[arg(long)]
    contract: Option<String>,

    /// Account to explore on start
    #[arg(long)]
    account: Option<String>,

    /// View string to open, as produced by `:share`
    #[arg(long)]
    open: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = config::load();
    if let Some(api) = args.api.clone() {
        config.api_url = api;
    }
    if let Some(contract) = args.contract.clone() {
        config.default_contract = contract;
    }
    if let Some(account) = args.account.clone() {
        config.default_account = account;
    }

    init_logging();
    tracing::info!(api = %config.api_url, "starting");

    let store = open_session_store();
    let inspector = CallInspector::new();
    let gateway = HttpGateway::new(&config.api_url, inspector.clone())?;
    let wallet = NearCliWallet::new(config.near_cli.clone(), config.network.clone());
    let runtime = RuntimeBridge::new(Arc::new(gateway), Arc::new(wallet))?;

    let mut app = App::new(config, store, inspector)?;
    app.bootstrap(args.open.as_deref());

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the UI. Filter via `KVGARDEN_LOG`.
fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("kvgarden: cannot create {}: {err}", parent.display());
            return;
        }
    }
    let file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("kvgarden: logging disabled, cannot open {}: {err}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_env("KVGARDEN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init();
}

fn open_session_store() -> Option<SessionStore> {
    let path = config::session_db_path()?;
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(dir = %parent.display(), error = %err, "cannot create data directory");
        }
    }
    match SessionStore::open(&path).context("session store disabled") {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "running without a session store");
            None
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &mut app))?;
        if app.should_quit {
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for cmd in app.take_commands() {
        if let Err(err) = runtime.send(cmd) {
            app.set_status(format!("{err}"), StatusLevel::Error);
        }
    }
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }
    if let Some(text) = app.take_copy_request() {
        copy_to_clipboard(app, text);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Edit(field) => handle_edit_mode(app, key, field),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => return app.apply_action(Action::Quit),
        KeyCode::Char('?') => {
            app.help_open = true;
            return;
        }
        KeyCode::Char(':') => return app.enter_command(),
        KeyCode::Esc => {
            app.dismiss_status();
            app.focus = Focus::Tree;
            return;
        }
        KeyCode::Char('1') => return app.set_view(ViewMode::Tree),
        KeyCode::Char('2') => return app.set_view(ViewMode::Json),
        KeyCode::Char('3') => return app.set_view(ViewMode::Feed),
        KeyCode::Char('4') => return app.set_view(ViewMode::Write),
        KeyCode::Char('c') => return app.begin_edit(Field::Contract),
        KeyCode::Char('a') => return app.begin_edit(Field::Account),
        KeyCode::Char('/') => return app.begin_edit(Field::Query),
        KeyCode::Char('C') => return app.toggle_all_contracts(),
        KeyCode::Char('A') => return app.toggle_all_accounts(),
        KeyCode::Char('e') | KeyCode::Char('r') => return app.apply_action(Action::Explore),
        KeyCode::Char('i') => {
            app.inspector_open = !app.inspector_open;
            return;
        }
        KeyCode::Char('s') => {
            let view = app.view_string().to_string();
            return app.apply_action(Action::Copy(view));
        }
        _ => {}
    }

    match app.nav.view_mode {
        ViewMode::Tree | ViewMode::Json if key.code == KeyCode::Backspace => {
            let depth = app.nav.breadcrumb.len();
            if depth > 1 {
                app.apply_action(Action::Navigate(NavigateTarget::Crumb(depth - 2)));
            }
        }
        ViewMode::Tree if app.focus == Focus::Detail => handle_detail_keys(app, key),
        ViewMode::Tree => handle_tree_keys(app, key),
        ViewMode::Feed => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.feed.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => app.feed.move_cursor(false),
            KeyCode::Enter => app.open_feed_entry(),
            _ => {}
        },
        ViewMode::Write => match key.code {
            KeyCode::Char('k') if app.write.form.mode == WriteMode::Single => {
                app.begin_edit(Field::WriteKey)
            }
            KeyCode::Char('v') if app.write.form.mode == WriteMode::Single => {
                app.begin_edit(Field::WriteValue)
            }
            KeyCode::Char('b') if app.write.form.mode == WriteMode::Batch => {
                app.begin_edit(Field::WriteBatch)
            }
            KeyCode::Char('m') => app.toggle_write_mode(),
            KeyCode::Enter => app.submit_write(),
            KeyCode::Char('o') => app.view_written_data(),
            _ => {}
        },
        ViewMode::Json => {}
    }
}

fn handle_tree_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_tree_cursor(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_tree_cursor(false),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.activate_tree_row(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('g') => app.go_selected(),
        KeyCode::Tab => app.focus = Focus::Detail,
        _ => {}
    }
}

fn handle_detail_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_history_cursor(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_history_cursor(false),
        KeyCode::Char('d') => app.request_diff(),
        KeyCode::Char('[') => app.step_diff(DiffEnd::A, true),
        KeyCode::Char(']') => app.step_diff(DiffEnd::A, false),
        KeyCode::Char('{') => app.step_diff(DiffEnd::B, true),
        KeyCode::Char('}') => app.step_diff(DiffEnd::B, false),
        KeyCode::Char('w') => app.request_writers(),
        KeyCode::Char('y') => app.copy_detail(false),
        KeyCode::Char('Y') => app.copy_detail(true),
        KeyCode::Tab | KeyCode::Char('h') | KeyCode::Left => app.focus = Focus::Tree,
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_edit_mode(app: &mut App, key: KeyEvent, field: Field) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => {
            app.field_mut(field).pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.field_mut(field).push(ch);
        }
        _ => {}
    }
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(text.clone()).is_ok() {
                let shown = if text.chars().count() > 40 {
                    format!("{}...", text.chars().take(40).collect::<String>())
                } else {
                    text
                };
                app.set_status(format!("Copied: {shown}"), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "clipboard unavailable");
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}

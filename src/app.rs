//! Application state owner
//!
//! [`App`] is the single logical owner of navigation state, the tree, the
//! detail panel, the feed and the write flow. It never performs I/O itself:
//! requests are queued in an outbox drained by the terminal loop, and
//! results come back through [`App::apply_runtime_event`].

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::core::{Action, Command, NavigateTarget, NotifyLevel};
use crate::domain::detail::{DetailPanel, DiffEnd};
use crate::domain::feed::FeedPanel;
use crate::domain::nav::{normalize_prefix, AccountScope, HashRoute, HashSync, NavigationState, ViewMode};
use crate::domain::tree::{ExploreScope, ExplorerTree, FetchTarget, NodeLink, TreeRow, TreeStatus};
use crate::domain::write::{WriteController, WriteMode};
use crate::infrastructure::api::{curl_get, CallInspector, Endpoints};
use crate::infrastructure::runtime::{RuntimeCommand, RuntimeEvent};
use crate::infrastructure::wallet::is_valid_account_id;
use crate::store::{SessionStore, WalletSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Detail,
}

/// Form inputs that can be edited in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Contract,
    Account,
    Query,
    WriteKey,
    WriteValue,
    WriteBatch,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Contract => "contract",
            Field::Account => "account",
            Field::Query => "key",
            Field::WriteKey => "write key",
            Field::WriteValue => "write value",
            Field::WriteBatch => "batch json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Edit(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Explore form as typed; [`App::explore`] turns it into navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreForm {
    pub contract: String,
    pub account: String,
    pub query: String,
    pub all_accounts: bool,
    pub all_contracts: bool,
}

impl ExploreForm {
    fn set_account(&mut self, account: &str) {
        self.account = account.to_string();
        self.all_accounts = false;
    }
}

#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub form: ExploreForm,
    pub nav: NavigationState,
    pub tree: ExplorerTree,
    pub detail: DetailPanel,
    pub feed: FeedPanel,
    pub write: WriteController,
    pub wallet: Option<WalletSession>,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub tree_cursor: usize,
    pub status: Option<StatusMessage>,
    pub inspector_open: bool,
    pub help_open: bool,
    pub last_tx: Option<String>,
    pub should_quit: bool,
    hash: HashSync,
    endpoints: Endpoints,
    inspector: CallInspector,
    store: Option<SessionStore>,
    tree_generation: u64,
    outbox: Vec<RuntimeCommand>,
    pending_copy: Option<String>,
}

impl App {
    pub fn new(config: Config, store: Option<SessionStore>, inspector: CallInspector) -> anyhow::Result<Self> {
        let endpoints = Endpoints::new(&config.api_url)?;
        let form = ExploreForm {
            contract: config.default_contract.clone(),
            account: config.default_account.clone(),
            ..ExploreForm::default()
        };
        Ok(Self {
            config,
            form,
            nav: NavigationState::default(),
            tree: ExplorerTree::default(),
            detail: DetailPanel::new(),
            feed: FeedPanel::default(),
            write: WriteController::default(),
            wallet: None,
            focus: Focus::Tree,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            tree_cursor: 0,
            status: None,
            inspector_open: false,
            help_open: false,
            last_tx: None,
            should_quit: false,
            hash: HashSync::default(),
            endpoints,
            inspector,
            store,
            tree_generation: 0,
            outbox: Vec::new(),
            pending_copy: None,
        })
    }

    /// First load. A write left pending by the previous run is restored
    /// before anything is fetched; otherwise the view string given on the
    /// command line (or the last one pushed) is opened.
    pub fn bootstrap(&mut self, open: Option<&str>) {
        self.wallet = self.with_store(|store| store.load_wallet()).flatten();
        if self.wallet.is_some() && self.restore_pending_write() {
            return;
        }

        let initial = open
            .map(str::to_string)
            .or_else(|| self.with_store(|store| store.load_view()).flatten());
        match initial.as_deref().and_then(HashRoute::decode) {
            Some(route) => self.apply_route(route),
            None => self.explore(),
        }
    }

    /// Consume the pending-write slot. Returns `true` when a snapshot was
    /// put back into the write form.
    pub fn restore_pending_write(&mut self) -> bool {
        let Some(pending) = self.with_store(|store| store.take_pending()).flatten() else {
            return false;
        };
        tracing::info!(contract = %pending.contract, "restoring pending write");
        self.write.restore(&pending);
        self.form.contract = pending.contract.clone();
        self.form.all_contracts = false;
        self.nav.contract_id = Some(pending.contract);
        self.nav.view_mode = ViewMode::Write;
        self.push_hash();
        self.set_status("restored unsent write, review and submit again", StatusLevel::Info);
        true
    }

    // === Status ===

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    /// Info messages fade; warnings and errors stay until dismissed.
    pub fn on_tick(&mut self) {
        self.hash.settle();
        if let Some(status) = self.status.as_ref() {
            if status.level == StatusLevel::Info && status.since.elapsed() > Duration::from_secs(3) {
                self.status = None;
            }
        }
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    // === Outbox ===

    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_copy_request(&mut self) -> Option<String> {
        self.pending_copy.take()
    }

    // === Navigation ===

    /// Current view string
    pub fn view_string(&self) -> &str {
        self.hash.current()
    }

    /// Publish the current state as a view string and remember it.
    pub fn push_hash(&mut self) {
        let route = HashRoute::from_state(&self.nav, &self.write.form.key, &self.write.form.value);
        let encoded = route.encode();
        if self.hash.push(encoded.clone()) {
            self.with_store(|store| store.save_view(&encoded));
        }
    }

    /// A view string arrived from outside (`:open`, command line).
    pub fn open_view(&mut self, raw: &str) {
        match self.hash.on_hash_change(raw) {
            Some(route) => self.apply_route(route),
            None if raw.trim().trim_start_matches('#').is_empty() => {
                self.set_status("empty view string", StatusLevel::Warn);
            }
            None => {}
        }
    }

    fn apply_route(&mut self, route: HashRoute) {
        match route {
            HashRoute::Write {
                contract,
                key,
                value,
            } => {
                match &contract {
                    Some(contract) => {
                        self.form.contract = contract.clone();
                        self.form.all_contracts = false;
                    }
                    None => self.form.all_contracts = true,
                }
                if let Some(key) = key {
                    self.write.form.mode = WriteMode::Single;
                    self.write.form.key = key;
                }
                if let Some(value) = value {
                    self.write.form.value = value;
                }
                self.nav.contract_id = contract;
                self.nav.view_mode = ViewMode::Write;
                self.push_hash();
            }
            HashRoute::Explore(state) => {
                match &state.contract_id {
                    Some(contract) => {
                        self.form.contract = contract.clone();
                        self.form.all_contracts = false;
                    }
                    None => self.form.all_contracts = true,
                }
                match &state.account_scope {
                    AccountScope::Single(account) => self.form.set_account(account),
                    AccountScope::All => {
                        self.form.account.clear();
                        self.form.all_accounts = true;
                    }
                    AccountScope::None => {
                        self.form.account.clear();
                        self.form.all_accounts = false;
                    }
                }
                self.form.query = state.query_text();
                let view = state.view_mode;
                self.nav = state;
                if view == ViewMode::Feed {
                    self.load_feed();
                    self.push_hash();
                } else {
                    self.explore();
                }
            }
        }
    }

    /// Turn the form into navigation state and start a fresh tree. The old
    /// tree is dropped; anything still in flight for it is ignored.
    pub fn explore(&mut self) {
        self.nav.contract_id = if self.form.all_contracts {
            None
        } else {
            Some(self.form.contract.trim().to_string()).filter(|c| !c.is_empty())
        };
        self.nav.account_scope = AccountScope::from_input(self.form.all_accounts, &self.form.account);
        self.nav.key_prefix = normalize_prefix(&self.form.query);
        self.nav.rebuild_breadcrumb();
        if matches!(self.nav.view_mode, ViewMode::Feed | ViewMode::Write) {
            self.nav.view_mode = ViewMode::Tree;
        }

        self.tree_generation += 1;
        let scope = ExploreScope::from_nav(&self.nav);
        tracing::info!(?scope, generation = self.tree_generation, "explore");
        let (tree, fetch) = ExplorerTree::explore(scope, self.tree_generation);
        self.tree = tree;
        self.tree_cursor = 0;
        self.detail.clear();
        self.focus = Focus::Tree;
        self.outbox.push(RuntimeCommand::Tree(fetch));
        self.push_hash();
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        if mode == self.nav.view_mode {
            return;
        }
        self.nav.view_mode = mode;
        if mode == ViewMode::Feed {
            self.load_feed();
        }
        self.push_hash();
    }

    fn load_feed(&mut self) {
        let Some(contract) = self.nav.contract_id.clone() else {
            self.set_status("pick a contract to see its feed", StatusLevel::Warn);
            return;
        };
        let request = self
            .feed
            .load(self.nav.account(), &contract, self.config.timeline_limit);
        self.outbox.push(RuntimeCommand::Feed(request));
    }

    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(target) => self.navigate(target),
            Action::SetView(mode) => self.set_view(mode),
            Action::Explore => self.explore(),
            Action::Copy(text) => {
                self.pending_copy = Some(text);
            }
            Action::Notify(msg, level) => {
                let level = match level {
                    NotifyLevel::Info => StatusLevel::Info,
                    NotifyLevel::Warn => StatusLevel::Warn,
                    NotifyLevel::Error => StatusLevel::Error,
                };
                self.set_status(msg, level);
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn navigate(&mut self, target: NavigateTarget) {
        match target {
            NavigateTarget::Root => {
                self.form.query.clear();
                self.explore();
            }
            NavigateTarget::Crumb(index) => {
                let segments: Vec<String> = self.nav.breadcrumb.iter().take(index + 1).cloned().collect();
                let Some((account, rest)) = segments.split_first() else {
                    return self.navigate(NavigateTarget::Root);
                };
                self.form.set_account(account);
                self.form.query = if rest.is_empty() {
                    String::new()
                } else {
                    format!("{}/**", rest.join("/"))
                };
                self.explore();
            }
            NavigateTarget::Contract(contract) => {
                self.form.contract = contract;
                self.form.all_contracts = false;
                self.form.account.clear();
                self.form.all_accounts = true;
                self.form.query.clear();
                self.explore();
            }
            NavigateTarget::Account { account, contract } => {
                self.form.contract = contract;
                self.form.all_contracts = false;
                self.form.set_account(&account);
                self.form.query.clear();
                self.explore();
            }
            NavigateTarget::Key { account, key } => {
                self.form.set_account(&account);
                self.form.query = if key.is_empty() {
                    String::new()
                } else {
                    format!("{key}/**")
                };
                self.nav.view_mode = ViewMode::Tree;
                self.explore();
            }
            NavigateTarget::View(raw) => self.open_view(&raw),
        }
    }

    // === Commands ===

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        self.exit_command();
        if input.is_empty() {
            return;
        }
        let cmd = crate::core::parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
        self.command.last = Some(input);
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Contract(Some(contract)) => {
                self.form.contract = contract.clone();
                self.form.all_contracts = false;
                Action::Explore
            }
            Command::Contract(None) => Action::Notify(
                format!("contract: {}", self.nav.contract_id.as_deref().unwrap_or("(all)")),
                NotifyLevel::Info,
            ),
            Command::Account(Some(account)) => {
                self.form.set_account(account);
                Action::Explore
            }
            Command::Account(None) => {
                self.form.set_account("");
                Action::Explore
            }
            Command::Key(query) => {
                self.form.query = query.clone().unwrap_or_default();
                Action::Explore
            }
            Command::AllAccounts => {
                self.form.all_accounts = true;
                Action::Explore
            }
            Command::AllContracts => {
                self.form.all_contracts = true;
                Action::Explore
            }
            Command::View(mode) => Action::SetView(*mode),
            Command::Open(raw) => Action::Navigate(NavigateTarget::View(raw.clone())),
            Command::Diff(a, b) => match self.detail.request_diff_between(*a, *b) {
                Some(request) => {
                    self.outbox.push(RuntimeCommand::Detail(request));
                    Action::None
                }
                None => Action::Notify("select a key first".into(), NotifyLevel::Warn),
            },
            Command::Writers => {
                self.request_writers();
                Action::None
            }
            Command::Connect(account) => {
                self.connect(account);
                Action::None
            }
            Command::Disconnect => {
                self.disconnect();
                Action::None
            }
            Command::Curl => match self.inspector.last() {
                Some(record) => Action::Copy(record.to_curl()),
                None => Action::Notify("no API call yet".into(), NotifyLevel::Warn),
            },
            Command::Share => Action::Copy(self.hash.current().to_string()),
            Command::Quit => Action::Quit,
            Command::Unknown(s) => Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn),
        }
    }

    // === Form editing ===

    pub fn begin_edit(&mut self, field: Field) {
        self.input_mode = InputMode::Edit(field);
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Contract => &mut self.form.contract,
            Field::Account => &mut self.form.account,
            Field::Query => &mut self.form.query,
            Field::WriteKey => &mut self.write.form.key,
            Field::WriteValue => &mut self.write.form.value,
            Field::WriteBatch => &mut self.write.form.batch_json,
        }
    }

    /// Enter in an edit field: explore fields re-explore, write fields
    /// republish the view string.
    pub fn commit_edit(&mut self) {
        let InputMode::Edit(field) = self.input_mode else {
            return;
        };
        self.input_mode = InputMode::Normal;
        match field {
            Field::Contract => {
                self.form.all_contracts = false;
                self.explore();
            }
            Field::Account => {
                self.form.all_accounts = false;
                self.explore();
            }
            Field::Query => self.explore(),
            Field::WriteKey | Field::WriteValue | Field::WriteBatch => self.push_hash(),
        }
    }

    pub fn toggle_all_accounts(&mut self) {
        self.form.all_accounts = !self.form.all_accounts;
    }

    pub fn toggle_all_contracts(&mut self) {
        self.form.all_contracts = !self.form.all_contracts;
    }

    pub fn toggle_write_mode(&mut self) {
        if self.write.phase().is_busy() {
            return;
        }
        self.write.form.mode = match self.write.form.mode {
            WriteMode::Single => WriteMode::Batch,
            WriteMode::Batch => WriteMode::Single,
        };
    }

    // === Tree ===

    pub fn visible_rows(&self) -> Vec<TreeRow> {
        self.tree.visible_rows()
    }

    pub fn move_tree_cursor(&mut self, down: bool) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.tree_cursor = 0;
            return;
        }
        self.tree_cursor = if down {
            (self.tree_cursor + 1).min(len - 1)
        } else {
            self.tree_cursor.saturating_sub(1)
        };
    }

    fn selected_node(&self) -> Option<usize> {
        match self.visible_rows().get(self.tree_cursor) {
            Some(TreeRow::Node { id, .. }) => Some(*id),
            _ => None,
        }
    }

    /// Enter on a tree row: branches toggle, leaves load the detail panel.
    pub fn activate_tree_row(&mut self) {
        let Some(id) = self.selected_node() else {
            return;
        };
        let is_branch = self.tree.node(id).is_some_and(|node| node.is_branch());
        if is_branch {
            if let Some(fetch) = self.tree.toggle(id) {
                self.outbox.push(RuntimeCommand::Tree(fetch));
            }
            return;
        }
        if let Some(key) = self.tree.key_ref(id) {
            let preview = self.tree.leaf_value(id).cloned();
            let request = self.detail.select(key, preview, self.config.history_limit);
            self.outbox.push(RuntimeCommand::Detail(request));
            self.focus = Focus::Detail;
        }
    }

    pub fn collapse_selected(&mut self) {
        if let Some(id) = self.selected_node() {
            self.tree.collapse(id);
        }
    }

    /// "go" on a contract, an account or an account-like key
    pub fn go_selected(&mut self) {
        let Some(link) = self.selected_node().and_then(|id| self.tree.link(id)) else {
            return;
        };
        let target = match link {
            NodeLink::Contract(contract) => NavigateTarget::Contract(contract),
            NodeLink::Account { account, contract } => NavigateTarget::Account { account, contract },
        };
        self.navigate(target);
    }

    /// Pretty JSON of the loaded tree for the JSON view
    pub fn json_text(&self) -> String {
        match self.tree.status() {
            TreeStatus::Loading => "loading...".to_string(),
            TreeStatus::Ready => serde_json::to_string_pretty(&self.tree.to_json()).unwrap_or_default(),
            _ => "no data".to_string(),
        }
    }

    // === Detail ===

    pub fn request_diff(&mut self) {
        match self.detail.request_diff() {
            Some(request) => self.outbox.push(RuntimeCommand::Detail(request)),
            None => self.set_status("no versions to diff", StatusLevel::Warn),
        }
    }

    pub fn step_diff(&mut self, end: DiffEnd, older: bool) {
        self.detail.step_diff_endpoint(end, older);
    }

    pub fn request_writers(&mut self) {
        match self.detail.request_writers(self.config.writers_limit) {
            Some(request) => self.outbox.push(RuntimeCommand::Detail(request)),
            None => self.set_status("select a key first", StatusLevel::Warn),
        }
    }

    pub fn move_history_cursor(&mut self, down: bool) {
        let len = self.detail.history().ready().map_or(0, |page| page.entries.len());
        if len == 0 {
            return;
        }
        let next = match (self.detail.history_cursor(), down) {
            (None, true) => Some(0),
            (None, false) => None,
            (Some(i), true) => Some((i + 1).min(len - 1)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };
        match next {
            Some(index) => {
                self.detail.show_history_entry(index);
            }
            None => self.detail.show_current(),
        }
    }

    /// URL of the request behind the focused detail pane
    pub fn detail_url(&self) -> Option<String> {
        let key = self.detail.key()?;
        let url = match self.detail.diff().ready() {
            Some(diff) => self.endpoints.diff(key, diff.block_a, diff.block_b),
            None if self.detail.history_cursor().is_some() => {
                self.endpoints.history(key, self.config.history_limit)
            }
            None => self.endpoints.get(key),
        };
        Some(url.to_string())
    }

    pub fn copy_detail(&mut self, as_curl: bool) {
        match self.detail_url() {
            Some(url) => {
                let text = if as_curl { curl_get(&url) } else { url };
                self.apply_action(Action::Copy(text));
            }
            None => self.set_status("select a key first", StatusLevel::Warn),
        }
    }

    // === Feed ===

    pub fn open_feed_entry(&mut self) {
        if let Some(target) = self.feed.selected_target() {
            self.navigate(NavigateTarget::Key {
                account: target.account,
                key: target.key,
            });
        }
    }

    // === Wallet & writes ===

    /// Contract a write goes to
    pub fn target_contract(&self) -> Option<String> {
        self.nav
            .contract_id
            .clone()
            .or_else(|| Some(self.form.contract.trim().to_string()).filter(|c| !c.is_empty()))
    }

    pub fn connect(&mut self, account: &str) {
        let account = account.trim();
        if !is_valid_account_id(account) {
            self.set_status(format!("invalid account id: {account}"), StatusLevel::Error);
            return;
        }
        let contract = self
            .target_contract()
            .unwrap_or_else(|| self.config.default_contract.clone());
        let session = WalletSession {
            account_id: account.to_string(),
            contract,
        };
        self.with_store(|store| store.save_wallet(&session));
        tracing::info!(account, contract = %session.contract, "wallet connected");
        self.wallet = Some(session);

        let account_input = self.form.account.trim();
        if account_input.is_empty() || account_input == self.config.default_account {
            self.form.set_account(account);
        }
        self.set_status(format!("connected as {account}"), StatusLevel::Info);
    }

    pub fn disconnect(&mut self) {
        self.with_store(|store| store.clear_wallet());
        self.wallet = None;
        if self.nav.view_mode == ViewMode::Write {
            self.set_view(ViewMode::Tree);
        }
        self.set_status("wallet disconnected", StatusLevel::Info);
    }

    /// `signed → contract::__fastdata_kv(...)`
    pub fn write_preview(&self) -> String {
        let contract = self.target_contract().unwrap_or_default();
        self.write
            .form
            .preview_line(self.wallet.as_ref().map(|w| w.account_id.as_str()), &contract)
    }

    pub fn submit_write(&mut self) {
        if self.write.phase().is_busy() {
            return;
        }
        let Some(session) = self.wallet.clone() else {
            self.set_status("connect a wallet first (:connect <account>)", StatusLevel::Warn);
            return;
        };
        let Some(contract) = self.target_contract() else {
            self.set_status("pick a contract to write to", StatusLevel::Warn);
            return;
        };
        if session.contract != contract {
            self.set_status(
                format!(
                    "wallet connected to {} — reconnect for {}",
                    session.contract, contract
                ),
                StatusLevel::Warn,
            );
            return;
        }
        let Ok(submission) = self.write.submit(&session.account_id, &contract) else {
            return;
        };
        // persisted before the wallet sees the call
        self.with_store(|store| store.save_pending(&submission.snapshot));
        self.outbox.push(RuntimeCommand::Write(submission));
    }

    pub fn view_written_data(&mut self) {
        if let Some(location) = self.write.written().cloned() {
            self.navigate(NavigateTarget::Key {
                account: location.account,
                key: location.key,
            });
        }
    }

    // === Runtime events ===

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::TreeLoaded { ticket, result } => {
                let failed_root = ticket.target == FetchTarget::Root && result.is_err();
                if self.tree.apply(ticket, result) && failed_root {
                    let text = if self.nav.is_contract_discovery() {
                        "Failed to fetch contracts"
                    } else {
                        "Failed to fetch data"
                    };
                    self.set_status(format!("{text} (r to retry)"), StatusLevel::Error);
                }
                self.clamp_tree_cursor();
            }
            RuntimeEvent::ValueLoaded { ticket, result } => {
                self.detail.apply_value(ticket, result);
            }
            RuntimeEvent::HistoryLoaded { ticket, result } => {
                self.detail.apply_history(ticket, result);
            }
            RuntimeEvent::DiffLoaded {
                ticket,
                block_a,
                block_b,
                result,
            } => {
                self.detail.apply_diff(ticket, block_a, block_b, result);
            }
            RuntimeEvent::WritersLoaded { ticket, result } => {
                self.detail.apply_writers(ticket, result);
            }
            RuntimeEvent::FeedLoaded { ticket, result } => {
                self.feed.apply(ticket, result);
            }
            RuntimeEvent::WriteSigned { ticket, tx_hash } => {
                if self.write.on_signed(ticket) {
                    self.with_store(|store| store.clear_pending());
                    self.last_tx = tx_hash;
                }
            }
            RuntimeEvent::WriteFailed { ticket, error } => {
                if self.write.on_wallet_error(ticket, &error) {
                    self.with_store(|store| store.clear_pending());
                }
            }
            RuntimeEvent::IndexPending { ticket, attempt } => {
                self.write.on_poll_miss(ticket, attempt);
            }
            RuntimeEvent::WriteIndexed { ticket, location } => {
                self.write.on_indexed(ticket, location);
            }
            RuntimeEvent::IndexTimedOut { ticket } => {
                self.write.on_timed_out(ticket);
            }
            RuntimeEvent::Error { message } => self.set_status(message, StatusLevel::Error),
        }
    }

    pub fn inspector_summary(&self) -> Option<String> {
        self.inspector
            .last()
            .map(|record| record.summary(&self.endpoints.origin()))
    }

    fn clamp_tree_cursor(&mut self) {
        let len = self.visible_rows().len();
        if self.tree_cursor >= len {
            self.tree_cursor = len.saturating_sub(1);
        }
    }

    /// Run a store operation; failures are logged, never fatal.
    fn with_store<T>(&self, op: impl FnOnce(&SessionStore) -> anyhow::Result<T>) -> Option<T> {
        let store = self.store.as_ref()?;
        match op(store) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, "session store");
                None
            }
        }
    }
}

//! Navigation state and its shareable view-string form
//!
//! The view string is a flat `application/x-www-form-urlencoded` list,
//! the same shape a browser keeps in a URL fragment, so links stay
//! portable between the terminal and the web explorer.

use reqwest::Url;

const HASH_BASE: &str = "kvgarden://view/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Tree,
    Json,
    Write,
    Feed,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Tree,
        ViewMode::Json,
        ViewMode::Feed,
        ViewMode::Write,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Tree => "tree",
            ViewMode::Json => "json",
            ViewMode::Write => "write",
            ViewMode::Feed => "feed",
        }
    }

    /// Unknown names fall back to the tree view
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => ViewMode::Json,
            "write" => ViewMode::Write,
            "feed" => ViewMode::Feed,
            _ => ViewMode::Tree,
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            ViewMode::Tree => '1',
            ViewMode::Json => '2',
            ViewMode::Feed => '3',
            ViewMode::Write => '4',
        }
    }
}

/// Which accounts a request is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountScope {
    Single(String),
    /// Every account that wrote under the contract
    All,
    /// Account explicitly cleared without asking for all accounts
    None,
}

impl AccountScope {
    /// Scope from the form inputs; the all-accounts toggle always wins.
    pub fn from_input(all_accounts: bool, account: &str) -> Self {
        let account = account.trim();
        if all_accounts {
            AccountScope::All
        } else if account.is_empty() {
            AccountScope::None
        } else {
            AccountScope::Single(account.to_string())
        }
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            AccountScope::Single(account) => Some(account),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// `None` means contract discovery
    pub contract_id: Option<String>,
    pub account_scope: AccountScope,
    /// Stored without the trailing wildcard
    pub key_prefix: Option<String>,
    pub view_mode: ViewMode,
    pub breadcrumb: Vec<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            contract_id: None,
            account_scope: AccountScope::All,
            key_prefix: None,
            view_mode: ViewMode::Tree,
            breadcrumb: Vec::new(),
        }
    }
}

impl NavigationState {
    pub fn is_contract_discovery(&self) -> bool {
        self.contract_id.is_none()
    }

    pub fn account(&self) -> Option<&str> {
        self.account_scope.account()
    }

    /// Key prefix as typed in the query box (`foo/**`), or empty
    pub fn query_text(&self) -> String {
        self.key_prefix
            .as_deref()
            .map(|prefix| format!("{prefix}/**"))
            .unwrap_or_default()
    }

    pub fn rebuild_breadcrumb(&mut self) {
        self.breadcrumb = breadcrumb_for(self.account(), self.key_prefix.as_deref());
    }
}

/// `[account, ...key segments]`, dropping empty segments
pub fn breadcrumb_for(account: Option<&str>, key: Option<&str>) -> Vec<String> {
    let mut crumbs = Vec::new();
    if let Some(account) = account.filter(|a| !a.is_empty()) {
        crumbs.push(account.to_string());
    }
    if let Some(key) = key {
        crumbs.extend(key.split('/').filter(|s| !s.is_empty()).map(str::to_string));
    }
    crumbs
}

/// Drop a trailing `*` run and the `/` before it: `foo/**` and `foo` name
/// the same prefix.
pub fn strip_wildcard(input: &str) -> &str {
    let trimmed = input.trim();
    let without_stars = trimmed.trim_end_matches('*');
    if without_stars.len() == trimmed.len() {
        return trimmed;
    }
    without_stars.strip_suffix('/').unwrap_or(without_stars)
}

/// Key prefix from raw query text; empty means "whole account"
pub fn normalize_prefix(input: &str) -> Option<String> {
    let stripped = strip_wildcard(input);
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// A decoded view string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashRoute {
    Explore(NavigationState),
    Write {
        contract: Option<String>,
        key: Option<String>,
        value: Option<String>,
    },
}

impl HashRoute {
    /// Route for the current state; write mode carries the single-key draft.
    pub fn from_state(nav: &NavigationState, draft_key: &str, draft_value: &str) -> Self {
        if nav.view_mode == ViewMode::Write {
            return HashRoute::Write {
                contract: nav.contract_id.clone(),
                key: (!draft_key.is_empty()).then(|| draft_key.to_string()),
                value: (!draft_value.is_empty()).then(|| draft_value.to_string()),
            };
        }
        HashRoute::Explore(nav.clone())
    }

    pub fn encode(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        match self {
            HashRoute::Write {
                contract,
                key,
                value,
            } => {
                pairs.push(("view", "write".to_string()));
                pairs.push(("contract", contract.clone().unwrap_or_default()));
                if let Some(key) = key.as_deref().filter(|k| !k.is_empty()) {
                    pairs.push(("key", key.to_string()));
                }
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    pairs.push(("value", value.to_string()));
                }
            }
            HashRoute::Explore(nav) => {
                if let Some(contract) = &nav.contract_id {
                    pairs.push(("contract", contract.clone()));
                }
                match &nav.account_scope {
                    AccountScope::Single(account) => pairs.push(("account", account.clone())),
                    AccountScope::None => pairs.push(("account", String::new())),
                    AccountScope::All => {}
                }
                if let Some(key) = nav.key_prefix.as_deref().map(strip_wildcard) {
                    if !key.is_empty() {
                        pairs.push(("key", key.to_string()));
                    }
                }
                if nav.view_mode != ViewMode::Tree {
                    pairs.push(("view", nav.view_mode.as_str().to_string()));
                }
                if nav.contract_id.is_none() {
                    pairs.push(("allContracts", "1".to_string()));
                }
                if nav.account_scope == AccountScope::All {
                    pairs.push(("allAccounts", "1".to_string()));
                }
            }
        }
        encode_pairs(&pairs)
    }

    /// `None` for an empty string: nothing to restore.
    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim().trim_start_matches('#').trim_start_matches('?');
        if raw.is_empty() {
            return None;
        }
        let pairs = decode_pairs(raw);
        let get = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        let contract = get("contract").filter(|c| !c.is_empty());
        let contract_id = if get("allContracts") == Some("1") || contract.is_none() {
            None
        } else {
            contract.map(str::to_string)
        };

        let view = ViewMode::parse(get("view").unwrap_or("tree"));
        let key = get("key").map(strip_wildcard).filter(|k| !k.is_empty());

        if view == ViewMode::Write {
            return Some(HashRoute::Write {
                contract: contract_id,
                key: key.map(str::to_string),
                value: get("value").map(str::to_string),
            });
        }

        let account_field = get("account");
        let all_accounts = get("allAccounts") == Some("1") || account_field.is_none();
        let account_scope = if all_accounts {
            AccountScope::All
        } else {
            AccountScope::from_input(false, account_field.unwrap_or_default())
        };

        let mut nav = NavigationState {
            contract_id,
            account_scope,
            key_prefix: key.map(str::to_string),
            view_mode: view,
            breadcrumb: Vec::new(),
        };
        nav.rebuild_breadcrumb();
        Some(HashRoute::Explore(nav))
    }
}

fn encode_pairs(pairs: &[(&str, String)]) -> String {
    match Url::parse_with_params(HASH_BASE, pairs.iter().map(|(k, v)| (*k, v.as_str()))) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => String::new(),
    }
}

fn decode_pairs(raw: &str) -> Vec<(String, String)> {
    match Url::parse(&format!("{HASH_BASE}?{raw}")) {
        Ok(url) => url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Two-way binding between the live state and the published view string.
///
/// Publishing a string marks it as an expected echo; when the same string
/// comes back through [`HashSync::on_hash_change`] before the next
/// [`HashSync::settle`] it is swallowed instead of triggering a reload.
#[derive(Debug, Default)]
pub struct HashSync {
    current: String,
    pending_echo: Option<String>,
}

impl HashSync {
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns `true` when the published string changed.
    pub fn push(&mut self, hash: String) -> bool {
        if hash == self.current {
            return false;
        }
        self.pending_echo = Some(hash.clone());
        self.current = hash;
        true
    }

    /// Forget an echo that never arrived. Later changes are deliberate.
    pub fn settle(&mut self) {
        self.pending_echo = None;
    }

    pub fn on_hash_change(&mut self, raw: &str) -> Option<HashRoute> {
        let raw = raw.trim().trim_start_matches('#');
        if self.pending_echo.take().as_deref() == Some(raw) {
            return None;
        }
        self.current = raw.to_string();
        HashRoute::decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nav(contract: Option<&str>, scope: AccountScope, key: Option<&str>, view: ViewMode) -> NavigationState {
        let mut nav = NavigationState {
            contract_id: contract.map(str::to_string),
            account_scope: scope,
            key_prefix: key.map(str::to_string),
            view_mode: view,
            breadcrumb: Vec::new(),
        };
        nav.rebuild_breadcrumb();
        nav
    }

    #[test]
    fn wildcard_stripping() {
        assert_eq!(strip_wildcard("foo/**"), "foo");
        assert_eq!(strip_wildcard("foo/*"), "foo");
        assert_eq!(strip_wildcard("foo*"), "foo");
        assert_eq!(strip_wildcard("foo/"), "foo/");
        assert_eq!(strip_wildcard("/**"), "");
        assert_eq!(strip_wildcard("  a/b  "), "a/b");
        assert_eq!(normalize_prefix("**"), None);
    }

    #[test]
    fn tree_view_and_all_scope_are_implicit() {
        let state = nav(Some("contextual.near"), AccountScope::All, None, ViewMode::Tree);
        assert_eq!(
            HashRoute::Explore(state).encode(),
            "contract=contextual.near&allAccounts=1"
        );
    }

    #[test]
    fn field_order_is_stable() {
        let state = nav(
            Some("contextual.near"),
            AccountScope::Single("alice.near".into()),
            Some("profile/name"),
            ViewMode::Json,
        );
        assert_eq!(
            HashRoute::Explore(state).encode(),
            "contract=contextual.near&account=alice.near&key=profile%2Fname&view=json"
        );
    }

    #[test]
    fn missing_contract_means_discovery() {
        let Some(HashRoute::Explore(state)) = HashRoute::decode("account=bob.near") else {
            panic!("expected explore route");
        };
        assert!(state.is_contract_discovery());
        assert_eq!(state.account_scope, AccountScope::Single("bob.near".into()));
    }

    #[test]
    fn absent_account_field_means_all_accounts() {
        let Some(HashRoute::Explore(state)) = HashRoute::decode("contract=c.near") else {
            panic!("expected explore route");
        };
        assert_eq!(state.account_scope, AccountScope::All);

        let Some(HashRoute::Explore(state)) = HashRoute::decode("contract=c.near&account=") else {
            panic!("expected explore route");
        };
        assert_eq!(state.account_scope, AccountScope::None);
    }

    #[test]
    fn all_accounts_beats_an_account_value() {
        let Some(HashRoute::Explore(state)) =
            HashRoute::decode("contract=c.near&account=a.near&allAccounts=1")
        else {
            panic!("expected explore route");
        };
        assert_eq!(state.account_scope, AccountScope::All);
    }

    #[test]
    fn write_route_only_carries_draft() {
        let state = nav(
            Some("c.near"),
            AccountScope::Single("a.near".into()),
            Some("ignored"),
            ViewMode::Write,
        );
        let route = HashRoute::from_state(&state, "greeting", "hi there");
        assert_eq!(route.encode(), "view=write&contract=c.near&key=greeting&value=hi+there");
        assert_eq!(HashRoute::decode(&route.encode()), Some(route));
    }

    #[test]
    fn breadcrumb_is_rebuilt_from_account_and_key() {
        let Some(HashRoute::Explore(state)) =
            HashRoute::decode("contract=c.near&account=a.near&key=x%2Fy")
        else {
            panic!("expected explore route");
        };
        assert_eq!(state.breadcrumb, vec!["a.near", "x", "y"]);
        assert_eq!(state.query_text(), "x/y/**");
    }

    #[test]
    fn round_trip_is_idempotent() {
        let states = vec![
            nav(None, AccountScope::All, None, ViewMode::Tree),
            nav(None, AccountScope::Single("a.near".into()), None, ViewMode::Tree),
            nav(Some("c.near"), AccountScope::None, None, ViewMode::Feed),
            nav(Some("c.near"), AccountScope::All, Some("graph/follow"), ViewMode::Json),
            nav(
                Some("c.near"),
                AccountScope::Single("x.tg".into()),
                Some("a b/ü"),
                ViewMode::Tree,
            ),
        ];
        for state in states {
            let first = HashRoute::Explore(state.clone()).encode();
            let decoded = HashRoute::decode(&first).expect("decodes");
            assert_eq!(decoded, HashRoute::Explore(state));
            assert_eq!(decoded.encode(), first);
        }
    }

    #[test]
    fn empty_string_restores_nothing() {
        assert_eq!(HashRoute::decode(""), None);
        assert_eq!(HashRoute::decode("#"), None);
    }

    #[test]
    fn own_push_is_not_reloaded() {
        let mut sync = HashSync::default();
        assert!(sync.push("contract=c.near&allAccounts=1".to_string()));
        assert_eq!(sync.on_hash_change("#contract=c.near&allAccounts=1"), None);
        // a later external change goes through
        assert!(sync.on_hash_change("contract=d.near").is_some());
        assert_eq!(sync.current(), "contract=d.near");
    }

    #[test]
    fn reopening_the_published_string_after_settling_reloads() {
        let mut sync = HashSync::default();
        sync.push("contract=c.near&allAccounts=1".to_string());
        sync.settle();
        assert!(sync.on_hash_change("contract=c.near&allAccounts=1").is_some());
        // the echo is gone once consumed
        sync.push("contract=d.near".to_string());
        assert_eq!(sync.on_hash_change("contract=d.near"), None);
        assert!(sync.on_hash_change("contract=d.near").is_some());
    }

    #[test]
    fn pushing_the_same_string_is_a_no_op() {
        let mut sync = HashSync::default();
        assert!(sync.push("view=json".to_string()));
        assert!(!sync.push("view=json".to_string()));
    }
}

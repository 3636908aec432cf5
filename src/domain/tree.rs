//! Lazily expanded key-space tree
//!
//! Nodes live in an arena owned by [`ExplorerTree`]. A branch is either
//! loaded (children known) or a placeholder waiting for its first fetch;
//! once loaded it stays loaded for the lifetime of the tree. Every fetch is
//! tagged with a [`TreeTicket`] so results addressed to an older tree (or
//! to a node that is no longer waiting) are dropped on arrival.

use serde_json::{Map, Value};

use crate::domain::nav::{AccountScope, NavigationState};
use crate::infrastructure::api::{KeyRef, Listing, SubtreePage};

pub type NodeId = usize;

/// Cap applied to contract and account listings
pub const LISTING_CAP: usize = 200;

/// How the root of a fresh exploration is populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreScope {
    /// Contract names, optionally only those an account wrote to
    Contracts { account: Option<String> },
    /// Accounts that wrote under one contract
    Accounts { contract: String },
    /// Everything one account wrote under a prefix, fetched in one call
    Account {
        account: String,
        contract: String,
        prefix: Option<String>,
    },
}

impl ExploreScope {
    pub fn from_nav(nav: &NavigationState) -> Self {
        match (&nav.contract_id, &nav.account_scope) {
            (None, scope) => ExploreScope::Contracts {
                account: scope.account().map(str::to_string),
            },
            (Some(contract), AccountScope::Single(account)) => ExploreScope::Account {
                account: account.clone(),
                contract: contract.clone(),
                prefix: nav.key_prefix.clone(),
            },
            (Some(contract), AccountScope::All | AccountScope::None) => ExploreScope::Accounts {
                contract: contract.clone(),
            },
        }
    }

    fn root_request(&self) -> TreeRequest {
        match self {
            ExploreScope::Contracts { account } => TreeRequest::Contracts {
                account: account.clone(),
            },
            ExploreScope::Accounts { contract } => TreeRequest::Accounts {
                contract: contract.clone(),
            },
            ExploreScope::Account {
                account,
                contract,
                prefix,
            } => TreeRequest::Subtree {
                account: account.clone(),
                contract: contract.clone(),
                prefix: prefix.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRequest {
    Contracts { account: Option<String> },
    Accounts { contract: String },
    Subtree {
        account: String,
        contract: String,
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Root,
    Node(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeTicket {
    pub generation: u64,
    pub target: FetchTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFetch {
    pub ticket: TreeTicket,
    pub request: TreeRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreePayload {
    Names(Listing),
    Subtree(SubtreePage),
}

/// What a node stands for, which decides what expanding it fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    Contract,
    Account { contract: String },
    Key {
        account: String,
        contract: String,
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Branch {
        children: Vec<NodeId>,
        load: LoadState,
    },
    /// Value as it appeared in the tree query; the detail panel fetches the
    /// authoritative one on selection.
    Leaf { value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub role: NodeRole,
    pub kind: NodeKind,
    pub expanded: bool,
}

impl TreeNode {
    pub fn is_branch(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { .. })
    }

    pub fn load_state(&self) -> Option<&LoadState> {
        match &self.kind {
            NodeKind::Branch { load, .. } => Some(load),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Names that look like NEAR accounts can be opened as an account view
    pub fn is_account_like(&self) -> bool {
        self.name.ends_with(".near") || self.name.ends_with(".tg")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    NoContracts { account: Option<String> },
    NoAccounts { contract: String },
    NoEntriesUnder {
        prefix: String,
        account: String,
        contract: String,
    },
    NoData { account: String, contract: String },
}

impl EmptyState {
    pub fn heading(&self) -> String {
        match self {
            EmptyState::NoContracts { account: None } => "No contracts found".to_string(),
            EmptyState::NoContracts {
                account: Some(account),
            } => format!("No contracts found for {account}"),
            EmptyState::NoAccounts { .. } => "No accounts found for this contract".to_string(),
            EmptyState::NoEntriesUnder { prefix, .. } => format!("No entries under \"{prefix}/\""),
            EmptyState::NoData { .. } => "No data found".to_string(),
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            EmptyState::NoContracts { .. } => None,
            EmptyState::NoAccounts { contract } => Some(format!("on {contract}")),
            EmptyState::NoEntriesUnder {
                account, contract, ..
            } => Some(format!("for {account} on {contract}")),
            EmptyState::NoData { account, contract } => {
                Some(format!("{account} has no entries on {contract}"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeStatus {
    /// Nothing explored yet
    Idle,
    Loading,
    Ready,
    /// Root fetch succeeded but returned nothing
    Empty(EmptyState),
    Failed(String),
}

/// Where "go" on a node leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeLink {
    Contract(String),
    Account { account: String, contract: String },
}

/// One line of the flattened, visible tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRow {
    Node { id: NodeId, depth: usize },
    Notice { depth: usize, text: &'static str },
}

#[derive(Debug, Clone)]
pub struct ExplorerTree {
    generation: u64,
    scope: Option<ExploreScope>,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    status: TreeStatus,
    truncated: bool,
    capped: Option<&'static str>,
}

impl Default for ExplorerTree {
    fn default() -> Self {
        Self {
            generation: 0,
            scope: None,
            nodes: Vec::new(),
            roots: Vec::new(),
            status: TreeStatus::Idle,
            truncated: false,
            capped: None,
        }
    }
}

impl ExplorerTree {
    /// Start a fresh exploration. The returned fetch populates the root.
    pub fn explore(scope: ExploreScope, generation: u64) -> (Self, TreeFetch) {
        let fetch = TreeFetch {
            ticket: TreeTicket {
                generation,
                target: FetchTarget::Root,
            },
            request: scope.root_request(),
        };
        let tree = Self {
            generation,
            scope: Some(scope),
            status: TreeStatus::Loading,
            ..Self::default()
        };
        (tree, fetch)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scope(&self) -> Option<&ExploreScope> {
        self.scope.as_ref()
    }

    pub fn status(&self) -> &TreeStatus {
        &self.status
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// A subtree fetch hit the result cap
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn cap_notice(&self) -> Option<String> {
        self.capped
            .map(|what| format!("Showing first {LISTING_CAP} {what} — more may exist"))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(NodeKind::Branch { children, .. }) => children,
            _ => &[],
        }
    }

    /// Find a child by name; `None` looks among the roots.
    pub fn child_named(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let ids = match parent {
            Some(id) => self.children(id),
            None => &self.roots,
        };
        ids.iter().copied().find(|id| self.nodes[*id].name == name)
    }

    /// Route a fetch result to the root or to the node it was issued for.
    /// Returns `false` when the result was stale and dropped.
    pub fn apply(&mut self, ticket: TreeTicket, result: Result<TreePayload, String>) -> bool {
        if ticket.generation != self.generation || self.scope.is_none() {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "dropping tree result for a previous exploration"
            );
            return false;
        }
        match ticket.target {
            FetchTarget::Root => self.apply_root(result),
            FetchTarget::Node(id) => self.apply_children(id, result),
        }
    }

    fn apply_root(&mut self, result: Result<TreePayload, String>) -> bool {
        if self.status != TreeStatus::Loading {
            return false;
        }
        let Some(scope) = self.scope.clone() else {
            return false;
        };
        let payload = match result {
            Ok(payload) => payload,
            Err(message) => {
                self.status = TreeStatus::Failed(message);
                return true;
            }
        };

        match (&scope, payload) {
            (ExploreScope::Contracts { account }, TreePayload::Names(listing)) => {
                if listing.names.is_empty() {
                    self.status = TreeStatus::Empty(EmptyState::NoContracts {
                        account: account.clone(),
                    });
                    return true;
                }
                self.note_cap(&listing, "contracts");
                for name in listing.names {
                    let id = self.push_branch(None, name, NodeRole::Contract, LoadState::Unloaded);
                    self.roots.push(id);
                }
            }
            (ExploreScope::Accounts { contract }, TreePayload::Names(listing)) => {
                if listing.names.is_empty() {
                    self.status = TreeStatus::Empty(EmptyState::NoAccounts {
                        contract: contract.clone(),
                    });
                    return true;
                }
                self.note_cap(&listing, "accounts");
                for name in listing.names {
                    let role = NodeRole::Account {
                        contract: contract.clone(),
                    };
                    let id = self.push_branch(None, name, role, LoadState::Unloaded);
                    self.roots.push(id);
                }
            }
            (
                ExploreScope::Account {
                    account,
                    contract,
                    prefix,
                },
                TreePayload::Subtree(page),
            ) => {
                if page.entries.is_empty() {
                    let state = match prefix {
                        Some(prefix) => EmptyState::NoEntriesUnder {
                            prefix: prefix.clone(),
                            account: account.clone(),
                            contract: contract.clone(),
                        },
                        None => EmptyState::NoData {
                            account: account.clone(),
                            contract: contract.clone(),
                        },
                    };
                    self.status = TreeStatus::Empty(state);
                    return true;
                }
                self.truncated |= page.has_more;
                let roots =
                    self.insert_entries(None, page.entries, account, contract, &page.base_path);
                self.roots = roots;
            }
            (_, _) => {
                self.status = TreeStatus::Failed("unexpected payload for this view".to_string());
                return true;
            }
        }
        self.status = TreeStatus::Ready;
        true
    }

    fn apply_children(&mut self, id: NodeId, result: Result<TreePayload, String>) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if node.load_state() != Some(&LoadState::Loading) {
            return false;
        }
        let role = node.role.clone();
        let name = node.name.clone();

        let payload = match result {
            Ok(payload) => payload,
            Err(message) => {
                tracing::warn!(node = %name, error = %message, "expansion failed");
                self.set_load(id, LoadState::Failed(message));
                return true;
            }
        };

        let children = match (&role, payload) {
            (NodeRole::Contract, TreePayload::Names(listing)) => {
                self.note_cap(&listing, "accounts");
                listing
                    .names
                    .into_iter()
                    .map(|account| {
                        let role = NodeRole::Account {
                            contract: name.clone(),
                        };
                        self.push_branch(Some(id), account, role, LoadState::Unloaded)
                    })
                    .collect()
            }
            (NodeRole::Account { contract }, TreePayload::Subtree(page)) => {
                self.truncated |= page.has_more;
                self.insert_entries(Some(id), page.entries, &name, contract, &page.base_path)
            }
            (NodeRole::Key { account, contract, .. }, TreePayload::Subtree(page)) => {
                self.truncated |= page.has_more;
                self.insert_entries(Some(id), page.entries, account, contract, &page.base_path)
            }
            (_, _) => {
                self.set_load(id, LoadState::Failed("unexpected payload".to_string()));
                return true;
            }
        };

        if let Some(NodeKind::Branch { children: slot, .. }) =
            self.nodes.get_mut(id).map(|node| &mut node.kind)
        {
            *slot = children;
        }
        self.set_load(id, LoadState::Loaded);
        true
    }

    /// Expand a branch. Returns the fetch to issue when the branch has
    /// never been loaded (or its last load failed) and none is in flight.
    pub fn expand(&mut self, id: NodeId) -> Option<TreeFetch> {
        let generation = self.generation;
        let node = self.nodes.get_mut(id)?;
        let NodeKind::Branch { load, .. } = &mut node.kind else {
            return None;
        };
        node.expanded = true;
        match load {
            LoadState::Loaded | LoadState::Loading => None,
            LoadState::Unloaded | LoadState::Failed(_) => {
                *load = LoadState::Loading;
                let request = match &node.role {
                    NodeRole::Contract => TreeRequest::Accounts {
                        contract: node.name.clone(),
                    },
                    NodeRole::Account { contract } => TreeRequest::Subtree {
                        account: node.name.clone(),
                        contract: contract.clone(),
                        prefix: None,
                    },
                    NodeRole::Key {
                        account,
                        contract,
                        path,
                    } => TreeRequest::Subtree {
                        account: account.clone(),
                        contract: contract.clone(),
                        prefix: Some(format!("{path}/")),
                    },
                };
                Some(TreeFetch {
                    ticket: TreeTicket {
                        generation,
                        target: FetchTarget::Node(id),
                    },
                    request,
                })
            }
        }
    }

    /// Hide children; loaded data is kept.
    pub fn collapse(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.expanded = false;
        }
    }

    pub fn toggle(&mut self, id: NodeId) -> Option<TreeFetch> {
        match self.nodes.get(id) {
            Some(node) if node.is_branch() && node.expanded => {
                self.collapse(id);
                None
            }
            Some(node) if node.is_branch() => self.expand(id),
            _ => None,
        }
    }

    /// Address of a leaf, for the detail panel
    pub fn key_ref(&self, id: NodeId) -> Option<KeyRef> {
        match &self.nodes.get(id)?.role {
            NodeRole::Key {
                account,
                contract,
                path,
            } => Some(KeyRef::new(account, contract, path)),
            _ => None,
        }
    }

    pub fn leaf_value(&self, id: NodeId) -> Option<&Value> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Leaf { value } => Some(value),
            NodeKind::Branch { .. } => None,
        }
    }

    pub fn link(&self, id: NodeId) -> Option<NodeLink> {
        let node = self.nodes.get(id)?;
        match &node.role {
            NodeRole::Contract => Some(NodeLink::Contract(node.name.clone())),
            NodeRole::Account { contract } => Some(NodeLink::Account {
                account: node.name.clone(),
                contract: contract.clone(),
            }),
            NodeRole::Key { contract, .. } if node.is_account_like() => Some(NodeLink::Account {
                account: node.name.clone(),
                contract: contract.clone(),
            }),
            NodeRole::Key { .. } => None,
        }
    }

    /// Depth-first list of what is currently on screen
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for id in &self.roots {
            self.collect_rows(*id, &mut rows);
        }
        rows
    }

    fn collect_rows(&self, id: NodeId, rows: &mut Vec<TreeRow>) {
        let node = &self.nodes[id];
        rows.push(TreeRow::Node {
            id,
            depth: node.depth,
        });
        if !node.expanded {
            return;
        }
        let NodeKind::Branch { children, load } = &node.kind else {
            return;
        };
        let depth = node.depth + 1;
        match load {
            LoadState::Loading => rows.push(TreeRow::Notice {
                depth,
                text: "loading...",
            }),
            LoadState::Failed(_) => rows.push(TreeRow::Notice {
                depth,
                text: "failed_",
            }),
            LoadState::Loaded if children.is_empty() => rows.push(TreeRow::Notice {
                depth,
                text: if node.role == NodeRole::Contract {
                    "(no accounts)"
                } else {
                    "(empty)"
                },
            }),
            LoadState::Loaded => {
                for child in children {
                    self.collect_rows(*child, rows);
                }
            }
            LoadState::Unloaded => {}
        }
    }

    /// Loaded data as JSON; placeholders render as `{}`
    pub fn to_json(&self) -> Value {
        let map = self.ids_to_json(&self.roots);
        match &self.scope {
            Some(ExploreScope::Account { account, .. }) => {
                let mut wrapper = Map::new();
                wrapper.insert(account.clone(), Value::Object(map));
                Value::Object(wrapper)
            }
            _ => Value::Object(map),
        }
    }

    fn ids_to_json(&self, ids: &[NodeId]) -> Map<String, Value> {
        let mut map = Map::new();
        for id in ids {
            let node = &self.nodes[*id];
            let value = match &node.kind {
                NodeKind::Leaf { value } => value.clone(),
                NodeKind::Branch { children, .. } => Value::Object(self.ids_to_json(children)),
            };
            map.insert(node.name.clone(), value);
        }
        map
    }

    fn note_cap(&mut self, listing: &Listing, what: &'static str) {
        if listing.names.len() >= LISTING_CAP || listing.has_more {
            self.capped = Some(what);
        }
    }

    fn set_load(&mut self, id: NodeId, next: LoadState) {
        if let Some(NodeKind::Branch { load, .. }) = self.nodes.get_mut(id).map(|node| &mut node.kind) {
            if *load == LoadState::Loaded {
                return;
            }
            *load = next;
        }
    }

    fn push_branch(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        role: NodeRole,
        load: LoadState,
    ) -> NodeId {
        let depth = parent.map(|p| self.nodes[p].depth + 1).unwrap_or(0);
        self.nodes.push(TreeNode {
            name,
            parent,
            depth,
            role,
            kind: NodeKind::Branch {
                children: Vec::new(),
                load,
            },
            expanded: false,
        });
        self.nodes.len() - 1
    }

    /// Insert a nested tree-query result below `parent`. Non-empty objects
    /// become loaded branches, empty objects become placeholders, anything
    /// else is a leaf.
    fn insert_entries(
        &mut self,
        parent: Option<NodeId>,
        entries: Map<String, Value>,
        account: &str,
        contract: &str,
        base_path: &str,
    ) -> Vec<NodeId> {
        let depth = parent.map(|p| self.nodes[p].depth + 1).unwrap_or(0);
        let mut ids = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            let path = join_path(base_path, &name);
            let role = NodeRole::Key {
                account: account.to_string(),
                contract: contract.to_string(),
                path: path.clone(),
            };
            let id = match value {
                Value::Object(children) if children.is_empty() => {
                    self.push_branch(parent, name, role, LoadState::Unloaded)
                }
                Value::Object(children) => {
                    let id = self.push_branch(parent, name, role, LoadState::Loaded);
                    let child_ids = self.insert_entries(Some(id), children, account, contract, &path);
                    if let NodeKind::Branch { children: slot, .. } = &mut self.nodes[id].kind {
                        *slot = child_ids;
                    }
                    id
                }
                leaf => {
                    self.nodes.push(TreeNode {
                        name,
                        parent,
                        depth,
                        role,
                        kind: NodeKind::Leaf { value: leaf },
                        expanded: false,
                    });
                    self.nodes.len() - 1
                }
            };
            ids.push(id);
        }
        ids
    }
}

fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Reply to an account-root query
    fn page(value: Value, has_more: bool) -> TreePayload {
        page_under(value, None, has_more)
    }

    /// Reply to a prefix query, nested from the root the way the backend sends it
    fn page_under(value: Value, prefix: Option<&str>, has_more: bool) -> TreePayload {
        let Value::Object(tree) = value else {
            panic!("tree payload must be an object");
        };
        TreePayload::Subtree(SubtreePage::from_tree(tree, prefix, has_more))
    }

    fn leaf_paths(tree: &ExplorerTree) -> Vec<String> {
        (0..tree.nodes.len())
            .filter(|id| tree.leaf_value(*id).is_some())
            .filter_map(|id| tree.key_ref(id))
            .map(|key| key.path)
            .collect()
    }

    fn names(names: &[&str]) -> TreePayload {
        TreePayload::Names(Listing {
            names: names.iter().map(|s| s.to_string()).collect(),
            has_more: false,
        })
    }

    fn account_tree(prefix: Option<&str>) -> (ExplorerTree, TreeFetch) {
        ExplorerTree::explore(
            ExploreScope::Account {
                account: "alice.near".into(),
                contract: "c.near".into(),
                prefix: prefix.map(str::to_string),
            },
            1,
        )
    }

    #[test]
    fn subtree_root_paths_include_the_prefix() {
        let (mut tree, fetch) = account_tree(Some("foo"));
        let reply = page_under(json!({"foo": {"a": "1", "b": "2"}}), Some("foo"), false);
        assert!(tree.apply(fetch.ticket, Ok(reply)));
        let a = tree.child_named(None, "a").unwrap();
        assert_eq!(tree.key_ref(a), Some(KeyRef::new("alice.near", "c.near", "foo/a")));
        assert_eq!(tree.status(), &TreeStatus::Ready);
    }

    #[test]
    fn exploring_a_leaf_key_shows_that_key() {
        let (mut tree, fetch) = account_tree(Some("profile/name"));
        let reply = page_under(json!({"profile": {"name": "Alice"}}), Some("profile/name"), false);
        tree.apply(fetch.ticket, Ok(reply));
        assert_eq!(leaf_paths(&tree), vec!["profile/name"]);
        let name = tree.child_named(None, "name").unwrap();
        assert_eq!(tree.leaf_value(name), Some(&json!("Alice")));
    }

    #[test]
    fn keys_sharing_a_byte_prefix_are_not_adopted() {
        let (mut tree, fetch) = account_tree(Some("foo"));
        let reply = page_under(
            json!({"foo": {"a": "1"}, "foobar": {"c": "3"}}),
            Some("foo"),
            false,
        );
        tree.apply(fetch.ticket, Ok(reply));
        assert_eq!(leaf_paths(&tree), vec!["foo/a"]);
    }

    #[test]
    fn nested_objects_arrive_loaded_and_empty_objects_as_placeholders() {
        let (mut tree, fetch) = account_tree(None);
        tree.apply(
            fetch.ticket,
            Ok(page(json!({"profile": {"name": "Alice"}, "graph": {}}), false)),
        );
        let profile = tree.child_named(None, "profile").unwrap();
        let graph = tree.child_named(None, "graph").unwrap();
        assert_eq!(tree.node(profile).unwrap().load_state(), Some(&LoadState::Loaded));
        assert_eq!(tree.node(graph).unwrap().load_state(), Some(&LoadState::Unloaded));
        assert_eq!(tree.expand(profile), None);

        let fetch = tree.expand(graph).expect("placeholder needs a fetch");
        assert_eq!(
            fetch.request,
            TreeRequest::Subtree {
                account: "alice.near".into(),
                contract: "c.near".into(),
                prefix: Some("graph/".into()),
            }
        );
    }

    #[test]
    fn expanding_twice_while_in_flight_issues_one_fetch() {
        let (mut tree, fetch) = account_tree(None);
        tree.apply(fetch.ticket, Ok(page(json!({"graph": {}}), false)));
        let graph = tree.child_named(None, "graph").unwrap();
        assert!(tree.expand(graph).is_some());
        tree.collapse(graph);
        assert!(tree.expand(graph).is_none());
    }

    #[test]
    fn failed_expansion_is_local_and_retryable() {
        let (mut tree, fetch) = ExplorerTree::explore(
            ExploreScope::Accounts {
                contract: "c.near".into(),
            },
            3,
        );
        tree.apply(fetch.ticket, Ok(names(&["a.near", "b.near"])));
        let a = tree.child_named(None, "a.near").unwrap();
        let b = tree.child_named(None, "b.near").unwrap();
        let fetch = tree.expand(a).unwrap();
        tree.apply(fetch.ticket, Err("kvQueryTree: 500".into()));

        assert!(matches!(tree.node(a).unwrap().load_state(), Some(LoadState::Failed(_))));
        assert_eq!(tree.node(b).unwrap().load_state(), Some(&LoadState::Unloaded));
        assert_eq!(tree.status(), &TreeStatus::Ready);
        assert!(tree
            .visible_rows()
            .contains(&TreeRow::Notice { depth: 1, text: "failed_" }));
        assert!(tree.expand(a).is_some());
    }

    #[test]
    fn results_for_an_older_generation_are_dropped() {
        let (mut old, old_fetch) = account_tree(None);
        old.apply(old_fetch.ticket, Ok(page(json!({"x": {}}), false)));
        let x = old.child_named(None, "x").unwrap();
        let stale = old.expand(x).unwrap();

        let (mut tree, fetch) = account_tree(None);
        let mut tree_next = ExplorerTree::explore(tree.scope().unwrap().clone(), 2).0;
        assert!(!tree_next.apply(stale.ticket, Ok(page(json!({"y": "1"}), false))));
        assert!(tree.apply(fetch.ticket, Ok(page(json!({"x": {}}), false))));
    }

    #[test]
    fn late_root_result_cannot_land_twice() {
        let (mut tree, fetch) = account_tree(None);
        assert!(tree.apply(fetch.ticket, Ok(page(json!({"x": "1"}), false))));
        assert!(!tree.apply(fetch.ticket, Ok(page(json!({"y": "1"}), false))));
        assert!(tree.child_named(None, "y").is_none());
    }

    #[test]
    fn loaded_never_reverts() {
        let (mut tree, fetch) = account_tree(None);
        tree.apply(fetch.ticket, Ok(page(json!({"x": {}}), false)));
        let x = tree.child_named(None, "x").unwrap();
        let expand = tree.expand(x).unwrap();
        tree.apply(expand.ticket, Ok(page_under(json!({"x": {"y": "1"}}), Some("x/"), false)));
        let y = tree.child_named(Some(x), "y").unwrap();
        assert_eq!(tree.key_ref(y).unwrap().path, "x/y");
        tree.set_load(x, LoadState::Unloaded);
        assert_eq!(tree.node(x).unwrap().load_state(), Some(&LoadState::Loaded));
    }

    #[test]
    fn empty_states_name_the_context() {
        let (mut tree, fetch) = ExplorerTree::explore(ExploreScope::Contracts { account: None }, 1);
        tree.apply(fetch.ticket, Ok(names(&[])));
        let TreeStatus::Empty(state) = tree.status() else { panic!("expected empty") };
        assert_eq!(state.heading(), "No contracts found");

        let (mut tree, fetch) = account_tree(Some("foo"));
        tree.apply(fetch.ticket, Ok(page(json!({}), false)));
        let TreeStatus::Empty(state) = tree.status() else { panic!("expected empty") };
        assert_eq!(state.heading(), "No entries under \"foo/\"");
        assert_eq!(state.detail().as_deref(), Some("for alice.near on c.near"));
    }

    #[test]
    fn listing_cap_and_truncation_are_surfaced() {
        let many: Vec<String> = (0..LISTING_CAP).map(|i| format!("acct{i}.near")).collect();
        let (mut tree, fetch) = ExplorerTree::explore(
            ExploreScope::Accounts {
                contract: "c.near".into(),
            },
            1,
        );
        tree.apply(
            fetch.ticket,
            Ok(TreePayload::Names(Listing {
                names: many,
                has_more: false,
            })),
        );
        assert_eq!(
            tree.cap_notice().as_deref(),
            Some("Showing first 200 accounts — more may exist")
        );

        let (mut tree, fetch) = account_tree(None);
        tree.apply(fetch.ticket, Ok(page(json!({"x": "1"}), true)));
        assert!(tree.is_truncated());
    }

    #[test]
    fn capped_accounts_under_an_expanded_contract_are_surfaced() {
        let (mut tree, fetch) = ExplorerTree::explore(ExploreScope::Contracts { account: None }, 1);
        tree.apply(fetch.ticket, Ok(names(&["c.near"])));
        assert_eq!(tree.cap_notice(), None);

        let contract = tree.child_named(None, "c.near").unwrap();
        let fetch = tree.expand(contract).unwrap();
        let many: Vec<String> = (0..LISTING_CAP).map(|i| format!("acct{i}.near")).collect();
        tree.apply(
            fetch.ticket,
            Ok(TreePayload::Names(Listing {
                names: many,
                has_more: false,
            })),
        );
        assert_eq!(tree.children(contract).len(), LISTING_CAP);
        assert_eq!(
            tree.cap_notice().as_deref(),
            Some("Showing first 200 accounts — more may exist")
        );
    }

    #[test]
    fn contract_discovery_nests_accounts_then_keys() {
        let (mut tree, fetch) = ExplorerTree::explore(ExploreScope::Contracts { account: None }, 1);
        tree.apply(fetch.ticket, Ok(names(&["c.near"])));
        let contract = tree.child_named(None, "c.near").unwrap();
        let fetch = tree.expand(contract).unwrap();
        assert_eq!(fetch.request, TreeRequest::Accounts { contract: "c.near".into() });
        tree.apply(fetch.ticket, Ok(names(&["bob.near"])));

        let bob = tree.child_named(Some(contract), "bob.near").unwrap();
        assert_eq!(
            tree.link(bob),
            Some(NodeLink::Account {
                account: "bob.near".into(),
                contract: "c.near".into()
            })
        );
        let fetch = tree.expand(bob).unwrap();
        assert_eq!(
            fetch.request,
            TreeRequest::Subtree {
                account: "bob.near".into(),
                contract: "c.near".into(),
                prefix: None,
            }
        );
        tree.apply(fetch.ticket, Ok(page(json!({"k": "v"}), false)));
        let k = tree.child_named(Some(bob), "k").unwrap();
        assert_eq!(tree.key_ref(k), Some(KeyRef::new("bob.near", "c.near", "k")));
        assert_eq!(tree.node(k).unwrap().depth, 2);
    }

    #[test]
    fn json_view_wraps_single_account_data() {
        let (mut tree, fetch) = account_tree(None);
        tree.apply(fetch.ticket, Ok(page(json!({"a": {"b": "1"}, "c": {}}), false)));
        assert_eq!(
            tree.to_json(),
            json!({"alice.near": {"a": {"b": "1"}, "c": {}}})
        );
    }
}

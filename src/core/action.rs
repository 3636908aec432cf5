//! Actions: the single entry point through which navigation state changes

use crate::domain::nav::ViewMode;

/// Everything that can change what is being viewed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,

    /// Navigate somewhere and re-explore
    Navigate(NavigateTarget),

    /// Switch view mode without changing scope
    SetView(ViewMode),

    /// Re-run the current exploration from the form inputs
    Explore,

    /// Copy text to the system clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Request quit
    Quit,
}

/// Navigation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateTarget {
    /// Breadcrumb root: keep scope, clear the key
    Root,
    /// Breadcrumb segment by index (0 is the account)
    Crumb(usize),
    /// Leave contract discovery for this contract, all accounts
    Contract(String),
    /// One account under a contract, no key
    Account { account: String, contract: String },
    /// One account at a key prefix, tree view
    Key { account: String, key: String },
    /// Restore a shared view string
    View(String),
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

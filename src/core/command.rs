//! Command parser for the : command system

use crate::domain::nav::ViewMode;

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Scope
    Contract(Option<String>),
    Account(Option<String>),
    Key(Option<String>),
    AllAccounts,
    AllContracts,
    View(ViewMode),
    Open(String),

    // Detail
    Diff(u64, u64),
    Writers,

    // Wallet
    Connect(String),
    Disconnect,

    // Diagnostics / sharing
    Curl,
    Share,

    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        "contract" | "c" => Command::Contract(args),
        "account" | "a" => Command::Account(args),
        "key" | "k" | "query" | "q" => Command::Key(args),
        "all" | "all-accounts" => Command::AllAccounts,
        "contracts" | "all-contracts" | "discover" => Command::AllContracts,
        "view" | "v" => match args {
            Some(name) => Command::View(ViewMode::parse(&name)),
            None => Command::Unknown(input.to_string()),
        },
        "tree" => Command::View(ViewMode::Tree),
        "json" => Command::View(ViewMode::Json),
        "feed" => Command::View(ViewMode::Feed),
        "write" => Command::View(ViewMode::Write),
        "open" => match args {
            Some(view) => Command::Open(view),
            None => Command::Unknown(input.to_string()),
        },
        "diff" => {
            let heights: Vec<u64> = args
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .filter_map(|s| s.replace('_', "").parse().ok())
                .collect();
            match heights.as_slice() {
                [a, b] => Command::Diff(*a, *b),
                _ => Command::Unknown(input.to_string()),
            }
        }
        "writers" | "who" => Command::Writers,
        "connect" | "login" => match args {
            Some(account) => Command::Connect(account),
            None => Command::Unknown(input.to_string()),
        },
        "disconnect" | "logout" => Command::Disconnect,
        "curl" => Command::Curl,
        "share" | "link" => Command::Share,
        "quit" | "q!" | "exit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_commands() {
        assert_eq!(
            parse_command("contract social.near"),
            Command::Contract(Some("social.near".to_string()))
        );
        assert_eq!(parse_command("account"), Command::Account(None));
        assert_eq!(
            parse_command("key profile/**"),
            Command::Key(Some("profile/**".to_string()))
        );
        assert_eq!(parse_command("all"), Command::AllAccounts);
        assert_eq!(parse_command("contracts"), Command::AllContracts);
    }

    #[test]
    fn test_parse_view_commands() {
        assert_eq!(parse_command("view json"), Command::View(ViewMode::Json));
        assert_eq!(parse_command("feed"), Command::View(ViewMode::Feed));
        assert_eq!(
            parse_command("open contract=c.near&allAccounts=1"),
            Command::Open("contract=c.near&allAccounts=1".to_string())
        );
    }

    #[test]
    fn test_parse_diff() {
        assert_eq!(parse_command("diff 100 200"), Command::Diff(100, 200));
        assert_eq!(parse_command("diff 1_000 2_000"), Command::Diff(1000, 2000));
        assert_eq!(parse_command("diff 100"), Command::Unknown("diff 100".to_string()));
    }

    #[test]
    fn test_parse_wallet_commands() {
        assert_eq!(
            parse_command("connect me.near"),
            Command::Connect("me.near".to_string())
        );
        assert_eq!(parse_command("connect"), Command::Unknown("connect".to_string()));
        assert_eq!(parse_command("disconnect"), Command::Disconnect);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
    }
}

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://kv.main.fastnear.com";
pub const DEFAULT_CONTRACT: &str = "contextual.near";
pub const DEFAULT_ACCOUNT: &str = "root.near";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub default_contract: String,
    pub default_account: String,
    pub network: String,
    pub near_cli: String,
    pub explorer_url: String,
    pub history_limit: usize,
    pub timeline_limit: usize,
    pub writers_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_contract: DEFAULT_CONTRACT.to_string(),
            default_account: DEFAULT_ACCOUNT.to_string(),
            network: "mainnet".to_string(),
            near_cli: "near".to_string(),
            explorer_url: "https://nearblocks.io/txns".to_string(),
            history_limit: 50,
            timeline_limit: 20,
            writers_limit: 20,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Self {
        toml::from_str::<Config>(content).unwrap_or_default()
    }

    /// Link to a transaction on the block explorer
    pub fn tx_link(&self, tx_hash: &str) -> String {
        format!("{}/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    Config::from_toml(&content)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("KVGARDEN_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("kvgarden").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("kvgarden").join("config.toml"));
    }

    directories::ProjectDirs::from("com", "fastnear", "kvgarden")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("kvgarden"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("kvgarden"));
    }
    directories::ProjectDirs::from("com", "fastnear", "kvgarden")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn session_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("session.sqlite3"))
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("kvgarden.log"))
}

//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the path given with `-f`), then applies
//! `PYQ_WORK_DIR`, `PYQ_LOG_LEVEL` and `PYQ_ADMIN_IDS` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// PTY (console) channel configuration.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
    /// Identifier the console user is known by (matched against the admin list).
    pub user_id: String,
}

/// Telegram channel configuration. The bot token is never read from TOML.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub pty: PtyConfig,
    pub telegram: TelegramConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Absolute path of the papers database.
    pub db_path: PathBuf,
    /// Identifiers allowed into the admin flows.
    pub admin_ids: Vec<String>,
    pub comms: CommsConfig,
}

impl Config {
    pub fn comms_pty_should_load(&self) -> bool {
        self.comms.pty.enabled
    }

    pub fn comms_telegram_should_load(&self) -> bool {
        self.comms.telegram.enabled
    }
}

/// Explicit overrides, normally sourced from the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    /// Comma-separated list; replaces `[admin].user_ids` entirely.
    pub admin_ids: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("PYQ_WORK_DIR").ok(),
            log_level: env::var("PYQ_LOG_LEVEL").ok(),
            admin_ids: env::var("PYQ_ADMIN_IDS").ok(),
        }
    }
}

/// Raw TOML shape, deserialized before resolution.
#[derive(Deserialize)]
struct RawConfig {
    supervisor: RawSupervisor,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    admin: RawAdmin,
    #[serde(default)]
    comms: RawComms,
}

#[derive(Deserialize)]
struct RawSupervisor {
    bot_name: String,
    work_dir: String,
    log_level: String,
}

#[derive(Deserialize)]
struct RawStore {
    #[serde(default = "default_db_file")]
    db_file: String,
}

impl Default for RawStore {
    fn default() -> Self {
        Self { db_file: default_db_file() }
    }
}

#[derive(Deserialize, Default)]
struct RawAdmin {
    #[serde(default)]
    user_ids: Vec<RawUserId>,
}

/// Telegram ids are numbers, other transports use strings; accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Int(i64),
    Text(String),
}

impl RawUserId {
    fn into_string(self) -> String {
        match self {
            RawUserId::Int(n) => n.to_string(),
            RawUserId::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    telegram: RawTelegram,
}

#[derive(Deserialize)]
struct RawPty {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_pty_user_id")]
    user_id: String,
}

impl Default for RawPty {
    fn default() -> Self {
        Self { enabled: true, user_id: default_pty_user_id() }
    }
}

#[derive(Deserialize, Default)]
struct RawTelegram {
    /// Telegram must be explicitly enabled.
    #[serde(default)]
    enabled: bool,
}

fn default_db_file() -> String {
    "pyq_papers.db".to_string()
}

fn default_pty_user_id() -> String {
    "console".to_string()
}

fn default_true() -> bool {
    true
}

/// Load config from `path` (or `config/default.toml`), then apply env overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    load_from(path, &Overrides::from_env())
}

/// Loader with explicit overrides; tests pass them directly instead of
/// mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, overrides)
        .map_err(|e| AppError::Config(format!("{} in {}", e, path.display())))
}

fn parse(raw: &str, overrides: &Overrides) -> Result<Config, String> {
    let parsed: RawConfig = toml::from_str(raw).map_err(|e| format!("parse error: {e}"))?;
    let s = parsed.supervisor;

    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&s.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(s.log_level);
    crate::logger::parse_level(&log_level).map_err(|e| e.to_string())?;

    let db_file = expand_home(&parsed.store.db_file);
    let db_path = if db_file.is_absolute() { db_file } else { work_dir.join(db_file) };

    let admin_ids = match overrides.admin_ids.as_deref() {
        Some(list) => split_ids(list),
        None => parsed.admin.user_ids.into_iter().map(RawUserId::into_string).collect(),
    };

    let pty_user_id = parsed.comms.pty.user_id.trim().to_string();
    if pty_user_id.is_empty() {
        return Err("comms.pty.user_id must not be empty".to_string());
    }

    Ok(Config {
        bot_name: s.bot_name,
        work_dir,
        log_level,
        db_path,
        admin_ids,
        comms: CommsConfig {
            pty: PtyConfig { enabled: parsed.comms.pty.enabled, user_id: pty_user_id },
            telegram: TelegramConfig { enabled: parsed.comms.telegram.enabled },
        },
    })
}

fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a leading `~` to the user's home directory.
/// Paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

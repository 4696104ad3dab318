//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read the explicit file if one is given, otherwise the first file found
//!    by [`probe_config_paths`], otherwise start from defaults
//! 2. Apply `PUNCHSYNC_*` environment overrides on top
//! 3. Validate the result
//!
//! JSON and TOML are supported, detected by file extension.
//!
//! ## Environment Variables
//! - `PUNCHSYNC_DB_PATH`: Database file path
//! - `PUNCHSYNC_DB_POOL_SIZE`: Connection pool size
//! - `PUNCHSYNC_DB_ENCRYPTION_KEY`: SQLCipher key
//! - `PUNCHSYNC_PUSH_URL`: Payroll API base URL
//! - `PUNCHSYNC_PUSH_USERNAME` / `PUNCHSYNC_PUSH_PASSWORD`: Payroll login
//! - `PUNCHSYNC_LOGIN_TIMEOUT` / `PUNCHSYNC_PUSH_TIMEOUT`: Seconds
//! - `PUNCHSYNC_PUSH_BATCH_SIZE`: Records per batch
//! - `PUNCHSYNC_BACKLOG_LIMIT`: Records fetched per run
//! - `PUNCHSYNC_LOG_LEVEL`: Default tracing filter
//! - `PUNCHSYNC_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! `config.{json,toml}` and `punchsync.{json,toml}` in the working directory,
//! then `config.{json,toml}` up to two parent directories, then the same set
//! relative to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use punchsync_domain::{Config, PunchSyncError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "punchsync.json", "punchsync.toml"];

/// Load configuration from file (explicit or probed) plus environment.
///
/// # Errors
/// Returns `PunchSyncError::Config` if the explicit file is missing, any file
/// or variable fails to parse, or the merged result is invalid.
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(&path)?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(&found)?,
            None => {
                tracing::debug!("no config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a single file
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(PunchSyncError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| PunchSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PunchSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PunchSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PunchSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Overlay any `PUNCHSYNC_*` variables that are set onto `config`.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(path) = env_string("PUNCHSYNC_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_parse::<u32>("PUNCHSYNC_DB_POOL_SIZE", "pool size")? {
        config.database.pool_size = size;
    }
    if let Some(key) = env_string("PUNCHSYNC_DB_ENCRYPTION_KEY") {
        config.database.encryption_key = Some(key);
    }

    if let Some(url) = env_string("PUNCHSYNC_PUSH_URL") {
        config.payroll.push_url = Some(url);
    }
    if let Some(username) = env_string("PUNCHSYNC_PUSH_USERNAME") {
        config.payroll.push_username = Some(username);
    }
    if let Some(password) = env_string("PUNCHSYNC_PUSH_PASSWORD") {
        config.payroll.push_password = Some(password);
    }
    if let Some(secs) = env_parse::<u64>("PUNCHSYNC_LOGIN_TIMEOUT", "login timeout")? {
        config.payroll.login_timeout_secs = secs;
    }
    if let Some(secs) = env_parse::<u64>("PUNCHSYNC_PUSH_TIMEOUT", "push timeout")? {
        config.payroll.push_timeout_secs = secs;
    }

    if let Some(size) = env_parse::<usize>("PUNCHSYNC_PUSH_BATCH_SIZE", "batch size")? {
        config.sync.batch_size = size;
    }
    if let Some(limit) = env_parse::<usize>("PUNCHSYNC_BACKLOG_LIMIT", "backlog limit")? {
        config.sync.backlog_limit = limit;
    }

    if let Some(level) = env_string("PUNCHSYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env_bool("PUNCHSYNC_LOG_JSON") {
        config.logging.json = json;
    }

    Ok(())
}

/// Reject values the push engine cannot run with.
pub fn validate(config: &Config) -> Result<()> {
    if config.database.path.trim().is_empty() {
        return Err(PunchSyncError::Config("Database path must not be empty".into()));
    }
    if config.database.pool_size == 0 {
        return Err(PunchSyncError::Config("Database pool size must be at least 1".into()));
    }
    if config.sync.batch_size == 0 {
        return Err(PunchSyncError::Config("Batch size must be at least 1".into()));
    }
    if config.sync.backlog_limit == 0 {
        return Err(PunchSyncError::Config("Backlog limit must be at least 1".into()));
    }
    if config.payroll.login_timeout_secs == 0 || config.payroll.push_timeout_secs == 0 {
        return Err(PunchSyncError::Config("Payroll timeouts must be at least 1 second".into()));
    }

    if let Some(push_url) = config.payroll.push_url.as_deref().filter(|u| !u.trim().is_empty()) {
        let parsed = Url::parse(push_url.trim())
            .map_err(|e| PunchSyncError::Config(format!("Invalid payroll URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PunchSyncError::Config(format!(
                "Payroll URL must use http or https, got {}",
                parsed.scheme()
            )));
        }
    }

    Ok(())
}

/// The first existing config file, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.is_file())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).collect();
    for ancestor in ["..", "../.."] {
        paths.push(dir.join(ancestor).join("config.json"));
        paths.push(dir.join(ancestor).join("config.toml"));
    }
    paths
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| PunchSyncError::Config(format!("Invalid {what} in {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

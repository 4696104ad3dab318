//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKLOG_LIMIT, DEFAULT_BATCH_SIZE, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE,
    DEFAULT_PAYROLL_BASE_URL, LOGIN_TIMEOUT_SECS, PUSH_TIMEOUT_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub payroll: PayrollConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Local store location and pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    /// SQLCipher key. Plain SQLite is used when absent.
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE, encryption_key: None }
    }
}

/// Remote payroll endpoint settings.
///
/// Credentials given here are written to the store's API configuration at
/// startup; the push engine itself only ever reads them from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    pub push_url: Option<String>,
    pub push_username: Option<String>,
    #[serde(skip_serializing)]
    pub push_password: Option<String>,
    pub login_timeout_secs: u64,
    pub push_timeout_secs: u64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            push_url: None,
            push_username: None,
            push_password: None,
            login_timeout_secs: LOGIN_TIMEOUT_SECS,
            push_timeout_secs: PUSH_TIMEOUT_SECS,
        }
    }
}

/// Batching limits for a push run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub backlog_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, backlog_limit: DEFAULT_BACKLOG_LIMIT }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// API configuration as persisted in the local store.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub push_url: Option<String>,
    pub push_username: Option<String>,
    #[serde(skip_serializing)]
    pub push_password: Option<String>,
}

impl ApiConfig {
    /// Base URL without trailing slashes, falling back to the public endpoint.
    pub fn base_url(&self) -> String {
        self.push_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_PAYROLL_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Returns the configured credentials when both parts are non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.push_username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.push_password.as_deref().filter(|p| !p.is_empty())?;
        Some(Credentials::new(username, password))
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("push_url", &self.push_url)
            .field("push_username", &self.push_username)
            .field("push_password", &self.push_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Username/password pair for the payroll login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

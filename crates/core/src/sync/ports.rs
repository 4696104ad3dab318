//! Port interfaces for push synchronization

use async_trait::async_trait;
use punchsync_domain::{
    ApiConfig, AuthToken, BatchEntry, BatchOutcome, Credentials, Result, SyncKind, SyncLogUpdate,
    TimesheetRecord,
};

/// Access to locally captured timesheet records
#[async_trait]
pub trait TimesheetRepository: Send + Sync {
    /// Fetch up to `limit` records that have not been synced yet, oldest first.
    async fn get_unsynced_timesheets(&self, limit: usize) -> Result<Vec<TimesheetRecord>>;

    /// Mark a record as accepted by the remote service.
    ///
    /// Records that are already synced must be left untouched.
    async fn mark_synced(&self, local_id: i64, remote_id: &str) -> Result<()>;

    /// Mark a record as rejected with a human-readable reason.
    async fn mark_sync_failed(&self, local_id: i64, reason: &str) -> Result<()>;
}

/// Persisted API configuration and the current push token
#[async_trait]
pub trait PushCredentialStore: Send + Sync {
    async fn get_api_config(&self) -> Result<Option<ApiConfig>>;

    async fn get_push_token(&self) -> Result<Option<String>>;

    /// Replace the stored token. `None` clears it.
    async fn update_push_token(&self, token: Option<&str>, user_logged: Option<&str>)
        -> Result<()>;
}

/// Sync run history
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Open a new log entry in the `running` state and return its id.
    async fn create_sync_log(&self, kind: SyncKind) -> Result<i64>;

    async fn update_sync_log(&self, id: i64, update: &SyncLogUpdate) -> Result<()>;

    async fn update_last_sync_time(&self, kind: SyncKind) -> Result<()>;
}

/// Outcome of an explicit connection test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

/// Issues and caches payroll API tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return the cached token, authenticating only when none is stored.
    async fn valid_token(&self) -> Result<String>;

    /// Log in and persist the resulting token.
    ///
    /// `None` uses the credentials held in the store.
    async fn authenticate(&self, credentials: Option<Credentials>) -> Result<AuthToken>;

    /// Drop the cached token so the next call re-authenticates.
    async fn invalidate(&self) -> Result<()>;

    /// Force a fresh login and describe the result.
    async fn test_connection(&self) -> ConnectionStatus {
        match self.authenticate(None).await {
            Ok(token) => ConnectionStatus {
                connected: true,
                message: format!(
                    "Connection successful. Logged in as {}",
                    token.user_logged.as_deref().unwrap_or("unknown user")
                ),
            },
            Err(err) => ConnectionStatus { connected: false, message: err.user_message().to_string() },
        }
    }
}

/// Delivers one batch to the remote service
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Send `batch` with `token`. Failures are reported as
    /// [`BatchOutcome::Fatal`] rather than as errors.
    async fn send(&self, token: &str, batch: &[BatchEntry]) -> BatchOutcome;
}

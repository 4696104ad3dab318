//! Sync run bookkeeping, batch outcomes and progress events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Direction of a sync run recorded in the sync log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Push,
}

impl_domain_status_conversions!(SyncKind {
    Push => "push",
});

/// Terminal (or in-flight) status of a sync log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    Running,
    Success,
    Error,
}

impl_domain_status_conversions!(SyncLogStatus {
    Running => "running",
    Success => "success",
    Error => "error",
});

/// Token issued by the payroll login endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    /// Display name of the authenticated principal.
    pub user_logged: Option<String>,
    pub company_name: Option<String>,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("user_logged", &self.user_logged)
            .field("company_name", &self.company_name)
            .finish()
    }
}

/// Counters accumulated during a single push run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Every record fetched from the backlog, including skipped ones.
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    /// Records dropped before sending because they had no employee code.
    pub skipped: usize,
    pub batches_completed: usize,
    pub batches_total: usize,
}

/// Final values written to a sync log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogUpdate {
    pub status: SyncLogStatus,
    pub records_processed: usize,
    pub records_success: usize,
    pub records_failed: usize,
    pub error_message: Option<String>,
}

impl SyncLogUpdate {
    pub fn from_stats(
        status: SyncLogStatus,
        stats: &SyncStats,
        error_message: Option<String>,
    ) -> Self {
        Self {
            status,
            records_processed: stats.processed,
            records_success: stats.success,
            records_failed: stats.failed,
            error_message,
        }
    }
}

/// Sync log row as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub kind: SyncKind,
    pub status: SyncLogStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: usize,
    pub records_success: usize,
    pub records_failed: usize,
    pub error_message: Option<String>,
}

/// A record the remote service refused, with its application error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub id: i64,
    pub error_code: i64,
    pub reason: String,
}

/// Result of sending one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The remote service evaluated each record. Either list may be empty.
    Partial { synced: Vec<i64>, failed: Vec<RejectedRecord> },
    /// Transport or authentication failure; the run must stop.
    Fatal { reason: String },
}

/// Progress event emitted before each batch and once on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub batch_current: usize,
    pub batch_total: usize,
    pub batch_size: usize,
    pub success: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub completed: bool,
}

/// Summary returned to the caller of a push run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    /// False when the run halted on a fatal error or could not start.
    pub success: bool,
    pub message: String,
    pub stats: SyncStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_omits_completed_flag_until_final_event() {
        let progress = SyncProgress {
            batch_current: 1,
            batch_total: 3,
            batch_size: 50,
            success: 0,
            failed: 0,
            completed: false,
        };
        let json = serde_json::to_value(progress).expect("serialize");
        assert!(json.get("completed").is_none());

        let done = SyncProgress { completed: true, batch_size: 0, ..progress };
        let json = serde_json::to_value(done).expect("serialize");
        assert_eq!(json["completed"], true);
    }

    #[test]
    fn token_debug_hides_secret() {
        let token = AuthToken {
            token: "abc123".into(),
            user_logged: Some("HR Admin".into()),
            company_name: None,
        };
        assert!(!format!("{token:?}").contains("abc123"));
    }

    #[test]
    fn log_update_copies_counters() {
        let stats = SyncStats { processed: 5, success: 3, failed: 1, skipped: 1, ..SyncStats::default() };
        let update = SyncLogUpdate::from_stats(SyncLogStatus::Error, &stats, None);
        assert_eq!(update.records_processed, 5);
        assert_eq!(update.records_success, 3);
        assert_eq!(update.records_failed, 1);
    }
}

//! In-memory store used by push sync tests
//!
//! Implements every store port over shared maps so that a test can seed a
//! backlog, run the service and inspect exactly what was written back.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use punchsync_core::{PushCredentialStore, SyncLogRepository, TimesheetRepository};
use punchsync_domain::{
    ApiConfig, LogType, PunchSyncError, Result as DomainResult, SyncKind, SyncLogStatus,
    SyncLogUpdate, SyncState, TimesheetRecord,
};
use tokio::sync::Mutex as TokioMutex;

/// Build an unsynced record with a predictable sync id.
pub fn timesheet(id: i64, employee_code: Option<&str>) -> TimesheetRecord {
    TimesheetRecord {
        id,
        employee_code: employee_code.map(str::to_string),
        date: "2024-03-18".into(),
        time: format!("{:02}:{:02}", 7 + (id % 10), id % 60),
        log_type: if id % 2 == 0 { LogType::Out } else { LogType::In },
        sync_id: format!("terminal-1-{id}"),
        branch_id: None,
        sync_status: SyncState::Unsynced,
        sync_error: None,
        remote_id: None,
    }
}

/// `count` valid records with ids starting at 1.
pub fn backlog(count: i64) -> Vec<TimesheetRecord> {
    (1..=count).map(|id| timesheet(id, Some(&format!("EMP-{id:04}")))).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: i64,
    pub kind: SyncKind,
    pub status: SyncLogStatus,
    pub update: Option<SyncLogUpdate>,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    timesheets: Arc<TokioMutex<BTreeMap<i64, TimesheetRecord>>>,
    logs: Arc<TokioMutex<Vec<LogRow>>>,
    last_push_updates: Arc<AtomicUsize>,
    requested_limits: Arc<TokioMutex<Vec<usize>>>,
    synced_marks: Arc<AtomicUsize>,
    api_config: Arc<TokioMutex<Option<ApiConfig>>>,
    token: Arc<TokioMutex<Option<(String, Option<String>)>>>,
    fail_mark_synced: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn with_timesheets(records: Vec<TimesheetRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.timesheets.try_lock().expect("fresh store lock");
            for record in records {
                map.insert(record.id, record);
            }
        }
        store
    }

    /// Make every `mark_synced` call fail with a database error.
    pub fn with_fail_mark_synced(self) -> Self {
        self.fail_mark_synced.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_token(self, token: &str) -> Self {
        *self.token.try_lock().expect("fresh store lock") = Some((token.to_string(), None));
        self
    }

    pub async fn timesheet(&self, id: i64) -> TimesheetRecord {
        self.timesheets.lock().await.get(&id).cloned().expect("timesheet exists")
    }

    pub async fn count_in_state(&self, state: SyncState) -> usize {
        self.timesheets.lock().await.values().filter(|r| r.sync_status == state).count()
    }

    pub async fn logs(&self) -> Vec<LogRow> {
        self.logs.lock().await.clone()
    }

    pub async fn last_log(&self) -> LogRow {
        self.logs.lock().await.last().cloned().expect("sync log created")
    }

    pub fn last_push_updates(&self) -> usize {
        self.last_push_updates.load(Ordering::SeqCst)
    }

    pub fn synced_marks(&self) -> usize {
        self.synced_marks.load(Ordering::SeqCst)
    }

    pub async fn requested_limits(&self) -> Vec<usize> {
        self.requested_limits.lock().await.clone()
    }

    pub async fn stored_token(&self) -> Option<String> {
        self.token.lock().await.as_ref().map(|(token, _)| token.clone())
    }
}

#[async_trait]
impl TimesheetRepository for MemoryStore {
    async fn get_unsynced_timesheets(&self, limit: usize) -> DomainResult<Vec<TimesheetRecord>> {
        self.requested_limits.lock().await.push(limit);
        Ok(self
            .timesheets
            .lock()
            .await
            .values()
            .filter(|r| r.sync_status == SyncState::Unsynced)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_synced(&self, local_id: i64, remote_id: &str) -> DomainResult<()> {
        if self.fail_mark_synced.load(Ordering::SeqCst) {
            return Err(PunchSyncError::Database("database is locked".into()));
        }

        let mut map = self.timesheets.lock().await;
        let record = map
            .get_mut(&local_id)
            .ok_or_else(|| PunchSyncError::NotFound(format!("timesheet {local_id}")))?;
        assert_ne!(record.sync_status, SyncState::Synced, "timesheet {local_id} synced twice");
        record.sync_status = SyncState::Synced;
        record.remote_id = Some(remote_id.to_string());
        record.sync_error = None;
        self.synced_marks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_sync_failed(&self, local_id: i64, reason: &str) -> DomainResult<()> {
        let mut map = self.timesheets.lock().await;
        let record = map
            .get_mut(&local_id)
            .ok_or_else(|| PunchSyncError::NotFound(format!("timesheet {local_id}")))?;
        if record.sync_status != SyncState::Synced {
            record.sync_status = SyncState::Failed;
            record.sync_error = Some(reason.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SyncLogRepository for MemoryStore {
    async fn create_sync_log(&self, kind: SyncKind) -> DomainResult<i64> {
        let mut logs = self.logs.lock().await;
        let id = i64::try_from(logs.len()).expect("log count fits i64") + 1;
        logs.push(LogRow { id, kind, status: SyncLogStatus::Running, update: None });
        Ok(id)
    }

    async fn update_sync_log(&self, id: i64, update: &SyncLogUpdate) -> DomainResult<()> {
        let mut logs = self.logs.lock().await;
        let row = logs
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| PunchSyncError::NotFound(format!("sync log {id}")))?;
        row.status = update.status;
        row.update = Some(update.clone());
        Ok(())
    }

    async fn update_last_sync_time(&self, _kind: SyncKind) -> DomainResult<()> {
        self.last_push_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PushCredentialStore for MemoryStore {
    async fn get_api_config(&self) -> DomainResult<Option<ApiConfig>> {
        Ok(self.api_config.lock().await.clone())
    }

    async fn get_push_token(&self) -> DomainResult<Option<String>> {
        Ok(self.stored_token().await)
    }

    async fn update_push_token(
        &self,
        token: Option<&str>,
        user_logged: Option<&str>,
    ) -> DomainResult<()> {
        *self.token.lock().await =
            token.map(|t| (t.to_string(), user_logged.map(str::to_string)));
        Ok(())
    }
}

//! SQLite implementation of the push store ports.
//!
//! One store backs all three ports so that timesheets, credentials and the
//! sync log share a single database and pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use punchsync_core::{PushCredentialStore, SyncLogRepository, TimesheetRepository};
use punchsync_domain::constants::MAX_SYNC_ERROR_LENGTH;
use punchsync_domain::{
    ApiConfig, LogType, PunchSyncError, Result, SyncKind, SyncLogEntry, SyncLogStatus,
    SyncLogUpdate, SyncState, TimesheetRecord,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument, warn};

use super::manager::{map_sql_error, DbManager};

/// A punch captured by a terminal, before it has a local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimesheet {
    pub employee_code: Option<String>,
    pub date: String,
    pub time: String,
    pub log_type: LogType,
    pub sync_id: String,
    pub branch_id: Option<i64>,
}

pub struct SqliteSyncStore {
    db: Arc<DbManager>,
}

impl SqliteSyncStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Insert a newly captured punch as `unsynced` and return its id.
    pub async fn insert_timesheet(&self, timesheet: NewTimesheet) -> Result<i64> {
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO timesheets
                    (employee_code, date, time, log_type, sync_id, branch_id, sync_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'unsynced', ?7)",
                params![
                    timesheet.employee_code,
                    timesheet.date,
                    timesheet.time,
                    timesheet.log_type.as_str(),
                    timesheet.sync_id,
                    timesheet.branch_id,
                    now_millis(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn get_timesheet(&self, id: i64) -> Result<Option<TimesheetRecord>> {
        self.with_connection(move |conn| {
            conn.query_row(
                &format!("{TIMESHEET_SELECT} WHERE id = ?1"),
                params![id],
                map_timesheet_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    /// Persist the payroll endpoint and credentials.
    ///
    /// The cached token survives only if the endpoint and username are
    /// unchanged.
    pub async fn save_api_config(&self, config: &ApiConfig) -> Result<()> {
        let config = config.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO api_config (id, push_url, push_username, push_password, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    push_token = CASE
                        WHEN api_config.push_url IS excluded.push_url
                         AND api_config.push_username IS excluded.push_username
                        THEN api_config.push_token
                        ELSE NULL
                    END,
                    push_user_logged = CASE
                        WHEN api_config.push_url IS excluded.push_url
                         AND api_config.push_username IS excluded.push_username
                        THEN api_config.push_user_logged
                        ELSE NULL
                    END,
                    push_url = excluded.push_url,
                    push_username = excluded.push_username,
                    push_password = excluded.push_password,
                    updated_at = excluded.updated_at",
                params![config.push_url, config.push_username, config.push_password, now_millis()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    /// Return every `failed` record to `unsynced`. Returns the number reset.
    #[instrument(skip(self))]
    pub async fn reset_failed_timesheets(&self) -> Result<usize> {
        let reset = self
            .with_connection(|conn| {
                conn.execute(
                    "UPDATE timesheets SET sync_status = 'unsynced', sync_error = NULL
                     WHERE sync_status = 'failed'",
                    [],
                )
                .map_err(map_sql_error)
            })
            .await?;
        debug!(reset, "failed timesheets returned to the backlog");
        Ok(reset)
    }

    pub async fn get_sync_log(&self, id: i64) -> Result<Option<SyncLogEntry>> {
        self.with_connection(move |conn| {
            conn.query_row(
                "SELECT id, kind, status, started_at, completed_at, records_processed,
                        records_success, records_failed, error_message
                 FROM sync_logs WHERE id = ?1",
                params![id],
                map_sync_log_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    pub async fn get_last_sync_time(&self, kind: SyncKind) -> Result<Option<DateTime<Utc>>> {
        let millis = self
            .with_connection(move |conn| {
                conn.query_row(
                    "SELECT last_sync_at FROM sync_state WHERE kind = ?1",
                    params![kind.as_str()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
                .map_err(map_sql_error)
            })
            .await?;
        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }
}

#[async_trait]
impl TimesheetRepository for SqliteSyncStore {
    async fn get_unsynced_timesheets(&self, limit: usize) -> Result<Vec<TimesheetRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = usize_to_i64(limit);
        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{TIMESHEET_SELECT} WHERE sync_status = 'unsynced'
                     ORDER BY date, time, id LIMIT ?1"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![limit], map_timesheet_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
    }

    async fn mark_synced(&self, local_id: i64, remote_id: &str) -> Result<()> {
        let remote_id = remote_id.to_string();
        let updated = self
            .with_connection(move |conn| {
                conn.execute(
                    "UPDATE timesheets
                     SET sync_status = 'synced', remote_id = ?2, sync_error = NULL, synced_at = ?3
                     WHERE id = ?1 AND sync_status != 'synced'",
                    params![local_id, remote_id, now_millis()],
                )
                .map_err(map_sql_error)
            })
            .await?;

        if updated == 0 {
            debug!(local_id, "timesheet already synced or missing");
        }
        Ok(())
    }

    async fn mark_sync_failed(&self, local_id: i64, reason: &str) -> Result<()> {
        let reason = truncate_reason(reason);
        let updated = self
            .with_connection(move |conn| {
                conn.execute(
                    "UPDATE timesheets SET sync_status = 'failed', sync_error = ?2
                     WHERE id = ?1 AND sync_status != 'synced'",
                    params![local_id, reason],
                )
                .map_err(map_sql_error)
            })
            .await?;

        if updated == 0 {
            warn!(local_id, "refusing to mark a synced or missing timesheet as failed");
        }
        Ok(())
    }
}

#[async_trait]
impl PushCredentialStore for SqliteSyncStore {
    async fn get_api_config(&self) -> Result<Option<ApiConfig>> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT push_url, push_username, push_password FROM api_config WHERE id = 1",
                [],
                |row| {
                    Ok(ApiConfig {
                        push_url: row.get(0)?,
                        push_username: row.get(1)?,
                        push_password: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
    }

    async fn get_push_token(&self) -> Result<Option<String>> {
        let token = self
            .with_connection(|conn| {
                conn.query_row("SELECT push_token FROM api_config WHERE id = 1", [], |row| {
                    row.get::<_, Option<String>>(0)
                })
                .optional()
                .map_err(map_sql_error)
            })
            .await?;
        Ok(token.flatten().filter(|token| !token.is_empty()))
    }

    async fn update_push_token(&self, token: Option<&str>, user_logged: Option<&str>) -> Result<()> {
        let token = token.map(str::to_owned);
        let user_logged = user_logged.map(str::to_owned);
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO api_config (id, push_token, push_user_logged, updated_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    push_token = excluded.push_token,
                    push_user_logged = excluded.push_user_logged,
                    updated_at = excluded.updated_at",
                params![token, user_logged, now_millis()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncStore {
    async fn create_sync_log(&self, kind: SyncKind) -> Result<i64> {
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO sync_logs (kind, status, started_at) VALUES (?1, ?2, ?3)",
                params![kind.as_str(), SyncLogStatus::Running.as_str(), now_millis()],
            )
            .map_err(map_sql_error)?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn update_sync_log(&self, id: i64, update: &SyncLogUpdate) -> Result<()> {
        let update = update.clone();
        self.with_connection(move |conn| {
            let completed_at = (update.status != SyncLogStatus::Running).then(now_millis);
            let updated = conn
                .execute(
                    "UPDATE sync_logs
                     SET status = ?2, records_processed = ?3, records_success = ?4,
                         records_failed = ?5, error_message = ?6, completed_at = ?7
                     WHERE id = ?1",
                    params![
                        id,
                        update.status.as_str(),
                        usize_to_i64(update.records_processed),
                        usize_to_i64(update.records_success),
                        usize_to_i64(update.records_failed),
                        update.error_message,
                        completed_at,
                    ],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(PunchSyncError::NotFound(format!("sync log {id} not found")));
            }
            Ok(())
        })
        .await
    }

    async fn update_last_sync_time(&self, kind: SyncKind) -> Result<()> {
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO sync_state (kind, last_sync_at) VALUES (?1, ?2)
                 ON CONFLICT(kind) DO UPDATE SET last_sync_at = excluded.last_sync_at",
                params![kind.as_str(), now_millis()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

const TIMESHEET_SELECT: &str = "SELECT id, employee_code, date, time, log_type, sync_id,
        branch_id, sync_status, sync_error, remote_id
    FROM timesheets";

fn map_timesheet_row(row: &Row<'_>) -> rusqlite::Result<TimesheetRecord> {
    Ok(TimesheetRecord {
        id: row.get(0)?,
        employee_code: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        log_type: parse_column(row, 4)?,
        sync_id: row.get(5)?,
        branch_id: row.get(6)?,
        sync_status: parse_column::<SyncState>(row, 7)?,
        sync_error: row.get(8)?,
        remote_id: row.get(9)?,
    })
}

fn map_sync_log_row(row: &Row<'_>) -> rusqlite::Result<SyncLogEntry> {
    Ok(SyncLogEntry {
        id: row.get(0)?,
        kind: parse_column(row, 1)?,
        status: parse_column(row, 2)?,
        started_at: timestamp_column(row, 3)?,
        completed_at: row
            .get::<_, Option<i64>>(4)?
            .map(|millis| millis_to_datetime(millis, 4))
            .transpose()?,
        records_processed: count_column(row, 5)?,
        records_success: count_column(row, 6)?,
        records_failed: count_column(row, 7)?,
        error_message: row.get(8)?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    millis_to_datetime(row.get(idx)?, idx)
}

fn millis_to_datetime(millis: i64, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(idx)?;
    usize::try_from(value).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err))
    })
}

fn truncate_reason(reason: &str) -> String {
    reason.chars().take(MAX_SYNC_ERROR_LENGTH).collect()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_join_error(err: task::JoinError) -> PunchSyncError {
    if err.is_cancelled() {
        PunchSyncError::Internal("blocking database task cancelled".into())
    } else {
        PunchSyncError::Internal(format!("blocking database task failed: {err}"))
    }
}

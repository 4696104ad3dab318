//! Shared fixtures for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use punchsync_domain::{ApiConfig, LogType};
use punchsync_infra::database::{DbManager, NewTimesheet, SqliteSyncStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{Request, Respond, ResponseTemplate};

pub const USERNAME: &str = "kiosk-01";
pub const PASSWORD: &str = "kiosk-secret";

/// Temporary migrated database that lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub store: Arc<SqliteSyncStore>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("punchsync-test.db");

        let manager = Arc::new(DbManager::new(&db_path, 4, None).expect("db manager"));
        manager.run_migrations().expect("migrations should run");
        let store = Arc::new(SqliteSyncStore::new(Arc::clone(&manager)));

        Self { manager, store, _temp_dir: temp_dir }
    }

    /// Store the payroll endpoint and the test credentials.
    pub async fn configure_payroll(&self, base_url: &str) {
        self.store
            .save_api_config(&ApiConfig {
                push_url: Some(base_url.to_string()),
                push_username: Some(USERNAME.to_string()),
                push_password: Some(PASSWORD.to_string()),
            })
            .await
            .expect("api config saved");
    }

    /// Insert `count` punches with employee codes and return their ids.
    pub async fn seed_punches(&self, count: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let punch = NewTimesheet {
                employee_code: Some(format!("EMP-{:04}", n % 7)),
                date: "2024-03-18".to_string(),
                time: format!("{:02}:{:02}", 6 + n / 60, n % 60),
                log_type: if n % 2 == 0 { LogType::In } else { LogType::Out },
                sync_id: format!("terminal-1-{n}"),
                branch_id: Some(1),
            };
            ids.push(self.store.insert_timesheet(punch).await.expect("punch inserted"));
        }
        ids
    }

    pub fn count_with_status(&self, status: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection");
        conn.query_row(
            "SELECT count(*) FROM timesheets WHERE sync_status = ?1",
            [status],
            |row| row.get(0),
        )
        .expect("count query")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Login response body carrying `token`.
pub fn login_ok(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token": token,
        "user_logged": "Kiosk Operator",
        "company_name": "Acme Foods"
    }))
}

/// Ids of the `log_list` entries in a sync request body.
pub fn batch_ids(request: &Request) -> Vec<i64> {
    let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
    body["log_list"]
        .as_array()
        .map(|entries| entries.iter().filter_map(|entry| entry["id"].as_i64()).collect())
        .unwrap_or_default()
}

/// Accepts every record of every batch, except the listed ids which are
/// rejected with `error_code`.
pub struct AcceptBatch {
    pub rejected: Vec<i64>,
    pub error_code: i64,
}

impl AcceptBatch {
    pub fn all() -> Self {
        Self { rejected: Vec::new(), error_code: 0 }
    }

    pub fn rejecting(rejected: Vec<i64>, error_code: i64) -> Self {
        Self { rejected, error_code }
    }
}

impl Respond for AcceptBatch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let (failed, synced): (Vec<i64>, Vec<i64>) =
            batch_ids(request).into_iter().partition(|id| self.rejected.contains(id));
        let logs_not_sync: Vec<Value> = failed
            .into_iter()
            .map(|id| json!({"id": id, "error_code": self.error_code, "reason": "rejected"}))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "logs_successfully_sync": synced,
            "logs_not_sync": logs_not_sync
        }))
    }
}

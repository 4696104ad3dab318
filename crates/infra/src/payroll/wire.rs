//! Request and response bodies of the payroll API

use punchsync_domain::constants::UNKNOWN_REMOTE_REASON;
use punchsync_domain::{BatchEntry, RejectedRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_logged: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST sync-time-in-out/`.
///
/// `from_biometrics` tells the service to read `log_list`;
/// `from_new_biometrics` makes it resolve employees by code instead of key.
#[derive(Debug, Serialize)]
pub struct SyncRequest<'a> {
    pub from_biometrics: bool,
    pub from_new_biometrics: bool,
    pub log_list: &'a [BatchEntry],
}

impl<'a> SyncRequest<'a> {
    pub const fn new(log_list: &'a [BatchEntry]) -> Self {
        Self { from_biometrics: true, from_new_biometrics: true, log_list }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub logs_successfully_sync: Vec<i64>,
    #[serde(default)]
    pub logs_not_sync: Vec<RejectedLog>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectedLog {
    pub id: i64,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<RejectedLog> for RejectedRecord {
    fn from(log: RejectedLog) -> Self {
        Self {
            id: log.id,
            error_code: log.error_code.unwrap_or(0),
            reason: log.reason.unwrap_or_else(|| UNKNOWN_REMOTE_REASON.to_string()),
        }
    }
}

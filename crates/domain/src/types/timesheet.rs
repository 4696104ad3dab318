//! Timesheet records captured by biometric terminals and their wire projection

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Punch direction recorded by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    In,
    Out,
}

impl_domain_status_conversions!(LogType {
    In => "in",
    Out => "out",
});

impl LogType {
    /// Upper-case form expected by the payroll API.
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

/// Local synchronization state of a timesheet record
///
/// `Unsynced -> Synced` happens exactly once. `Failed -> Unsynced` only
/// happens through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Unsynced,
    Synced,
    Failed,
}

impl_domain_status_conversions!(SyncState {
    Unsynced => "unsynced",
    Synced => "synced",
    Failed => "failed",
});

/// A single attendance event held in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetRecord {
    pub id: i64,
    /// Payroll employee code; records without one cannot be pushed.
    pub employee_code: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub log_type: LogType,
    /// Idempotency key presented to the remote service.
    pub sync_id: String,
    pub branch_id: Option<i64>,
    pub sync_status: SyncState,
    pub sync_error: Option<String>,
    pub remote_id: Option<String>,
}

impl TimesheetRecord {
    /// Employee code with surrounding whitespace removed, if non-empty.
    pub fn employee(&self) -> Option<&str> {
        self.employee_code.as_deref().map(str::trim).filter(|code| !code.is_empty())
    }
}

/// Wire projection of a [`TimesheetRecord`] inside a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: i64,
    pub employee: String,
    pub log_time: String,
    pub log_type: String,
    pub sync_id: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
}

impl BatchEntry {
    /// Project a record onto the wire shape. Returns `None` when the record has
    /// no usable employee code.
    pub fn from_record(record: &TimesheetRecord) -> Option<Self> {
        let employee = record.employee()?;
        Some(Self {
            id: record.id,
            employee: employee.to_string(),
            log_time: record.time.clone(),
            log_type: record.log_type.wire_code().to_string(),
            sync_id: record.sync_id.clone(),
            date: record.date.clone(),
            branch_id: record.branch_id,
        })
    }
}

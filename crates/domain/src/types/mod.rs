//! Domain types and models

pub mod sync;
pub mod timesheet;

pub use sync::{
    AuthToken, BatchOutcome, PushReport, RejectedRecord, SyncKind, SyncLogEntry, SyncLogStatus,
    SyncLogUpdate, SyncProgress, SyncStats,
};
pub use timesheet::{BatchEntry, LogType, SyncState, TimesheetRecord};

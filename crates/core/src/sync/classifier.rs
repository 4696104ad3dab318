//! Human-readable messages for remote failures
//!
//! The payroll service reports per-record problems as numeric application
//! codes and batch-level problems as HTTP statuses. Both are translated into
//! text an operator can act on.

use punchsync_domain::constants::UNKNOWN_REMOTE_REASON;
use punchsync_domain::PunchSyncError;

/// Known application error codes reported in `logs_not_sync`.
pub fn app_error_message(code: i64) -> Option<&'static str> {
    let message = match code {
        100 => "Invalid request format",
        101 => "Missing required field",
        102 => "Invalid date format",
        103 => "Invalid time format",
        110 => "Invalid employee code",
        120 => "Duplicate record already exists",
        130 => "Branch not found",
        140 => "Employee not found in payroll system",
        141 => "Employee is inactive",
        142 => "Employee not assigned to branch",
        143 => "Employee not recognized in payroll system",
        150 => "Invalid log type",
        160 => "Record outside allowed date range",
        200 => "Server processing error",
        500 => "Payroll server internal error",
        _ => return None,
    };
    Some(message)
}

/// Message for a rejected record. Unknown codes fall back to the remote reason
/// unless it is empty or the generic placeholder.
pub fn friendly_app_error(code: i64, reason: &str) -> String {
    if let Some(message) = app_error_message(code) {
        return message.to_string();
    }

    let reason = reason.trim();
    if reason.is_empty() || reason == UNKNOWN_REMOTE_REASON {
        format!("Sync failed (error code {code})")
    } else {
        reason.to_string()
    }
}

/// Known HTTP statuses returned by the payroll endpoints.
pub fn http_error_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "Bad request - the data sent was invalid",
        401 => "Authentication expired - please log in again",
        403 => "Access denied - insufficient permissions",
        404 => "Payroll API endpoint not found - check your URL configuration",
        408 => "Request timed out - the server took too long to respond",
        429 => "Too many requests - please wait before trying again",
        500 => "Payroll server error - please try again later",
        502 => "Payroll server is temporarily unavailable",
        503 => "Payroll service is under maintenance",
        504 => "Payroll server timed out",
        _ => return None,
    };
    Some(message)
}

pub fn friendly_http_error(status: u16) -> String {
    if let Some(message) = http_error_message(status) {
        return message.to_string();
    }

    match status {
        400..=499 => format!("Request error ({status}) - check your configuration"),
        500..=599 => format!("Payroll server error ({status}) - please try again later"),
        _ => format!("Unexpected response from payroll server ({status})"),
    }
}

/// Coarse category of a domain error, used for log labels and branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Transport,
    Storage,
    Input,
    Internal,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::Transport => "transport",
            Self::Storage => "storage",
            Self::Input => "input",
            Self::Internal => "internal",
        }
    }
}

pub const fn classify(err: &PunchSyncError) -> ErrorKind {
    match err {
        PunchSyncError::Config(_) => ErrorKind::Configuration,
        PunchSyncError::Auth(_) => ErrorKind::Authentication,
        PunchSyncError::Timeout(_) | PunchSyncError::Connection(_) | PunchSyncError::Network(_) => {
            ErrorKind::Transport
        }
        PunchSyncError::Database(_) | PunchSyncError::NotFound(_) => ErrorKind::Storage,
        PunchSyncError::InvalidInput(_) => ErrorKind::Input,
        PunchSyncError::Internal(_) => ErrorKind::Internal,
    }
}

//! Conversions from external infrastructure errors into domain errors.

use punchsync_domain::PunchSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PunchSyncError);

impl From<InfraError> for PunchSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PunchSyncError> for InfraError {
    fn from(value: PunchSyncError) -> Self {
        Self(value)
    }
}

trait IntoPunchSyncError {
    fn into_punchsync(self) -> PunchSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → PunchSyncError */
/* -------------------------------------------------------------------------- */

impl IntoPunchSyncError for SqlError {
    fn into_punchsync(self) -> PunchSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        PunchSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        PunchSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        PunchSyncError::Database("unique constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => PunchSyncError::Database(
                        "database key rejected or database not encrypted".into(),
                    ),
                    _ => PunchSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => PunchSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                PunchSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                PunchSyncError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidQuery => PunchSyncError::Database("invalid SQL query".into()),
            other => PunchSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_punchsync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → PunchSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(PunchSyncError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PunchSyncError */
/* -------------------------------------------------------------------------- */

impl IntoPunchSyncError for HttpError {
    fn into_punchsync(self) -> PunchSyncError {
        if self.is_timeout() {
            return PunchSyncError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return PunchSyncError::Connection("HTTP connection failure".into());
        }

        if self.is_decode() {
            return PunchSyncError::Network(format!("invalid response body: {self}"));
        }

        PunchSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_punchsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

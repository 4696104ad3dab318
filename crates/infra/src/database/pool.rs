//! r2d2 pool of rusqlite connections
//!
//! Every connection gets the same pragmas on checkout. When an encryption key
//! is configured the SQLCipher key is applied first.

use std::path::Path;
use std::time::Duration;

use punchsync_domain::{PunchSyncError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, instrument, warn};

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

#[derive(Clone)]
pub struct PoolConfig {
    pub max_size: u32,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
    pub encryption_key: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            encryption_key: None,
        }
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("max_size", &self.max_size)
            .field("connection_timeout", &self.connection_timeout)
            .field("busy_timeout", &self.busy_timeout)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Builds the pool and checks out one connection so that a wrong key or an
/// unreadable file fails here instead of on first use.
#[instrument(skip(config), fields(db_path = %path.display(), pool_size = config.max_size))]
pub fn create_pool(path: &Path, config: PoolConfig) -> Result<SqlitePool> {
    let init_config = config.clone();
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| apply_connection_pragmas(conn, &init_config));

    let pool = Pool::builder()
        .max_size(config.max_size.max(1))
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|err| {
            warn!(error = %err, "failed to create connection pool");
            map_pool_error(&err)
        })?;

    {
        let conn = pool.get().map_err(|err| map_pool_error(&err))?;
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|err| {
                PunchSyncError::Database(format!("database is not readable: {err}"))
            })?;
    }

    info!(encrypted = config.encryption_key.is_some(), "sqlite pool ready");
    Ok(pool)
}

/// Pragmas applied to every pooled connection.
pub fn apply_connection_pragmas(conn: &Connection, config: &PoolConfig) -> rusqlite::Result<()> {
    // must precede any other statement
    if let Some(key) = config.encryption_key.as_deref() {
        conn.pragma_update(None, "key", key)?;
    }

    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(config.busy_timeout)
}

fn map_pool_error(err: &r2d2::Error) -> PunchSyncError {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("not a database") || lower.contains("encrypted") {
        PunchSyncError::Database("database key rejected or database not encrypted".into())
    } else {
        PunchSyncError::Database(format!("connection pool error: {message}"))
    }
}

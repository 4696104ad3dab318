//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Remote payroll service
pub const DEFAULT_PAYROLL_BASE_URL: &str = "https://yahshuapayroll.com/api";
pub const LOGIN_PATH: &str = "api-auth/";
pub const SYNC_PATH: &str = "sync-time-in-out/";
pub const USER_AGENT: &str = "Biometric Integration/1.0";

// Timeouts
pub const LOGIN_TIMEOUT_SECS: u64 = 30;
pub const PUSH_TIMEOUT_SECS: u64 = 60;

// Batching
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_BACKLOG_LIMIT: usize = 10_000;

// Storage
pub const DEFAULT_DB_PATH: &str = "punchsync.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
pub const MAX_SYNC_ERROR_LENGTH: usize = 256;

// Remote placeholder reason that carries no information
pub const UNKNOWN_REMOTE_REASON: &str = "Unknown error";

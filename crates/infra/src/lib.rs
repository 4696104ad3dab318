//! # PunchSync Infrastructure
//!
//! Implementations of the core push ports.
//!
//! This crate contains:
//! - SQLite persistence (timesheets, API configuration, sync log)
//! - The HTTP client and the payroll API adapters
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `punchsync-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod payroll;

pub use database::{DbManager, NewTimesheet, SqliteSyncStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use payroll::{HttpBatchTransport, PayrollTokenManager};

//! # PunchSync Domain
//!
//! Business domain types for the biometric timesheet push engine.
//!
//! This crate contains:
//! - Timesheet records and their wire projection
//! - Sync log, progress and batch outcome types
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other PunchSync crates
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

//! # PunchSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the local store, token issuance and batch
//!   delivery
//! - Error classification, batch building and the push orchestrator
//!
//! ## Architecture Principles
//! - Only depends on `punchsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod sync;

// Re-export specific items to avoid ambiguity
pub use sync::ports::{
    BatchTransport, ConnectionStatus, PushCredentialStore, SyncLogRepository, TimesheetRepository,
    TokenProvider,
};
pub use sync::{NoopProgressSink, ProgressSink, PushSyncService};

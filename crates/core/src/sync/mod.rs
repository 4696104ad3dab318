//! Push synchronization of timesheet records to the payroll service

pub mod batch_builder;
pub mod classifier;
pub mod ports;
pub mod progress;
pub mod service;

pub use batch_builder::{BatchBuilder, BuiltBatches};
pub use classifier::{classify, friendly_app_error, friendly_http_error, ErrorKind};
pub use progress::{NoopProgressSink, ProgressSink};
pub use service::{summary_message, PushPhase, PushSyncService, CANCELLED_REASON};

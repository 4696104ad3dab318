//! Adapters for the remote payroll API

pub mod auth;
pub mod transport;
pub mod wire;

pub use auth::PayrollTokenManager;
pub use transport::HttpBatchTransport;

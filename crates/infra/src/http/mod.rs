//! HTTP client wrapper shared by the payroll adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};

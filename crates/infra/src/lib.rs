//! # Batchline Infrastructure
//!
//! Infrastructure implementations of core batch ports.
//!
//! This crate contains:
//! - The HTTP batch transport for objects, references and delete filters
//! - Conversions from reqwest errors into faults and domain errors
//! - The configuration loader (environment, TOML and JSON files)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `batchline-core`
//! - Contains all "impure" code (network, files, process environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod telemetry;
pub mod transport;

// Re-export commonly used items
pub use errors::{fault_from_reqwest, InfraError};
pub use http::{HttpClient, HttpClientBuilder};
pub use telemetry::{init_tracing, LogFormat};
pub use transport::HttpBatchTransport;

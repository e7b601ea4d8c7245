//! # Batchline Domain
//!
//! Data types shared by the batch write engine and its adapters.
//!
//! This crate contains:
//! - Write items (objects, references, delete filters) and batches
//! - Per-item and aggregated batch results
//! - Retry policy and transport fault types
//! - Configuration structures and the domain error type
//!
//! ## Architecture
//! - No dependencies on other Batchline crates
//! - No I/O; pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod serde_util;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;

//! Infrastructure error handling.

pub mod conversions;

pub use conversions::{fault_from_reqwest, InfraError};

//! Domain-level constants

/// Default number of items per batch when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of concurrent submission workers.
pub const DEFAULT_POOL_SIZE: usize = 1;

/// Default per-request deadline for the HTTP transport, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Maximum length kept for error messages copied out of transport faults.
pub const MAX_ERROR_DETAIL_LENGTH: usize = 512;

/// Suffix appended when an error message is truncated.
pub const TRUNCATE_SUFFIX: &str = "...";

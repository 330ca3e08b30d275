//! API constants

/// Versioned prefix for every non-probe route
pub const API_PREFIX: &str = "/api/v0";

/// Service name reported in logs and health responses
pub const SERVICE_NAME: &str = "invoice-import";

/// Largest accepted request body (invoice files and event payloads)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

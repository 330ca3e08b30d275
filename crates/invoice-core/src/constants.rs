//! Protocol constants for the import transaction lifecycle.

/// Validity window of a minted upload credential.
pub const UPLOAD_URL_EXPIRES_SECS: u64 = 300;

/// Lifetime of a transaction record after issuance.
pub const TRANSACTION_TTL_SECS: i64 = 120;

/// Minimum number of characters an invoice number must have.
pub const MIN_INVOICE_NUMBER_LEN: usize = 5;

/// Wall-clock budget for a single handler invocation.
pub const HANDLER_TIMEOUT_SECS: u64 = 2;

/// Bound on a single notifier call. Kept below the handler budget so a
/// stalled gateway cannot consume it.
pub const NOTIFIER_TIMEOUT_SECS: u64 = 1;

/// How often expired transaction records are physically removed.
pub const TRANSACTION_PURGE_INTERVAL_SECS: u64 = 300;

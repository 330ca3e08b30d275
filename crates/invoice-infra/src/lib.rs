//! Invoice Import Infrastructure Library
//!
//! Shared infrastructure components used by the import service:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Connection notifiers (gateway management API, in-process registry)

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod notifier;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

#[cfg(feature = "notifier-http")]
pub use notifier::HttpConnectionNotifier;
pub use notifier::{ConnectionNotifier, ConnectionRegistry, OutboundFrame};

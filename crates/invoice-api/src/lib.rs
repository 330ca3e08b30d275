//! Invoice Import API Library
//!
//! HTTP and WebSocket surface for the import pipeline, plus application setup.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;

pub use error::ErrorResponse;

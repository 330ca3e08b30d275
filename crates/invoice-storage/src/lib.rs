//! Invoice Storage Library
//!
//! Object access for uploaded invoice files: minting time-limited write
//! credentials, reading and deleting the uploaded objects.
//!
//! # Object key format
//!
//! The object key of an upload is its transaction token, stored flat at the
//! bucket root. Keys must not be empty, contain `..` or start with `/`.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use invoice_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectAccess, StorageError, StorageResult};

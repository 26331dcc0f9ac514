//! Object stage store for the upload pipeline.
//!
//! Files live under two key namespaces in the same bucket/directory:
//! final keys (`weddings/{wedding_id}/{timestamp}_{random}.{ext}`) and
//! temporary staging keys (the same key prefixed with `temp/`). The client
//! or the API server stages raw bytes at the temporary key; the worker
//! promotes optimized bytes to the final key and deletes the staged copy.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use keys::{derive_keys, replace_extension, temp_key_for, KeyPair, TEMP_PREFIX};
pub use local::LocalStorage;
pub use s3::S3Storage;
pub use traits::{Storage, StorageBackend, StorageError, StorageResult};

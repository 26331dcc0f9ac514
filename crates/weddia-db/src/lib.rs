//! Postgres repositories for the upload pipeline.
//!
//! Soft delete is applied as an explicit repository-layer filter: every media
//! read carries `deleted_at IS NULL` rather than relying on query rewriting.

pub mod media;
pub mod traits;
pub mod upload_jobs;

pub use media::MediaRepository;
pub use traits::{JobStore, MediaStore};
pub use upload_jobs::UploadJobRepository;

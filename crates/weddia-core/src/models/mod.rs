pub mod media;
pub mod upload_job;

pub use media::{Media, MediaType};
pub use upload_job::{FileMetadata, JobDescriptor, JobSnapshot, JobStatus, UploadJob};

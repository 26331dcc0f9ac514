pub mod health;
pub mod media_list;
pub mod media_upload;
pub mod process_job;
pub mod upload_complete;
pub mod upload_initiate;
pub mod upload_presigned;
pub mod upload_status;

//! Background processing worker and job dispatcher.
//!
//! One worker invocation owns one job: it marks the job processing, walks the
//! staged files sequentially, optimizes and promotes each one, and finalizes
//! the job after every file has been attempted exactly once. A single file's
//! failure never aborts the batch.

pub mod dispatcher;
pub mod hooks;
pub mod processor;
pub mod queue;
pub mod test_helpers;

pub use dispatcher::{JobDispatcher, JobTransport};
pub use hooks::{GalleryRefresh, NoopGalleryRefresh};
pub use processor::{JobOutcome, JobProcessor};
pub use queue::{HttpQueue, MessageQueue, QueueError};

//! The meeting job lifecycle: model, persistence, processing and queueing.

mod error;
pub mod model;
pub mod processor;
pub mod queue;
pub mod service;
mod status;
pub mod store;

pub use error::JobError;
pub use model::{Job, JobStatusView, JobSummaryView};
pub use processor::StageProcessor;
pub use queue::{JobQueue, JobQueueHandle, QueueSlot};
pub use service::{JobService, UploadReceipt};
pub use status::JobStatus;
pub use store::JobStore;

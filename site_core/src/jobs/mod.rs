//! Video-processing job service: filesystem-backed store, script runner and
//! the wire models shared with the polling client.

pub mod models;
pub mod repository;
pub mod runner;

pub use models::{stage, stage_progress, Job, JobStatus, LogChunk, SourceType};
pub use repository::{FsJobStore, JobStore};
pub use runner::JobRunner;

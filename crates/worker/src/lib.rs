//! Job runtime for vigil.
//!
//! Analysis passes run as [`Job`]s on the blocking pool. [`JobScheduler`]
//! bounds how many run at once and queues the rest in submission order;
//! running jobs see a [`JobMonitor`] for cancellation and progress.

mod class;
mod context;
mod job;
mod scheduler;
mod spawn;

pub use class::TaskClass;
pub use context::{JobContext, JobMonitor};
pub use job::{Job, JobError, JobId, JobState};
pub use scheduler::JobScheduler;

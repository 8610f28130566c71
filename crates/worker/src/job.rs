use std::fmt;
use std::sync::Arc;

use crate::{JobContext, TaskClass};

/// Error returned by a job body. Logged by the scheduler, never propagated.
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) type JobBody = Box<dyn FnOnce(&JobContext) -> Result<(), JobError> + Send + 'static>;
pub(crate) type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync + 'static>;

/// Identifier handed out by [`crate::JobScheduler::submit`]. Monotonic per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

impl JobId {
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "job#{}", self.0)
	}
}

/// Lifecycle of a submitted job. `Completed` is terminal and is reached
/// whether the body succeeded, failed, panicked or observed cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
	Queued,
	Running,
	Completed,
}

/// A unit of work for the scheduler: a name, a class and a blocking body.
pub struct Job {
	pub(crate) name: Arc<str>,
	pub(crate) class: TaskClass,
	pub(crate) body: JobBody,
	pub(crate) on_progress: Option<ProgressFn>,
}

impl Job {
	/// Creates a background job running `body` on the blocking pool.
	pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
	where
		F: FnOnce(&JobContext) -> Result<(), JobError> + Send + 'static,
	{
		Self {
			name: name.into(),
			class: TaskClass::Background,
			body: Box::new(body),
			on_progress: None,
		}
	}

	/// Sets the execution class.
	#[must_use]
	pub fn class(mut self, class: TaskClass) -> Self {
		self.class = class;
		self
	}

	/// Registers a `(total, completed)` progress callback.
	#[must_use]
	pub fn on_progress<F>(mut self, callback: F) -> Self
	where
		F: Fn(usize, usize) + Send + Sync + 'static,
	{
		self.on_progress = Some(Arc::new(callback));
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Debug for Job {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Job")
			.field("name", &self.name)
			.field("class", &self.class)
			.field("has_progress", &self.on_progress.is_some())
			.finish_non_exhaustive()
	}
}

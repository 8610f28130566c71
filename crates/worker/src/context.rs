use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use crate::JobId;
use crate::job::ProgressFn;

/// Minimal host capability a running job sees: advisory cancellation and progress reporting.
pub trait JobMonitor {
	/// Whether a stop was requested. Jobs should check this between units of work.
	fn is_cancelled(&self) -> bool;

	/// Announces the total number of work units.
	fn begin(&self, total_units: usize);

	/// Reports `units` additional completed work units.
	fn worked(&self, units: usize);
}

/// Per-job context passed to the job body.
pub struct JobContext {
	id: JobId,
	cancel: CancellationToken,
	total: AtomicUsize,
	completed: AtomicUsize,
	on_progress: Option<ProgressFn>,
}

impl JobContext {
	pub(crate) fn new(id: JobId, cancel: CancellationToken, on_progress: Option<ProgressFn>) -> Self {
		Self {
			id,
			cancel,
			total: AtomicUsize::new(0),
			completed: AtomicUsize::new(0),
			on_progress,
		}
	}

	pub fn id(&self) -> JobId {
		self.id
	}

	/// Child token for handing cancellation to nested work.
	pub fn cancellation(&self) -> CancellationToken {
		self.cancel.child_token()
	}

	/// Completed units so far.
	pub fn completed_units(&self) -> usize {
		self.completed.load(Ordering::Relaxed)
	}

	fn notify(&self) {
		if let Some(callback) = &self.on_progress {
			callback(self.total.load(Ordering::Relaxed), self.completed.load(Ordering::Relaxed));
		}
	}
}

impl JobMonitor for JobContext {
	fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	fn begin(&self, total_units: usize) {
		self.total.store(total_units, Ordering::Relaxed);
		self.completed.store(0, Ordering::Relaxed);
		self.notify();
	}

	fn worked(&self, units: usize) {
		self.completed.fetch_add(units, Ordering::Relaxed);
		self.notify();
	}
}

impl std::fmt::Debug for JobContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JobContext")
			.field("id", &self.id)
			.field("cancelled", &self.cancel.is_cancelled())
			.field("total", &self.total)
			.field("completed", &self.completed)
			.finish()
	}
}

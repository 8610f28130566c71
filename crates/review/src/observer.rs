use std::time::Duration;

use vigil_analysis::TaskId;
use vigil_primitives::ProjectId;

/// What one analysis job did, reported after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
	pub project: ProjectId,
	pub task: TaskId,
	/// Files selected for analysis.
	pub files: usize,
	pub rules: usize,
	/// Findings installed as annotations.
	pub annotations: usize,
	pub processing_errors: usize,
	pub missing_files: usize,
	pub cancelled: bool,
	pub failed: bool,
	pub engine_duration: Duration,
	/// Wall time of the whole job, engine and reconciliation included.
	pub duration: Duration,
}

/// Host hooks for job progress and completion.
///
/// Called from worker threads; implementations must not block for long.
pub trait ReviewObserver: Send + Sync {
	fn on_progress(&self, _project: &ProjectId, _total: usize, _completed: usize) {}

	fn on_task_summary(&self, _summary: &TaskSummary) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReviewObserver for NoopObserver {}

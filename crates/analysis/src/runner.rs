//! Batched execution of an [`AnalysisTask`] against the engine.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil_config::DEFAULT_BATCH_SIZE;
use vigil_primitives::{FileDescriptor, Finding, ProjectId, ResourceTree};
use vigil_worker::JobMonitor;

use crate::files::{collect_files, extension_filter, passes_extension_filter};
use crate::{AnalysisTask, Engine, EngineError, ProcessingError, TaskId};

/// Runner settings taken from workspace preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
	/// Files per engine call (minimum 1).
	pub batch_size: usize,
	/// Analyze only files whose extension belongs to a configured language.
	pub filter_by_extension: bool,
}

impl Default for RunnerOptions {
	fn default() -> Self {
		Self {
			batch_size: DEFAULT_BATCH_SIZE,
			filter_by_extension: true,
		}
	}
}

/// The engine failed part-way through a task.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
	#[error("engine failed on batch {batch} of {project} ({files} files)")]
	Engine {
		project: ProjectId,
		batch: usize,
		files: usize,
		#[source]
		source: EngineError,
	},
}

/// Everything a finished (or stopped) task produced.
#[derive(Debug)]
pub struct AnalysisOutcome {
	pub task: TaskId,
	pub project: ProjectId,
	/// One entry per successfully analyzed file; an empty list means the file is clean.
	pub findings_by_file: BTreeMap<PathBuf, Vec<Finding>>,
	pub processing_errors: Vec<ProcessingError>,
	pub batch_durations: Vec<Duration>,
	/// Files selected for analysis, whether or not every batch ran.
	pub file_count: usize,
	pub rule_count: usize,
	pub engine_duration: Duration,
	pub cancelled: bool,
	pub failure: Option<AnalysisError>,
}

impl AnalysisOutcome {
	fn new(task: &AnalysisTask, file_count: usize) -> Self {
		Self {
			task: task.id(),
			project: task.project().clone(),
			findings_by_file: BTreeMap::new(),
			processing_errors: Vec::new(),
			batch_durations: Vec::new(),
			file_count,
			rule_count: task.configuration().rule_count(),
			engine_duration: Duration::ZERO,
			cancelled: false,
			failure: None,
		}
	}

	/// Number of findings across all analyzed files.
	pub fn finding_count(&self) -> usize {
		self.findings_by_file.values().map(Vec::len).sum()
	}
}

/// Runs analysis tasks batch by batch.
pub struct TaskRunner {
	engine: Arc<dyn Engine>,
	tree: Arc<dyn ResourceTree>,
	options: RunnerOptions,
}

impl TaskRunner {
	pub fn new(engine: Arc<dyn Engine>, tree: Arc<dyn ResourceTree>, options: RunnerOptions) -> Self {
		Self { engine, tree, options }
	}

	pub fn options(&self) -> RunnerOptions {
		self.options
	}

	/// Existing files of the task's scope that pass the extension filter and the
	/// configuration's include/exclude patterns, sorted by path.
	pub fn files_for(&self, task: &AnalysisTask) -> Vec<FileDescriptor> {
		let configuration = task.configuration();
		let filter = extension_filter(configuration, self.options.filter_by_extension);
		collect_files(task.scope(), self.tree.as_ref())
			.into_iter()
			.filter(|file| file.exists && passes_extension_filter(file, filter.as_ref()) && configuration.applies(&file.path))
			.collect()
	}

	/// Runs `task`, checking `monitor` for cancellation before every batch.
	///
	/// Engine failures stop the run and are reported in
	/// [`AnalysisOutcome::failure`]; batches completed before the failure
	/// keep their results.
	pub fn run(&self, task: &AnalysisTask, monitor: &dyn JobMonitor) -> AnalysisOutcome {
		let files = self.files_for(task);
		let mut outcome = AnalysisOutcome::new(task, files.len());
		monitor.begin(files.len());

		if files.is_empty() {
			tracing::debug!(task = %task.id(), project = %task.project(), "analysis.nothing_to_do");
			return outcome;
		}
		if outcome.rule_count == 0 {
			// No rules: every selected file is clean.
			tracing::debug!(task = %task.id(), project = %task.project(), files = files.len(), "analysis.no_rules");
			outcome.findings_by_file = files.iter().map(|file| (file.path.clone(), Vec::new())).collect();
			monitor.worked(files.len());
			return outcome;
		}

		let batch_size = self.options.batch_size.max(1);
		for (batch, chunk) in files.chunks(batch_size).enumerate() {
			if monitor.is_cancelled() {
				tracing::info!(task = %task.id(), project = %task.project(), batch, "analysis.cancelled");
				outcome.cancelled = true;
				break;
			}

			let started = Instant::now();
			let result = self.engine.analyze(chunk, task.configuration());
			let elapsed = started.elapsed();
			outcome.engine_duration += elapsed;
			outcome.batch_durations.push(elapsed);

			match result {
				Ok(report) => merge_batch(&mut outcome, chunk, report.findings, report.errors),
				Err(source) => {
					tracing::error!(task = %task.id(), project = %task.project(), batch, files = chunk.len(), error = %source, "analysis.engine_failed");
					outcome.failure = Some(AnalysisError::Engine {
						project: task.project().clone(),
						batch,
						files: chunk.len(),
						source,
					});
					break;
				}
			}
			monitor.worked(chunk.len());
		}

		tracing::debug!(
			task = %task.id(),
			project = %task.project(),
			files = outcome.findings_by_file.len(),
			findings = outcome.finding_count(),
			errors = outcome.processing_errors.len(),
			duration_ms = outcome.engine_duration.as_millis() as u64,
			"analysis.finished"
		);
		outcome
	}
}

/// Folds one batch's engine output into the outcome.
fn merge_batch(outcome: &mut AnalysisOutcome, chunk: &[FileDescriptor], findings: Vec<Finding>, errors: Vec<ProcessingError>) {
	let batch: HashSet<&Path> = chunk.iter().map(|file| file.path.as_path()).collect();
	for file in chunk {
		outcome.findings_by_file.insert(file.path.clone(), Vec::new());
	}

	for finding in findings {
		match outcome.findings_by_file.get_mut(&finding.path) {
			Some(list) if batch.contains(finding.path.as_path()) => list.push(finding),
			_ => tracing::warn!(path = %finding.path.display(), rule = %finding.rule, "analysis.finding_outside_batch"),
		}
	}

	// A file the engine could not process keeps its previous annotations.
	for error in errors {
		tracing::warn!(path = %error.path.display(), message = %error.message, "analysis.processing_error");
		if batch.contains(error.path.as_path()) {
			outcome.findings_by_file.remove(&error.path);
		}
		outcome.processing_errors.push(error);
	}
}

impl std::fmt::Debug for TaskRunner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TaskRunner").field("options", &self.options).finish_non_exhaustive()
	}
}

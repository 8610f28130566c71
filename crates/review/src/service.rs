//! The trigger entry point.
//!
//! A trigger resolves configuration for every project in the scope, sizes
//! each project's share, and submits one analysis job per project that
//! passes. Jobs run the engine, reconcile the annotation store, and report
//! a [`TaskSummary`] to the observer.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil_analysis::{AnalysisOutcome, AnalysisTask, Engine, RunnerOptions, ScopeSizer, SizingPolicy, TaskRunner};
use vigil_annotations::{AnnotationReconciler, AnnotationStore, ReconcileOptions, ReconcileReport};
use vigil_config::{ConfigError, ConfigStore, Preferences, ResolvedProject, RuleConfigurationResolver};
use vigil_primitives::{ProjectId, ResourceTree, Scope};
use vigil_worker::{Job, JobError, JobId, JobScheduler, TaskClass};

use crate::{NoopObserver, ReviewObserver, TaskSummary};

/// Trigger failure. Nothing was submitted when this is returned.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// A project job handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTask {
	pub project: ProjectId,
	pub job: JobId,
	pub file_count: usize,
}

/// A project share left out by the incremental threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedScope {
	pub project: ProjectId,
	pub file_count: usize,
	pub max_incremental_count: usize,
}

/// What a trigger decided, per project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerReport {
	pub submitted: Vec<SubmittedTask>,
	pub skipped: Vec<SkippedScope>,
	/// Projects with analysis disabled, skipped because the run was automatic.
	pub disabled: Vec<ProjectId>,
	/// Files whose annotations were cleared because the delta removed them.
	pub cleared: usize,
}

impl TriggerReport {
	pub fn job_ids(&self) -> impl Iterator<Item = JobId> + '_ {
		self.submitted.iter().map(|task| task.job)
	}
}

/// Collaborators of a [`ReviewService`].
pub struct ReviewContext {
	pub config: Arc<dyn ConfigStore>,
	pub tree: Arc<dyn ResourceTree>,
	pub engine: Arc<dyn Engine>,
	pub store: Arc<AnnotationStore>,
	pub scheduler: JobScheduler,
}

/// Decides what to analyze for a scope and schedules it.
pub struct ReviewService {
	resolver: RuleConfigurationResolver,
	tree: Arc<dyn ResourceTree>,
	engine: Arc<dyn Engine>,
	sizer: ScopeSizer,
	reconciler: Arc<AnnotationReconciler>,
	scheduler: JobScheduler,
	observer: Arc<dyn ReviewObserver>,
}

impl ReviewService {
	pub fn new(context: ReviewContext) -> Self {
		let ReviewContext {
			config,
			tree,
			engine,
			store,
			scheduler,
		} = context;
		Self {
			resolver: RuleConfigurationResolver::new(config),
			sizer: ScopeSizer::new(Arc::clone(&tree)),
			reconciler: Arc::new(AnnotationReconciler::new(store, Arc::clone(&tree))),
			tree,
			engine,
			scheduler,
			observer: Arc::new(NoopObserver),
		}
	}

	/// Replaces the progress and summary observer.
	#[must_use]
	pub fn with_observer(mut self, observer: Arc<dyn ReviewObserver>) -> Self {
		self.observer = observer;
		self
	}

	pub fn store(&self) -> &Arc<AnnotationStore> {
		self.reconciler.store()
	}

	pub fn scheduler(&self) -> &JobScheduler {
		&self.scheduler
	}

	/// Forgets cached project properties so the next trigger reloads them.
	pub fn invalidate_configuration(&self) {
		self.resolver.invalidate();
	}

	/// Requests analysis of `scope`.
	///
	/// `user_initiated` marks an explicit request: it bypasses the incremental
	/// threshold and the per-project enable flag.
	///
	/// # Errors
	///
	/// Returns [`ReviewError::Config`] if any project's configuration cannot
	/// be loaded; no job is submitted and no annotation is cleared in that case.
	pub fn trigger(&self, scope: &Scope, user_initiated: bool) -> Result<TriggerReport, ReviewError> {
		let mut report = TriggerReport::default();
		if scope.is_empty() {
			tracing::debug!(user_initiated, "review.empty_scope");
			return Ok(report);
		}

		let preferences = self.resolver.store().preferences();
		let mut resolved = Vec::new();
		for (project, share) in scope.split_by_project() {
			let project_config = self.resolver.resolve(&project).inspect_err(|error| {
				tracing::error!(project = %project, %error, "review.config_unavailable");
			})?;
			resolved.push((share, project_config));
		}

		let removed = removed_paths(scope);
		if !removed.is_empty() {
			report.cleared = self.reconciler.remove_files(removed);
		}

		for (share, project_config) in resolved {
			let project = project_config.project.clone();
			if !project_config.properties.enabled && !user_initiated {
				tracing::debug!(project = %project, "review.project_disabled");
				report.disabled.push(project);
				continue;
			}

			let policy = SizingPolicy {
				full_build_enabled: project_config.properties.full_build_enabled,
				user_initiated,
				max_incremental_count: preferences.max_incremental_count,
				filter_by_extension: preferences.determine_filetypes_automatically,
			};
			let decision = self.sizer.evaluate(&share, &project_config.configuration, policy);
			if !decision.proceed {
				report.skipped.push(SkippedScope {
					project,
					file_count: decision.file_count,
					max_incremental_count: preferences.max_incremental_count,
				});
				continue;
			}
			if decision.file_count == 0 {
				tracing::debug!(project = %project, "review.no_matching_files");
				continue;
			}

			let task = AnalysisTask::new(project.clone(), share, Arc::clone(&project_config.configuration), user_initiated);
			let job = self.job_for(task, &project_config, &preferences);
			let id = self.scheduler.submit(job);
			tracing::debug!(project = %project, job = %id, files = decision.file_count, user_initiated, "review.submitted");
			report.submitted.push(SubmittedTask {
				project,
				job: id,
				file_count: decision.file_count,
			});
		}

		tracing::info!(
			submitted = report.submitted.len(),
			skipped = report.skipped.len(),
			disabled = report.disabled.len(),
			cleared = report.cleared,
			user_initiated,
			"review.triggered"
		);
		Ok(report)
	}

	/// Waits until every job submitted so far has completed.
	pub async fn await_idle(&self) {
		self.scheduler.await_all().await;
	}

	fn job_for(&self, task: AnalysisTask, project_config: &ResolvedProject, preferences: &Preferences) -> Job {
		let runner = TaskRunner::new(
			Arc::clone(&self.engine),
			Arc::clone(&self.tree),
			RunnerOptions {
				batch_size: preferences.batch_size,
				filter_by_extension: preferences.determine_filetypes_automatically,
			},
		);
		let reconciler = Arc::clone(&self.reconciler);
		let observer = Arc::clone(&self.observer);
		let options = ReconcileOptions {
			violations_as_errors: project_config.properties.violations_as_errors,
		};
		let class = if task.user_initiated() { TaskClass::Interactive } else { TaskClass::Background };
		let progress_observer = Arc::clone(&self.observer);
		let progress_project = task.project().clone();

		Job::new(format!("vigil: {}", task.project()), move |ctx| -> Result<(), JobError> {
			let started = Instant::now();
			let outcome = runner.run(&task, ctx);
			let reconciled = reconciler.reconcile(&outcome.findings_by_file, options);
			let summary = summarize(&task, &outcome, &reconciled, started.elapsed());
			log_performance(&summary);
			observer.on_task_summary(&summary);

			match outcome.failure {
				Some(failure) => Err(failure.into()),
				None => Ok(()),
			}
		})
		.class(class)
		.on_progress(move |total, completed| progress_observer.on_progress(&progress_project, total, completed))
	}
}

impl std::fmt::Debug for ReviewService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReviewService")
			.field("resolver", &self.resolver)
			.field("scheduler", &self.scheduler)
			.finish_non_exhaustive()
	}
}

fn summarize(task: &AnalysisTask, outcome: &AnalysisOutcome, reconciled: &ReconcileReport, duration: Duration) -> TaskSummary {
	TaskSummary {
		project: task.project().clone(),
		task: task.id(),
		files: outcome.file_count,
		rules: outcome.rule_count,
		annotations: reconciled.annotations,
		processing_errors: outcome.processing_errors.len(),
		missing_files: reconciled.errors.len(),
		cancelled: outcome.cancelled,
		failed: outcome.failure.is_some(),
		engine_duration: outcome.engine_duration,
		duration,
	}
}

fn log_performance(summary: &TaskSummary) {
	let duration_ms = summary.engine_duration.as_secs_f64() * 1000.0;
	let per = |count: usize| if count == 0 { 0.0 } else { duration_ms / count as f64 };
	tracing::info!(
		project = %summary.project,
		task = %summary.task,
		files = summary.files,
		rules = summary.rules,
		annotations = summary.annotations,
		duration_ms = duration_ms as u64,
		ms_per_file = per(summary.files),
		ms_per_rule = per(summary.rules),
		cancelled = summary.cancelled,
		failed = summary.failed,
		"review.performance"
	);
}

/// Files a delta removed.
fn removed_paths(scope: &Scope) -> Vec<&Path> {
	match scope {
		Scope::Delta(delta) => delta.removed_files().into_iter().map(|resource| resource.path.as_path()).collect(),
		Scope::Resources(_) => Vec::new(),
	}
}

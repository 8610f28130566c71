//! Bounded-concurrency job admission with a FIFO overflow queue.
//!
//! At most `max_concurrency` jobs run at once. Further submissions wait in
//! submission order and are started by the completion hook of whichever
//! running job finishes first. Every job ends in [`JobState::Completed`],
//! including ones that fail, panic or observe cancellation, so a slot is
//! always released.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::spawn::{spawn_job, spawn_supervisor};
use crate::{Job, JobContext, JobId, JobState};

/// Admits jobs up to a concurrency limit and queues the rest.
///
/// Cheap to clone; clones share the same admission state.
#[derive(Clone)]
pub struct JobScheduler {
	inner: Arc<Inner>,
}

struct Inner {
	max_concurrency: usize,
	next_id: AtomicU64,
	root_cancel: CancellationToken,
	state: Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
	running: usize,
	peak_running: usize,
	queue: VecDeque<PendingJob>,
	jobs: HashMap<JobId, JobEntry>,
}

struct PendingJob {
	id: JobId,
	job: Job,
	cancel: CancellationToken,
}

struct JobEntry {
	name: Arc<str>,
	state: watch::Sender<JobState>,
	cancel: CancellationToken,
}

impl JobScheduler {
	/// Creates a scheduler admitting up to `max_concurrency` jobs at once (minimum 1).
	pub fn new(max_concurrency: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				max_concurrency: max_concurrency.max(1),
				next_id: AtomicU64::new(0),
				root_cancel: CancellationToken::new(),
				state: Mutex::new(SchedulerState::default()),
			}),
		}
	}

	pub fn max_concurrency(&self) -> usize {
		self.inner.max_concurrency
	}

	/// Starts `job` immediately if a slot is free, otherwise appends it to the queue.
	///
	/// Never blocks the caller. Jobs submitted after [`Self::shutdown`] are
	/// still admitted but observe cancellation from their first check.
	pub fn submit(&self, job: Job) -> JobId {
		let id = JobId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
		let cancel = self.inner.root_cancel.child_token();
		let (state_tx, _) = watch::channel(JobState::Queued);

		let mut state = self.inner.state.lock();
		state.jobs.retain(|_, entry| *entry.state.borrow() != JobState::Completed);
		state.jobs.insert(
			id,
			JobEntry {
				name: Arc::clone(&job.name),
				state: state_tx,
				cancel: cancel.clone(),
			},
		);

		let pending = PendingJob { id, job, cancel };
		if state.running < self.inner.max_concurrency {
			Inner::start(&self.inner, &mut state, pending);
		} else {
			tracing::debug!(job = %id, name = %pending.job.name, queued = state.queue.len() + 1, "scheduler.enqueue");
			state.queue.push_back(pending);
		}
		id
	}

	/// Current state of `id`, or `None` if it was never issued by this scheduler.
	pub fn state(&self, id: JobId) -> Option<JobState> {
		if let Some(entry) = self.inner.state.lock().jobs.get(&id) {
			return Some(*entry.state.borrow());
		}
		(id.0 < self.inner.next_id.load(Ordering::Relaxed)).then_some(JobState::Completed)
	}

	/// Waits until `id` has completed. Returns immediately for unknown or finished jobs.
	pub async fn await_one(&self, id: JobId) {
		let rx = self.inner.state.lock().jobs.get(&id).map(|entry| entry.state.subscribe());
		if let Some(mut rx) = rx {
			let _ = rx.wait_for(|state| *state == JobState::Completed).await;
		}
	}

	/// Waits for every job submitted before this call. Jobs submitted while
	/// waiting are not included.
	pub async fn await_all(&self) {
		let receivers: Vec<_> = {
			let state = self.inner.state.lock();
			state
				.jobs
				.values()
				.filter(|entry| *entry.state.borrow() != JobState::Completed)
				.map(|entry| entry.state.subscribe())
				.collect()
		};
		for mut rx in receivers {
			let _ = rx.wait_for(|state| *state == JobState::Completed).await;
		}
	}

	/// Requests cancellation of one job. Returns false if the job is unknown or already completed.
	pub fn cancel(&self, id: JobId) -> bool {
		let state = self.inner.state.lock();
		match state.jobs.get(&id) {
			Some(entry) if *entry.state.borrow() != JobState::Completed => {
				tracing::debug!(job = %id, name = %entry.name, "scheduler.cancel");
				entry.cancel.cancel();
				true
			}
			_ => false,
		}
	}

	/// Cancels every running and queued job. Queued jobs still pass through
	/// admission so their completion is observable.
	pub fn shutdown(&self) {
		let state = self.inner.state.lock();
		tracing::info!(running = state.running, queued = state.queue.len(), "scheduler.shutdown");
		self.inner.root_cancel.cancel();
	}

	pub fn running(&self) -> usize {
		self.inner.state.lock().running
	}

	pub fn queued(&self) -> usize {
		self.inner.state.lock().queue.len()
	}

	/// Highest number of simultaneously running jobs observed so far.
	pub fn peak_running(&self) -> usize {
		self.inner.state.lock().peak_running
	}

	pub fn is_idle(&self) -> bool {
		let state = self.inner.state.lock();
		state.running == 0 && state.queue.is_empty()
	}
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new(10)
	}
}

impl std::fmt::Debug for JobScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("JobScheduler")
			.field("max_concurrency", &self.inner.max_concurrency)
			.field("running", &state.running)
			.field("queued", &state.queue.len())
			.finish()
	}
}

impl Inner {
	/// Marks `pending` running and hands it to the blocking pool. Caller holds the state lock.
	fn start(this: &Arc<Self>, state: &mut SchedulerState, pending: PendingJob) {
		let PendingJob { id, job, cancel } = pending;
		state.running += 1;
		state.peak_running = state.peak_running.max(state.running);
		if let Some(entry) = state.jobs.get(&id) {
			entry.state.send_replace(JobState::Running);
		}
		tracing::debug!(job = %id, name = %job.name, running = state.running, "scheduler.start");

		let inner = Arc::clone(this);
		spawn_supervisor(id, async move {
			let Job {
				name,
				class,
				body,
				on_progress,
			} = job;
			let started = Instant::now();
			let result = spawn_job(id, &name, class, move || {
				let ctx = JobContext::new(id, cancel, on_progress);
				body(&ctx)
			})
			.await;
			let elapsed_ms = started.elapsed().as_millis() as u64;

			match result {
				Ok(Ok(())) => tracing::debug!(job = %id, name = %name, elapsed_ms, "scheduler.job_done"),
				Ok(Err(error)) => tracing::warn!(job = %id, name = %name, elapsed_ms, %error, "scheduler.job_failed"),
				Err(join_error) if join_error.is_panic() => {
					let message = panic_message(join_error.into_panic());
					tracing::error!(job = %id, name = %name, elapsed_ms, panic = %message, "scheduler.job_panicked");
				}
				Err(join_error) => tracing::warn!(job = %id, name = %name, elapsed_ms, error = %join_error, "scheduler.job_aborted"),
			}

			inner.complete(id);
		});
	}

	/// Completion hook: releases the slot and admits the queue head, atomically.
	fn complete(self: &Arc<Self>, id: JobId) {
		let mut state = self.state.lock();
		state.running = state.running.saturating_sub(1);
		if let Some(entry) = state.jobs.get(&id) {
			entry.state.send_replace(JobState::Completed);
		}
		if let Some(next) = state.queue.pop_front() {
			Self::start(self, &mut state, next);
		}
	}
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

//! Where jobs execute.
//!
//! Job bodies go to the blocking pool of the caller's tokio runtime. Callers
//! outside any runtime (plain threads, build hooks) share one lazily built
//! runtime instead.

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::{JobId, TaskClass};

const SHARED_RUNTIME_THREADS: usize = 2;

/// Runtime the scheduler spawns on: the ambient one if present, else the shared one.
pub(crate) fn job_runtime() -> Handle {
	if let Ok(handle) = Handle::try_current() {
		return handle;
	}

	static SHARED: OnceLock<Runtime> = OnceLock::new();
	SHARED
		.get_or_init(|| {
			Builder::new_multi_thread()
				.enable_all()
				.worker_threads(SHARED_RUNTIME_THREADS)
				.thread_name("vigil-jobs")
				.build()
				.expect("failed to build the shared vigil job runtime")
		})
		.handle()
		.clone()
}

/// Runs a job body on the blocking pool inside a `job` span.
pub(crate) fn spawn_job<F, R>(id: JobId, name: &Arc<str>, class: TaskClass, body: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let span = tracing::debug_span!("job", job = %id, name = %name, class = class.as_str());
	job_runtime().spawn_blocking(move || {
		let _entered = span.entered();
		body()
	})
}

/// Spawns the async task that awaits a job and releases its slot.
pub(crate) fn spawn_supervisor<F>(id: JobId, supervisor: F) -> JoinHandle<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	tracing::trace!(job = %id, worker_class = TaskClass::Supervision.as_str(), "worker.supervise");
	job_runtime().spawn(supervisor)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jobs_run_without_an_ambient_runtime() {
		let handle = spawn_job(JobId(7), &Arc::from("answer"), TaskClass::Background, || 21 * 2);
		assert_eq!(job_runtime().block_on(handle).unwrap(), 42);
	}

	#[tokio::test]
	async fn supervisors_run_on_the_callers_runtime() {
		let (done_tx, done_rx) = tokio::sync::oneshot::channel();
		spawn_supervisor(JobId(1), async move {
			let _ = done_tx.send(());
		})
		.await
		.unwrap();
		assert!(done_rx.await.is_ok());
	}
}

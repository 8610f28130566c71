//! Installs analysis results into the [`AnnotationStore`].
//!
//! Each reconciliation covers a batch of files: every file in the batch has
//! its records replaced wholesale, every file outside it is left alone.
//! Batches touching the same file serialize through per-file locks taken in
//! sorted path order; disjoint batches run concurrently.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use vigil_primitives::{Finding, ResourceTree};

use crate::store::FileUpdate;
use crate::{AnnotationRecord, AnnotationStore};

/// Failure to install annotations for one file. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
	#[error("cannot annotate {}: file no longer exists", path.display())]
	MissingFile { path: PathBuf },
}

/// Per-batch options derived from the analyzed project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
	pub violations_as_errors: bool,
}

impl Default for ReconcileOptions {
	fn default() -> Self {
		Self { violations_as_errors: true }
	}
}

/// Summary of one reconciliation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
	/// Files present in the batch.
	pub files: usize,
	/// Files whose stored records actually changed.
	pub files_changed: usize,
	/// Records now installed for the batch's files.
	pub annotations: usize,
	pub errors: Vec<ReconcileError>,
}

/// Replaces per-file annotation records from analysis output.
pub struct AnnotationReconciler {
	store: Arc<AnnotationStore>,
	tree: Arc<dyn ResourceTree>,
	file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AnnotationReconciler {
	pub fn new(store: Arc<AnnotationStore>, tree: Arc<dyn ResourceTree>) -> Self {
		Self {
			store,
			tree,
			file_locks: Mutex::new(HashMap::new()),
		}
	}

	pub fn store(&self) -> &Arc<AnnotationStore> {
		&self.store
	}

	/// Replaces the records of every file in `findings_by_file`.
	///
	/// An empty finding list clears the file. Records are sorted so that
	/// reconciling the same map twice leaves the store unchanged.
	pub fn reconcile(&self, findings_by_file: &BTreeMap<PathBuf, Vec<Finding>>, options: ReconcileOptions) -> ReconcileReport {
		let mut report = ReconcileReport {
			files: findings_by_file.len(),
			..ReconcileReport::default()
		};
		if findings_by_file.is_empty() {
			return report;
		}

		let locks = self.locks_for(findings_by_file.keys());
		let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();

		let mut updates: Vec<FileUpdate> = Vec::with_capacity(findings_by_file.len());
		for (path, findings) in findings_by_file {
			if !self.tree.exists(path) {
				let error = ReconcileError::MissingFile { path: path.clone() };
				tracing::warn!(path = %path.display(), %error, "annotations.missing_file");
				report.errors.push(error);
				updates.push((path.clone(), None));
				continue;
			}

			let mut records: Vec<_> = findings
				.iter()
				.map(|finding| AnnotationRecord::from_finding(path.clone(), finding, options.violations_as_errors))
				.collect();
			records.sort_by(AnnotationRecord::canonical_cmp);
			report.annotations += records.len();
			updates.push((path.clone(), Some(Arc::from(records))));
		}

		report.files_changed = self.store.apply(updates);
		tracing::debug!(
			files = report.files,
			changed = report.files_changed,
			annotations = report.annotations,
			missing = report.errors.len(),
			"annotations.reconciled"
		);
		report
	}

	/// Drops all records of `paths`, e.g. for deleted files.
	pub fn remove_files<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> usize {
		let mut paths: Vec<&Path> = paths.into_iter().collect();
		paths.sort_unstable();
		paths.dedup();
		if paths.is_empty() {
			return 0;
		}

		let locks = self.locks_for(paths.iter().copied());
		let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();
		let removed = self.store.apply(paths.iter().map(|path| (path.to_path_buf(), None)).collect());
		tracing::debug!(requested = paths.len(), removed, "annotations.removed");
		removed
	}

	/// Per-file locks for `paths`, in the order given (callers pass sorted paths).
	fn locks_for<'a, P>(&self, paths: impl Iterator<Item = &'a P>) -> Vec<Arc<Mutex<()>>>
	where
		P: AsRef<Path> + ?Sized + 'a,
	{
		let mut registry = self.file_locks.lock();
		registry.retain(|_, lock| Arc::strong_count(lock) > 1);
		paths
			.map(|path| Arc::clone(registry.entry(path.as_ref().to_path_buf()).or_default()))
			.collect()
	}
}

impl std::fmt::Debug for AnnotationReconciler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AnnotationReconciler")
			.field("store", &self.store)
			.field("locked_files", &self.file_locks.lock().len())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests;

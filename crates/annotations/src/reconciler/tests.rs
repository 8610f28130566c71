use std::collections::HashSet;
use std::thread;

use parking_lot::RwLock;
use pretty_assertions::assert_eq;
use vigil_primitives::{FileDescriptor, Resource, RulePriority};

use super::*;
use crate::{AnnotationEvent, AnnotationSeverity, VisualWeight};

#[derive(Default)]
struct ExistingFiles {
	paths: RwLock<HashSet<PathBuf>>,
}

impl ExistingFiles {
	fn with(paths: &[&str]) -> Arc<Self> {
		let tree = Self::default();
		tree.paths.write().extend(paths.iter().map(PathBuf::from));
		Arc::new(tree)
	}

	fn delete(&self, path: &str) {
		self.paths.write().remove(Path::new(path));
	}
}

impl ResourceTree for ExistingFiles {
	fn walk(&self, _resource: &Resource) -> Box<dyn Iterator<Item = FileDescriptor> + '_> {
		Box::new(std::iter::empty())
	}

	fn exists(&self, path: &Path) -> bool {
		self.paths.read().contains(path)
	}
}

fn finding(path: &str, line: u32, rule: &str, priority: u8) -> Finding {
	Finding {
		path: PathBuf::from(path),
		begin_line: line,
		end_line: line,
		rule: rule.to_string(),
		priority: RulePriority::new(priority),
		message: format!("{rule} violated"),
	}
}

fn batch(entries: &[(&str, Vec<Finding>)]) -> BTreeMap<PathBuf, Vec<Finding>> {
	entries.iter().map(|(path, findings)| (PathBuf::from(path), findings.clone())).collect()
}

fn reconciler(tree: Arc<ExistingFiles>) -> AnnotationReconciler {
	AnnotationReconciler::new(Arc::new(AnnotationStore::new()), tree)
}

const X: &str = "core/src/X.java";
const Y: &str = "core/src/Y.java";
const Z: &str = "core/src/Z.java";

#[test]
fn reconciling_twice_is_idempotent() {
	let reconciler = reconciler(ExistingFiles::with(&[X, Y]));
	let findings = batch(&[
		(X, vec![finding(X, 9, "UnusedLocalVariable", 3), finding(X, 2, "EmptyCatchBlock", 1)]),
		(Y, vec![finding(Y, 4, "SystemPrintln", 2)]),
	]);

	let first = reconciler.reconcile(&findings, ReconcileOptions::default());
	let after_first: Vec<_> = [X, Y].iter().map(|p| reconciler.store().get(Path::new(p))).collect();
	let version = reconciler.store().version();
	let second = reconciler.reconcile(&findings, ReconcileOptions::default());
	let after_second: Vec<_> = [X, Y].iter().map(|p| reconciler.store().get(Path::new(p))).collect();

	assert_eq!(first.files_changed, 2);
	assert_eq!(second.files_changed, 0);
	assert_eq!(after_first, after_second);
	assert_eq!(reconciler.store().version(), version);
	let lines: Vec<_> = after_first[0].iter().map(|r| r.attributes.line).collect();
	assert_eq!(lines, vec![2, 9]);
}

#[test]
fn batch_leaves_other_files_untouched() {
	let reconciler = reconciler(ExistingFiles::with(&[X, Y, Z]));
	reconciler.reconcile(&batch(&[(Z, vec![finding(Z, 1, "EmptyCatchBlock", 1)])]), ReconcileOptions::default());
	let z_before = reconciler.store().get(Path::new(Z));

	reconciler.reconcile(
		&batch(&[(X, vec![finding(X, 5, "SystemPrintln", 3)]), (Y, vec![])]),
		ReconcileOptions::default(),
	);

	assert_eq!(reconciler.store().get(Path::new(Z)), z_before);
	assert_eq!(reconciler.store().files(), vec![PathBuf::from(X), PathBuf::from(Z)]);
}

#[test]
fn empty_finding_list_clears_file() {
	let reconciler = reconciler(ExistingFiles::with(&[X]));
	reconciler.reconcile(&batch(&[(X, vec![finding(X, 1, "EmptyCatchBlock", 1)])]), ReconcileOptions::default());
	assert_eq!(reconciler.store().error_count(), 1);

	let report = reconciler.reconcile(&batch(&[(X, vec![])]), ReconcileOptions::default());

	assert_eq!(report.files_changed, 1);
	assert!(reconciler.store().get(Path::new(X)).is_empty());
	assert_eq!(reconciler.store().error_count(), 0);
}

#[test]
fn priority_one_follows_violations_as_errors_flag() {
	let reconciler = reconciler(ExistingFiles::with(&[X]));
	let findings = batch(&[(X, vec![finding(X, 1, "EmptyCatchBlock", 1)])]);

	reconciler.reconcile(&findings, ReconcileOptions { violations_as_errors: true });
	let record = reconciler.store().get(Path::new(X))[0].clone();
	assert_eq!((record.severity, record.weight), (AnnotationSeverity::Error, VisualWeight::High));

	reconciler.reconcile(&findings, ReconcileOptions { violations_as_errors: false });
	let record = reconciler.store().get(Path::new(X))[0].clone();
	assert_eq!((record.severity, record.weight), (AnnotationSeverity::Warning, VisualWeight::High));
	assert_eq!(reconciler.store().warning_count(), 1);
	assert!(reconciler.store().files_with_errors().is_empty());
}

#[test]
fn missing_file_is_reported_and_stale_records_dropped() {
	let tree = ExistingFiles::with(&[X, Y]);
	let reconciler = reconciler(Arc::clone(&tree));
	reconciler.reconcile(
		&batch(&[(X, vec![finding(X, 1, "EmptyCatchBlock", 1)]), (Y, vec![finding(Y, 1, "EmptyCatchBlock", 1)])]),
		ReconcileOptions::default(),
	);

	tree.delete(Y);
	let report = reconciler.reconcile(
		&batch(&[(X, vec![finding(X, 3, "SystemPrintln", 3)]), (Y, vec![finding(Y, 2, "SystemPrintln", 3)])]),
		ReconcileOptions::default(),
	);

	assert_eq!(report.errors, vec![ReconcileError::MissingFile { path: PathBuf::from(Y) }]);
	assert_eq!(report.annotations, 1);
	assert!(reconciler.store().get(Path::new(Y)).is_empty());
	assert_eq!(reconciler.store().get(Path::new(X))[0].attributes.line, 3);
}

#[test]
fn remove_files_clears_deleted_paths() {
	let reconciler = reconciler(ExistingFiles::with(&[X, Y]));
	reconciler.reconcile(
		&batch(&[(X, vec![finding(X, 1, "EmptyCatchBlock", 1)]), (Y, vec![finding(Y, 1, "EmptyCatchBlock", 1)])]),
		ReconcileOptions::default(),
	);

	let removed = reconciler.remove_files([Path::new(Y), Path::new(Y), Path::new(Z)]);

	assert_eq!(removed, 1);
	assert_eq!(reconciler.store().files(), vec![PathBuf::from(X)]);
}

#[test]
fn events_report_changed_files() {
	let (store, mut events) = AnnotationStore::with_events();
	let reconciler = AnnotationReconciler::new(Arc::new(store), ExistingFiles::with(&[X]));

	reconciler.reconcile(
		&batch(&[(X, vec![finding(X, 1, "EmptyCatchBlock", 1), finding(X, 2, "SystemPrintln", 3)])]),
		ReconcileOptions::default(),
	);

	assert_eq!(
		events.try_recv().ok(),
		Some(AnnotationEvent {
			path: PathBuf::from(X),
			error_count: 1,
			warning_count: 1,
		})
	);
	assert!(events.try_recv().is_err());
}

#[test]
fn overlapping_batches_from_many_threads_settle_consistently() {
	let files: Vec<String> = (0..8).map(|i| format!("core/src/F{i}.java")).collect();
	let names: Vec<&str> = files.iter().map(String::as_str).collect();
	let reconciler = Arc::new(reconciler(ExistingFiles::with(&names)));

	let handles: Vec<_> = (0..8)
		.map(|worker| {
			let reconciler = Arc::clone(&reconciler);
			let files = files.clone();
			thread::spawn(move || {
				for round in 0..25 {
					// Each worker touches an overlapping window, in varying order of insertion.
					let mut window: Vec<_> = files.iter().cycle().skip(worker).take(3).collect();
					if round % 2 == 1 {
						window.reverse();
					}
					let map: BTreeMap<_, _> = window.iter().map(|path| (PathBuf::from(path), vec![finding(path, 1, "EmptyCatchBlock", 1)])).collect();
					reconciler.reconcile(&map, ReconcileOptions::default());
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	for path in &files {
		assert_eq!(reconciler.store().get(Path::new(path)).len(), 1);
	}
	assert_eq!(reconciler.store().error_count(), 8);
}

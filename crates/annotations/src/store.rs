//! Read side of the annotation model.
//!
//! The store maps each file to its current annotation records. Readers get a
//! shared snapshot per file; writers replace whole files at once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::AnnotationRecord;

/// Event emitted when the annotations of one file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEvent {
	pub path: PathBuf,
	pub error_count: usize,
	pub warning_count: usize,
}

pub type AnnotationEventSender = mpsc::UnboundedSender<AnnotationEvent>;
pub type AnnotationEventReceiver = mpsc::UnboundedReceiver<AnnotationEvent>;

/// Per-file annotation records shared between the reconciler and readers.
pub struct AnnotationStore {
	files: RwLock<HashMap<PathBuf, Arc<[AnnotationRecord]>>>,
	event_sender: Option<AnnotationEventSender>,
	/// Bumped on every file change.
	version: AtomicU64,
}

/// Replacement for one file. `None` removes the file's entry.
pub(crate) type FileUpdate = (PathBuf, Option<Arc<[AnnotationRecord]>>);

impl AnnotationStore {
	pub fn new() -> Self {
		Self {
			files: RwLock::new(HashMap::new()),
			event_sender: None,
			version: AtomicU64::new(0),
		}
	}

	/// Creates a store that reports every file change on the returned channel.
	pub fn with_events() -> (Self, AnnotationEventReceiver) {
		let (sender, receiver) = mpsc::unbounded_channel();
		let store = Self {
			files: RwLock::new(HashMap::new()),
			event_sender: Some(sender),
			version: AtomicU64::new(0),
		};
		(store, receiver)
	}

	/// Current records for `path`; empty when the file has none.
	pub fn get(&self, path: &Path) -> Arc<[AnnotationRecord]> {
		self.files.read().get(path).cloned().unwrap_or_else(|| Arc::from(Vec::new()))
	}

	/// Files that currently carry at least one record, sorted.
	pub fn files(&self) -> Vec<PathBuf> {
		let mut files: Vec<_> = self.files.read().keys().cloned().collect();
		files.sort();
		files
	}

	pub fn version(&self) -> u64 {
		self.version.load(Ordering::Relaxed)
	}

	pub fn error_count(&self) -> usize {
		self.files.read().values().map(|records| severity_counts(records).0).sum()
	}

	pub fn warning_count(&self) -> usize {
		self.files.read().values().map(|records| severity_counts(records).1).sum()
	}

	/// Files with at least one error record, sorted.
	pub fn files_with_errors(&self) -> Vec<PathBuf> {
		let mut files: Vec<_> = self
			.files
			.read()
			.iter()
			.filter(|(_, records)| records.iter().any(AnnotationRecord::is_error))
			.map(|(path, _)| path.clone())
			.collect();
		files.sort();
		files
	}

	/// Applies all updates under one write lock.
	///
	/// Readers observe each file either fully before or fully after the batch.
	/// Files whose records are unchanged do not bump the version or emit events.
	pub(crate) fn apply(&self, updates: Vec<FileUpdate>) -> usize {
		let mut changed = Vec::new();
		{
			let mut files = self.files.write();
			for (path, records) in updates {
				let records = records.filter(|records| !records.is_empty());
				let unchanged = match &records {
					Some(records) => files.get(&path).is_some_and(|old| **old == **records),
					None => !files.contains_key(&path),
				};
				if unchanged {
					continue;
				}

				let (error_count, warning_count) = records.as_deref().map(severity_counts).unwrap_or_default();
				match records {
					Some(records) => {
						files.insert(path.clone(), records);
					}
					None => {
						files.remove(&path);
					}
				}
				changed.push(AnnotationEvent {
					path,
					error_count,
					warning_count,
				});
			}
		}

		if !changed.is_empty() {
			self.version.fetch_add(changed.len() as u64, Ordering::Relaxed);
		}
		let count = changed.len();
		if let Some(sender) = &self.event_sender {
			for event in changed {
				let _ = sender.send(event);
			}
		}
		count
	}
}

fn severity_counts(records: &[AnnotationRecord]) -> (usize, usize) {
	let errors = records.iter().filter(|r| r.is_error()).count();
	let warnings = records.iter().filter(|r| r.is_warning()).count();
	(errors, warnings)
}

impl Default for AnnotationStore {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for AnnotationStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AnnotationStore")
			.field("files", &self.files.read().len())
			.field("has_event_sender", &self.event_sender.is_some())
			.field("version", &self.version)
			.finish()
	}
}

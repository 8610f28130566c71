//! Watch mode: turns filesystem events into incremental triggers.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio_util::sync::CancellationToken;
use vigil_config::TomlConfigStore;
use vigil_config::file::{PREFERENCES_FILE, PROJECT_FILE};
use vigil_primitives::{DeltaKind, ProjectId, Resource, ResourceDelta, Scope};
use vigil_review::ReviewService;

use crate::workspace::FsResourceTree;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Pending changes keyed by workspace-relative path; the latest kind wins.
#[derive(Debug, Default)]
struct PendingChanges {
	files: BTreeMap<PathBuf, DeltaKind>,
	config_changed: bool,
	last_event: Option<Instant>,
}

impl PendingChanges {
	fn record(&mut self, tree: &FsResourceTree, event: &Event) {
		let kind = match event.kind {
			EventKind::Create(_) => DeltaKind::Added,
			EventKind::Remove(_) => DeltaKind::Removed,
			EventKind::Modify(_) => DeltaKind::Changed,
			_ => return,
		};
		for path in &event.paths {
			let Some(relative) = tree.relative(path) else { continue };
			if is_config_file(&relative) {
				self.config_changed = true;
				self.last_event = Some(Instant::now());
				continue;
			}
			if is_hidden(&relative) || relative.components().count() < 2 || path.is_dir() {
				continue;
			}
			// Renames surface as modifications; trust the filesystem over the event kind.
			let kind = match kind {
				DeltaKind::Changed if !path.exists() => DeltaKind::Removed,
				DeltaKind::Removed if path.exists() => DeltaKind::Changed,
				other => other,
			};
			self.files.insert(relative, kind);
			self.last_event = Some(Instant::now());
		}
	}

	fn ready(&self, debounce: Duration) -> bool {
		self.last_event.is_some_and(|at| at.elapsed() >= debounce)
	}

	fn take(&mut self) -> (BTreeMap<PathBuf, DeltaKind>, bool) {
		self.last_event = None;
		(std::mem::take(&mut self.files), std::mem::take(&mut self.config_changed))
	}
}

fn is_config_file(path: &Path) -> bool {
	path == Path::new(PREFERENCES_FILE) || path.file_name().is_some_and(|name| name == PROJECT_FILE)
}

fn is_hidden(path: &Path) -> bool {
	path.components()
		.any(|component| matches!(component, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

/// Builds one delta scope per project from workspace-relative changes.
fn delta_scopes(changes: &BTreeMap<PathBuf, DeltaKind>) -> Vec<Scope> {
	let mut by_project: BTreeMap<ProjectId, ResourceDelta> = BTreeMap::new();
	for (path, kind) in changes {
		let Some(Component::Normal(project)) = path.components().next() else { continue };
		let project = ProjectId::new(project.to_string_lossy());
		let root = by_project
			.entry(project.clone())
			.or_insert_with(|| ResourceDelta::new(Resource::project(project.clone()), DeltaKind::Changed));
		root.children.push(ResourceDelta::new(Resource::file(project, path.clone()), *kind));
	}
	by_project.into_values().map(Scope::Delta).collect()
}

/// Watches the workspace until `stop` is cancelled, triggering analysis for
/// every debounced batch of changes.
pub fn run(service: Arc<ReviewService>, config: Arc<TomlConfigStore>, tree: Arc<FsResourceTree>, debounce: Duration, stop: CancellationToken) -> Result<()> {
	let (event_tx, event_rx) = mpsc::channel();
	let mut watcher = notify::recommended_watcher(move |event| {
		let _ = event_tx.send(event);
	})
	.context("starting filesystem watcher")?;
	watcher
		.watch(tree.root(), RecursiveMode::Recursive)
		.with_context(|| format!("watching {}", tree.root().display()))?;
	tracing::info!(root = %tree.root().display(), debounce_ms = debounce.as_millis() as u64, "watch.started");

	let mut pending = PendingChanges::default();
	while !stop.is_cancelled() {
		match event_rx.recv_timeout(POLL_INTERVAL) {
			Ok(Ok(event)) => pending.record(&tree, &event),
			Ok(Err(error)) => tracing::warn!(%error, "watch.event_error"),
			Err(RecvTimeoutError::Timeout) => {}
			Err(RecvTimeoutError::Disconnected) => break,
		}

		if !pending.ready(debounce) {
			continue;
		}
		let (changes, config_changed) = pending.take();
		if config_changed {
			if let Err(error) = config.reload() {
				tracing::warn!(%error, "watch.preferences_reload_failed");
			}
			service.invalidate_configuration();
		}
		for scope in delta_scopes(&changes) {
			match service.trigger(&scope, false) {
				Ok(report) => tracing::debug!(submitted = report.submitted.len(), cleared = report.cleared, "watch.triggered"),
				Err(error) => tracing::warn!(%error, "watch.trigger_failed"),
			}
		}
	}

	tracing::info!("watch.stopped");
	Ok(())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn changes_group_into_one_delta_per_project() {
		let changes: BTreeMap<PathBuf, DeltaKind> = [
			(PathBuf::from("core/src/A.java"), DeltaKind::Changed),
			(PathBuf::from("core/src/B.java"), DeltaKind::Removed),
			(PathBuf::from("web/app.js"), DeltaKind::Added),
		]
		.into_iter()
		.collect();

		let scopes = delta_scopes(&changes);

		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes[0].projects(), vec![ProjectId::from("core")]);
		let Scope::Delta(core) = &scopes[0] else { panic!("expected a delta") };
		assert_eq!(core.changed_files().len(), 1);
		assert_eq!(core.removed_files().len(), 1);
		assert_eq!(scopes[1].projects(), vec![ProjectId::from("web")]);
	}

	#[test]
	fn config_and_hidden_paths_are_recognized() {
		assert!(is_config_file(Path::new("vigil.toml")));
		assert!(is_config_file(Path::new("core/.vigil.toml")));
		assert!(!is_config_file(Path::new("core/vigil.toml.bak")));
		assert!(is_hidden(Path::new(".git/HEAD")));
		assert!(!is_hidden(Path::new("core/src/A.java")));
	}
}

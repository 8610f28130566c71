//! Filesystem view of a vigil workspace.
//!
//! A workspace is a directory whose immediate subdirectories are projects.
//! Resource paths are relative to the workspace root and start with the
//! project directory name.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use vigil_config::ConfigStore;
use vigil_config::file::PROJECT_FILE;
use vigil_primitives::{FileDescriptor, ProjectId, Resource, ResourceTree};

/// [`ResourceTree`] over the filesystem below a workspace root.
///
/// Walks honor `.gitignore` and skip hidden entries. Project source roots
/// come from each project's `source_roots` property.
pub struct FsResourceTree {
	root: PathBuf,
	config: Arc<dyn ConfigStore>,
}

impl FsResourceTree {
	pub fn new(root: impl Into<PathBuf>, config: Arc<dyn ConfigStore>) -> Self {
		Self { root: root.into(), config }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Workspace-relative form of `path`, or `None` if it lies outside the root.
	pub fn relative(&self, path: &Path) -> Option<PathBuf> {
		if path.is_relative() {
			return Some(path.to_path_buf());
		}
		path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
	}
}

impl ResourceTree for FsResourceTree {
	fn walk(&self, resource: &Resource) -> Box<dyn Iterator<Item = FileDescriptor> + '_> {
		let absolute = self.root.join(&resource.path);
		if resource.is_file() {
			let exists = absolute.is_file();
			return Box::new(std::iter::once(FileDescriptor::new(resource.project.clone(), resource.path.clone(), exists)));
		}

		let project = resource.project.clone();
		let walker = WalkBuilder::new(&absolute).standard_filters(true).build();
		Box::new(walker.filter_map(move |entry| {
			let entry = match entry {
				Ok(entry) => entry,
				Err(error) => {
					tracing::warn!(%error, "workspace.walk_error");
					return None;
				}
			};
			if !entry.file_type().is_some_and(|kind| kind.is_file()) {
				return None;
			}
			let relative = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
			Some(FileDescriptor::new(project.clone(), relative, true))
		}))
	}

	fn source_roots(&self, project: &ProjectId) -> Vec<Resource> {
		match self.config.load_project(project) {
			Ok(properties) => properties
				.source_roots
				.iter()
				.map(|root| Resource::folder(project.clone(), Path::new(project.as_str()).join(root)))
				.collect(),
			Err(_) => Vec::new(),
		}
	}

	fn exists(&self, path: &Path) -> bool {
		self.root.join(path).exists()
	}
}

impl std::fmt::Debug for FsResourceTree {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FsResourceTree").field("root", &self.root).finish_non_exhaustive()
	}
}

/// Projects of the workspace: subdirectories carrying a project file, sorted.
pub fn discover_projects(root: &Path) -> Result<Vec<ProjectId>> {
	let entries = std::fs::read_dir(root).with_context(|| format!("reading workspace {}", root.display()))?;
	let mut projects = Vec::new();
	for entry in entries {
		let entry = entry?;
		if entry.path().join(PROJECT_FILE).is_file()
			&& let Some(name) = entry.file_name().to_str()
		{
			projects.push(ProjectId::new(name));
		}
	}
	projects.sort();
	Ok(projects)
}

/// Resource for a user-supplied path, absolute or relative to the workspace root.
pub fn resource_for_path(root: &Path, path: &Path) -> Result<Resource> {
	let relative = if path.is_absolute() {
		path.strip_prefix(root)
			.with_context(|| format!("{} is outside the workspace {}", path.display(), root.display()))?
			.to_path_buf()
	} else {
		path.to_path_buf()
	};
	let relative: PathBuf = relative.components().filter(|c| !matches!(c, Component::CurDir)).collect();

	let Some(Component::Normal(project)) = relative.components().next() else {
		bail!("{} does not name a project", path.display());
	};
	let project = ProjectId::new(project.to_string_lossy());
	let absolute = root.join(&relative);

	Ok(if relative.components().count() == 1 {
		Resource::project(project)
	} else if absolute.is_dir() {
		Resource::folder(project, relative)
	} else {
		Resource::file(project, relative)
	})
}

use std::path::{Path, PathBuf};

use crate::ProjectId;

/// Kind of node in the resource hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	Project,
	Folder,
	File,
}

/// A node of the workspace resource hierarchy.
///
/// Paths are workspace-relative and start with the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
	pub project: ProjectId,
	pub path: PathBuf,
	pub kind: ResourceKind,
}

impl Resource {
	/// The project root resource; its path is the project name.
	pub fn project(project: impl Into<ProjectId>) -> Self {
		let project = project.into();
		let path = PathBuf::from(project.as_str());
		Self {
			project,
			path,
			kind: ResourceKind::Project,
		}
	}

	pub fn folder(project: impl Into<ProjectId>, path: impl Into<PathBuf>) -> Self {
		Self {
			project: project.into(),
			path: path.into(),
			kind: ResourceKind::Folder,
		}
	}

	pub fn file(project: impl Into<ProjectId>, path: impl Into<PathBuf>) -> Self {
		Self {
			project: project.into(),
			path: path.into(),
			kind: ResourceKind::File,
		}
	}

	pub fn is_file(&self) -> bool {
		self.kind == ResourceKind::File
	}

	/// Lowercased extension of the resource path, if any.
	pub fn extension(&self) -> Option<String> {
		extension_of(&self.path)
	}
}

/// A candidate file produced by walking the resource tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileDescriptor {
	pub path: PathBuf,
	pub project: ProjectId,
	/// Lowercased extension without the dot.
	pub extension: Option<String>,
	pub exists: bool,
}

impl FileDescriptor {
	pub fn new(project: impl Into<ProjectId>, path: impl Into<PathBuf>, exists: bool) -> Self {
		let path = path.into();
		Self {
			extension: extension_of(&path),
			path,
			project: project.into(),
			exists,
		}
	}

	/// Whether the file's extension is one of `extensions` (lowercase, dotless).
	pub fn has_extension_in<'a>(&self, mut extensions: impl Iterator<Item = &'a str>) -> bool {
		match self.extension.as_deref() {
			Some(ext) => extensions.any(|candidate| candidate == ext),
			None => false,
		}
	}
}

/// Returns the lowercased extension of `path`.
pub fn extension_of(path: &Path) -> Option<String> {
	path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

/// Read-only view over the host's resource hierarchy.
///
/// Implemented by the host: a filesystem walker in the binary, an in-memory
/// tree in tests.
pub trait ResourceTree: Send + Sync {
	/// Yields every file at or below `resource`. A file resource yields itself.
	/// Folders produce no descriptor of their own.
	fn walk(&self, resource: &Resource) -> Box<dyn Iterator<Item = FileDescriptor> + '_>;

	/// Source roots to visit instead of the whole project, if the project declares any.
	fn source_roots(&self, _project: &ProjectId) -> Vec<Resource> {
		Vec::new()
	}

	/// Whether a workspace-relative path still exists.
	fn exists(&self, path: &Path) -> bool;
}

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::{FileDescriptor, ProjectId, Resource, ResourceKind, ResourceTree};

/// In-memory [`ResourceTree`] for embedding hosts and tests.
///
/// Files are registered explicitly; containers are implied by path prefixes.
#[derive(Debug, Default)]
pub struct MemoryResourceTree {
	files: RwLock<BTreeMap<PathBuf, ProjectId>>,
	source_roots: RwLock<HashMap<ProjectId, Vec<PathBuf>>>,
}

impl MemoryResourceTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `path` as an existing file of `project`.
	pub fn add_file(&self, project: impl Into<ProjectId>, path: impl Into<PathBuf>) {
		self.files.write().insert(path.into(), project.into());
	}

	/// Forgets `path`. Returns whether it was registered.
	pub fn remove_file(&self, path: &Path) -> bool {
		self.files.write().remove(path).is_some()
	}

	/// Restricts project walks to `roots` (workspace-relative folders).
	pub fn set_source_roots(&self, project: impl Into<ProjectId>, roots: impl IntoIterator<Item = PathBuf>) {
		self.source_roots.write().insert(project.into(), roots.into_iter().collect());
	}
}

impl ResourceTree for MemoryResourceTree {
	fn walk(&self, resource: &Resource) -> Box<dyn Iterator<Item = FileDescriptor> + '_> {
		let files = self.files.read();
		let found: Vec<_> = match resource.kind {
			ResourceKind::File => vec![FileDescriptor::new(resource.project.clone(), resource.path.clone(), files.contains_key(&resource.path))],
			ResourceKind::Project | ResourceKind::Folder => files
				.iter()
				.filter(|(path, project)| **project == resource.project && path.starts_with(&resource.path))
				.map(|(path, project)| FileDescriptor::new(project.clone(), path.clone(), true))
				.collect(),
		};
		Box::new(found.into_iter())
	}

	fn source_roots(&self, project: &ProjectId) -> Vec<Resource> {
		self.source_roots
			.read()
			.get(project)
			.map(|roots| roots.iter().map(|root| Resource::folder(project.clone(), root.clone())).collect())
			.unwrap_or_default()
	}

	fn exists(&self, path: &Path) -> bool {
		self.files.read().contains_key(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn walks_containers_by_prefix() {
		let tree = MemoryResourceTree::new();
		tree.add_file("core", "core/src/A.java");
		tree.add_file("core", "core/src/nested/B.java");
		tree.add_file("core", "core/docs/readme.md");
		tree.add_file("web", "web/app.js");

		let src: Vec<_> = tree.walk(&Resource::folder("core", "core/src")).map(|f| f.path).collect();
		assert_eq!(src, vec![PathBuf::from("core/src/A.java"), PathBuf::from("core/src/nested/B.java")]);
		assert_eq!(tree.walk(&Resource::project("core")).count(), 3);
	}

	#[test]
	fn file_walk_reports_existence() {
		let tree = MemoryResourceTree::new();
		tree.add_file("core", "core/A.java");

		let gone: Vec<_> = tree.walk(&Resource::file("core", "core/B.java")).collect();
		assert_eq!(gone.len(), 1);
		assert!(!gone[0].exists);

		assert!(tree.remove_file(Path::new("core/A.java")));
		assert!(!tree.exists(Path::new("core/A.java")));
	}
}

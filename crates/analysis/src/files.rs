//! Expansion of a [`Scope`] into candidate files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use vigil_config::RuleConfiguration;
use vigil_primitives::{FileDescriptor, ResourceKind, ResourceTree, Scope};

/// Expands `scope` into file descriptors, deduplicated and sorted by path.
///
/// Explicit resources are walked recursively; a project resource walks its
/// source roots when the tree reports any. Deltas contribute their added and
/// changed file nodes only.
pub fn collect_files(scope: &Scope, tree: &dyn ResourceTree) -> Vec<FileDescriptor> {
	let mut files: BTreeMap<PathBuf, FileDescriptor> = BTreeMap::new();
	let mut add = |file: FileDescriptor| {
		files.entry(file.path.clone()).or_insert(file);
	};

	match scope {
		Scope::Resources(resources) => {
			for resource in resources {
				let roots = match resource.kind {
					ResourceKind::Project => tree.source_roots(&resource.project),
					_ => Vec::new(),
				};
				if roots.is_empty() {
					tree.walk(resource).for_each(&mut add);
				} else {
					for root in &roots {
						tree.walk(root).for_each(&mut add);
					}
				}
			}
		}
		Scope::Delta(delta) => {
			for resource in delta.changed_files() {
				add(FileDescriptor::new(resource.project.clone(), resource.path.clone(), tree.exists(&resource.path)));
			}
		}
	}

	files.into_values().collect()
}

/// Extensions a file must carry to be considered, or `None` to admit every file.
pub fn extension_filter(configuration: &RuleConfiguration, automatic: bool) -> Option<BTreeSet<&'static str>> {
	automatic.then(|| configuration.file_extensions())
}

/// Whether `file` passes an optional extension filter.
pub fn passes_extension_filter(file: &FileDescriptor, filter: Option<&BTreeSet<&'static str>>) -> bool {
	filter.is_none_or(|extensions| file.has_extension_in(extensions.iter().copied()))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use vigil_primitives::{DeltaKind, MemoryResourceTree, Resource, ResourceDelta};

	use super::*;

	fn tree() -> MemoryResourceTree {
		let tree = MemoryResourceTree::new();
		tree.add_file("core", "core/src/A.java");
		tree.add_file("core", "core/src/B.java");
		tree.add_file("core", "core/build/Gen.java");
		tree
	}

	fn paths(files: &[FileDescriptor]) -> Vec<&str> {
		files.iter().map(|f| f.path.to_str().unwrap_or_default()).collect()
	}

	#[test]
	fn overlapping_resources_are_deduplicated() {
		let tree = tree();
		let scope = Scope::Resources(vec![Resource::folder("core", "core/src"), Resource::file("core", "core/src/A.java")]);

		assert_eq!(paths(&collect_files(&scope, &tree)), vec!["core/src/A.java", "core/src/B.java"]);
	}

	#[test]
	fn project_walks_source_roots_when_declared() {
		let tree = tree();
		let scope = Scope::Resources(vec![Resource::project("core")]);
		assert_eq!(collect_files(&scope, &tree).len(), 3);

		tree.set_source_roots("core", [PathBuf::from("core/src")]);
		assert_eq!(paths(&collect_files(&scope, &tree)), vec!["core/src/A.java", "core/src/B.java"]);
	}

	#[test]
	fn delta_contributes_added_and_changed_files() {
		let tree = tree();
		let delta = ResourceDelta::new(Resource::project("core"), DeltaKind::Changed)
			.with_child(ResourceDelta::new(Resource::file("core", "core/src/A.java"), DeltaKind::Changed))
			.with_child(ResourceDelta::new(Resource::file("core", "core/src/Old.java"), DeltaKind::Removed))
			.with_child(ResourceDelta::new(Resource::folder("core", "core/src"), DeltaKind::Changed));

		let files = collect_files(&Scope::Delta(delta), &tree);
		assert_eq!(paths(&files), vec!["core/src/A.java"]);
		assert!(files[0].exists);
	}

	#[test]
	fn extension_filter_is_optional() {
		let file = FileDescriptor::new("core", "core/README.md", true);
		let java: BTreeSet<&'static str> = ["java"].into_iter().collect();

		assert!(!passes_extension_filter(&file, Some(&java)));
		assert!(passes_extension_filter(&file, None));
	}
}

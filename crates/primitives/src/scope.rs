use crate::{ProjectId, Resource, ResourceKind};

/// How a resource changed in a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
	Added,
	Removed,
	Changed,
}

/// A tree of changed resources rooted at a project, as delivered by a build hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDelta {
	pub resource: Resource,
	pub kind: DeltaKind,
	pub children: Vec<ResourceDelta>,
}

impl ResourceDelta {
	pub fn new(resource: Resource, kind: DeltaKind) -> Self {
		Self {
			resource,
			kind,
			children: Vec::new(),
		}
	}

	/// Appends a child node.
	#[must_use]
	pub fn with_child(mut self, child: ResourceDelta) -> Self {
		self.children.push(child);
		self
	}

	/// Visits every node depth-first, parents before children.
	pub fn visit<'a>(&'a self, visitor: &mut impl FnMut(&'a ResourceDelta)) {
		visitor(self);
		for child in &self.children {
			child.visit(visitor);
		}
	}

	/// File nodes that were added or changed, in visit order.
	pub fn changed_files(&self) -> Vec<&Resource> {
		let mut files = Vec::new();
		self.visit(&mut |node| {
			if node.resource.kind == ResourceKind::File && node.kind != DeltaKind::Removed {
				files.push(&node.resource);
			}
		});
		files
	}

	/// File nodes that were removed, in visit order.
	pub fn removed_files(&self) -> Vec<&Resource> {
		let mut files = Vec::new();
		self.visit(&mut |node| {
			if node.resource.kind == ResourceKind::File && node.kind == DeltaKind::Removed {
				files.push(&node.resource);
			}
		});
		files
	}
}

/// What a trigger asks to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
	/// Explicit selection: projects, folders or files. Containers are analyzed recursively.
	Resources(Vec<Resource>),
	/// Incremental change set from a build hook.
	Delta(ResourceDelta),
}

impl Scope {
	/// Whether the scope contains no work at all.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Resources(resources) => resources.is_empty(),
			Self::Delta(delta) => {
				let mut any_file = false;
				delta.visit(&mut |node| any_file |= node.resource.kind == ResourceKind::File);
				!any_file
			}
		}
	}

	/// Deduplicated projects touched by the scope, in first-seen order.
	pub fn projects(&self) -> Vec<ProjectId> {
		let mut projects: Vec<ProjectId> = Vec::new();
		let mut push = |project: &ProjectId| {
			if !projects.contains(project) {
				projects.push(project.clone());
			}
		};
		match self {
			Self::Resources(resources) => resources.iter().for_each(|r| push(&r.project)),
			Self::Delta(delta) => delta.visit(&mut |node| push(&node.resource.project)),
		}
		projects
	}

	/// Splits the scope into one sub-scope per project, in [`Self::projects`] order.
	pub fn split_by_project(&self) -> Vec<(ProjectId, Scope)> {
		match self {
			Self::Resources(resources) => self
				.projects()
				.into_iter()
				.map(|project| {
					let owned = resources.iter().filter(|r| r.project == project).cloned().collect();
					(project, Self::Resources(owned))
				})
				.collect(),
			Self::Delta(delta) => self
				.projects()
				.into_iter()
				.filter_map(|project| prune_delta(delta, &project).map(|d| (project, Self::Delta(d))))
				.collect(),
		}
	}
}

/// Keeps only the nodes of `delta` that belong to `project`, reattaching
/// foreign-rooted subtrees under the nearest kept ancestor.
fn prune_delta(delta: &ResourceDelta, project: &ProjectId) -> Option<ResourceDelta> {
	let children: Vec<ResourceDelta> = delta.children.iter().flat_map(|child| prune_children(child, project)).collect();
	if &delta.resource.project == project {
		return Some(ResourceDelta {
			resource: delta.resource.clone(),
			kind: delta.kind,
			children,
		});
	}
	match children.len() {
		0 => None,
		1 => children.into_iter().next(),
		_ => Some(ResourceDelta {
			resource: Resource::project(project.clone()),
			kind: DeltaKind::Changed,
			children,
		}),
	}
}

fn prune_children(delta: &ResourceDelta, project: &ProjectId) -> Vec<ResourceDelta> {
	if &delta.resource.project == project {
		return prune_delta(delta, project).into_iter().collect();
	}
	delta.children.iter().flat_map(|child| prune_children(child, project)).collect()
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use pretty_assertions::assert_eq;

	use super::*;

	fn sample_delta() -> ResourceDelta {
		ResourceDelta::new(Resource::project("core"), DeltaKind::Changed)
			.with_child(
				ResourceDelta::new(Resource::folder("core", "core/src"), DeltaKind::Changed)
					.with_child(ResourceDelta::new(Resource::file("core", "core/src/A.java"), DeltaKind::Changed))
					.with_child(ResourceDelta::new(Resource::file("core", "core/src/B.java"), DeltaKind::Added))
					.with_child(ResourceDelta::new(Resource::file("core", "core/src/C.java"), DeltaKind::Removed)),
			)
	}

	#[test]
	fn delta_separates_changed_and_removed_files() {
		let delta = sample_delta();
		let changed: Vec<PathBuf> = delta.changed_files().iter().map(|r| r.path.clone()).collect();
		let removed: Vec<PathBuf> = delta.removed_files().iter().map(|r| r.path.clone()).collect();
		assert_eq!(changed, vec![PathBuf::from("core/src/A.java"), PathBuf::from("core/src/B.java")]);
		assert_eq!(removed, vec![PathBuf::from("core/src/C.java")]);
	}

	#[test]
	fn projects_are_deduplicated_in_first_seen_order() {
		let scope = Scope::Resources(vec![
			Resource::file("web", "web/index.js"),
			Resource::project("core"),
			Resource::file("web", "web/app.js"),
		]);
		assert_eq!(scope.projects(), vec![ProjectId::new("web"), ProjectId::new("core")]);
	}

	#[test]
	fn split_groups_resources_by_project() {
		let scope = Scope::Resources(vec![
			Resource::file("web", "web/index.js"),
			Resource::project("core"),
			Resource::file("web", "web/app.js"),
		]);
		let split = scope.split_by_project();
		assert_eq!(split.len(), 2);
		assert_eq!(
			split[0].1,
			Scope::Resources(vec![Resource::file("web", "web/index.js"), Resource::file("web", "web/app.js")])
		);
		assert_eq!(split[1].1, Scope::Resources(vec![Resource::project("core")]));
	}

	#[test]
	fn empty_scopes() {
		assert!(Scope::Resources(Vec::new()).is_empty());
		assert!(Scope::Delta(ResourceDelta::new(Resource::project("core"), DeltaKind::Changed)).is_empty());
		assert!(!Scope::Delta(sample_delta()).is_empty());
	}

	#[test]
	fn single_project_delta_splits_to_itself() {
		let scope = Scope::Delta(sample_delta());
		let split = scope.split_by_project();
		assert_eq!(split, vec![(ProjectId::new("core"), scope.clone())]);
	}
}

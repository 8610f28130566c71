use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use vigil_primitives::ProjectId;

use crate::{ConfigError, Preferences, ProjectProperties, Result};

/// Key-value access to persisted preferences and project properties.
pub trait ConfigStore: Send + Sync {
	/// Loads the properties (including rule sets) of one project.
	fn load_project(&self, project: &ProjectId) -> Result<ProjectProperties>;

	/// Current workspace preferences.
	fn preferences(&self) -> Preferences;

	/// Names of globally active rules.
	fn active_rule_names(&self) -> BTreeSet<String> {
		self.preferences().active_rules
	}
}

/// In-memory [`ConfigStore`] for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
	preferences: RwLock<Preferences>,
	projects: RwLock<HashMap<ProjectId, ProjectProperties>>,
	loads: AtomicUsize,
}

impl MemoryConfigStore {
	pub fn new(preferences: Preferences) -> Self {
		Self {
			preferences: RwLock::new(preferences),
			..Self::default()
		}
	}

	pub fn set_preferences(&self, preferences: Preferences) {
		*self.preferences.write() = preferences;
	}

	pub fn insert_project(&self, project: impl Into<ProjectId>, properties: ProjectProperties) {
		self.projects.write().insert(project.into(), properties);
	}

	pub fn remove_project(&self, project: &ProjectId) -> Option<ProjectProperties> {
		self.projects.write().remove(project)
	}

	/// Number of successful or failed [`ConfigStore::load_project`] calls so far.
	pub fn load_count(&self) -> usize {
		self.loads.load(Ordering::Relaxed)
	}
}

impl ConfigStore for MemoryConfigStore {
	fn load_project(&self, project: &ProjectId) -> Result<ProjectProperties> {
		self.loads.fetch_add(1, Ordering::Relaxed);
		self.projects
			.read()
			.get(project)
			.cloned()
			.ok_or_else(|| ConfigError::unavailable(project, "project has no stored properties"))
	}

	fn preferences(&self) -> Preferences {
		self.preferences.read().clone()
	}
}

//! Composition of the effective rule configuration for a project.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use vigil_primitives::ProjectId;

use crate::{ConfigStore, PatternSet, Preferences, ProjectProperties, Result, RuleConfiguration, RuleSet};

/// Properties and effective configuration for one project.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
	pub project: ProjectId,
	pub properties: Arc<ProjectProperties>,
	pub configuration: Arc<RuleConfiguration>,
}

/// Builds [`RuleConfiguration`]s from a [`ConfigStore`].
///
/// Keeps the properties of the most recently requested project; a request for
/// any other project replaces the cached entry.
pub struct RuleConfigurationResolver {
	store: Arc<dyn ConfigStore>,
	last_project: Mutex<Option<(ProjectId, Arc<ProjectProperties>)>>,
}

impl std::fmt::Debug for RuleConfigurationResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RuleConfigurationResolver")
			.field("cached", &self.last_project.lock().as_ref().map(|(project, _)| project.clone()))
			.finish()
	}
}

impl RuleConfigurationResolver {
	pub fn new(store: Arc<dyn ConfigStore>) -> Self {
		Self {
			store,
			last_project: Mutex::new(None),
		}
	}

	pub fn store(&self) -> &Arc<dyn ConfigStore> {
		&self.store
	}

	/// Drops the cached project properties.
	pub fn invalidate(&self) {
		self.last_project.lock().take();
	}

	/// Resolves the effective rule configuration for `project`.
	///
	/// # Errors
	///
	/// Returns [`crate::ConfigError::Unavailable`] when the project's properties cannot be loaded.
	pub fn resolve(&self, project: &ProjectId) -> Result<ResolvedProject> {
		let properties = self.project_properties(project)?;
		let preferences = self.store.preferences();
		let configuration = compose(project, &properties, &preferences, &self.store);
		debug!(
			%project,
			rules = configuration.rule_count(),
			include = configuration.include.len(),
			exclude = configuration.exclude.len(),
			"rule configuration resolved"
		);
		Ok(ResolvedProject {
			project: project.clone(),
			properties,
			configuration: Arc::new(configuration),
		})
	}

	fn project_properties(&self, project: &ProjectId) -> Result<Arc<ProjectProperties>> {
		let mut cached = self.last_project.lock();
		if let Some((key, properties)) = cached.as_ref()
			&& key == project
		{
			return Ok(Arc::clone(properties));
		}
		let properties = Arc::new(self.store.load_project(project)?);
		*cached = Some((project.clone(), Arc::clone(&properties)));
		Ok(properties)
	}
}

fn compose(project: &ProjectId, properties: &ProjectProperties, preferences: &Preferences, store: &Arc<dyn ConfigStore>) -> RuleConfiguration {
	let active = preferences.global_rule_management.then(|| store.active_rule_names());

	let rule_sets: Vec<RuleSet> = properties
		.rule_sets
		.iter()
		.map(|rule_set| {
			let mut filtered = rule_set.clone();
			if let Some(active) = &active {
				let before = filtered.rules.len();
				filtered.rules.retain(|rule| active.contains(&rule.name));
				let after = filtered.rules.len();
				if after < before {
					warn!(
						%project,
						rule_set = %rule_set.name,
						active = after,
						total = before,
						ignored = before - after,
						"rule set filtered by global rule management"
					);
				}
			}
			filtered
		})
		.collect();

	let include = PatternSet::new(
		preferences
			.include_patterns
			.iter()
			.chain(&properties.include_patterns)
			.chain(rule_sets.iter().flat_map(|set| &set.include_patterns)),
	);
	let exclude = PatternSet::new(
		preferences
			.exclude_patterns
			.iter()
			.chain(&properties.exclude_patterns)
			.chain(rule_sets.iter().flat_map(|set| &set.exclude_patterns)),
	);

	RuleConfiguration { rule_sets, include, exclude }
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use pretty_assertions::assert_eq;
	use vigil_primitives::{Language, RulePriority};

	use super::*;
	use crate::{ConfigError, MemoryConfigStore, Rule};

	fn rule(name: &str) -> Rule {
		Rule {
			name: name.into(),
			language: Language::Java,
			priority: RulePriority::MEDIUM,
		}
	}

	fn properties() -> ProjectProperties {
		ProjectProperties {
			exclude_patterns: vec!["**/generated/*".into()],
			rule_sets: vec![RuleSet {
				name: "basic".into(),
				rules: vec![rule("EmptyCatchBlock"), rule("UnusedLocalVariable"), rule("GodClass")],
				include_patterns: vec!["*.java".into()],
				exclude_patterns: Vec::new(),
			}],
			..ProjectProperties::default()
		}
	}

	fn store(preferences: Preferences) -> Arc<MemoryConfigStore> {
		let store = Arc::new(MemoryConfigStore::new(preferences));
		store.insert_project("core", properties());
		store
	}

	#[test]
	fn unions_global_and_project_patterns() {
		let store = store(Preferences {
			exclude_patterns: vec!["**/target/**".into()],
			..Preferences::default()
		});
		let resolver = RuleConfigurationResolver::new(store);
		let resolved = resolver.resolve(&ProjectId::new("core")).unwrap();
		let config = &resolved.configuration;

		assert_eq!(config.include.patterns().collect::<Vec<_>>(), vec!["*.java"]);
		assert_eq!(config.exclude.patterns().collect::<Vec<_>>(), vec!["**/generated/*", "**/target/**"]);
		assert!(!config.applies(Path::new("core/src/generated/Gen.java")));
		assert!(config.applies(Path::new("core/src/Main.java")));
	}

	#[test]
	fn global_rule_management_keeps_only_active_rules_in_order() {
		let store = store(Preferences {
			global_rule_management: true,
			active_rules: ["GodClass", "EmptyCatchBlock"].into_iter().map(String::from).collect(),
			..Preferences::default()
		});
		let resolver = RuleConfigurationResolver::new(store);
		let resolved = resolver.resolve(&ProjectId::new("core")).unwrap();
		let names: Vec<_> = resolved.configuration.rules().map(|r| r.name.as_str()).collect();
		assert_eq!(names, vec!["EmptyCatchBlock", "GodClass"]);
	}

	#[test]
	fn resolution_is_deterministic() {
		let resolver = RuleConfigurationResolver::new(store(Preferences::default()));
		let a = resolver.resolve(&ProjectId::new("core")).unwrap();
		resolver.invalidate();
		let b = resolver.resolve(&ProjectId::new("core")).unwrap();
		assert_eq!(a.configuration, b.configuration);
	}

	#[test]
	fn caches_last_project_only() {
		let store = store(Preferences::default());
		store.insert_project("web", ProjectProperties::default());
		let resolver = RuleConfigurationResolver::new(store.clone());

		resolver.resolve(&ProjectId::new("core")).unwrap();
		resolver.resolve(&ProjectId::new("core")).unwrap();
		assert_eq!(store.load_count(), 1);

		resolver.resolve(&ProjectId::new("web")).unwrap();
		resolver.resolve(&ProjectId::new("core")).unwrap();
		assert_eq!(store.load_count(), 3);
	}

	#[test]
	fn unknown_project_is_unavailable() {
		let resolver = RuleConfigurationResolver::new(store(Preferences::default()));
		let err = resolver.resolve(&ProjectId::new("ghost")).unwrap_err();
		assert!(matches!(err, ConfigError::Unavailable { .. }));
	}
}

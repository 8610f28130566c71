//! Decides whether an unattended analysis pass is small enough to run.

use std::sync::Arc;

use vigil_config::{DEFAULT_MAX_INCREMENTAL_COUNT, RuleConfiguration};
use vigil_primitives::{ResourceTree, Scope};

use crate::files::{collect_files, extension_filter, passes_extension_filter};

/// Inputs of the go/no-go decision besides the scope itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingPolicy {
	pub full_build_enabled: bool,
	pub user_initiated: bool,
	pub max_incremental_count: usize,
	/// Count only files whose extension belongs to a configured language.
	pub filter_by_extension: bool,
}

impl Default for SizingPolicy {
	fn default() -> Self {
		Self {
			full_build_enabled: false,
			user_initiated: false,
			max_incremental_count: DEFAULT_MAX_INCREMENTAL_COUNT,
			filter_by_extension: true,
		}
	}
}

/// Result of [`ScopeSizer::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingDecision {
	pub file_count: usize,
	pub proceed: bool,
}

/// Counts the files a scope would analyze and applies the incremental threshold.
pub struct ScopeSizer {
	tree: Arc<dyn ResourceTree>,
}

impl ScopeSizer {
	pub fn new(tree: Arc<dyn ResourceTree>) -> Self {
		Self { tree }
	}

	/// Evaluates `scope` against `policy`.
	///
	/// Any of a full-build project, a user request or a count within the
	/// threshold lets the pass proceed. An empty scope always proceeds.
	/// Files that no longer exist are not counted.
	pub fn evaluate(&self, scope: &Scope, configuration: &RuleConfiguration, policy: SizingPolicy) -> SizingDecision {
		if scope.is_empty() {
			return SizingDecision {
				file_count: 0,
				proceed: true,
			};
		}

		let filter = extension_filter(configuration, policy.filter_by_extension);
		let file_count = collect_files(scope, self.tree.as_ref())
			.iter()
			.filter(|file| file.exists && passes_extension_filter(file, filter.as_ref()))
			.count();

		let proceed = policy.full_build_enabled || policy.user_initiated || file_count <= policy.max_incremental_count;
		if !proceed {
			tracing::info!(
				file_count,
				max_incremental_count = policy.max_incremental_count,
				"skipping analysis of {file_count} files; enable full builds to analyze changes above {} files",
				policy.max_incremental_count
			);
		}
		SizingDecision { file_count, proceed }
	}
}

impl std::fmt::Debug for ScopeSizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScopeSizer").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use vigil_config::{Rule, RuleSet};
	use vigil_primitives::{Language, MemoryResourceTree, Resource, RulePriority};

	use super::*;

	fn java_configuration() -> RuleConfiguration {
		RuleConfiguration {
			rule_sets: vec![RuleSet {
				name: "quickstart".into(),
				rules: vec![Rule {
					name: "EmptyCatchBlock".into(),
					language: Language::Java,
					priority: RulePriority::MEDIUM,
				}],
				include_patterns: Vec::new(),
				exclude_patterns: Vec::new(),
			}],
			..RuleConfiguration::default()
		}
	}

	fn sizer_with_java_files(count: usize) -> (ScopeSizer, Scope) {
		let tree = MemoryResourceTree::new();
		for index in 0..count {
			tree.add_file("core", format!("core/src/F{index}.java"));
		}
		tree.add_file("core", "core/src/notes.txt");
		(ScopeSizer::new(Arc::new(tree)), Scope::Resources(vec![Resource::project("core")]))
	}

	#[test]
	fn six_files_exceed_threshold_of_five() {
		let (sizer, scope) = sizer_with_java_files(6);
		let decision = sizer.evaluate(&scope, &java_configuration(), SizingPolicy::default());
		assert_eq!(decision, SizingDecision { file_count: 6, proceed: false });
	}

	#[test]
	fn five_files_are_within_threshold() {
		let (sizer, scope) = sizer_with_java_files(5);
		let decision = sizer.evaluate(&scope, &java_configuration(), SizingPolicy::default());
		assert_eq!(decision, SizingDecision { file_count: 5, proceed: true });
	}

	#[test]
	fn user_request_overrides_threshold() {
		let (sizer, scope) = sizer_with_java_files(6);
		let policy = SizingPolicy {
			user_initiated: true,
			..SizingPolicy::default()
		};
		assert_eq!(sizer.evaluate(&scope, &java_configuration(), policy), SizingDecision { file_count: 6, proceed: true });
	}

	#[test]
	fn full_build_overrides_threshold() {
		let (sizer, scope) = sizer_with_java_files(40);
		let policy = SizingPolicy {
			full_build_enabled: true,
			..SizingPolicy::default()
		};
		assert!(sizer.evaluate(&scope, &java_configuration(), policy).proceed);
	}

	#[test]
	fn without_filetype_detection_every_file_counts() {
		let (sizer, scope) = sizer_with_java_files(5);
		let policy = SizingPolicy {
			filter_by_extension: false,
			..SizingPolicy::default()
		};
		assert_eq!(sizer.evaluate(&scope, &java_configuration(), policy), SizingDecision { file_count: 6, proceed: false });
	}

	#[test]
	fn deleted_files_do_not_count() {
		let (sizer, _) = sizer_with_java_files(0);
		let gone: Vec<_> = (0..6).map(|index| Resource::file("core", format!("core/src/Gone{index}.java"))).collect();
		let decision = sizer.evaluate(&Scope::Resources(gone), &java_configuration(), SizingPolicy::default());
		assert_eq!(decision, SizingDecision { file_count: 0, proceed: true });
	}

	#[test]
	fn empty_scope_proceeds() {
		let (sizer, _) = sizer_with_java_files(0);
		let decision = sizer.evaluate(&Scope::Resources(Vec::new()), &java_configuration(), SizingPolicy::default());
		assert_eq!(decision, SizingDecision { file_count: 0, proceed: true });
	}
}

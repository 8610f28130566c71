use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vigil_primitives::{Language, RulePriority};

use crate::PatternSet;

/// One rule as configured for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
	pub name: String,
	pub language: Language,
	#[serde(default)]
	pub priority: RulePriority,
}

/// A named, ordered group of rules with its own path patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
	pub name: String,
	#[serde(default, rename = "rule")]
	pub rules: Vec<Rule>,
	#[serde(default)]
	pub include_patterns: Vec<String>,
	#[serde(default)]
	pub exclude_patterns: Vec<String>,
}

/// Effective rule configuration for one project.
///
/// Built by [`crate::RuleConfigurationResolver`]; identical inputs always
/// produce an identical configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleConfiguration {
	pub rule_sets: Vec<RuleSet>,
	pub include: PatternSet,
	pub exclude: PatternSet,
}

impl RuleConfiguration {
	/// Total number of rules across all rule sets.
	pub fn rule_count(&self) -> usize {
		self.rule_sets.iter().map(|set| set.rules.len()).sum()
	}

	/// Rules in configuration order.
	pub fn rules(&self) -> impl Iterator<Item = &Rule> {
		self.rule_sets.iter().flat_map(|set| set.rules.iter())
	}

	/// Languages with at least one rule.
	pub fn languages(&self) -> BTreeSet<Language> {
		self.rules().map(|rule| rule.language).collect()
	}

	/// Extensions owned by [`Self::languages`].
	pub fn file_extensions(&self) -> BTreeSet<&'static str> {
		self.languages().into_iter().flat_map(|language| language.extensions().iter().copied()).collect()
	}

	/// Whether `path` should be analyzed under the include/exclude patterns.
	///
	/// `path` is workspace-relative. A pattern matches if it matches either
	/// that path or the path below the project directory, so `src/gen/**`
	/// and `core/src/gen/**` both select `core/src/gen/A.java`. An empty
	/// include set admits every path. Exclusion always wins.
	pub fn applies(&self, path: &Path) -> bool {
		let within_project = project_relative(path);
		let matches = |set: &PatternSet| set.is_match(path) || within_project.is_some_and(|rest| set.is_match(rest));
		let included = self.include.is_empty() || matches(&self.include);
		included && !matches(&self.exclude)
	}
}

fn project_relative(path: &Path) -> Option<&Path> {
	let mut components = path.components();
	components.next()?;
	let rest = components.as_path();
	(!rest.as_os_str().is_empty()).then_some(rest)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rule(name: &str, language: Language) -> Rule {
		Rule {
			name: name.into(),
			language,
			priority: RulePriority::MEDIUM,
		}
	}

	fn config(include: &[&str], exclude: &[&str]) -> RuleConfiguration {
		RuleConfiguration {
			rule_sets: vec![RuleSet {
				name: "basic".into(),
				rules: vec![rule("UnusedLocalVariable", Language::Java), rule("EmptyCatchBlock", Language::Java)],
				include_patterns: Vec::new(),
				exclude_patterns: Vec::new(),
			}],
			include: PatternSet::new(include.iter().copied()),
			exclude: PatternSet::new(exclude.iter().copied()),
		}
	}

	#[test]
	fn exclude_beats_include() {
		let config = config(&["*.java"], &["**/generated/*"]);
		assert!(config.applies(Path::new("core/src/Main.java")));
		assert!(!config.applies(Path::new("core/src/generated/Gen.java")));
	}

	#[test]
	fn include_set_restricts_when_present() {
		let config = config(&["*.java"], &[]);
		assert!(!config.applies(Path::new("core/build.xml")));
		let open = self::config(&[], &[]);
		assert!(open.applies(Path::new("core/build.xml")));
	}

	#[test]
	fn patterns_match_below_the_project_directory() {
		let config = config(&["src/**"], &["src/generated/**"]);
		assert!(config.applies(Path::new("core/src/Main.java")));
		assert!(!config.applies(Path::new("core/src/generated/Gen.java")));
		assert!(!config.applies(Path::new("core/test/MainTest.java")));

		let prefixed = self::config(&[], &["core/src/generated/**"]);
		assert!(!prefixed.applies(Path::new("core/src/generated/Gen.java")));
	}

	#[test]
	fn extensions_follow_rule_languages() {
		let mut config = config(&[], &[]);
		assert_eq!(config.file_extensions().into_iter().collect::<Vec<_>>(), vec!["java"]);
		config.rule_sets[0].rules.push(rule("NoEval", Language::Ecmascript));
		assert_eq!(config.file_extensions().into_iter().collect::<Vec<_>>(), vec!["java", "js"]);
		assert_eq!(config.rule_count(), 3);
	}
}

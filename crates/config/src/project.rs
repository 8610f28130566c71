use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::RuleSet;

/// Per-project analysis properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectProperties {
	/// Whether automatic (build-triggered) analysis runs for this project.
	pub enabled: bool,
	/// Lifts the incremental file-count threshold for unattended runs.
	pub full_build_enabled: bool,
	/// Report high-priority findings as errors instead of warnings.
	pub violations_as_errors: bool,
	pub include_patterns: Vec<String>,
	pub exclude_patterns: Vec<String>,
	/// Project-relative folders to analyze instead of the whole project.
	pub source_roots: Vec<PathBuf>,
	#[serde(rename = "rule_set")]
	pub rule_sets: Vec<RuleSet>,
}

impl Default for ProjectProperties {
	fn default() -> Self {
		Self {
			enabled: true,
			full_build_enabled: false,
			violations_as_errors: true,
			include_patterns: Vec::new(),
			exclude_patterns: Vec::new(),
			source_roots: Vec::new(),
			rule_sets: Vec::new(),
		}
	}
}

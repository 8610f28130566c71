use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default number of matching files an unattended run may touch.
pub const DEFAULT_MAX_INCREMENTAL_COUNT: usize = 5;
/// Default number of analysis jobs allowed to run at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
/// Default number of files handed to the engine per call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Workspace-wide preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
	/// When set, only rules named in [`Self::active_rules`] run.
	pub global_rule_management: bool,
	pub active_rules: BTreeSet<String>,
	/// Include patterns applied to every project.
	pub include_patterns: Vec<String>,
	/// Exclude patterns applied to every project.
	pub exclude_patterns: Vec<String>,
	/// Count and analyze only files whose extension belongs to a language with active rules.
	pub determine_filetypes_automatically: bool,
	/// Unattended runs touching more matching files than this are skipped.
	pub max_incremental_count: usize,
	pub max_concurrency: usize,
	pub batch_size: usize,
}

impl Default for Preferences {
	fn default() -> Self {
		Self {
			global_rule_management: false,
			active_rules: BTreeSet::new(),
			include_patterns: Vec::new(),
			exclude_patterns: Vec::new(),
			determine_filetypes_automatically: true,
			max_incremental_count: DEFAULT_MAX_INCREMENTAL_COUNT,
			max_concurrency: DEFAULT_MAX_CONCURRENCY,
			batch_size: DEFAULT_BATCH_SIZE,
		}
	}
}

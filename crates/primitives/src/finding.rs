use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rule priority on the engine's ordered scale, where 1 is the most severe.
///
/// Values outside `1..=5` are kept as-is; consumers treat them as the default bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulePriority(u8);

impl RulePriority {
	pub const HIGH: Self = Self(1);
	pub const MEDIUM_HIGH: Self = Self(2);
	pub const MEDIUM: Self = Self(3);
	pub const MEDIUM_LOW: Self = Self(4);
	pub const LOW: Self = Self(5);

	pub const fn new(level: u8) -> Self {
		Self(level)
	}

	pub const fn level(self) -> u8 {
		self.0
	}
}

impl Default for RulePriority {
	fn default() -> Self {
		Self::MEDIUM
	}
}

impl fmt::Display for RulePriority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// One violation reported by the analysis engine.
///
/// Produced only by the engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
	/// Workspace-relative path of the file the finding belongs to.
	pub path: PathBuf,
	/// First line of the offending region (1-based).
	pub begin_line: u32,
	/// Last line of the offending region (1-based, inclusive).
	pub end_line: u32,
	/// Name of the rule that produced the finding.
	pub rule: String,
	pub priority: RulePriority,
	pub message: String,
}

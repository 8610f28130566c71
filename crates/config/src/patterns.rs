use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

/// A deduplicated, sorted set of glob patterns compiled into one matcher.
///
/// `*` crosses directory separators, so `*.java` matches files at any depth.
/// [`crate::RuleConfiguration::applies`] decides which path forms are tried.
#[derive(Clone)]
pub struct PatternSet {
	patterns: BTreeSet<String>,
	matcher: GlobSet,
}

impl PatternSet {
	/// Compiles `patterns`. Invalid globs are logged and skipped.
	pub fn new<I, S>(patterns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut accepted = BTreeSet::new();
		for pattern in patterns {
			let pattern = pattern.as_ref().trim();
			if pattern.is_empty() || accepted.contains(pattern) {
				continue;
			}
			match Glob::new(pattern) {
				Ok(_) => {
					accepted.insert(pattern.to_string());
				}
				Err(error) => warn!(pattern, %error, "ignoring invalid path pattern"),
			}
		}

		let mut builder = GlobSetBuilder::new();
		for pattern in &accepted {
			if let Ok(glob) = Glob::new(pattern) {
				builder.add(glob);
			}
		}
		let matcher = builder.build().unwrap_or_else(|error| {
			warn!(%error, "failed to compile path patterns");
			GlobSet::empty()
		});

		Self { patterns: accepted, matcher }
	}

	pub fn empty() -> Self {
		Self {
			patterns: BTreeSet::new(),
			matcher: GlobSet::empty(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	pub fn len(&self) -> usize {
		self.patterns.len()
	}

	/// Whether any pattern matches `path`.
	pub fn is_match(&self, path: &Path) -> bool {
		!self.patterns.is_empty() && self.matcher.is_match(path)
	}

	/// Patterns in sorted order.
	pub fn patterns(&self) -> impl Iterator<Item = &str> {
		self.patterns.iter().map(String::as_str)
	}
}

impl Default for PatternSet {
	fn default() -> Self {
		Self::empty()
	}
}

impl PartialEq for PatternSet {
	fn eq(&self, other: &Self) -> bool {
		self.patterns == other.patterns
	}
}

impl Eq for PatternSet {}

impl fmt::Debug for PatternSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(&self.patterns).finish()
	}
}

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of a workspace project.
///
/// Cheap to clone; projects are compared and hashed by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Arc<str>);

impl ProjectId {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ProjectId {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for ProjectId {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serializes_as_a_plain_string() {
		let project = ProjectId::from("core");
		assert_eq!(serde_json::to_string(&project).unwrap(), "\"core\"");
		let parsed: ProjectId = serde_json::from_str("\"web\"").unwrap();
		assert_eq!(parsed, ProjectId::from("web"));
	}
}

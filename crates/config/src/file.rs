//! TOML-backed configuration store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use vigil_primitives::ProjectId;

use crate::{ConfigError, ConfigStore, Preferences, ProjectProperties, Result};

/// Name of the workspace preference file, relative to the workspace root.
pub const PREFERENCES_FILE: &str = "vigil.toml";
/// Name of the project property file, relative to each project directory.
pub const PROJECT_FILE: &str = ".vigil.toml";

/// [`ConfigStore`] reading `vigil.toml` at the workspace root and
/// `.vigil.toml` inside each project directory.
#[derive(Debug)]
pub struct TomlConfigStore {
	root: PathBuf,
	preferences: RwLock<Preferences>,
}

impl TomlConfigStore {
	/// Opens the store, reading workspace preferences once.
	///
	/// A missing preference file yields defaults.
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		let preferences = load_preferences(&root)?;
		Ok(Self {
			root,
			preferences: RwLock::new(preferences),
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Re-reads the workspace preference file.
	pub fn reload(&self) -> Result<()> {
		let preferences = load_preferences(&self.root)?;
		*self.preferences.write() = preferences;
		info!(root = %self.root.display(), "preferences reloaded");
		Ok(())
	}

	fn project_file(&self, project: &ProjectId) -> PathBuf {
		self.root.join(project.as_str()).join(PROJECT_FILE)
	}
}

impl ConfigStore for TomlConfigStore {
	fn load_project(&self, project: &ProjectId) -> Result<ProjectProperties> {
		let path = self.project_file(project);
		match read_toml::<ProjectProperties>(&path) {
			Ok(Some(properties)) => {
				debug!(%project, rule_sets = properties.rule_sets.len(), "project properties loaded");
				Ok(properties)
			}
			Ok(None) => Err(ConfigError::unavailable(project, format!("{} not found", path.display()))),
			Err(error) => Err(ConfigError::unavailable(project, error)),
		}
	}

	fn preferences(&self) -> Preferences {
		self.preferences.read().clone()
	}
}

fn load_preferences(root: &Path) -> Result<Preferences> {
	let path = root.join(PREFERENCES_FILE);
	Ok(read_toml(&path)?.unwrap_or_default())
}

/// Reads and parses a TOML file; `Ok(None)` when the file does not exist.
fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
	let text = match std::fs::read_to_string(path) {
		Ok(text) => text,
		Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
		Err(error) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				error,
			});
		}
	};
	toml::from_str(&text).map(Some).map_err(|error| ConfigError::Parse {
		path: path.to_path_buf(),
		error,
	})
}

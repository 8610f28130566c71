//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;
use vigil_primitives::ProjectId;

/// Errors that can occur when loading preferences or project properties.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Project properties could not be loaded; aborts the trigger that asked for them.
	#[error("configuration unavailable for project {project}: {reason}")]
	Unavailable {
		/// Project whose properties failed to load.
		project: ProjectId,
		/// Human-readable cause.
		reason: String,
	},

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or schema.
	#[error("failed to parse {path}: {error}")]
	Parse {
		/// Path to the file that failed to parse.
		path: PathBuf,
		/// The underlying TOML error.
		error: toml::de::Error,
	},
}

impl ConfigError {
	/// Wraps any loading failure for `project` as [`ConfigError::Unavailable`].
	pub fn unavailable(project: &ProjectId, reason: impl ToString) -> Self {
		Self::Unavailable {
			project: project.clone(),
			reason: reason.to_string(),
		}
	}
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

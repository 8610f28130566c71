use std::path::PathBuf;

use vigil_config::RuleConfiguration;
use vigil_primitives::{FileDescriptor, Finding};

/// The external rule engine.
///
/// Called once per batch from a blocking worker thread. Implementations
/// report per-file problems in [`EngineReport::errors`] and reserve `Err`
/// for failures of the whole call.
pub trait Engine: Send + Sync {
	fn analyze(&self, files: &[FileDescriptor], configuration: &RuleConfiguration) -> Result<EngineReport, EngineError>;
}

impl<F> Engine for F
where
	F: Fn(&[FileDescriptor], &RuleConfiguration) -> Result<EngineReport, EngineError> + Send + Sync,
{
	fn analyze(&self, files: &[FileDescriptor], configuration: &RuleConfiguration) -> Result<EngineReport, EngineError> {
		self(files, configuration)
	}
}

/// Output of one engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
	pub findings: Vec<Finding>,
	pub errors: Vec<ProcessingError>,
}

/// The engine could not process one file, e.g. because it failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to process {}: {message}", path.display())]
pub struct ProcessingError {
	pub path: PathBuf,
	pub message: String,
}

impl ProcessingError {
	pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			message: message.into(),
		}
	}
}

/// Failure of an entire engine call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("engine failed: {reason}")]
	Failed { reason: String },
	#[error("engine I/O error running {command}: {error}")]
	Io {
		command: String,
		#[source]
		error: std::io::Error,
	},
	#[error("unreadable engine output {line:?}: {reason}")]
	Protocol { line: String, reason: String },
}

impl EngineError {
	pub fn failed(reason: impl Into<String>) -> Self {
		Self::Failed { reason: reason.into() }
	}
}

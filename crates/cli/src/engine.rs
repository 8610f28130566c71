//! Engine adapter running an external analyzer command.
//!
//! The command receives the absolute paths of one batch as arguments and the
//! comma-separated rule names in `VIGIL_RULES`. It prints one JSON object per
//! line on stdout, either a finding or a per-file processing error:
//!
//! ```text
//! {"file":"/ws/core/src/A.java","begin_line":3,"end_line":3,"rule":"EmptyCatchBlock","priority":1,"message":"..."}
//! {"file":"/ws/core/src/B.java","error":"unexpected token"}
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use vigil_analysis::{Engine, EngineError, EngineReport, ProcessingError};
use vigil_config::RuleConfiguration;
use vigil_primitives::{FileDescriptor, Finding, RulePriority};

/// Environment variable carrying the active rule names.
pub const RULES_ENV: &str = "VIGIL_RULES";

/// One line of engine output.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OutputLine {
	Finding {
		file: PathBuf,
		begin_line: u32,
		#[serde(default)]
		end_line: Option<u32>,
		rule: String,
		#[serde(default)]
		priority: RulePriority,
		#[serde(default)]
		message: String,
	},
	Error {
		file: PathBuf,
		error: String,
	},
}

/// [`Engine`] backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandEngine {
	program: String,
	args: Vec<String>,
	root: PathBuf,
}

impl CommandEngine {
	pub fn new(program: impl Into<String>, args: Vec<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args,
			root: root.into(),
		}
	}

	fn relative(&self, file: &Path) -> PathBuf {
		file.strip_prefix(&self.root).map(Path::to_path_buf).unwrap_or_else(|_| file.to_path_buf())
	}

	/// Parses the command's stdout into an engine report.
	fn parse(&self, stdout: &str) -> Result<EngineReport, EngineError> {
		let mut report = EngineReport::default();
		for line in stdout.lines().map(str::trim).filter(|line| !line.is_empty()) {
			let parsed: OutputLine = serde_json::from_str(line).map_err(|error| EngineError::Protocol {
				line: line.to_string(),
				reason: error.to_string(),
			})?;
			match parsed {
				OutputLine::Finding {
					file,
					begin_line,
					end_line,
					rule,
					priority,
					message,
				} => report.findings.push(Finding {
					path: self.relative(&file),
					begin_line,
					end_line: end_line.unwrap_or(begin_line),
					rule,
					priority,
					message,
				}),
				OutputLine::Error { file, error } => report.errors.push(ProcessingError::new(self.relative(&file), error)),
			}
		}
		Ok(report)
	}
}

impl Engine for CommandEngine {
	fn analyze(&self, files: &[FileDescriptor], configuration: &RuleConfiguration) -> Result<EngineReport, EngineError> {
		let rules: Vec<&str> = configuration.rules().map(|rule| rule.name.as_str()).collect();
		let output = Command::new(&self.program)
			.args(&self.args)
			.args(files.iter().map(|file| self.root.join(&file.path)))
			.env(RULES_ENV, rules.join(","))
			.current_dir(&self.root)
			.output()
			.map_err(|error| EngineError::Io {
				command: self.program.clone(),
				error,
			})?;

		let stdout = String::from_utf8_lossy(&output.stdout);
		let report = self.parse(&stdout);
		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			match report {
				Ok(report) if !report.findings.is_empty() || !report.errors.is_empty() => {
					tracing::debug!(status = %output.status, "engine.nonzero_exit_with_output");
					return Ok(report);
				}
				_ => {
					return Err(EngineError::failed(format!("{} exited with {}: {}", self.program, output.status, stderr.trim())));
				}
			}
		}
		report
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn engine() -> CommandEngine {
		CommandEngine::new("analyzer", Vec::new(), "/ws")
	}

	#[test]
	fn parses_findings_and_errors() {
		let stdout = concat!(
			"{\"file\":\"/ws/core/A.java\",\"begin_line\":3,\"rule\":\"EmptyCatchBlock\",\"priority\":1,\"message\":\"empty\"}\n",
			"\n",
			"{\"file\":\"core/B.java\",\"error\":\"unexpected token\"}\n",
		);

		let report = engine().parse(stdout).unwrap();

		assert_eq!(
			report.findings,
			vec![Finding {
				path: PathBuf::from("core/A.java"),
				begin_line: 3,
				end_line: 3,
				rule: "EmptyCatchBlock".into(),
				priority: RulePriority::HIGH,
				message: "empty".into(),
			}]
		);
		assert_eq!(report.errors, vec![ProcessingError::new("core/B.java", "unexpected token")]);
	}

	#[test]
	fn garbage_is_a_protocol_error() {
		assert!(matches!(engine().parse("not json"), Err(EngineError::Protocol { .. })));
	}

	#[test]
	fn missing_program_is_an_io_error() {
		let engine = CommandEngine::new("vigil-test-no-such-analyzer", Vec::new(), std::env::temp_dir());
		let result = engine.analyze(&[], &RuleConfiguration::default());
		assert!(matches!(result, Err(EngineError::Io { .. })));
	}
}

use std::cmp::Ordering;
use std::path::PathBuf;

use vigil_primitives::{Finding, RulePriority};

/// Severity shown for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationSeverity {
	Error,
	Warning,
	Info,
}

/// How prominently the host should render an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualWeight {
	High,
	Normal,
}

/// Payload copied from the finding that produced an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationAttributes {
	pub message: String,
	pub line: u32,
	pub end_line: u32,
	pub rule: String,
	pub priority: RulePriority,
}

/// A persisted annotation attached to one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationRecord {
	pub path: PathBuf,
	pub severity: AnnotationSeverity,
	pub weight: VisualWeight,
	pub attributes: AnnotationAttributes,
}

impl AnnotationRecord {
	/// Builds the record for `finding`, attached to `path`.
	pub fn from_finding(path: PathBuf, finding: &Finding, violations_as_errors: bool) -> Self {
		let (severity, weight) = severity_for(finding.priority, violations_as_errors);
		Self {
			path,
			severity,
			weight,
			attributes: AnnotationAttributes {
				message: finding.message.clone(),
				line: finding.begin_line,
				end_line: finding.end_line,
				rule: finding.rule.clone(),
				priority: finding.priority,
			},
		}
	}

	pub fn is_error(&self) -> bool {
		self.severity == AnnotationSeverity::Error
	}

	pub fn is_warning(&self) -> bool {
		self.severity == AnnotationSeverity::Warning
	}

	/// Canonical order of records within one file: line, end line, rule, message.
	pub(crate) fn canonical_cmp(&self, other: &Self) -> Ordering {
		let (a, b) = (&self.attributes, &other.attributes);
		a.line
			.cmp(&b.line)
			.then(a.end_line.cmp(&b.end_line))
			.then_with(|| a.rule.cmp(&b.rule))
			.then_with(|| a.message.cmp(&b.message))
	}
}

/// Maps a rule priority to annotation severity and weight.
///
/// | priority | flag on          | flag off         |
/// |----------|------------------|------------------|
/// | 1        | Error, High      | Warning, High    |
/// | 2        | Error, Normal    | Warning, High    |
/// | 5        | Info, Normal     | Info, Normal     |
/// | other    | Warning, High    | Warning, High    |
pub fn severity_for(priority: RulePriority, violations_as_errors: bool) -> (AnnotationSeverity, VisualWeight) {
	use AnnotationSeverity::*;
	use VisualWeight::*;

	match (priority.level(), violations_as_errors) {
		(1, true) => (Error, High),
		(2, true) => (Error, Normal),
		(5, _) => (Info, Normal),
		_ => (Warning, High),
	}
}

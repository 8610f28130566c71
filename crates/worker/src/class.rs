/// Execution classes used for job scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work a user explicitly asked for, e.g. a menu command.
	Interactive,
	/// Work triggered without a user in the loop, e.g. on save or build.
	Background,
	/// Async bookkeeping around a job: completion hooks and queue release.
	Supervision,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Supervision => "supervision",
		}
	}
}

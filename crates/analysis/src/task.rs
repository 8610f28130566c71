use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use vigil_config::RuleConfiguration;
use vigil_primitives::{ProjectId, Scope};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "task#{}", self.0)
	}
}

/// One pending analysis pass over one project. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisTask {
	id: TaskId,
	project: ProjectId,
	scope: Scope,
	configuration: Arc<RuleConfiguration>,
	user_initiated: bool,
	created_at: SystemTime,
}

impl AnalysisTask {
	pub fn new(project: ProjectId, scope: Scope, configuration: Arc<RuleConfiguration>, user_initiated: bool) -> Self {
		Self {
			id: TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)),
			project,
			scope,
			configuration,
			user_initiated,
			created_at: SystemTime::now(),
		}
	}

	pub fn id(&self) -> TaskId {
		self.id
	}

	pub fn project(&self) -> &ProjectId {
		&self.project
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	pub fn configuration(&self) -> &RuleConfiguration {
		&self.configuration
	}

	pub fn user_initiated(&self) -> bool {
		self.user_initiated
	}

	pub fn created_at(&self) -> SystemTime {
		self.created_at
	}
}

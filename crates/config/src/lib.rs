//! Configuration for vigil.
//!
//! This crate owns everything that decides *which rules run on which files*:
//!
//! - **Preferences**: workspace-wide settings such as global rule management,
//!   shared include/exclude patterns and the incremental threshold.
//! - **Project properties**: per-project rule sets, patterns and flags.
//! - **Resolution**: [`RuleConfigurationResolver`] merges both into the
//!   [`RuleConfiguration`] an analysis pass runs with.
//!
//! # Configuration Files
//!
//! [`TomlConfigStore`] reads:
//!
//! 1. `<workspace>/vigil.toml` - workspace preferences (optional)
//! 2. `<workspace>/<project>/.vigil.toml` - project properties (required per analyzed project)
//!
//! ```toml
//! # <workspace>/<project>/.vigil.toml
//! full_build_enabled = false
//! violations_as_errors = true
//! # patterns match paths below the project directory or below the workspace root
//! exclude_patterns = ["src/generated/**"]
//!
//! [[rule_set]]
//! name = "quickstart"
//!
//! [[rule_set.rule]]
//! name = "EmptyCatchBlock"
//! language = "java"
//! priority = 3
//! ```

mod error;
pub mod file;
mod patterns;
mod preferences;
mod project;
mod resolver;
mod rules;
mod store;

pub use error::{ConfigError, Result};
pub use file::TomlConfigStore;
pub use patterns::PatternSet;
pub use preferences::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_INCREMENTAL_COUNT, Preferences};
pub use project::ProjectProperties;
pub use resolver::{ResolvedProject, RuleConfigurationResolver};
pub use rules::{Rule, RuleConfiguration, RuleSet};
pub use store::{ConfigStore, MemoryConfigStore};

//! Analysis stage of vigil.
//!
//! [`ScopeSizer`] decides whether a pass runs at all. [`TaskRunner`] expands
//! an [`AnalysisTask`]'s scope into files and feeds them to the [`Engine`] in
//! batches, producing an [`AnalysisOutcome`] ready for reconciliation.

mod engine;
pub mod files;
mod runner;
mod sizer;
mod task;

pub use engine::{Engine, EngineError, EngineReport, ProcessingError};
pub use runner::{AnalysisError, AnalysisOutcome, RunnerOptions, TaskRunner};
pub use sizer::{ScopeSizer, SizingDecision, SizingPolicy};
pub use task::{AnalysisTask, TaskId};

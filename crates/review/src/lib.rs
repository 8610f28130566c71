//! Orchestration for vigil.
//!
//! [`ReviewService::trigger`] is the single entry point hosts call when
//! resources change or the user asks for a check. Analysis runs on the
//! injected [`vigil_worker::JobScheduler`]; results land in the
//! [`vigil_annotations::AnnotationStore`].

mod observer;
mod service;

pub use observer::{NoopObserver, ReviewObserver, TaskSummary};
pub use service::{ReviewContext, ReviewError, ReviewService, SkippedScope, SubmittedTask, TriggerReport};

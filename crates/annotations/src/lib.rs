//! Annotation model for vigil.
//!
//! [`AnnotationReconciler`] turns engine findings into [`AnnotationRecord`]s
//! and installs them per file; [`AnnotationStore`] is the read side the host
//! renders from.

mod reconciler;
mod record;
mod store;

pub use reconciler::{AnnotationReconciler, ReconcileError, ReconcileOptions, ReconcileReport};
pub use record::{AnnotationAttributes, AnnotationRecord, AnnotationSeverity, VisualWeight, severity_for};
pub use store::{AnnotationEvent, AnnotationEventReceiver, AnnotationEventSender, AnnotationStore};

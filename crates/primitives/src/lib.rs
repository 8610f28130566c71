//! Core types shared across vigil: projects, resources, change scopes, languages and findings.
//!
//! Everything in this crate is plain data. The only trait is [`ResourceTree`], the read-only
//! view over the host's resource hierarchy that the sizing and analysis stages walk.

/// Analysis findings and rule priorities.
pub mod finding;
/// Project identifiers.
pub mod ids;
/// Source languages and the file extensions they own.
pub mod language;
mod memory;
/// Resources, file descriptors and the resource tree abstraction.
pub mod resource;
/// Change scopes: explicit resource lists and deltas.
pub mod scope;

pub use finding::{Finding, RulePriority};
pub use ids::ProjectId;
pub use language::Language;
pub use memory::MemoryResourceTree;
pub use resource::{FileDescriptor, Resource, ResourceKind, ResourceTree, extension_of};
pub use scope::{DeltaKind, ResourceDelta, Scope};

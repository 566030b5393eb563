//! Domain models for favorites
//!
//! Contains the entry model, path identity rules and resource references,
//! without any persistence or threading concerns.

mod entry;
pub mod resolver;
mod resource;

pub use entry::{normalize_comment, Entry, EntryError, EntryKey, EntryStatus};
pub use resolver::CasePolicy;
pub use resource::{AddRequest, ResourceRef, Workspace};

//! Favorites - a persistent, user-curated list of file and folder bookmarks
//!
//! Favorites are workspace resources or arbitrary filesystem paths, kept in
//! a user-chosen order. The [`store::FavoritesStore`] owns the list, persists
//! it after every change, reconciles it with filesystem change deltas and
//! notifies listeners with immutable snapshots.

pub mod domain;
pub mod storage;
pub mod store;
pub mod watch;
pub mod cli;

pub use domain::{AddRequest, Entry, EntryKey, EntryStatus, ResourceRef, Workspace};
pub use store::{DropLocation, FavoritesStore, ResourceDelta, Snapshot};

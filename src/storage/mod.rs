//! # Storage Layer
//!
//! Persistence for the favorites list.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Favorites | Flat record array ([`codec`]) | `<data dir>/entries.prefs` |
//! | Config | TOML | `<config dir>/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`FilePreferences`] takes `fs2` locks around reads and writes
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Preferences`] - Key/value text storage the store persists into
//! - [`Config`] - User configuration

pub mod codec;
mod config;
mod preferences;

pub use codec::CodecError;
pub use config::{
    Config, ConfigError, PathsConfig, StorageConfig, WatchConfig, WorkspaceConfig,
    DEFAULT_PREFERENCE_KEY,
};
pub use preferences::{FilePreferences, MemoryPreferences, Preferences, PreferencesError};

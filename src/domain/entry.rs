//! Favorite entry model

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;

use super::resolver;
use super::resource::ResourceRef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("Favorite path must not be empty")]
    EmptyPath,
}

/// Existence status of a favorite, derived from the last probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    #[default]
    Ok,
    Missing,
}

impl EntryStatus {
    /// Maps an existence probe result to a status
    pub fn from_exists(exists: bool) -> Self {
        if exists {
            EntryStatus::Ok
        } else {
            EntryStatus::Missing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Ok => "OK",
            EntryStatus::Missing => "MISSING",
        }
    }

    /// Parses a persisted status name, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("ok") {
            Some(EntryStatus::Ok)
        } else if value.eq_ignore_ascii_case("missing") {
            Some(EntryStatus::Missing)
        } else {
            None
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a favorite: the normalized, case-policy-aware path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    /// Computes the key for a path under the process case policy
    pub fn for_path(path: &str) -> Self {
        Self(resolver::key_for(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One bookmarked file or folder.
///
/// Equality and hashing look only at the key, so two entries with
/// different labels or comments for the same path are the same favorite.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    #[serde(skip)]
    key: EntryKey,
    absolute_path: String,
    workspace_member: bool,
    workspace_path: Option<String>,
    label: Option<String>,
    comment: Option<String>,
    status: EntryStatus,
}

impl Entry {
    /// Creates an entry for an absolute path
    pub fn new(absolute_path: impl Into<String>, workspace_member: bool) -> Result<Self, EntryError> {
        let absolute_path = absolute_path.into();
        if absolute_path.trim().is_empty() {
            return Err(EntryError::EmptyPath);
        }

        Ok(Self {
            key: EntryKey::for_path(&absolute_path),
            absolute_path,
            workspace_member,
            workspace_path: None,
            label: None,
            comment: None,
            status: EntryStatus::Ok,
        })
    }

    /// Creates an entry from a resource reference
    pub fn from_resource(resource: &ResourceRef) -> Result<Self, EntryError> {
        Ok(Self::new(resource.absolute_path(), resource.is_workspace_member())?
            .with_workspace_path(resource.workspace_path().map(str::to_string))
            .with_label(Some(resource.name().to_string())))
    }

    pub fn with_workspace_path(mut self, workspace_path: Option<String>) -> Self {
        self.workspace_path = workspace_path;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = normalize_comment(comment.as_deref());
        self
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    pub fn is_workspace_member(&self) -> bool {
        self.workspace_member
    }

    pub fn workspace_path(&self) -> Option<&str> {
        self.workspace_path.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label for display, falling back to the last path segment
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => resolver::display_name(&self.absolute_path),
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn is_missing(&self) -> bool {
        self.status == EntryStatus::Missing
    }

    /// Moves the entry to a new path and recomputes its key
    pub(crate) fn set_location(&mut self, absolute_path: &str) {
        self.absolute_path = absolute_path.to_string();
        self.key = EntryKey::for_path(absolute_path);
    }

    pub(crate) fn set_workspace_path(&mut self, workspace_path: Option<String>) {
        self.workspace_path = workspace_path;
    }

    pub(crate) fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub(crate) fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    /// Returns true if the status actually changed
    pub(crate) fn set_status(&mut self, status: EntryStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = if self.workspace_member { "workspace" } else { "external" };
        write!(f, "{}:{}", origin, self.absolute_path)
    }
}

/// Maps blank comments to no comment
pub fn normalize_comment(comment: Option<&str>) -> Option<String> {
    match comment {
        Some(text) if !text.trim().is_empty() => Some(text.to_string()),
        _ => None,
    }
}

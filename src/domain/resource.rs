//! References to files and folders handed in by the host

use std::path::{Component, Path, PathBuf};

use super::resolver;

/// A resolved file or folder: where it lives, and where it sits in the
/// workspace if it belongs to one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    absolute_path: String,
    workspace_path: Option<String>,
    name: String,
}

impl ResourceRef {
    /// Creates a workspace member reference
    pub fn new(
        absolute_path: impl Into<String>,
        workspace_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            absolute_path: resolver::normalize(&absolute_path.into()),
            workspace_path: Some(workspace_path.into()),
            name: name.into(),
        }
    }

    /// Creates a reference to a path outside any workspace.
    ///
    /// Returns `None` when the path cannot be made absolute.
    pub fn external(path: impl AsRef<Path>) -> Option<Self> {
        let absolute_path = resolver::absolutize(path.as_ref())?;
        let name = resolver::display_name(&absolute_path);
        Some(Self {
            absolute_path,
            workspace_path: None,
            name,
        })
    }

    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    pub fn workspace_path(&self) -> Option<&str> {
        self.workspace_path.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_workspace_member(&self) -> bool {
        self.workspace_path.is_some()
    }
}

/// The managed project workspace: a root directory whose contents are
/// addressed by rooted, `/`-separated workspace paths
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = resolver::absolutize(&root).map(PathBuf::from).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a path to a workspace member, if it lies inside the root
    pub fn resource(&self, path: &Path) -> Option<ResourceRef> {
        let absolute = resolver::absolutize(path)?;
        let relative = Path::new(&absolute).strip_prefix(&self.root).ok()?;

        let segments: Vec<&str> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        if segments.is_empty() {
            return None;
        }

        let name = segments[segments.len() - 1].to_string();
        let workspace_path = format!("/{}", segments.join("/"));
        Some(ResourceRef::new(absolute, workspace_path, name))
    }

    /// Classifies a path as a workspace member or an external path
    pub fn add_request(&self, path: &Path) -> AddRequest {
        match self.resource(path) {
            Some(resource) => AddRequest::Resource(resource),
            None => AddRequest::External(path.to_path_buf()),
        }
    }
}

/// One item of a bulk add
#[derive(Debug, Clone)]
pub enum AddRequest {
    Resource(ResourceRef),
    External(PathBuf),
}

impl From<ResourceRef> for AddRequest {
    fn from(resource: ResourceRef) -> Self {
        AddRequest::Resource(resource)
    }
}

impl From<PathBuf> for AddRequest {
    fn from(path: PathBuf) -> Self {
        AddRequest::External(path)
    }
}

impl From<&Path> for AddRequest {
    fn from(path: &Path) -> Self {
        AddRequest::External(path.to_path_buf())
    }
}

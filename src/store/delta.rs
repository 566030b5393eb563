//! Resource change deltas
//!
//! A delta is a tree of change records delivered by whatever watches the
//! workspace and filesystem. The store reads it in one pre-order pass.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{EntryKey, ResourceRef};

/// What happened to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Added,
    Removed,
    Changed,
}

/// One node of a change delta
#[derive(Debug, Clone)]
pub struct ResourceDelta {
    resource: Option<ResourceRef>,
    kind: DeltaKind,
    moved_to: Option<ResourceRef>,
    children: Vec<ResourceDelta>,
}

impl ResourceDelta {
    /// Creates the root node of a delta; it carries no resource itself
    pub fn root(children: Vec<ResourceDelta>) -> Self {
        Self {
            resource: None,
            kind: DeltaKind::Changed,
            moved_to: None,
            children,
        }
    }

    pub fn added(resource: ResourceRef) -> Self {
        Self::node(resource, DeltaKind::Added)
    }

    pub fn removed(resource: ResourceRef) -> Self {
        Self::node(resource, DeltaKind::Removed)
    }

    pub fn changed(resource: ResourceRef) -> Self {
        Self::node(resource, DeltaKind::Changed)
    }

    /// A removal whose resource now lives at `to`
    pub fn moved(from: ResourceRef, to: ResourceRef) -> Self {
        Self {
            moved_to: Some(to),
            ..Self::node(from, DeltaKind::Removed)
        }
    }

    fn node(resource: ResourceRef, kind: DeltaKind) -> Self {
        Self {
            resource: Some(resource),
            kind,
            moved_to: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ResourceDelta>) -> Self {
        self.children = children;
        self
    }

    pub fn resource(&self) -> Option<&ResourceRef> {
        self.resource.as_ref()
    }

    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    pub fn moved_to(&self) -> Option<&ResourceRef> {
        self.moved_to.as_ref()
    }

    pub fn children(&self) -> &[ResourceDelta] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none() && self.children.is_empty()
    }

    /// Visits this node and its descendants in pre-order
    pub fn visit<F: FnMut(&ResourceDelta)>(&self, visitor: &mut F) {
        visitor(self);
        for child in &self.children {
            child.visit(visitor);
        }
    }
}

/// Moves and removals gathered from one delta
#[derive(Debug, Default)]
pub(crate) struct DeltaSummary {
    pub(crate) moved: BTreeMap<EntryKey, ResourceRef>,
    pub(crate) removed: HashSet<EntryKey>,
}

impl DeltaSummary {
    /// Collects moves and removals in a single traversal.
    ///
    /// A removal is cancelled by a later addition of the same key in the
    /// same delta, so a replace-in-place never reads as a deletion.
    pub(crate) fn collect(delta: &ResourceDelta) -> Self {
        let mut summary = Self::default();

        delta.visit(&mut |node| {
            let Some(resource) = node.resource() else {
                return;
            };
            let key = EntryKey::for_path(resource.absolute_path());

            match (node.kind(), node.moved_to()) {
                (DeltaKind::Removed, Some(target)) => {
                    summary.moved.insert(key, target.clone());
                }
                (DeltaKind::Removed, None) => {
                    summary.removed.insert(key);
                }
                (DeltaKind::Added, _) => {
                    summary.removed.remove(&key);
                }
                (DeltaKind::Changed, _) => {}
            }
        });

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(path: &str) -> ResourceRef {
        let name = path.rsplit('/').next().unwrap_or(path);
        ResourceRef::new(path, path.trim_start_matches("/ws"), name)
    }

    #[test]
    fn visits_in_pre_order() {
        let delta = ResourceDelta::root(vec![
            ResourceDelta::changed(resource("/ws/src"))
                .with_children(vec![ResourceDelta::added(resource("/ws/src/a.rs"))]),
            ResourceDelta::removed(resource("/ws/b.rs")),
        ]);

        let mut seen = Vec::new();
        delta.visit(&mut |node| {
            seen.push(node.resource().map(|r| r.absolute_path().to_string()));
        });

        assert_eq!(
            seen,
            vec![
                None,
                Some("/ws/src".to_string()),
                Some("/ws/src/a.rs".to_string()),
                Some("/ws/b.rs".to_string()),
            ]
        );
    }

    #[test]
    fn collects_moves_and_removals() {
        let delta = ResourceDelta::root(vec![
            ResourceDelta::moved(resource("/ws/foo.txt"), resource("/ws/bar.txt")),
            ResourceDelta::added(resource("/ws/bar.txt")),
            ResourceDelta::removed(resource("/ws/gone.txt")),
        ]);

        let summary = DeltaSummary::collect(&delta);

        assert_eq!(
            summary.moved.get(&EntryKey::for_path("/ws/foo.txt")).map(|r| r.absolute_path()),
            Some("/ws/bar.txt")
        );
        assert!(summary.removed.contains(&EntryKey::for_path("/ws/gone.txt")));
        assert!(!summary.removed.contains(&EntryKey::for_path("/ws/foo.txt")));
    }

    #[test]
    fn later_addition_cancels_removal() {
        let delta = ResourceDelta::root(vec![
            ResourceDelta::removed(resource("/ws/a.txt")),
            ResourceDelta::added(resource("/ws/a.txt")),
        ]);

        assert!(DeltaSummary::collect(&delta).removed.is_empty());
    }

    #[test]
    fn earlier_addition_does_not_cancel_removal() {
        let delta = ResourceDelta::root(vec![
            ResourceDelta::added(resource("/ws/a.txt")),
            ResourceDelta::removed(resource("/ws/a.txt")),
        ]);

        assert_eq!(DeltaSummary::collect(&delta).removed.len(), 1);
    }
}

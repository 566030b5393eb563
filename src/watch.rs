//! # Filesystem Watcher
//!
//! Turns raw `notify` events into [`ResourceDelta`]s and feeds them to a
//! [`FavoritesStore`].
//!
//! Events are gathered for a short batch window so that the two halves of
//! a rename usually land in the same delta. A rename whose halves fall in
//! different batches briefly marks the favorite missing; the next probe
//! corrects it.
//!
//! Each batch first reloads the persisted list, so favorites saved by other
//! `favs` processes while the watcher runs are not overwritten.
//!
//! ## Watched paths
//!
//! - the workspace root, recursively
//! - the parent directory of every external favorite, non-recursively

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::domain::{ResourceRef, Workspace};
use crate::store::{FavoritesStore, ResourceDelta};

/// How often an idle watcher checks its stop flag
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Default time to gather events into one delta
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(250);

/// Builds one delta from a batch of filesystem events.
///
/// Paths inside `workspace` become member references; everything else is
/// treated as an external path. Access events are ignored.
pub fn delta_from_events(events: &[Event], workspace: Option<&Workspace>) -> ResourceDelta {
    let mut children = Vec::new();

    for event in events {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                children.extend(resources(event, workspace).map(ResourceDelta::added));
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                children.extend(resources(event, workspace).map(ResourceDelta::removed));
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let (Some(from), Some(to)) = (event.paths.first(), event.paths.get(1)) else {
                    continue;
                };
                if let (Some(from), Some(to)) = (resolve(from, workspace), resolve(to, workspace)) {
                    children.push(ResourceDelta::moved(from, to.clone()));
                    children.push(ResourceDelta::added(to));
                }
            }
            // Backends that cannot tell the halves apart report one path per side
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in &event.paths {
                    let Some(resource) = resolve(path, workspace) else {
                        continue;
                    };
                    if path.exists() {
                        children.push(ResourceDelta::added(resource));
                    } else {
                        children.push(ResourceDelta::removed(resource));
                    }
                }
            }
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                children.extend(resources(event, workspace).map(ResourceDelta::changed));
            }
            EventKind::Access(_) => {}
        }
    }

    ResourceDelta::root(children)
}

/// Member reference inside the workspace, external reference otherwise
fn resolve(path: &Path, workspace: Option<&Workspace>) -> Option<ResourceRef> {
    workspace
        .and_then(|workspace| workspace.resource(path))
        .or_else(|| ResourceRef::external(path))
}

fn resources<'a>(
    event: &'a Event,
    workspace: Option<&'a Workspace>,
) -> impl Iterator<Item = ResourceRef> + 'a {
    event
        .paths
        .iter()
        .filter_map(move |path| resolve(path, workspace))
}

/// Watches favorites on disk and reconciles the store as they change
pub struct FavoritesWatcher {
    store: Arc<FavoritesStore>,
    workspace: Option<Workspace>,
    batch_window: Duration,
}

impl FavoritesWatcher {
    pub fn new(store: Arc<FavoritesStore>, workspace: Option<Workspace>) -> Self {
        Self {
            store,
            workspace,
            batch_window: DEFAULT_BATCH_WINDOW,
        }
    }

    pub fn with_batch_window(mut self, window: Duration) -> Self {
        self.batch_window = window;
        self
    }

    /// Directories to watch for the current favorites
    pub fn targets(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut targets = BTreeMap::new();
        let root = self.workspace.as_ref().map(Workspace::root);

        if let Some(root) = root.filter(|root| root.is_dir()) {
            targets.insert(root.to_path_buf(), RecursiveMode::Recursive);
        }

        for entry in self.store.entries().iter() {
            if entry.is_workspace_member() {
                continue;
            }
            let Some(parent) = Path::new(entry.absolute_path()).parent() else {
                continue;
            };
            if root.is_some_and(|root| parent.starts_with(root)) || !parent.is_dir() {
                continue;
            }
            targets
                .entry(parent.to_path_buf())
                .or_insert(RecursiveMode::NonRecursive);
        }

        targets.into_iter().collect()
    }

    /// Applies one batch of events; returns false when nothing was relevant
    pub fn dispatch(&self, events: &[Event]) -> bool {
        let delta = delta_from_events(events, self.workspace.as_ref());
        if delta.is_empty() {
            return false;
        }

        tracing::debug!(changes = delta.children().len(), "Reconciling favorites");
        // Other processes may have saved since the last batch.
        self.store.reload();
        self.store.on_external_change(&delta);
        true
    }

    /// Watches until `stop` is set or the event source goes away
    pub fn run(&self, stop: &AtomicBool) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        let mut watcher =
            notify::recommended_watcher(tx).context("Failed to create file watcher")?;

        for (path, mode) in self.targets() {
            match watcher.watch(&path, mode) {
                Ok(()) => tracing::debug!(path = %path.display(), ?mode, "Watching"),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Failed to watch directory")
                }
            }
        }

        tracing::info!(
            batch_millis = self.batch_window.as_millis() as u64,
            "Favorites watcher ready"
        );

        while !stop.load(Ordering::Relaxed) {
            let first = match rx.recv_timeout(IDLE_POLL) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let mut events = Vec::new();
            collect(first, &mut events);

            let deadline = Instant::now() + self.batch_window;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match rx.recv_timeout(remaining) {
                    Ok(result) => collect(result, &mut events),
                    Err(_) => break,
                }
            }

            self.dispatch(&events);
        }

        Ok(())
    }
}

fn collect(result: notify::Result<Event>, events: &mut Vec<Event>) {
    match result {
        Ok(event) => events.push(event),
        Err(error) => tracing::warn!(%error, "Watch error"),
    }
}

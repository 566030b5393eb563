//! # Favorites Store
//!
//! Owns the single ordered, duplicate-free list of favorites for the life of
//! the process. Every public operation runs under one lock covering both the
//! display order and the by-key index, persists through [`Preferences`]
//! before releasing it, and then notifies listeners with an immutable
//! [`Snapshot`] of the committed state.
//!
//! ## Status
//!
//! An entry is `OK` or `MISSING`. Status is only ever derived from an
//! existence probe, so probing twice without a filesystem change is a no-op.
//!
//! ## Lifecycle
//!
//! 1. [`FavoritesStore::load`] once at startup
//! 2. user operations and [`FavoritesStore::on_external_change`] from any thread
//! 3. [`FavoritesStore::shutdown`] for the final save and listener detach

mod delta;
mod entries;
mod listeners;
mod probe;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::domain::{normalize_comment, AddRequest, Entry, EntryKey, EntryStatus, ResourceRef};
use crate::storage::{codec, Preferences, DEFAULT_PREFERENCE_KEY};

pub use delta::{DeltaKind, ResourceDelta};
pub use listeners::{ListenerId, ListenerSet, Snapshot};
pub use probe::{FsProbe, ResourceProbe};

use delta::DeltaSummary;
use entries::{EntryList, Upsert};

/// Where a dragged block lands relative to the drop target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropLocation {
    Before,
    After,
    On,
    #[default]
    None,
}

impl DropLocation {
    /// After and On place the block after the target; the rest before it
    pub fn inserts_after(self) -> bool {
        matches!(self, DropLocation::After | DropLocation::On)
    }
}

/// Mutable state guarded by the store lock
#[derive(Debug, Default)]
struct State {
    entries: EntryList,
    revision: u64,
}

/// Outcome of a locked mutation
#[derive(Debug, Default, Clone, Copy)]
struct Effect {
    persist: bool,
    notify: bool,
}

impl Effect {
    const NONE: Effect = Effect {
        persist: false,
        notify: false,
    };
    const CHANGED: Effect = Effect {
        persist: true,
        notify: true,
    };
}

/// The favorites list, shared between the UI and change notifiers
pub struct FavoritesStore {
    state: Mutex<State>,
    listeners: ListenerSet,
    preferences: Box<dyn Preferences>,
    probe: Box<dyn ResourceProbe>,
    preference_key: String,
}

impl FavoritesStore {
    /// Creates an empty store persisting into `preferences`
    pub fn new(preferences: Box<dyn Preferences>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            listeners: ListenerSet::new(),
            preferences,
            probe: Box::new(FsProbe),
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
        }
    }

    /// Replaces the existence probe
    pub fn with_probe(mut self, probe: Box<dyn ResourceProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Persists under a different preference key
    pub fn with_preference_key(mut self, key: impl Into<String>) -> Self {
        self.preference_key = key.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Returns an immutable snapshot of the current order
    pub fn entries(&self) -> Snapshot {
        let state = self.lock();
        Snapshot::new(state.revision, state.entries.to_vec())
    }

    pub fn get(&self, key: &EntryKey) -> Option<Entry> {
        self.lock().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &EntryKey) -> bool {
        self.lock().entries.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the entry's target currently exists
    pub fn exists(&self, entry: &Entry) -> bool {
        self.probe.exists(entry)
    }

    /// Whether the entry's target is a directory
    pub fn is_directory(&self, entry: &Entry) -> bool {
        self.probe.is_directory(entry)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Registers a change callback
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Snapshot) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Replaces the in-memory list with the persisted one.
    ///
    /// Missing, empty or corrupt persisted text yields an empty list. Every
    /// entry is re-probed and listeners are always notified.
    pub fn load(&self) {
        self.apply(|store, state| {
            state.entries = store.read_persisted().unwrap_or_default();

            let reprobed = state.entries.refresh_statuses(store.probe.as_ref());
            tracing::debug!(count = state.entries.len(), "Loaded favorites");
            Effect {
                persist: reprobed,
                notify: true,
            }
        });
    }

    /// Picks up changes another process saved since the last load.
    ///
    /// Unlike [`load`](Self::load), listeners are only notified when the
    /// list actually differs, and a failed read keeps the in-memory list.
    /// Returns true if anything changed.
    pub fn reload(&self) -> bool {
        let mut changed = false;

        self.apply(|store, state| {
            let Some(mut entries) = store.read_persisted() else {
                return Effect::NONE;
            };
            let reprobed = entries.refresh_statuses(store.probe.as_ref());

            changed = codec::encode(&entries.to_vec()) != codec::encode(&state.entries.to_vec());
            state.entries = entries;
            if changed {
                tracing::debug!(count = state.entries.len(), "Reloaded favorites");
            }

            Effect {
                persist: reprobed,
                notify: changed,
            }
        });
        changed
    }

    /// Decodes the persisted list; `None` only when the read itself failed
    fn read_persisted(&self) -> Option<EntryList> {
        let mut entries = EntryList::default();

        match self.preferences.get(&self.preference_key) {
            Ok(Some(text)) if !text.trim().is_empty() => match codec::decode(&text) {
                Ok(decoded) => {
                    for entry in decoded {
                        entries.upsert(entry);
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "Discarding unreadable favorites");
                }
            },
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(error = %format!("{:#}", error), "Failed to read favorites");
                return None;
            }
        }

        Some(entries)
    }

    /// Final save and listener detach
    pub fn shutdown(&self) {
        self.save_now();
        self.listeners.clear();
    }

    /// Writes the current order to preferences; failures are logged
    pub fn save_now(&self) {
        let state = self.lock();
        self.persist(&state);
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Adds a workspace (or other resolved) resource.
    ///
    /// Returns true only if a new favorite was appended. Re-adding a stored
    /// path refreshes it in place and still persists.
    pub fn add_resource(&self, resource: &ResourceRef) -> bool {
        self.add_entries(std::iter::once(Entry::from_resource(resource).ok()))
            .added
    }

    /// Adds a path outside the workspace.
    ///
    /// The path is made absolute and normalized first; invalid paths are
    /// ignored and report false.
    pub fn add_external(&self, path: impl AsRef<Path>) -> bool {
        self.add_entries(std::iter::once(external_entry(path.as_ref()))).added
    }

    /// Adds or refreshes many favorites with a single save and notification.
    ///
    /// Invalid items are skipped. Returns true if anything visibly changed.
    pub fn add_many(&self, requests: impl IntoIterator<Item = AddRequest>) -> bool {
        let entries = requests.into_iter().map(|request| match request {
            AddRequest::Resource(resource) => Entry::from_resource(&resource).ok(),
            AddRequest::External(path) => external_entry(&path),
        });
        self.add_entries(entries).changed
    }

    fn add_entries(&self, entries: impl IntoIterator<Item = Option<Entry>>) -> AddOutcome {
        let mut outcome = AddOutcome::default();

        self.apply(|store, state| {
            let mut refreshed = false;

            for entry in entries.into_iter().flatten() {
                let status = EntryStatus::from_exists(store.probe.exists(&entry));
                match state.entries.upsert(entry.with_status(status)) {
                    Upsert::Added => outcome.added = true,
                    Upsert::Refreshed { changed } => {
                        refreshed = true;
                        outcome.changed |= changed;
                    }
                }
            }

            let reprobed = state.entries.refresh_statuses(store.probe.as_ref());
            outcome.changed |= outcome.added || reprobed;

            Effect {
                persist: outcome.added || refreshed || reprobed,
                notify: outcome.changed,
            }
        });

        outcome
    }

    /// Removes favorites by key; absent keys are ignored.
    ///
    /// Returns true if the list shrank.
    pub fn remove(&self, keys: impl IntoIterator<Item = EntryKey>) -> bool {
        let mut removed = false;
        self.apply(|_, state| {
            for key in keys {
                removed |= state.entries.remove(&key);
            }
            if removed {
                Effect::CHANGED
            } else {
                Effect::NONE
            }
        });
        removed
    }

    /// Moves favorites as one block before or after `target`.
    ///
    /// With no target, or a target that is itself moving or gone, the block
    /// goes to the end. The block keeps the order given in `moving`. Any
    /// non-empty move persists and notifies, even if the order is unchanged.
    pub fn move_entries(
        &self,
        moving: impl IntoIterator<Item = EntryKey>,
        target: Option<&EntryKey>,
        location: DropLocation,
    ) {
        self.apply(|_, state| {
            if state
                .entries
                .reorder(moving, target, location.inserts_after())
            {
                Effect::CHANGED
            } else {
                Effect::NONE
            }
        });
    }

    /// Sets or clears the comment of a favorite.
    ///
    /// Blank text clears the comment. Returns true if the value changed.
    pub fn update_comment(&self, key: &EntryKey, comment: Option<&str>) -> bool {
        let comment = normalize_comment(comment);
        let mut changed = false;

        self.apply(|_, state| {
            if let Some(entry) = state.entries.get_mut(key) {
                if entry.comment() != comment.as_deref() {
                    entry.set_comment(comment.clone());
                    changed = true;
                }
            }
            if changed {
                Effect::CHANGED
            } else {
                Effect::NONE
            }
        });
        changed
    }

    /// Reconciles favorites with a batch of external resource changes.
    ///
    /// Moved resources take their entries with them, removed ones are marked
    /// missing, and afterwards every entry is re-probed to catch changes the
    /// delta did not describe.
    pub fn on_external_change(&self, delta: &ResourceDelta) {
        let summary = DeltaSummary::collect(delta);

        self.apply(|store, state| {
            let mut changed = state
                .entries
                .relocate_all(&summary.moved, store.probe.as_ref())
                > 0;

            for key in &summary.removed {
                if let Some(entry) = state.entries.get_mut(key) {
                    if !entry.is_missing() {
                        entry.set_status(EntryStatus::Missing);
                        changed = true;
                    }
                }
            }

            changed |= state.entries.refresh_statuses(store.probe.as_ref());

            if changed {
                Effect::CHANGED
            } else {
                Effect::NONE
            }
        });
    }

    /// Runs one mutation under the lock, persists inside it, and notifies
    /// after releasing it
    fn apply<F>(&self, mutate: F)
    where
        F: FnOnce(&Self, &mut State) -> Effect,
    {
        let snapshot = {
            let mut state = self.lock();
            let effect = mutate(self, &mut *state);

            if effect.persist {
                self.persist(&state);
            }
            if !effect.notify {
                return;
            }

            state.revision += 1;
            Snapshot::new(state.revision, state.entries.to_vec())
        };

        self.listeners.notify(&snapshot);
    }

    fn persist(&self, state: &State) {
        let text = codec::encode(&state.entries.to_vec());
        if let Err(error) = self.preferences.put(&self.preference_key, &text) {
            tracing::error!(error = %format!("{:#}", error), "Failed to persist favorites");
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct AddOutcome {
    added: bool,
    changed: bool,
}

fn external_entry(path: &Path) -> Option<Entry> {
    match ResourceRef::external(path) {
        Some(resource) => Entry::from_resource(&resource).ok(),
        None => {
            tracing::debug!(path = %path.display(), "Ignoring invalid favorite path");
            None
        }
    }
}

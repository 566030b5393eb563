//! Change listeners and the snapshots they receive
//!
//! Subscribers are kept in a copy-on-write list: delivery iterates a cheap
//! clone of the current list, so callbacks may subscribe or unsubscribe
//! while a notification is in flight.

use std::any::Any;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;

use crate::domain::Entry;

/// Immutable, ordered view of the favorites after a change
#[derive(Debug, Clone)]
pub struct Snapshot {
    revision: u64,
    entries: Arc<[Entry]>,
}

impl Snapshot {
    pub(crate) fn new(revision: u64, entries: Vec<Entry>) -> Self {
        Self {
            revision,
            entries: entries.into(),
        }
    }

    /// Monotonic change counter; later snapshots have larger revisions
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

impl Deref for Snapshot {
    type Target = [Entry];

    fn deref(&self) -> &[Entry] {
        &self.entries
    }
}

/// Handle returned by [`ListenerSet::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Snapshot) -> Result<()> + Send + Sync>;

/// Thread-safe set of change callbacks
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: RwLock<Arc<Vec<(ListenerId, Listener)>>>,
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Registers a callback and returns its handle
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Snapshot) -> Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**guard).clone();
        next.push((id, Arc::new(listener)));
        *guard = Arc::new(next);
        id
    }

    /// Removes a callback; returns false if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = guard
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *guard = Arc::new(next);
        true
    }

    /// Detaches every callback
    pub fn clear(&self) {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Arc<Vec<(ListenerId, Listener)>> {
        let guard = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Delivers a snapshot to every callback.
    ///
    /// A callback that errors or panics is logged and skipped; the others
    /// still run. Returns the number of failed callbacks.
    pub fn notify(&self, snapshot: &Snapshot) -> usize {
        let mut failures = 0;

        for (id, listener) in self.current().iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    failures += 1;
                    tracing::warn!(listener = id.0, error = %format!("{:#}", error), "Favorites listener failed");
                }
                Err(payload) => {
                    failures += 1;
                    tracing::error!(
                        listener = id.0,
                        panic = panic_message(payload.as_ref()),
                        "Favorites listener panicked"
                    );
                }
            }
        }

        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn snapshot() -> Snapshot {
        Snapshot::new(7, vec![Entry::new("/a", false).unwrap()])
    }

    #[test]
    fn delivers_to_every_listener() {
        let listeners = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            listeners.subscribe(move |snapshot| {
                assert_eq!(snapshot.revision(), 7);
                assert_eq!(snapshot.len(), 1);
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(listeners.notify(&snapshot()), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_listeners_do_not_block_others() {
        let listeners = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));

        listeners.subscribe(|_| anyhow::bail!("view disposed"));
        listeners.subscribe(|_| panic!("listener bug"));
        let counter = Arc::clone(&calls);
        listeners.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(listeners.notify(&snapshot()), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let listeners = ListenerSet::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = listeners.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.notify(&snapshot());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(listeners.is_empty());
    }

    #[test]
    fn listener_may_unsubscribe_during_delivery() {
        let listeners = Arc::new(ListenerSet::new());
        let handle = Arc::new(std::sync::Mutex::new(None));

        let inner = Arc::clone(&listeners);
        let slot = Arc::clone(&handle);
        let id = listeners.subscribe(move |_| {
            if let Some(id) = *slot.lock().unwrap() {
                inner.unsubscribe(id);
            }
            Ok(())
        });
        *handle.lock().unwrap() = Some(id);

        assert_eq!(listeners.notify(&snapshot()), 0);
        assert!(listeners.is_empty());
    }
}

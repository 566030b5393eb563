//! Ordered, duplicate-free entry collection with a by-key index

use std::collections::{HashMap, HashSet};

use crate::domain::{Entry, EntryKey, EntryStatus, ResourceRef};

use super::probe::ResourceProbe;

/// Result of inserting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Upsert {
    /// Appended as a new favorite
    Added,
    /// Matched an existing favorite whose fields were refreshed
    Refreshed { changed: bool },
}

/// The display order plus an index from key to entry.
///
/// `order` and `index` always hold exactly the same keys.
#[derive(Debug, Default)]
pub(crate) struct EntryList {
    order: Vec<EntryKey>,
    index: HashMap<EntryKey, Entry>,
}

impl EntryList {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    pub(crate) fn get(&self, key: &EntryKey) -> Option<&Entry> {
        self.index.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &EntryKey) -> Option<&mut Entry> {
        self.index.get_mut(key)
    }

    /// Entries in display order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(move |key| self.index.get(key))
    }

    pub(crate) fn to_vec(&self) -> Vec<Entry> {
        self.iter().cloned().collect()
    }

    /// Appends a new entry, or refreshes the stored one with the same key.
    ///
    /// A refresh takes the label, absolute path and status of `entry`; the
    /// stored comment and workspace flag are kept and the position does not
    /// change. The workspace path is only taken from an entry with the same
    /// membership, so re-adding a member as an external path keeps it.
    pub(crate) fn upsert(&mut self, entry: Entry) -> Upsert {
        match self.index.get_mut(entry.key()) {
            Some(existing) => {
                let same_membership = existing.is_workspace_member() == entry.is_workspace_member();
                let workspace_path = if same_membership {
                    entry.workspace_path()
                } else {
                    existing.workspace_path()
                }
                .map(str::to_string);

                let changed = existing.label() != entry.label()
                    || existing.workspace_path() != workspace_path.as_deref()
                    || existing.absolute_path() != entry.absolute_path()
                    || existing.status() != entry.status();

                existing.set_label(entry.label().map(str::to_string));
                existing.set_workspace_path(workspace_path);
                existing.set_location(entry.absolute_path());
                existing.set_status(entry.status());

                Upsert::Refreshed { changed }
            }
            None => {
                self.order.push(entry.key().clone());
                self.index.insert(entry.key().clone(), entry);
                Upsert::Added
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &EntryKey) -> bool {
        if self.index.remove(key).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != key);
        true
    }

    /// Moves stored entries next to `target` as one contiguous block.
    ///
    /// Keys that are not stored, and repeated keys, are ignored. Returns
    /// false when nothing was left to move.
    pub(crate) fn reorder(
        &mut self,
        moving: impl IntoIterator<Item = EntryKey>,
        target: Option<&EntryKey>,
        after_target: bool,
    ) -> bool {
        let mut seen = HashSet::new();
        let block: Vec<EntryKey> = moving
            .into_iter()
            .filter(|key| self.index.contains_key(key))
            .filter(|key| seen.insert(key.clone()))
            .collect();
        if block.is_empty() {
            return false;
        }

        self.order.retain(|key| !seen.contains(key));

        let position = target.and_then(|target| self.order.iter().position(|key| key == target));
        let insert_at = match position {
            Some(index) if after_target => index + 1,
            Some(index) => index,
            None => self.order.len(),
        };

        let tail = self.order.split_off(insert_at);
        self.order.extend(block);
        self.order.extend(tail);
        true
    }

    /// Points the entries stored under the moved-from keys at their targets.
    ///
    /// Every moving entry is detached before any is re-keyed, so chained
    /// renames (`b -> c` then `a -> b`) and swaps keep every favorite in its
    /// slot. A moved entry landing on a favorite that is not itself moving is
    /// merged into it. Returns the number of stored entries that moved.
    pub(crate) fn relocate_all<'a>(
        &mut self,
        moves: impl IntoIterator<Item = (&'a EntryKey, &'a ResourceRef)>,
        probe: &dyn ResourceProbe,
    ) -> usize {
        let detached: Vec<(EntryKey, Entry, &ResourceRef)> = moves
            .into_iter()
            .filter_map(|(old, target)| {
                self.index
                    .remove(old)
                    .map(|entry| (old.clone(), entry, target))
            })
            .collect();
        if detached.is_empty() {
            return 0;
        }

        let mut rekeyed: HashMap<EntryKey, Option<EntryKey>> = HashMap::new();
        for (old, mut entry, target) in detached {
            entry.set_location(target.absolute_path());
            if entry.is_workspace_member() {
                entry.set_workspace_path(target.workspace_path().map(str::to_string));
            }
            entry.set_label(Some(target.name().to_string()));
            entry.set_status(EntryStatus::from_exists(probe.exists(&entry)));

            let new_key = entry.key().clone();
            if self.index.contains_key(&new_key) {
                tracing::debug!(from = %old, to = %new_key, "Moved favorite merged into existing entry");
                rekeyed.insert(old, None);
            } else {
                tracing::debug!(from = %old, to = %new_key, "Favorite moved");
                self.index.insert(new_key.clone(), entry);
                rekeyed.insert(old, Some(new_key));
            }
        }

        let moved = rekeyed.len();
        self.order = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|key| match rekeyed.remove(&key) {
                Some(new_key) => new_key,
                None => Some(key),
            })
            .collect();
        moved
    }

    /// Re-probes every entry; returns true if any status changed
    pub(crate) fn refresh_statuses(&mut self, probe: &dyn ResourceProbe) -> bool {
        let mut changed = false;
        for entry in self.index.values_mut() {
            let status = EntryStatus::from_exists(probe.exists(entry));
            changed |= entry.set_status(status);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllExist;

    impl ResourceProbe for AllExist {
        fn exists(&self, _entry: &Entry) -> bool {
            true
        }

        fn is_directory(&self, _entry: &Entry) -> bool {
            false
        }
    }

    fn key(path: &str) -> EntryKey {
        EntryKey::for_path(path)
    }

    fn list(paths: &[&str]) -> EntryList {
        let mut list = EntryList::default();
        for path in paths {
            list.upsert(Entry::new(*path, false).unwrap());
        }
        list
    }

    fn paths(list: &EntryList) -> Vec<&str> {
        list.iter().map(Entry::absolute_path).collect()
    }

    #[test]
    fn upsert_refreshes_without_reordering() {
        let mut list = list(&["/a", "/b", "/c"]);
        list.get_mut(&key("/b"))
            .unwrap()
            .set_comment(Some("keep".to_string()));

        let refreshed = Entry::new("/b/.", true)
            .unwrap()
            .with_label(Some("B".to_string()));
        assert_eq!(list.upsert(refreshed), Upsert::Refreshed { changed: true });

        let b = list.get(&key("/b")).unwrap();
        assert_eq!(paths(&list), vec!["/a", "/b/.", "/c"]);
        assert_eq!(b.label(), Some("B"));
        assert_eq!(b.comment(), Some("keep"));
        assert!(!b.is_workspace_member());
    }

    #[test]
    fn upsert_keeps_workspace_path_across_membership() {
        let mut list = EntryList::default();
        let member = Entry::from_resource(&ResourceRef::new("/ws/a", "/a", "a")).unwrap();
        list.upsert(member);

        let external = Entry::from_resource(&ResourceRef::external("/ws/a").unwrap()).unwrap();
        assert_eq!(list.upsert(external), Upsert::Refreshed { changed: false });

        let stored = list.get(&key("/ws/a")).unwrap();
        assert!(stored.is_workspace_member());
        assert_eq!(stored.workspace_path(), Some("/a"));
    }

    #[test]
    fn reorder_inserts_block_relative_to_target() {
        let mut after = list(&["/a", "/b", "/c", "/d"]);
        after.reorder([key("/a"), key("/c")], Some(&key("/b")), true);
        assert_eq!(paths(&after), vec!["/b", "/a", "/c", "/d"]);

        let mut before = list(&["/a", "/b", "/c", "/d"]);
        before.reorder([key("/a"), key("/c")], Some(&key("/b")), false);
        assert_eq!(paths(&before), vec!["/a", "/c", "/b", "/d"]);

        let mut end = list(&["/a", "/b", "/c", "/d"]);
        end.reorder([key("/a"), key("/c")], None, true);
        assert_eq!(paths(&end), vec!["/b", "/d", "/a", "/c"]);
    }

    #[test]
    fn reorder_ignores_unknown_and_repeated_keys() {
        let mut list = list(&["/a", "/b", "/c"]);
        assert!(!list.reorder([key("/x")], None, true));

        list.reorder([key("/c"), key("/x"), key("/c"), key("/a")], Some(&key("/b")), false);
        assert_eq!(paths(&list), vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn reorder_onto_moving_target_appends() {
        let mut list = list(&["/a", "/b", "/c"]);
        list.reorder([key("/a"), key("/b")], Some(&key("/b")), true);
        assert_eq!(paths(&list), vec!["/c", "/a", "/b"]);
    }

    fn moves<'a>(
        pairs: &'a [(EntryKey, ResourceRef)],
    ) -> impl Iterator<Item = (&'a EntryKey, &'a ResourceRef)> {
        pairs.iter().map(|(old, target)| (old, target))
    }

    #[test]
    fn relocate_rekeys_in_place() {
        let mut list = list(&["/ws/a", "/ws/foo.txt", "/ws/c"]);
        let pairs = [(key("/ws/foo.txt"), ResourceRef::new("/ws/bar.txt", "/bar.txt", "bar.txt"))];

        assert_eq!(list.relocate_all(moves(&pairs), &AllExist), 1);

        assert_eq!(paths(&list), vec!["/ws/a", "/ws/bar.txt", "/ws/c"]);
        assert!(list.get(&key("/ws/foo.txt")).is_none());
        let moved = list.get(&key("/ws/bar.txt")).unwrap();
        assert_eq!(moved.label(), Some("bar.txt"));
        assert_eq!(moved.status(), EntryStatus::Ok);
    }

    #[test]
    fn relocate_onto_existing_entry_merges() {
        let mut list = list(&["/ws/a", "/ws/b"]);
        let pairs = [(key("/ws/a"), ResourceRef::new("/ws/b", "/b", "b"))];

        assert_eq!(list.relocate_all(moves(&pairs), &AllExist), 1);
        assert_eq!(paths(&list), vec!["/ws/b"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn relocate_follows_chained_renames() {
        let mut list = list(&["/ws/a", "/ws/b"]);
        list.get_mut(&key("/ws/a"))
            .unwrap()
            .set_comment(Some("was a".to_string()));
        let pairs = [
            (key("/ws/a"), ResourceRef::new("/ws/b", "/b", "b")),
            (key("/ws/b"), ResourceRef::new("/ws/c", "/c", "c")),
        ];

        assert_eq!(list.relocate_all(moves(&pairs), &AllExist), 2);

        assert_eq!(paths(&list), vec!["/ws/b", "/ws/c"]);
        assert_eq!(list.get(&key("/ws/b")).unwrap().comment(), Some("was a"));
        assert_eq!(list.get(&key("/ws/c")).unwrap().comment(), None);
    }

    #[test]
    fn relocate_swaps_two_entries() {
        let mut list = list(&["/ws/a", "/ws/x", "/ws/b"]);
        list.get_mut(&key("/ws/a"))
            .unwrap()
            .set_comment(Some("was a".to_string()));
        let pairs = [
            (key("/ws/a"), ResourceRef::new("/ws/b", "/b", "b")),
            (key("/ws/b"), ResourceRef::new("/ws/a", "/a", "a")),
        ];

        assert_eq!(list.relocate_all(moves(&pairs), &AllExist), 2);

        assert_eq!(paths(&list), vec!["/ws/b", "/ws/x", "/ws/a"]);
        assert_eq!(list.get(&key("/ws/b")).unwrap().comment(), Some("was a"));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn relocate_ignores_unstored_keys() {
        let mut list = list(&["/ws/a"]);
        let pairs = [(key("/ws/z"), ResourceRef::new("/ws/a", "/a", "a"))];

        assert_eq!(list.relocate_all(moves(&pairs), &AllExist), 0);
        assert_eq!(paths(&list), vec!["/ws/a"]);
    }

    #[test]
    fn remove_keeps_order_and_index_aligned() {
        let mut list = list(&["/a", "/b", "/c"]);
        assert!(list.remove(&key("/b")));
        assert!(!list.remove(&key("/b")));
        assert_eq!(paths(&list), vec!["/a", "/c"]);
        assert_eq!(list.to_vec().len(), 2);
    }
}

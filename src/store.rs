//! Todo Collection and Session Store
//!
//! `TodoCollection` is an immutable snapshot: updating it produces a new
//! collection that shares every untouched item with the old one.
//! `TodoStore` owns the session's current snapshot and is the single place
//! it gets replaced.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{TodoId, TodoItem};

/// Ordered todo list, unique by id
#[derive(Debug, Clone, Default)]
pub struct TodoCollection {
    items: Vec<Arc<TodoItem>>,
}

impl TodoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from items in order. Later duplicates of an id are dropped.
    pub fn from_items(items: impl IntoIterator<Item = TodoItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(Arc::new)
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TodoItem>> {
        self.items.iter()
    }

    pub fn get(&self, id: &TodoId) -> Option<&Arc<TodoItem>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Copy of the collection with the entry for `updated.id` replaced.
    ///
    /// Returns `None` when no entry has that id; nothing is ever appended.
    pub fn replace(&self, updated: Arc<TodoItem>) -> Option<Self> {
        let position = self.items.iter().position(|item| item.id == updated.id)?;
        let mut items = self.items.clone();
        items[position] = updated;
        Some(Self { items })
    }

    /// Copy with `item` stored under its id and its flag set to `is_completed`.
    pub fn with_completion(&self, item: &TodoItem, is_completed: bool) -> Option<Self> {
        self.replace(Arc::new(item.with_completion(is_completed)))
    }

    pub fn to_vec(&self) -> Vec<TodoItem> {
        self.items.iter().map(|item| (**item).clone()).collect()
    }
}

impl PartialEq for TodoCollection {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a == b)
    }
}

impl FromIterator<TodoItem> for TodoCollection {
    fn from_iter<I: IntoIterator<Item = TodoItem>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

// ========================
// Session Store
// ========================

/// Owner of the session's todo collection.
///
/// Every mutation is applied atomically to the *current* snapshot, so
/// concurrent writers never overwrite each other's changes. Readers can
/// subscribe to be woken on each change.
#[derive(Debug)]
pub struct TodoStore {
    state: watch::Sender<TodoCollection>,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new(TodoCollection::new())
    }
}

impl TodoStore {
    pub fn new(initial: TodoCollection) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    /// Current snapshot (cheap: items are shared)
    pub fn snapshot(&self) -> TodoCollection {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoCollection> {
        self.state.subscribe()
    }

    /// Update an item in the store by ID. Returns the entry it replaced.
    pub fn update_item(&self, updated: Arc<TodoItem>) -> Option<Arc<TodoItem>> {
        let mut previous = None;
        self.state.send_if_modified(|collection| {
            match collection.replace(updated.clone()) {
                Some(next) => {
                    previous = collection.get(&updated.id).cloned();
                    *collection = next;
                    true
                }
                None => false,
            }
        });
        previous
    }

    /// Put `previous` back, but only if the entry for its id is still
    /// `expected` (compared by pointer). Returns whether it was restored.
    pub fn restore_item(&self, expected: &Arc<TodoItem>, previous: Arc<TodoItem>) -> bool {
        self.state.send_if_modified(|collection| {
            let still_ours = collection
                .get(&previous.id)
                .is_some_and(|current| Arc::ptr_eq(current, expected));
            if !still_ours {
                return false;
            }
            match collection.replace(previous.clone()) {
                Some(next) => {
                    *collection = next;
                    true
                }
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TodoCollection {
        TodoCollection::from_items(vec![
            TodoItem::new("1", false).with_field("title", "one"),
            TodoItem::new("2", true).with_field("title", "two"),
        ])
    }

    #[test]
    fn test_from_items_drops_duplicate_ids() {
        let collection = TodoCollection::from_items(vec![
            TodoItem::new("1", false),
            TodoItem::new("1", true),
            TodoItem::new("2", false),
        ]);
        assert_eq!(collection.len(), 2);
        assert!(!collection.get(&TodoId::new("1")).unwrap().is_completed);
    }

    #[test]
    fn test_with_completion_preserves_order_and_identity() {
        let before = sample();
        let item = before.get(&TodoId::new("1")).unwrap().clone();

        let after = before.with_completion(&item, true).unwrap();

        let ids: Vec<_> = after.iter().map(|i| i.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(after.get(&TodoId::new("1")).unwrap().is_completed);
        assert!(Arc::ptr_eq(
            before.get(&TodoId::new("2")).unwrap(),
            after.get(&TodoId::new("2")).unwrap()
        ));
        // Original snapshot untouched
        assert!(!before.get(&TodoId::new("1")).unwrap().is_completed);
    }

    #[test]
    fn test_replace_unknown_id_is_none() {
        let collection = sample();
        assert!(collection.replace(Arc::new(TodoItem::new("9", true))).is_none());
    }

    #[test]
    fn test_store_update_and_restore() {
        let store = TodoStore::new(sample());
        let mut rx = store.subscribe();

        let flipped = Arc::new(TodoItem::new("1", true));
        let previous = store.update_item(flipped.clone()).unwrap();
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();
        assert!(store.snapshot().get(&TodoId::new("1")).unwrap().is_completed);

        assert!(store.restore_item(&flipped, previous));
        assert!(!store.snapshot().get(&TodoId::new("1")).unwrap().is_completed);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_restore_skips_newer_write() {
        let store = TodoStore::new(sample());
        let ours = Arc::new(TodoItem::new("1", true));
        let previous = store.update_item(ours.clone()).unwrap();

        // Someone else wrote after us
        store.update_item(Arc::new(TodoItem::new("1", false).with_field("title", "renamed")));

        assert!(!store.restore_item(&ours, previous));
        assert_eq!(
            store.snapshot().get(&TodoId::new("1")).unwrap().title(),
            Some("renamed")
        );
    }

    #[test]
    fn test_update_unknown_id_leaves_store() {
        let store = TodoStore::new(sample());
        assert!(store.update_item(Arc::new(TodoItem::new("9", true))).is_none());
        assert_eq!(store.snapshot(), sample());
    }
}

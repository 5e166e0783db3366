//! Selected-app table contracts, change broadcasting, and in-memory adapters.
//!
//! Presence of a [`SelectedAppRecord`] in the store is the only source of truth for "this app is
//! allowed in restricted mode". Records are created and deleted, never updated in place.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use futures::{
    channel::mpsc::{self, UnboundedSender},
    stream::LocalBoxStream,
    StreamExt,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Persisted row of the selected-app table.
pub struct SelectedAppRecord {
    /// Stable package identifier (primary key).
    pub package_id: String,
    /// Display name captured when the app was selected.
    pub name: String,
}

impl SelectedAppRecord {
    /// Creates a record from an identifier and display name.
    pub fn new(package_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            name: name.into(),
        }
    }
}

/// One observation of the full table, or the storage fault that prevented reading it.
pub type SelectedAppsSnapshot = Result<Vec<SelectedAppRecord>, String>;

/// Live sequence of full-table snapshots produced by [`SelectedAppStore::observe_selected_apps`].
pub type SelectedAppStream = LocalBoxStream<'static, SelectedAppsSnapshot>;

/// Object-safe boxed future used by [`SelectedAppStore`] async methods.
pub type SelectedAppStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable single-table store of the apps a parent allowed in restricted mode.
pub trait SelectedAppStore {
    /// Inserts a record, ignoring the write when the identifier already exists.
    ///
    /// Returns `true` when a row was added and `false` for an ignored duplicate.
    fn insert_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>>;

    /// Removes the record with the same identifier.
    ///
    /// Returns `false` when no such record existed; that is not an error.
    fn remove_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>>;

    /// Lists all records in insertion order.
    fn list_selected_apps<'a>(
        &'a self,
    ) -> SelectedAppStoreFuture<'a, Result<Vec<SelectedAppRecord>, String>>;

    /// Opens a live observation of the table.
    ///
    /// The stream yields the current snapshot immediately and then one snapshot after every
    /// committed insert or remove. Ignored writes publish nothing.
    fn observe_selected_apps(&self) -> SelectedAppStream;
}

#[derive(Debug, Default)]
/// Fan-out of table snapshots to every active observer.
///
/// Observers whose stream was dropped are pruned on the next publish.
pub struct SelectionBroadcaster {
    subscribers: RefCell<Vec<UnboundedSender<SelectedAppsSnapshot>>>,
}

impl SelectionBroadcaster {
    /// Registers a new observer seeded with `initial`.
    pub fn subscribe(&self, initial: SelectedAppsSnapshot) -> SelectedAppStream {
        let (tx, rx) = mpsc::unbounded();
        if tx.unbounded_send(initial).is_ok() {
            self.subscribers.borrow_mut().push(tx);
        }
        rx.boxed_local()
    }

    /// Sends `snapshot` to every live observer.
    pub fn publish(&self, snapshot: SelectedAppsSnapshot) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
    }

    /// Returns the number of observers still attached.
    pub fn observer_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op selected-app store for unsupported targets and baseline tests.
pub struct NoopSelectedAppStore;

impl SelectedAppStore for NoopSelectedAppStore {
    fn insert_selected_app<'a>(
        &'a self,
        _record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async { Ok(false) })
    }

    fn remove_selected_app<'a>(
        &'a self,
        _record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async { Ok(false) })
    }

    fn list_selected_apps<'a>(
        &'a self,
    ) -> SelectedAppStoreFuture<'a, Result<Vec<SelectedAppRecord>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn observe_selected_apps(&self) -> SelectedAppStream {
        futures::stream::once(async { Ok(Vec::new()) }).boxed_local()
    }
}

#[derive(Debug, Default)]
struct MemorySelection {
    records: Vec<SelectedAppRecord>,
    broadcaster: SelectionBroadcaster,
}

#[derive(Debug, Clone, Default)]
/// In-memory selected-app store; clones share the same table.
pub struct MemorySelectedAppStore {
    inner: Rc<RefCell<MemorySelection>>,
}

impl MemorySelectedAppStore {
    /// Creates a store pre-populated with `records` (duplicates are ignored).
    pub fn with_records(records: impl IntoIterator<Item = SelectedAppRecord>) -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.borrow_mut();
            for record in records {
                if !inner
                    .records
                    .iter()
                    .any(|existing| existing.package_id == record.package_id)
                {
                    inner.records.push(record);
                }
            }
        }
        store
    }

    /// Returns a copy of the current rows.
    pub fn records(&self) -> Vec<SelectedAppRecord> {
        self.inner.borrow().records.clone()
    }

    /// Returns the number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().broadcaster.observer_count()
    }

    fn publish_current(&self) {
        let inner = self.inner.borrow();
        inner.broadcaster.publish(Ok(inner.records.clone()));
    }
}

impl SelectedAppStore for MemorySelectedAppStore {
    fn insert_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            {
                let mut inner = self.inner.borrow_mut();
                if inner
                    .records
                    .iter()
                    .any(|existing| existing.package_id == record.package_id)
                {
                    return Ok(false);
                }
                inner.records.push(record.clone());
            }
            self.publish_current();
            Ok(true)
        })
    }

    fn remove_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            let removed = {
                let mut inner = self.inner.borrow_mut();
                let before = inner.records.len();
                inner
                    .records
                    .retain(|existing| existing.package_id != record.package_id);
                inner.records.len() != before
            };
            if removed {
                self.publish_current();
            }
            Ok(removed)
        })
    }

    fn list_selected_apps<'a>(
        &'a self,
    ) -> SelectedAppStoreFuture<'a, Result<Vec<SelectedAppRecord>, String>> {
        Box::pin(async move { Ok(self.records()) })
    }

    fn observe_selected_apps(&self) -> SelectedAppStream {
        let inner = self.inner.borrow();
        inner.broadcaster.subscribe(Ok(inner.records.clone()))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: &str, name: &str) -> SelectedAppRecord {
        SelectedAppRecord::new(id, name)
    }

    #[test]
    fn duplicate_insert_is_ignored_and_keeps_original_name() {
        let store = MemorySelectedAppStore::default();
        let store_obj: &dyn SelectedAppStore = &store;

        assert!(block_on(store_obj.insert_selected_app(&record("com.a", "A"))).expect("insert"));
        assert!(
            !block_on(store_obj.insert_selected_app(&record("com.a", "Renamed")))
                .expect("duplicate insert")
        );

        assert_eq!(store.records(), vec![record("com.a", "A")]);
    }

    #[test]
    fn removing_missing_record_is_not_an_error() {
        let store = MemorySelectedAppStore::with_records([record("com.a", "A")]);
        let store_obj: &dyn SelectedAppStore = &store;

        let removed =
            block_on(store_obj.remove_selected_app(&record("com.missing", "M"))).expect("remove");

        assert!(!removed);
        assert_eq!(store.records(), vec![record("com.a", "A")]);
    }

    #[test]
    fn remove_matches_by_identifier() {
        let store = MemorySelectedAppStore::with_records([record("com.a", "A")]);
        let store_obj: &dyn SelectedAppStore = &store;

        assert!(block_on(store_obj.remove_selected_app(&record("com.a", "Other name")))
            .expect("remove"));
        assert!(store.records().is_empty());
    }

    #[test]
    fn listing_preserves_insertion_order() {
        let store = MemorySelectedAppStore::default();
        let store_obj: &dyn SelectedAppStore = &store;
        for (id, name) in [("com.c", "C"), ("com.a", "A"), ("com.b", "B")] {
            block_on(store_obj.insert_selected_app(&record(id, name))).expect("insert");
        }

        let ids = block_on(store_obj.list_selected_apps())
            .expect("list")
            .into_iter()
            .map(|r| r.package_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["com.c", "com.a", "com.b"]);
    }

    #[test]
    fn observers_see_initial_snapshot_then_every_committed_change() {
        let store = MemorySelectedAppStore::with_records([record("com.a", "A")]);
        let store_obj: &dyn SelectedAppStore = &store;
        let mut first = store_obj.observe_selected_apps();
        let mut second = store_obj.observe_selected_apps();

        block_on(store_obj.insert_selected_app(&record("com.b", "B"))).expect("insert");
        block_on(store_obj.insert_selected_app(&record("com.b", "B"))).expect("ignored insert");
        block_on(store_obj.remove_selected_app(&record("com.a", "A"))).expect("remove");

        for stream in [&mut first, &mut second] {
            assert_eq!(
                block_on(stream.next()),
                Some(Ok(vec![record("com.a", "A")]))
            );
            assert_eq!(
                block_on(stream.next()),
                Some(Ok(vec![record("com.a", "A"), record("com.b", "B")]))
            );
            assert_eq!(block_on(stream.next()), Some(Ok(vec![record("com.b", "B")])));
        }
    }

    #[test]
    fn dropped_observers_are_pruned_on_publish() {
        let store = MemorySelectedAppStore::default();
        let store_obj: &dyn SelectedAppStore = &store;
        let observer = store_obj.observe_selected_apps();
        assert_eq!(store.observer_count(), 1);

        drop(observer);
        block_on(store_obj.insert_selected_app(&record("com.a", "A"))).expect("insert");

        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopSelectedAppStore;
        let store_obj: &dyn SelectedAppStore = &store;

        assert!(!block_on(store_obj.insert_selected_app(&record("com.a", "A"))).expect("insert"));
        assert!(!block_on(store_obj.remove_selected_app(&record("com.a", "A"))).expect("remove"));
        assert_eq!(
            block_on(store_obj.list_selected_apps()).expect("list"),
            Vec::<SelectedAppRecord>::new()
        );
        let mut observed = store_obj.observe_selected_apps();
        assert_eq!(block_on(observed.next()), Some(Ok(Vec::new())));
    }
}

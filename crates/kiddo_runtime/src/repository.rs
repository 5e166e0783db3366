//! Boundary between the selected-app store and launcher domain types.

use std::rc::Rc;

use futures::{stream::LocalBoxStream, StreamExt};
use platform_host::{SelectedAppRecord, SelectedAppStore};
use thiserror::Error;

use crate::model::AppInfo;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Selection-store failures, split by direction.
pub enum SelectionError {
    /// Reading or observing the store failed.
    #[error("selection read failed: {0}")]
    Read(String),
    /// Inserting or removing a record failed.
    #[error("selection write failed: {0}")]
    Write(String),
}

/// Live sequence of selected apps (icons not hydrated).
pub type SelectedAppInfoStream = LocalBoxStream<'static, Result<Vec<AppInfo>, SelectionError>>;

/// Converts a domain app into its persisted row.
pub fn record_from_app(app: &AppInfo) -> SelectedAppRecord {
    SelectedAppRecord::new(app.package_id.clone(), app.name.clone())
}

/// Converts a persisted row into a domain app without an icon.
pub fn app_from_record(record: SelectedAppRecord) -> AppInfo {
    AppInfo {
        name: record.name,
        package_id: record.package_id,
        icon: None,
    }
}

#[derive(Clone)]
/// Selected-app repository over an injected [`SelectedAppStore`].
pub struct SelectionRepository {
    store: Rc<dyn SelectedAppStore>,
}

impl SelectionRepository {
    /// Wraps `store`.
    pub fn new(store: Rc<dyn SelectedAppStore>) -> Self {
        Self { store }
    }

    /// Opens a live observation of the selected set.
    pub fn observe_selected(&self) -> SelectedAppInfoStream {
        self.store
            .observe_selected_apps()
            .map(|snapshot| {
                snapshot
                    .map(|records| records.into_iter().map(app_from_record).collect())
                    .map_err(SelectionError::Read)
            })
            .boxed_local()
    }

    /// Persists `app`; returns `false` when it was already selected.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Write`] when the store rejects the insert.
    pub async fn add(&self, app: &AppInfo) -> Result<bool, SelectionError> {
        self.store
            .insert_selected_app(&record_from_app(app))
            .await
            .map_err(SelectionError::Write)
    }

    /// Removes `app` by identifier; returns `false` when it was not selected.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Write`] when the store rejects the delete.
    pub async fn remove(&self, app: &AppInfo) -> Result<bool, SelectionError> {
        self.store
            .remove_selected_app(&record_from_app(app))
            .await
            .map_err(SelectionError::Write)
    }

    /// Lists the selected apps in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Read`] when the store cannot be read.
    pub async fn list_selected(&self) -> Result<Vec<AppInfo>, SelectionError> {
        self.store
            .list_selected_apps()
            .await
            .map(|records| records.into_iter().map(app_from_record).collect())
            .map_err(SelectionError::Read)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{IconHandle, MemorySelectedAppStore};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn icons_are_dropped_on_the_way_in_and_absent_on_the_way_out() {
        let store = MemorySelectedAppStore::default();
        let repository = SelectionRepository::new(Rc::new(store.clone()));
        let app = AppInfo::new("com.a", "A").with_icon(IconHandle::new("file:///a.png"));

        assert!(block_on(repository.add(&app)).expect("add"));
        assert!(!block_on(repository.add(&app)).expect("duplicate add"));

        assert_eq!(store.records(), vec![SelectedAppRecord::new("com.a", "A")]);
        assert_eq!(
            block_on(repository.list_selected()).expect("list"),
            vec![AppInfo::new("com.a", "A")]
        );
    }

    #[test]
    fn observation_maps_records_to_apps() {
        let store = MemorySelectedAppStore::with_records([SelectedAppRecord::new("com.a", "A")]);
        let repository = SelectionRepository::new(Rc::new(store));
        let mut observed = repository.observe_selected();

        block_on(repository.remove(&AppInfo::new("com.a", "A"))).expect("remove");

        assert_eq!(
            block_on(observed.next()),
            Some(Ok(vec![AppInfo::new("com.a", "A")]))
        );
        assert_eq!(block_on(observed.next()), Some(Ok(Vec::new())));
    }
}

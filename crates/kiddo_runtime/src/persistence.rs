//! Legacy preference-backed selection and its one-time migration into the selection store.

use std::collections::{BTreeSet, HashMap};

use platform_host::{load_pref_with, save_pref_with, PackageRegistry, PrefsStore};
use thiserror::Error;

use crate::{
    model::AppInfo,
    repository::{SelectionError, SelectionRepository},
};

/// Preference namespace of the legacy selected-app set.
pub const LEGACY_PREFS_NAMESPACE: &str = "KiddoGuardPreferences";
/// Preference key of the legacy selected-app set.
pub const LEGACY_SELECTED_APPS_KEY: &str = "selected_apps";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure of the legacy-selection migration.
pub enum MigrationError {
    /// The preference store failed or held a malformed set.
    #[error("legacy preferences failed: {0}")]
    Prefs(String),
    /// The package registry could not be enumerated.
    #[error("package registry failed: {0}")]
    Registry(String),
    /// A migrated selection could not be written.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of one migration run, identifiers in sorted order.
pub struct MigrationReport {
    /// Newly inserted into the selection store.
    pub migrated: Vec<String>,
    /// Already present in the selection store.
    pub already_selected: Vec<String>,
    /// No longer installed, dropped.
    pub skipped_uninstalled: Vec<String>,
}

/// Loads the legacy identifier set.
///
/// # Errors
///
/// Returns an error when the store fails or the payload is malformed.
pub async fn load_legacy_selection(
    prefs: &dyn PrefsStore,
) -> Result<Option<BTreeSet<String>>, String> {
    load_pref_with(prefs, LEGACY_PREFS_NAMESPACE, LEGACY_SELECTED_APPS_KEY).await
}

/// Replaces the legacy identifier set.
///
/// # Errors
///
/// Returns an error when the store save fails.
pub async fn save_legacy_selection(
    prefs: &dyn PrefsStore,
    package_ids: &BTreeSet<String>,
) -> Result<(), String> {
    save_pref_with(
        prefs,
        LEGACY_PREFS_NAMESPACE,
        LEGACY_SELECTED_APPS_KEY,
        package_ids,
    )
    .await
}

/// Moves the legacy identifier set into the selection store.
///
/// Returns `Ok(None)` when there is nothing to migrate. Installed identifiers are inserted with
/// their current display name; the rest are skipped. The legacy key is deleted only after every
/// insert succeeded, so a failed run is retried on the next boot.
///
/// # Errors
///
/// Returns [`MigrationError`] when any store or the registry fails.
pub async fn migrate_legacy_selection(
    prefs: &dyn PrefsStore,
    packages: &dyn PackageRegistry,
    repository: &SelectionRepository,
) -> Result<Option<MigrationReport>, MigrationError> {
    let Some(legacy_ids) = load_legacy_selection(prefs)
        .await
        .map_err(MigrationError::Prefs)?
    else {
        return Ok(None);
    };

    let names = packages
        .list_packages()
        .await
        .map_err(MigrationError::Registry)?
        .into_iter()
        .map(|package| (package.package_id, package.display_name))
        .collect::<HashMap<_, _>>();

    let mut report = MigrationReport::default();
    for package_id in legacy_ids {
        let Some(name) = names.get(&package_id) else {
            report.skipped_uninstalled.push(package_id);
            continue;
        };
        if repository.add(&AppInfo::new(package_id.clone(), name.clone())).await? {
            report.migrated.push(package_id);
        } else {
            report.already_selected.push(package_id);
        }
    }

    prefs
        .delete_pref(LEGACY_PREFS_NAMESPACE, LEGACY_SELECTED_APPS_KEY)
        .await
        .map_err(MigrationError::Prefs)?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use platform_host::{
        InstalledPackage, MemoryPackageRegistry, MemoryPrefsStore, MemorySelectedAppStore,
        SelectedAppRecord, SelectedAppStore, SelectedAppStoreFuture, SelectedAppStream,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    fn installed(id: &str, name: &str) -> InstalledPackage {
        InstalledPackage {
            package_id: id.to_string(),
            display_name: name.to_string(),
            icon: None,
            is_system: false,
            has_launch_entry: true,
        }
    }

    fn legacy(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn legacy_set_is_stored_as_a_sorted_json_array() {
        let prefs = MemoryPrefsStore::default();

        block_on(save_legacy_selection(&prefs, &legacy(&["com.b", "com.a"]))).expect("save");

        let raw = block_on(prefs.load_pref(LEGACY_PREFS_NAMESPACE, LEGACY_SELECTED_APPS_KEY))
            .expect("load")
            .expect("present");
        assert_eq!(
            serde_json::from_str::<Vec<String>>(&raw).expect("json"),
            vec!["com.a".to_string(), "com.b".to_string()]
        );
        assert_eq!(
            block_on(load_legacy_selection(&prefs)).expect("typed load"),
            Some(legacy(&["com.a", "com.b"]))
        );
    }

    #[test]
    fn migration_moves_installed_ids_and_clears_the_legacy_key() {
        let prefs = MemoryPrefsStore::default();
        block_on(save_legacy_selection(
            &prefs,
            &legacy(&["com.a", "com.b", "com.gone"]),
        ))
        .expect("seed");
        let registry = MemoryPackageRegistry::with_packages([
            installed("com.a", "Alpha"),
            installed("com.b", "Beta"),
        ]);
        let store = MemorySelectedAppStore::with_records([SelectedAppRecord::new("com.b", "Beta")]);
        let repository = SelectionRepository::new(Rc::new(store.clone()));

        let report = block_on(migrate_legacy_selection(&prefs, &registry, &repository))
            .expect("migrate")
            .expect("report");

        assert_eq!(
            report,
            MigrationReport {
                migrated: vec!["com.a".to_string()],
                already_selected: vec!["com.b".to_string()],
                skipped_uninstalled: vec!["com.gone".to_string()],
            }
        );
        assert_eq!(
            store.records(),
            vec![
                SelectedAppRecord::new("com.b", "Beta"),
                SelectedAppRecord::new("com.a", "Alpha"),
            ]
        );
        assert!(prefs.keys(LEGACY_PREFS_NAMESPACE).is_empty());
        assert_eq!(
            block_on(migrate_legacy_selection(&prefs, &registry, &repository)).expect("rerun"),
            None
        );
    }

    struct ReadOnlyStore;

    impl SelectedAppStore for ReadOnlyStore {
        fn insert_selected_app<'a>(
            &'a self,
            _record: &'a SelectedAppRecord,
        ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
            Box::pin(async { Err("disk full".to_string()) })
        }

        fn remove_selected_app<'a>(
            &'a self,
            _record: &'a SelectedAppRecord,
        ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
            Box::pin(async { Err("disk full".to_string()) })
        }

        fn list_selected_apps<'a>(
            &'a self,
        ) -> SelectedAppStoreFuture<'a, Result<Vec<SelectedAppRecord>, String>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn observe_selected_apps(&self) -> SelectedAppStream {
            use futures::StreamExt;
            futures::stream::empty().boxed_local()
        }
    }

    #[test]
    fn failed_insert_keeps_the_legacy_key_for_retry() {
        let prefs = MemoryPrefsStore::default();
        block_on(save_legacy_selection(&prefs, &legacy(&["com.a"]))).expect("seed");
        let registry = MemoryPackageRegistry::with_packages([installed("com.a", "Alpha")]);
        let repository = SelectionRepository::new(Rc::new(ReadOnlyStore));

        let err = block_on(migrate_legacy_selection(&prefs, &registry, &repository))
            .expect_err("insert fails");

        assert_eq!(
            err,
            MigrationError::Selection(SelectionError::Write("disk full".to_string()))
        );
        assert_eq!(
            prefs.keys(LEGACY_PREFS_NAMESPACE),
            vec![LEGACY_SELECTED_APPS_KEY.to_string()]
        );
    }

    #[test]
    fn malformed_legacy_payload_is_reported() {
        let prefs = MemoryPrefsStore::default();
        block_on(prefs.save_pref(LEGACY_PREFS_NAMESPACE, LEGACY_SELECTED_APPS_KEY, "{\"a\":1}"))
            .expect("seed");
        let repository = SelectionRepository::new(Rc::new(MemorySelectedAppStore::default()));

        let err = block_on(migrate_legacy_selection(
            &prefs,
            &MemoryPackageRegistry::default(),
            &repository,
        ))
        .expect_err("malformed");

        assert!(matches!(err, MigrationError::Prefs(message) if message.contains("malformed")));
    }
}

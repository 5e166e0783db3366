//! Namespaced preference storage backed by a single JSON map file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use platform_host::{PrefsStore, PrefsStoreFuture};

const PREFS_FILE_NAME: &str = "prefs.json";

type PrefMap = BTreeMap<String, BTreeMap<String, String>>;

fn load_pref_map(path: &Path) -> Result<PrefMap, String> {
    if !path.exists() {
        return Ok(PrefMap::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(PrefMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse prefs map {}: {err}", path.display()))
}

fn save_pref_map(path: &Path, map: &PrefMap) -> Result<(), String> {
    let serialized = serde_json::to_string(map)
        .map_err(|err| format!("failed to serialize prefs map: {err}"))?;
    fs::write(path, serialized).map_err(|err| format!("failed to write {}: {err}", path.display()))
}

fn validate_scope(namespace: &str, key: &str) -> Result<(), String> {
    if namespace.is_empty() {
        Err("Preference namespace must not be empty".to_string())
    } else if key.is_empty() {
        Err("Preference key must not be empty".to_string())
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Preference store persisting every namespace into one `prefs.json` file.
pub struct FilePrefsStore {
    file: PathBuf,
}

impl FilePrefsStore {
    /// Creates a store rooted at `root`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self, String> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|err| format!("failed to create prefs dir {}: {err}", root.display()))?;
        Ok(Self {
            file: root.join(PREFS_FILE_NAME),
        })
    }

    /// Returns the backing file path.
    pub fn file(&self) -> &Path {
        &self.file
    }

    fn load(&self, namespace: &str, key: &str) -> Result<Option<String>, String> {
        validate_scope(namespace, key)?;
        let map = load_pref_map(&self.file)?;
        Ok(map
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn save(&self, namespace: &str, key: &str, raw_json: &str) -> Result<(), String> {
        validate_scope(namespace, key)?;
        let mut map = load_pref_map(&self.file)?;
        map.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), raw_json.to_string());
        save_pref_map(&self.file, &map)
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), String> {
        validate_scope(namespace, key)?;
        let mut map = load_pref_map(&self.file)?;
        let Some(entries) = map.get_mut(namespace) else {
            return Ok(());
        };
        if entries.remove(key).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            map.remove(namespace);
        }
        save_pref_map(&self.file, &map)
    }
}

impl PrefsStore for FilePrefsStore {
    fn load_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { self.load(namespace, key) })
    }

    fn save_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { self.save(namespace, key, raw_json) })
    }

    fn delete_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move { self.delete(namespace, key) })
    }
}

#[cfg(test)]
mod tests {
    use super::{load_pref_map, FilePrefsStore};
    use futures::executor::block_on;
    use platform_host::PrefsStore;
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir_path() -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("kiddo_prefs_dir_{}_{}", process::id(), now))
    }

    #[test]
    fn namespaced_values_round_trip_through_the_file() {
        let root = temp_dir_path();
        let store = FilePrefsStore::from_root(&root).expect("store");

        block_on(store.save_pref("KiddoGuardPreferences", "selected_apps", "[\"com.a\"]"))
            .expect("save");
        block_on(store.save_pref("other", "selected_apps", "[]")).expect("save other");

        let reopened = FilePrefsStore::from_root(&root).expect("reopen");
        assert_eq!(
            block_on(reopened.load_pref("KiddoGuardPreferences", "selected_apps"))
                .expect("load"),
            Some("[\"com.a\"]".to_string())
        );
        assert_eq!(
            block_on(reopened.load_pref("other", "selected_apps")).expect("load other"),
            Some("[]".to_string())
        );

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn delete_drops_empty_namespaces_and_tolerates_missing_keys() {
        let root = temp_dir_path();
        let store = FilePrefsStore::from_root(&root).expect("store");

        block_on(store.delete_pref("ns", "missing")).expect("delete missing");
        block_on(store.save_pref("ns", "key", "1")).expect("save");
        block_on(store.delete_pref("ns", "key")).expect("delete");

        assert_eq!(block_on(store.load_pref("ns", "key")).expect("load"), None);
        assert!(load_pref_map(store.file()).expect("map").is_empty());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn empty_scope_is_rejected() {
        let root = temp_dir_path();
        let store = FilePrefsStore::from_root(&root).expect("store");

        assert!(block_on(store.load_pref("", "key")).is_err());
        assert!(block_on(store.save_pref("ns", "", "1")).is_err());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn corrupt_file_surfaces_parse_error() {
        let root = temp_dir_path();
        let store = FilePrefsStore::from_root(&root).expect("store");
        fs::write(store.file(), "{not json").expect("write corrupt");

        let err = block_on(store.load_pref("ns", "key")).expect_err("corrupt");
        assert!(err.contains("failed to parse prefs map"));

        let _ = fs::remove_dir_all(root);
    }
}

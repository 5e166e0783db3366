//! Namespace-scoped preference storage contracts and adapters.
//!
//! Preferences are small JSON values addressed by `(namespace, key)`. The launcher only uses this
//! store for the legacy selected-app set that predates the selected-app table.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};

/// Object-safe boxed future used by [`PrefsStore`] async methods.
pub type PrefsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for lightweight preference values (JSON stored as text per namespaced key).
pub trait PrefsStore {
    /// Loads the raw JSON stored under `namespace`/`key`.
    fn load_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>>;

    /// Saves raw JSON under `namespace`/`key`, replacing any previous value.
    fn save_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>>;

    /// Deletes `namespace`/`key`. Deleting an absent key succeeds.
    fn delete_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for unsupported targets and baseline tests.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref<'a>(
        &'a self,
        _namespace: &'a str,
        _key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_pref<'a>(
        &'a self,
        _namespace: &'a str,
        _key: &'a str,
        _raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_pref<'a>(
        &'a self,
        _namespace: &'a str,
        _key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

type PrefsByNamespace = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default)]
/// In-memory preference store; clones share the same map.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<PrefsByNamespace>>,
}

impl MemoryPrefsStore {
    /// Returns the keys currently stored in `namespace`.
    pub fn keys(&self, namespace: &str) -> Vec<String> {
        self.inner
            .borrow()
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move {
            Ok(self
                .inner
                .borrow()
                .get(namespace)
                .and_then(|entries| entries.get(key))
                .cloned())
        })
    }

    fn save_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .entry(namespace.to_string())
                .or_default()
                .insert(key.to_string(), raw_json.to_string());
            Ok(())
        })
    }

    fn delete_pref<'a>(
        &'a self,
        namespace: &'a str,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut inner = self.inner.borrow_mut();
            if let Some(entries) = inner.get_mut(namespace) {
                entries.remove(key);
                if entries.is_empty() {
                    inner.remove(namespace);
                }
            }
            Ok(())
        })
    }
}

/// Loads and deserializes a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub async fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    namespace: &str,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_pref(namespace, key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("preference {namespace}/{key} is malformed: {e}"))
}

/// Serializes and saves a typed preference value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or store save fails.
pub async fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    namespace: &str,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_pref(namespace, key, &raw).await
}

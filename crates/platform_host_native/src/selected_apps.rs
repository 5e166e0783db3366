//! SQLite-backed selected-app table.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use platform_host::{
    SelectedAppRecord, SelectedAppStore, SelectedAppStoreFuture, SelectedAppStream,
    SelectionBroadcaster,
};
use rusqlite::{params, Connection};

const SCHEMA_VERSION: u32 = 1;

const CREATE_SELECTED_APPS: &str = "\
CREATE TABLE IF NOT EXISTS selected_apps (
    package_id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL
);";

/// Selected-app store persisted in a single SQLite table.
///
/// Writes are committed before observers are notified, so every published snapshot reflects
/// durable state.
pub struct SqliteSelectedAppStore {
    conn: RefCell<Connection>,
    broadcaster: SelectionBroadcaster,
}

impl std::fmt::Debug for SqliteSelectedAppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSelectedAppStore")
            .field("broadcaster", &self.broadcaster)
            .finish_non_exhaustive()
    }
}

impl SqliteSelectedAppStore {
    /// Opens (creating when missing) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the parent directory, connection, or schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                format!("failed to create database dir {}: {err}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|err| format!("failed to open {}: {err}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|err| format!("failed to open in-memory database: {err}"))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, String> {
        migrate(&conn)?;
        Ok(Self {
            conn: RefCell::new(conn),
            broadcaster: SelectionBroadcaster::default(),
        })
    }

    fn insert(&self, record: &SelectedAppRecord) -> Result<bool, String> {
        let changed = self
            .conn
            .borrow()
            .execute(
                "INSERT OR IGNORE INTO selected_apps (package_id, name) VALUES (?1, ?2)",
                params![record.package_id, record.name],
            )
            .map_err(|err| format!("failed to insert {}: {err}", record.package_id))?;
        Ok(changed > 0)
    }

    fn remove(&self, record: &SelectedAppRecord) -> Result<bool, String> {
        let changed = self
            .conn
            .borrow()
            .execute(
                "DELETE FROM selected_apps WHERE package_id = ?1",
                params![record.package_id],
            )
            .map_err(|err| format!("failed to delete {}: {err}", record.package_id))?;
        Ok(changed > 0)
    }

    fn list(&self) -> Result<Vec<SelectedAppRecord>, String> {
        let conn = self.conn.borrow();
        let mut stmt = conn
            .prepare("SELECT package_id, name FROM selected_apps ORDER BY rowid")
            .map_err(|err| format!("failed to prepare selected-app query: {err}"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SelectedAppRecord {
                    package_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|err| format!("failed to query selected apps: {err}"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| format!("failed to read selected-app row: {err}"))
    }

    fn publish_current(&self) {
        self.broadcaster.publish(self.list());
    }
}

fn migrate(conn: &Connection) -> Result<(), String> {
    let version: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|err| format!("failed to read schema version: {err}"))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }
    conn.execute_batch(CREATE_SELECTED_APPS)
        .map_err(|err| format!("failed to create selected_apps table: {err}"))?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|err| format!("failed to record schema version: {err}"))
}

impl SelectedAppStore for SqliteSelectedAppStore {
    fn insert_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            let inserted = self.insert(record)?;
            if inserted {
                self.publish_current();
            }
            Ok(inserted)
        })
    }

    fn remove_selected_app<'a>(
        &'a self,
        record: &'a SelectedAppRecord,
    ) -> SelectedAppStoreFuture<'a, Result<bool, String>> {
        Box::pin(async move {
            let removed = self.remove(record)?;
            if removed {
                self.publish_current();
            }
            Ok(removed)
        })
    }

    fn list_selected_apps<'a>(
        &'a self,
    ) -> SelectedAppStoreFuture<'a, Result<Vec<SelectedAppRecord>, String>> {
        Box::pin(async move { self.list() })
    }

    fn observe_selected_apps(&self) -> SelectedAppStream {
        self.broadcaster.subscribe(self.list())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn schema_is_created_once_and_versioned() {
        let store = SqliteSelectedAppStore::open_in_memory().expect("store");
        migrate(&store.conn.borrow()).expect("second migrate is a no-op");

        let version: u32 = store
            .conn
            .borrow()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn duplicate_insert_keeps_first_row() {
        let store = SqliteSelectedAppStore::open_in_memory().expect("store");

        assert!(block_on(store.insert_selected_app(&SelectedAppRecord::new("com.a", "A")))
            .expect("insert"));
        assert!(
            !block_on(store.insert_selected_app(&SelectedAppRecord::new("com.a", "Again")))
                .expect("ignored")
        );

        assert_eq!(
            block_on(store.list_selected_apps()).expect("list"),
            vec![SelectedAppRecord::new("com.a", "A")]
        );
    }
}

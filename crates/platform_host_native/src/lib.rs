//! Native (non-wasm) implementations of [`platform_host`] service contracts.
//!
//! The selected-app table lives in SQLite, legacy preferences in a single JSON file, and the
//! package registry reads freedesktop `.desktop` entries. [`build_host_services`] composes them
//! into a [`platform_host::HostServices`] bundle from a [`NativeHostConfig`].

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod config;
mod desktop_entry;
mod packages;
mod prefs;
mod selected_apps;

use std::rc::Rc;

use platform_host::{HostCapabilities, HostServices, HostStrategy, NoopLauncherRoleService};

pub use config::{NativeHostConfig, DATA_DIR_ENV, DATABASE_FILE_NAME, PREFS_DIR_NAME};
pub use desktop_entry::{parse_desktop_entry, strip_field_codes, DesktopEntry};
pub use packages::{ApplicationDir, DesktopEntryRegistry};
pub use prefs::FilePrefsStore;
pub use selected_apps::SqliteSelectedAppStore;

/// Composes the native host bundle described by `config`.
///
/// The default-home role has no native backend yet, so it is reported as unavailable.
///
/// # Errors
///
/// Returns an error when the data directory, preference file, or database cannot be opened.
pub fn build_host_services(config: &NativeHostConfig) -> Result<HostServices, String> {
    let selected_apps = SqliteSelectedAppStore::open(config.database_path())?;
    let prefs = FilePrefsStore::from_root(config.prefs_dir())?;
    let packages = DesktopEntryRegistry::new(config.application_dirs.clone())
        .with_icon_dirs(config.icon_dirs.clone());

    Ok(HostServices {
        selected_apps: Rc::new(selected_apps),
        prefs: Rc::new(prefs),
        packages: Rc::new(packages),
        launcher_role: Rc::new(NoopLauncherRoleService),
        capabilities: HostCapabilities::native(),
        host_strategy: HostStrategy::Native,
    })
}

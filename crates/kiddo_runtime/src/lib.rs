//! Kid-mode launcher runtime: selected-app synchronization, installed-app queries, legacy
//! selection migration, the parental gate, and the leptos launcher surfaces.

pub mod components;
pub mod controller;
pub mod host;
pub mod installed_apps;
pub mod model;
pub mod parental_gate;
pub mod persistence;
pub mod reducer;
pub mod repository;

#[cfg(all(feature = "csr", target_arch = "wasm32"))]
pub use components::mount_launcher;
pub use components::{
    use_launcher_runtime, AppPickerScreen, DefaultLauncherPrompt, HomeScreen, LauncherProvider,
    LauncherRoute, LauncherRuntimeContext, LauncherShell, ParentalGateDialog,
};
pub use controller::{LauncherController, LauncherError, LauncherStateStream, SelectionSync};
pub use host::LauncherHostContext;
pub use installed_apps::{hydrate_icons, query_installed_apps};
pub use model::*;
pub use parental_gate::ParentalChallenge;
pub use persistence::{migrate_legacy_selection, MigrationError, MigrationReport};
pub use reducer::{reduce_launcher, LauncherAction, LauncherEffect, ReducerError};
pub use repository::{SelectionError, SelectionRepository};

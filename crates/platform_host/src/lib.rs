//! Typed host-domain contracts and shared models used by the kid-mode launcher runtime and its
//! native adapters.
//!
//! This crate is the API-first boundary for platform services. It exposes the selected-app store,
//! the lightweight preference store, the OS package registry, and the default-launcher role
//! service as object-safe traits, together with in-memory adapters for tests and stub hosts.
//! Concrete native adapters live in `platform_host_native`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod host;
pub mod launcher_role;
pub mod packages;
pub mod storage;

pub use host::{CapabilityStatus, HostCapabilities, HostServices, HostStrategy};
pub use launcher_role::{
    LauncherRoleFuture, LauncherRoleService, MemoryLauncherRoleService, NoopLauncherRoleService,
};
pub use packages::{
    IconHandle, InstalledPackage, LaunchEntry, MemoryPackageRegistry, NoopPackageRegistry,
    PackageLookupError, PackageRegistry, PackageRegistryFuture, FALLBACK_ICON_HANDLE,
};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore, PrefsStoreFuture,
};
pub use storage::selected_apps::{
    MemorySelectedAppStore, NoopSelectedAppStore, SelectedAppRecord, SelectedAppStore,
    SelectedAppStoreFuture, SelectedAppStream, SelectedAppsSnapshot, SelectionBroadcaster,
};

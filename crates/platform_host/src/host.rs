//! Shared host-bundle and capability models for runtime composition.

use std::rc::Rc;

use crate::{
    LauncherRoleService, MemoryLauncherRoleService, MemoryPackageRegistry, MemoryPrefsStore,
    MemorySelectedAppStore, PackageRegistry, PrefsStore, SelectedAppStore,
};

/// Stable host strategy selected for the current composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Native composition backed by SQLite, preference files, and the OS package registry.
    Native,
    /// Composition with in-memory adapters (tests, previews).
    Stub,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics and runtime inspection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Stub => "stub",
        }
    }
}

/// Host availability state for one optional capability domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    /// Capability is available.
    Available,
    /// Capability is not implemented or not supported on the active host.
    Unavailable,
}

impl CapabilityStatus {
    /// Returns whether the capability can be used immediately.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Host capability snapshot exposed to runtime wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Launching installed packages.
    pub package_launch: CapabilityStatus,
    /// Querying and changing the default-home-screen role.
    pub launcher_role: CapabilityStatus,
    /// Selection survives a restart.
    pub durable_selection: CapabilityStatus,
}

impl HostCapabilities {
    /// Native host posture.
    pub const fn native() -> Self {
        Self {
            package_launch: CapabilityStatus::Available,
            launcher_role: CapabilityStatus::Unavailable,
            durable_selection: CapabilityStatus::Available,
        }
    }

    /// In-memory stub posture.
    pub const fn stub() -> Self {
        Self {
            package_launch: CapabilityStatus::Available,
            launcher_role: CapabilityStatus::Available,
            durable_selection: CapabilityStatus::Unavailable,
        }
    }
}

/// Runtime-selected host service bundle injected into the launcher runtime.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `kiddo_runtime`, which keeps the runtime decoupled from adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Selected-app table.
    pub selected_apps: Rc<dyn SelectedAppStore>,
    /// Lightweight namespaced preference store (legacy selection path).
    pub prefs: Rc<dyn PrefsStore>,
    /// OS package registry.
    pub packages: Rc<dyn PackageRegistry>,
    /// Default-home-screen role service.
    pub launcher_role: Rc<dyn LauncherRoleService>,
    /// Host availability snapshot for optional capability domains.
    pub capabilities: HostCapabilities,
    /// Stable strategy identifier for diagnostics and policy.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Composes a bundle from fresh in-memory adapters.
    pub fn in_memory() -> Self {
        Self {
            selected_apps: Rc::new(MemorySelectedAppStore::default()),
            prefs: Rc::new(MemoryPrefsStore::default()),
            packages: Rc::new(MemoryPackageRegistry::default()),
            launcher_role: Rc::new(MemoryLauncherRoleService::new(true)),
            capabilities: HostCapabilities::stub(),
            host_strategy: HostStrategy::Stub,
        }
    }
}

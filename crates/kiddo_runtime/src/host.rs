//! Host service accessors for the launcher runtime.

use std::rc::Rc;

use platform_host::{
    HostCapabilities, HostServices, LauncherRoleService, PackageRegistry, PrefsStore,
    SelectedAppStore,
};

#[derive(Clone)]
/// Host service bundle used by the controller to execute effects.
pub struct LauncherHostContext {
    services: HostServices,
}

impl LauncherHostContext {
    /// Wraps an injected host bundle.
    pub fn new(services: HostServices) -> Self {
        Self { services }
    }

    /// Returns the selected-app store.
    pub fn selected_app_store(&self) -> Rc<dyn SelectedAppStore> {
        self.services.selected_apps.clone()
    }

    /// Returns the legacy preference store.
    pub fn prefs_store(&self) -> Rc<dyn PrefsStore> {
        self.services.prefs.clone()
    }

    /// Returns the OS package registry.
    pub fn package_registry(&self) -> Rc<dyn PackageRegistry> {
        self.services.packages.clone()
    }

    /// Returns the default-home role service.
    pub fn launcher_role(&self) -> Rc<dyn LauncherRoleService> {
        self.services.launcher_role.clone()
    }

    /// Returns the capability snapshot.
    pub fn capabilities(&self) -> HostCapabilities {
        self.services.capabilities
    }

    /// Returns the stable host strategy token.
    pub fn host_strategy_name(&self) -> &'static str {
        self.services.host_strategy.as_str()
    }
}

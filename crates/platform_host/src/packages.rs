//! OS package-registry contracts: enumerating launchable apps, icon lookup, and launching.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Handle string of the built-in placeholder icon.
pub const FALLBACK_ICON_HANDLE: &str = "builtin:kiddo/fallback";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Opaque reference to an app icon (file path, resource URI, or the built-in fallback).
pub struct IconHandle(String);

impl IconHandle {
    /// Wraps a host-specific icon reference.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the built-in placeholder icon.
    pub fn fallback() -> Self {
        Self(FALLBACK_ICON_HANDLE.to_string())
    }

    /// Returns whether this is the built-in placeholder icon.
    pub fn is_fallback(&self) -> bool {
        self.0 == FALLBACK_ICON_HANDLE
    }

    /// Returns the raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One application known to the host package registry.
pub struct InstalledPackage {
    /// Stable package identifier.
    pub package_id: String,
    /// User-facing label.
    pub display_name: String,
    /// Icon resolved during enumeration, if the registry had one at hand.
    pub icon: Option<IconHandle>,
    /// Whether the package ships with the system image.
    pub is_system: bool,
    /// Whether the package exposes a user-facing launch entry point.
    pub has_launch_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Host-specific launch target for a package.
pub struct LaunchEntry {
    /// Package the entry belongs to.
    pub package_id: String,
    /// Opaque target understood by the registry that produced it.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Failure of a single-package lookup.
pub enum PackageLookupError {
    /// The package is not installed (or no longer installed).
    NotFound {
        /// Identifier that failed to resolve.
        package_id: String,
    },
    /// The host registry itself failed.
    Host(String),
}

impl std::fmt::Display for PackageLookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { package_id } => write!(f, "package not found: {package_id}"),
            Self::Host(message) => write!(f, "package registry failed: {message}"),
        }
    }
}

impl std::error::Error for PackageLookupError {}

/// Object-safe boxed future used by [`PackageRegistry`].
pub type PackageRegistryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service exposing the OS package registry.
pub trait PackageRegistry {
    /// Enumerates installed packages that the host considers candidates for a launcher.
    ///
    /// No ordering is guaranteed across calls.
    fn list_packages<'a>(
        &'a self,
    ) -> PackageRegistryFuture<'a, Result<Vec<InstalledPackage>, String>>;

    /// Loads the icon for one package.
    fn load_icon<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<IconHandle, PackageLookupError>>;

    /// Resolves the launch entry for a package, or `None` when it cannot be launched.
    fn resolve_launch_entry<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<Option<LaunchEntry>, String>>;

    /// Starts the application behind `entry`.
    fn launch<'a>(
        &'a self,
        entry: &'a LaunchEntry,
    ) -> PackageRegistryFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op registry for unsupported targets: nothing is installed.
pub struct NoopPackageRegistry;

impl PackageRegistry for NoopPackageRegistry {
    fn list_packages<'a>(
        &'a self,
    ) -> PackageRegistryFuture<'a, Result<Vec<InstalledPackage>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn load_icon<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<IconHandle, PackageLookupError>> {
        Box::pin(async move {
            Err(PackageLookupError::NotFound {
                package_id: package_id.to_string(),
            })
        })
    }

    fn resolve_launch_entry<'a>(
        &'a self,
        _package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<Option<LaunchEntry>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn launch<'a>(
        &'a self,
        _entry: &'a LaunchEntry,
    ) -> PackageRegistryFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Default)]
struct MemoryPackages {
    packages: Vec<InstalledPackage>,
    icons: HashMap<String, IconHandle>,
    launched: Vec<String>,
}

#[derive(Debug, Clone, Default)]
/// In-memory package registry for tests and stub hosts; clones share state.
pub struct MemoryPackageRegistry {
    inner: Rc<RefCell<MemoryPackages>>,
}

impl MemoryPackageRegistry {
    /// Creates a registry with `packages` installed.
    pub fn with_packages(packages: impl IntoIterator<Item = InstalledPackage>) -> Self {
        let registry = Self::default();
        for package in packages {
            registry.install(package);
        }
        registry
    }

    /// Installs (or replaces) a package.
    pub fn install(&self, package: InstalledPackage) {
        let mut inner = self.inner.borrow_mut();
        inner
            .packages
            .retain(|existing| existing.package_id != package.package_id);
        inner.packages.push(package);
    }

    /// Uninstalls a package and forgets its icon.
    pub fn uninstall(&self, package_id: &str) {
        let mut inner = self.inner.borrow_mut();
        inner
            .packages
            .retain(|existing| existing.package_id != package_id);
        inner.icons.remove(package_id);
    }

    /// Registers an icon that only `load_icon` can see.
    pub fn set_icon(&self, package_id: &str, icon: IconHandle) {
        self.inner
            .borrow_mut()
            .icons
            .insert(package_id.to_string(), icon);
    }

    /// Returns the package ids launched so far, oldest first.
    pub fn launched(&self) -> Vec<String> {
        self.inner.borrow().launched.clone()
    }

    fn find(&self, package_id: &str) -> Option<InstalledPackage> {
        self.inner
            .borrow()
            .packages
            .iter()
            .find(|package| package.package_id == package_id)
            .cloned()
    }
}

impl PackageRegistry for MemoryPackageRegistry {
    fn list_packages<'a>(
        &'a self,
    ) -> PackageRegistryFuture<'a, Result<Vec<InstalledPackage>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().packages.clone()) })
    }

    fn load_icon<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<IconHandle, PackageLookupError>> {
        Box::pin(async move {
            let not_found = || PackageLookupError::NotFound {
                package_id: package_id.to_string(),
            };
            let package = self.find(package_id).ok_or_else(not_found)?;
            if let Some(icon) = self.inner.borrow().icons.get(package_id) {
                return Ok(icon.clone());
            }
            package.icon.ok_or_else(not_found)
        })
    }

    fn resolve_launch_entry<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<Option<LaunchEntry>, String>> {
        Box::pin(async move {
            Ok(self
                .find(package_id)
                .filter(|package| package.has_launch_entry)
                .map(|package| LaunchEntry {
                    target: format!("memory:{}", package.package_id),
                    package_id: package.package_id,
                }))
        })
    }

    fn launch<'a>(
        &'a self,
        entry: &'a LaunchEntry,
    ) -> PackageRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.find(&entry.package_id).is_none() {
                return Err(format!("package not installed: {}", entry.package_id));
            }
            self.inner
                .borrow_mut()
                .launched
                .push(entry.package_id.clone());
            Ok(())
        })
    }
}

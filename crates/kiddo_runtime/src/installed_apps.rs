//! Installed-app query and icon hydration over the host package registry.

use leptos::logging;
use platform_host::{IconHandle, InstalledPackage, PackageLookupError, PackageRegistry};

use crate::model::{name_matches, AppInfo};

/// Returns whether a package belongs in the launcher.
///
/// User-installed packages are always included; system packages only when they expose a launch
/// entry.
pub fn is_user_launchable(package: &InstalledPackage) -> bool {
    !package.is_system || package.has_launch_entry
}

/// Enumerates launchable apps whose name matches `filter`.
///
/// Icon lookup failures never abort the query; the entry gets the fallback icon.
///
/// # Errors
///
/// Returns an error when the registry cannot enumerate packages.
pub async fn query_installed_apps(
    registry: &dyn PackageRegistry,
    filter: Option<&str>,
) -> Result<Vec<AppInfo>, String> {
    let query = filter.unwrap_or_default();
    let packages = registry.list_packages().await?;
    let mut apps = Vec::new();
    for package in packages
        .into_iter()
        .filter(is_user_launchable)
        .filter(|package| name_matches(&package.display_name, query))
    {
        let icon = match package.icon {
            Some(icon) => icon,
            None => resolve_app_icon(registry, &package.package_id).await,
        };
        apps.push(AppInfo {
            name: package.display_name,
            package_id: package.package_id,
            icon: Some(icon),
        });
    }
    Ok(apps)
}

/// Loads the icon for `package_id`, substituting the fallback icon on any failure.
pub async fn resolve_app_icon(registry: &dyn PackageRegistry, package_id: &str) -> IconHandle {
    match registry.load_icon(package_id).await {
        Ok(icon) => icon,
        Err(PackageLookupError::NotFound { .. }) => IconHandle::fallback(),
        Err(err) => {
            logging::warn!("icon lookup for {package_id} failed: {err}");
            IconHandle::fallback()
        }
    }
}

/// Attaches an icon to every app that has none.
pub async fn hydrate_icons(registry: &dyn PackageRegistry, apps: Vec<AppInfo>) -> Vec<AppInfo> {
    let mut hydrated = Vec::with_capacity(apps.len());
    for mut app in apps {
        if app.icon.is_none() {
            app.icon = Some(resolve_app_icon(registry, &app.package_id).await);
        }
        hydrated.push(app);
    }
    hydrated
}

//! Package registry backed by freedesktop application directories.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::rc::Rc;

use platform_host::{
    IconHandle, InstalledPackage, LaunchEntry, PackageLookupError, PackageRegistry,
    PackageRegistryFuture,
};

use crate::desktop_entry::{parse_desktop_entry, DesktopEntry};

const DESKTOP_EXTENSION: &str = "desktop";
const ICON_THEME: &str = "hicolor";
const ICON_SIZES: [&str; 7] = [
    "scalable", "256x256", "128x128", "96x96", "64x64", "48x48", "32x32",
];
const ICON_EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// One directory of `.desktop` files.
pub struct ApplicationDir {
    /// Directory path.
    pub path: PathBuf,
    /// Whether entries found here count as system packages.
    pub is_system: bool,
}

impl ApplicationDir {
    /// Directory of user-installed applications.
    pub fn user(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_system: false,
        }
    }

    /// Directory of applications shipped with the system.
    pub fn system(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_system: true,
        }
    }
}

#[derive(Debug, Clone)]
struct ScannedEntry {
    package_id: String,
    entry: DesktopEntry,
    is_system: bool,
}

#[derive(Debug, Clone, Default)]
/// Registry that treats every `.desktop` file as an installed package.
///
/// The package identifier is the file stem (`org.mozilla.firefox.desktop` is
/// `org.mozilla.firefox`). When the same identifier exists in several directories the first
/// directory wins, so a `Hidden=true` user entry masks the system one.
///
/// Launched processes are kept until they exit and are reaped on later registry calls.
pub struct DesktopEntryRegistry {
    application_dirs: Vec<ApplicationDir>,
    icon_dirs: Vec<PathBuf>,
    children: Rc<RefCell<Vec<Child>>>,
}

impl DesktopEntryRegistry {
    /// Creates a registry scanning `application_dirs` in order.
    pub fn new(application_dirs: Vec<ApplicationDir>) -> Self {
        Self {
            application_dirs,
            icon_dirs: Vec::new(),
            children: Rc::default(),
        }
    }

    /// Sets the icon search roots.
    pub fn with_icon_dirs(mut self, icon_dirs: Vec<PathBuf>) -> Self {
        self.icon_dirs = icon_dirs;
        self
    }

    /// Collects launched processes that have exited; returns how many are still running.
    pub fn reap_exited(&self) -> usize {
        let mut children = self.children.borrow_mut();
        children.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        children.len()
    }

    fn scan(&self) -> Result<Vec<ScannedEntry>, String> {
        let mut seen = HashSet::new();
        let mut scanned = Vec::new();
        for dir in &self.application_dirs {
            for path in desktop_files(&dir.path)? {
                let Some(package_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };
                if !seen.insert(package_id.to_string()) {
                    continue;
                }
                let Ok(content) = fs::read_to_string(&path) else {
                    continue;
                };
                let Some(entry) = parse_desktop_entry(&content) else {
                    continue;
                };
                scanned.push(ScannedEntry {
                    package_id: package_id.to_string(),
                    entry,
                    is_system: dir.is_system,
                });
            }
        }
        scanned.retain(|scanned| !scanned.entry.hidden);
        Ok(scanned)
    }

    fn find(&self, package_id: &str) -> Result<Option<ScannedEntry>, String> {
        Ok(self
            .scan()?
            .into_iter()
            .find(|scanned| scanned.package_id == package_id))
    }

    fn resolve_icon(&self, icon: &str) -> Option<PathBuf> {
        let direct = Path::new(icon);
        if direct.is_absolute() {
            return direct.is_file().then(|| direct.to_path_buf());
        }
        self.icon_dirs.iter().find_map(|root| {
            let themed = ICON_SIZES.iter().flat_map(|size| {
                ICON_EXTENSIONS.iter().map(move |ext| {
                    root.join(ICON_THEME)
                        .join(size)
                        .join("apps")
                        .join(format!("{icon}.{ext}"))
                })
            });
            let flat = ICON_EXTENSIONS
                .iter()
                .map(|ext| root.join(format!("{icon}.{ext}")));
            themed.chain(flat).find(|candidate| candidate.is_file())
        })
    }
}

fn desktop_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(format!("failed to read {}: {err}", dir.display())),
    };
    let mut files = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == DESKTOP_EXTENSION)
        })
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

impl PackageRegistry for DesktopEntryRegistry {
    fn list_packages<'a>(
        &'a self,
    ) -> PackageRegistryFuture<'a, Result<Vec<InstalledPackage>, String>> {
        Box::pin(async move {
            self.reap_exited();
            Ok(self
                .scan()?
                .into_iter()
                .map(|scanned| InstalledPackage {
                    has_launch_entry: scanned.entry.is_launchable(),
                    package_id: scanned.package_id,
                    display_name: scanned.entry.name,
                    icon: None,
                    is_system: scanned.is_system,
                })
                .collect())
        })
    }

    fn load_icon<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<IconHandle, PackageLookupError>> {
        Box::pin(async move {
            let not_found = || PackageLookupError::NotFound {
                package_id: package_id.to_string(),
            };
            let scanned = self
                .find(package_id)
                .map_err(PackageLookupError::Host)?
                .ok_or_else(not_found)?;
            scanned
                .entry
                .icon
                .as_deref()
                .and_then(|icon| self.resolve_icon(icon))
                .map(|path| IconHandle::new(path.display().to_string()))
                .ok_or_else(not_found)
        })
    }

    fn resolve_launch_entry<'a>(
        &'a self,
        package_id: &'a str,
    ) -> PackageRegistryFuture<'a, Result<Option<LaunchEntry>, String>> {
        Box::pin(async move {
            Ok(self
                .find(package_id)?
                .filter(|scanned| scanned.entry.is_launchable())
                .and_then(|scanned| {
                    scanned.entry.command_line().map(|target| LaunchEntry {
                        package_id: scanned.package_id,
                        target,
                    })
                }))
        })
    }

    fn launch<'a>(
        &'a self,
        entry: &'a LaunchEntry,
    ) -> PackageRegistryFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let words = shell_words::split(&entry.target)
                .map_err(|err| format!("malformed launch target for {}: {err}", entry.package_id))?;
            let (program, args) = words
                .split_first()
                .ok_or_else(|| format!("empty launch target for {}", entry.package_id))?;
            self.reap_exited();
            let child = Command::new(program)
                .args(args)
                .spawn()
                .map_err(|err| format!("failed to launch {}: {err}", entry.package_id))?;
            self.children.borrow_mut().push(child);
            Ok(())
        })
    }
}

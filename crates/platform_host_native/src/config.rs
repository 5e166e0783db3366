//! Native host configuration resolved from the process environment.

use std::path::PathBuf;

use crate::packages::ApplicationDir;

/// Environment variable overriding the launcher data directory.
pub const DATA_DIR_ENV: &str = "KIDDO_DATA_DIR";
/// File name of the selected-app database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "kiddo_guard.db";
/// Directory holding the preference file inside the data directory.
pub const PREFS_DIR_NAME: &str = "prefs";

const APP_DIR_NAME: &str = "kiddoguard";
const DEFAULT_XDG_DATA_DIRS: &str = "/usr/local/share:/usr/share";
const PIXMAPS_DIR: &str = "/usr/share/pixmaps";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Paths used by the native adapters.
pub struct NativeHostConfig {
    /// Root directory for the database and preference file.
    pub data_dir: PathBuf,
    /// Desktop-entry directories, highest precedence first.
    pub application_dirs: Vec<ApplicationDir>,
    /// Icon search roots, highest precedence first.
    pub icon_dirs: Vec<PathBuf>,
}

impl NativeHostConfig {
    /// Resolves configuration from `KIDDO_DATA_DIR`, `XDG_DATA_DIRS`, and the platform data dir.
    ///
    /// # Errors
    ///
    /// Returns an error when no data directory can be determined.
    pub fn from_env() -> Result<Self, String> {
        let data_dir_override = std::env::var_os(DATA_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let xdg_data_dirs = std::env::var("XDG_DATA_DIRS").ok();
        Self::resolve(data_dir_override, dirs::data_dir(), xdg_data_dirs.as_deref())
    }

    /// Resolves configuration from explicit inputs.
    ///
    /// `user_data_dir` is the per-user data directory (`~/.local/share` on Linux); its
    /// applications are treated as user-installed. Entries from `xdg_data_dirs` are system
    /// applications.
    ///
    /// # Errors
    ///
    /// Returns an error when neither an override nor a user data directory is available.
    pub fn resolve(
        data_dir_override: Option<PathBuf>,
        user_data_dir: Option<PathBuf>,
        xdg_data_dirs: Option<&str>,
    ) -> Result<Self, String> {
        let data_dir = match (data_dir_override, user_data_dir.as_ref()) {
            (Some(dir), _) => dir,
            (None, Some(user)) => user.join(APP_DIR_NAME),
            (None, None) => {
                return Err(format!(
                    "no data directory available; set {DATA_DIR_ENV} to choose one"
                ))
            }
        };

        let system_roots = xdg_data_dirs
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(DEFAULT_XDG_DATA_DIRS)
            .split(':')
            .filter(|segment| !segment.is_empty())
            .map(PathBuf::from)
            .collect::<Vec<_>>();

        let mut application_dirs = Vec::new();
        let mut icon_dirs = Vec::new();
        if let Some(user) = user_data_dir.as_ref() {
            application_dirs.push(ApplicationDir::user(user.join("applications")));
            icon_dirs.push(user.join("icons"));
        }
        for root in &system_roots {
            application_dirs.push(ApplicationDir::system(root.join("applications")));
            icon_dirs.push(root.join("icons"));
        }
        icon_dirs.push(PathBuf::from(PIXMAPS_DIR));

        Ok(Self {
            data_dir,
            application_dirs,
            icon_dirs,
        })
    }

    /// Returns the selected-app database path.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    /// Returns the preference directory.
    pub fn prefs_dir(&self) -> PathBuf {
        self.data_dir.join(PREFS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn override_wins_over_user_data_dir() {
        let config = NativeHostConfig::resolve(
            Some(PathBuf::from("/tmp/kiddo")),
            Some(PathBuf::from("/home/kid/.local/share")),
            None,
        )
        .expect("config");

        assert_eq!(config.data_dir, PathBuf::from("/tmp/kiddo"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/kiddo/kiddo_guard.db"));
        assert_eq!(config.prefs_dir(), PathBuf::from("/tmp/kiddo/prefs"));
    }

    #[test]
    fn user_applications_take_precedence_over_system_dirs() {
        let config = NativeHostConfig::resolve(
            None,
            Some(PathBuf::from("/home/kid/.local/share")),
            Some("/opt/share::/usr/share"),
        )
        .expect("config");

        assert_eq!(
            config.data_dir,
            PathBuf::from("/home/kid/.local/share/kiddoguard")
        );
        assert_eq!(
            config.application_dirs,
            vec![
                ApplicationDir::user("/home/kid/.local/share/applications"),
                ApplicationDir::system("/opt/share/applications"),
                ApplicationDir::system("/usr/share/applications"),
            ]
        );
        assert_eq!(config.icon_dirs.last(), Some(&PathBuf::from(PIXMAPS_DIR)));
    }

    #[test]
    fn missing_data_dir_is_reported() {
        let err = NativeHostConfig::resolve(None, None, None).expect_err("no data dir");
        assert!(err.contains(DATA_DIR_ENV));
    }
}

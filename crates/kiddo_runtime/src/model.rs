//! Launcher state model and picker view-model helpers.

use std::collections::HashSet;

use platform_host::IconHandle;
use serde::{Deserialize, Serialize};

use crate::parental_gate::ParentalChallenge;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// An application as shown by the launcher.
///
/// Rebuilt on every query or store emission; the icon is never persisted.
pub struct AppInfo {
    /// User-facing label.
    pub name: String,
    /// Stable package identifier.
    pub package_id: String,
    /// Resolved icon, or `None` before hydration.
    pub icon: Option<IconHandle>,
}

impl AppInfo {
    /// Creates an app without an icon.
    pub fn new(package_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_id: package_id.into(),
            icon: None,
        }
    }

    /// Returns the app with `icon` attached.
    pub fn with_icon(mut self, icon: IconHandle) -> Self {
        self.icon = Some(icon);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Monotonic sequence number tagging one installed-app query.
pub struct LoadTicket(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Issued/applied bookkeeping for installed-app queries.
pub struct LoadTickets {
    issued: u64,
    applied: u64,
}

impl LoadTickets {
    /// Issues the next ticket.
    pub fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Marks `ticket` complete. Returns `false` when a newer ticket was already applied, in which
    /// case the result must be discarded.
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if ticket.0 <= self.applied || ticket.0 > self.issued {
            return false;
        }
        self.applied = ticket.0;
        true
    }

    /// Returns whether the most recently issued ticket is still outstanding.
    pub const fn in_flight(self) -> bool {
        self.issued > self.applied
    }

    /// Returns the last applied ticket, if any.
    pub fn last_applied(self) -> Option<LoadTicket> {
        (self.applied > 0).then_some(LoadTicket(self.applied))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Parental-gate state.
pub enum AdminAccess {
    /// Admin options are hidden.
    #[default]
    Locked,
    /// A challenge is on screen.
    Challenge {
        /// Problem currently shown.
        challenge: ParentalChallenge,
        /// Wrong answers submitted since the gate opened.
        failed_attempts: u32,
    },
    /// Admin options are available until relocked.
    Unlocked,
}

impl AdminAccess {
    /// Returns whether admin options are available.
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked)
    }

    /// Returns the challenge on screen, if any.
    pub const fn active_challenge(self) -> Option<ParentalChallenge> {
        match self {
            Self::Challenge { challenge, .. } => Some(challenge),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Whether this launcher holds the system default-home role.
pub enum DefaultLauncherStatus {
    /// Not queried yet.
    #[default]
    Unknown,
    /// The launcher is the default home screen.
    IsDefault,
    /// Another app is the default home screen.
    NotDefault {
        /// Whether the "set as default" prompt is showing.
        prompt_visible: bool,
    },
    /// The host cannot report or change the role.
    Unavailable,
}

impl DefaultLauncherStatus {
    /// Returns whether the "set as default" prompt should be rendered.
    pub const fn prompt_visible(self) -> bool {
        matches!(
            self,
            Self::NotDefault {
                prompt_visible: true
            }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Observable launcher state owned by the controller.
pub struct LauncherState {
    /// Result of the last applied installed-app query.
    pub available_apps: Vec<AppInfo>,
    /// Apps allowed in restricted mode, unique by identifier.
    pub selected_apps: Vec<AppInfo>,
    /// `true` while the latest installed-app query is outstanding.
    pub loading: bool,
    /// Query sequencing.
    pub load_tickets: LoadTickets,
    /// Parental-gate state.
    pub admin: AdminAccess,
    /// Default-home role state.
    pub default_launcher: DefaultLauncherStatus,
}

impl LauncherState {
    /// Returns whether `package_id` is currently selected.
    pub fn is_selected(&self, package_id: &str) -> bool {
        self.selected_apps
            .iter()
            .any(|app| app.package_id == package_id)
    }
}

/// Removes later entries whose identifier already appeared.
pub fn dedupe_by_package_id(apps: Vec<AppInfo>) -> Vec<AppInfo> {
    let mut seen = HashSet::new();
    apps.into_iter()
        .filter(|app| seen.insert(app.package_id.clone()))
        .collect()
}

/// Case-insensitive substring match; an empty query matches everything.
pub fn name_matches(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The two lists shown by the app picker.
pub struct PickerSections {
    /// Selected apps matching the query.
    pub selected: Vec<AppInfo>,
    /// Available, unselected apps matching the query.
    pub unselected: Vec<AppInfo>,
}

impl PickerSections {
    /// Returns whether neither section has an entry.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.unselected.is_empty()
    }
}

/// Splits the picker content for `query`.
pub fn picker_sections(available: &[AppInfo], selected: &[AppInfo], query: &str) -> PickerSections {
    let selected_ids = selected
        .iter()
        .map(|app| app.package_id.as_str())
        .collect::<HashSet<_>>();
    PickerSections {
        selected: selected
            .iter()
            .filter(|app| name_matches(&app.name, query))
            .cloned()
            .collect(),
        unselected: available
            .iter()
            .filter(|app| !selected_ids.contains(app.package_id.as_str()))
            .filter(|app| name_matches(&app.name, query))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stale_and_unknown_tickets_are_rejected() {
        let mut tickets = LoadTickets::default();
        let first = tickets.issue();
        let second = tickets.issue();

        assert!(tickets.in_flight());
        assert!(tickets.complete(second));
        assert!(!tickets.in_flight());
        assert!(!tickets.complete(first));
        assert!(!tickets.complete(LoadTicket(9)));
        assert_eq!(tickets.last_applied(), Some(second));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let apps = vec![
            AppInfo::new("com.a", "A"),
            AppInfo::new("com.b", "B"),
            AppInfo::new("com.a", "A again"),
        ];

        assert_eq!(
            dedupe_by_package_id(apps),
            vec![AppInfo::new("com.a", "A"), AppInfo::new("com.b", "B")]
        );
    }

    #[test]
    fn picker_sections_split_by_selection_and_filter_by_name() {
        let available = vec![
            AppInfo::new("com.paint", "Paint"),
            AppInfo::new("com.piano", "Piano"),
            AppInfo::new("com.maps", "Maps"),
        ];
        let selected = vec![AppInfo::new("com.paint", "Paint"), AppInfo::new("com.gone", "Pad")];

        let all = picker_sections(&available, &selected, "");
        assert_eq!(all.selected.len(), 2);
        assert_eq!(
            all.unselected,
            vec![AppInfo::new("com.piano", "Piano"), AppInfo::new("com.maps", "Maps")]
        );

        let filtered = picker_sections(&available, &selected, "PA");
        assert_eq!(
            filtered.selected,
            vec![AppInfo::new("com.paint", "Paint"), AppInfo::new("com.gone", "Pad")]
        );
        assert_eq!(filtered.unselected, Vec::new());

        assert!(picker_sections(&available, &selected, "zzz").is_empty());
    }
}

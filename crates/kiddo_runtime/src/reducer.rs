//! Reducer actions, side-effect intents, and transition logic for the launcher runtime.

use thiserror::Error;

use crate::model::{
    dedupe_by_package_id, AdminAccess, AppInfo, DefaultLauncherStatus, LauncherState, LoadTicket,
};
use crate::parental_gate::ParentalChallenge;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Actions accepted by [`reduce_launcher`] to mutate [`LauncherState`].
pub enum LauncherAction {
    /// Start a new installed-app query.
    LoadAvailableApps {
        /// Optional case-insensitive name filter.
        filter: Option<String>,
    },
    /// An installed-app query finished.
    AvailableAppsLoaded {
        /// Ticket issued for the query.
        ticket: LoadTicket,
        /// Query result.
        apps: Vec<AppInfo>,
    },
    /// An installed-app query failed.
    AvailableAppsLoadFailed {
        /// Ticket issued for the query.
        ticket: LoadTicket,
    },
    /// Allow an app in restricted mode.
    SelectApp {
        /// App to persist.
        app: AppInfo,
    },
    /// The store accepted a selection.
    SelectionPersisted {
        /// App that was persisted.
        app: AppInfo,
    },
    /// Remove an app from restricted mode.
    DeselectApp {
        /// App to remove.
        app: AppInfo,
    },
    /// The store removed a selection.
    DeselectionPersisted {
        /// Identifier that was removed.
        package_id: String,
    },
    /// The store published a new selected set (icons already hydrated).
    SelectedAppsObserved {
        /// Full selected set.
        apps: Vec<AppInfo>,
    },
    /// Start a selected app.
    LaunchApp {
        /// Identifier to launch.
        package_id: String,
    },
    /// Show the parental gate.
    RequestAdminAccess {
        /// Problem to show.
        challenge: ParentalChallenge,
    },
    /// Answer the parental gate.
    SubmitGateAnswer {
        /// Raw text typed by the user.
        answer: String,
        /// Problem shown after a wrong answer.
        next_challenge: ParentalChallenge,
    },
    /// Close the parental gate without answering.
    CancelAdminChallenge,
    /// Hide admin options again.
    LockAdmin,
    /// Leave restricted mode by giving up the default-home role.
    ExitRestrictedMode,
    /// The host reported the default-home role.
    DefaultLauncherResolved {
        /// Whether this launcher is the default.
        is_default: bool,
    },
    /// The host cannot report the default-home role.
    DefaultLauncherUnavailable,
    /// "Set as Default" was pressed.
    AcceptDefaultLauncherPrompt,
    /// "Not Now" was pressed.
    DismissDefaultLauncherPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side effects emitted by the reducer for the controller to execute in order.
pub enum LauncherEffect {
    /// Enumerate installed apps and report back with the ticket.
    QueryInstalledApps {
        /// Ticket to report with.
        ticket: LoadTicket,
        /// Optional name filter.
        filter: Option<String>,
    },
    /// Insert the app into the selection store.
    PersistSelection {
        /// App to insert.
        app: AppInfo,
    },
    /// Remove the app from the selection store.
    PersistDeselection {
        /// App to remove.
        app: AppInfo,
    },
    /// Resolve and start a package.
    LaunchPackage {
        /// Identifier to launch.
        package_id: String,
    },
    /// Open the system default-home settings.
    OpenHomeSettings,
    /// Give up the default-home role.
    ClearDefaultHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// Reducer validation errors.
pub enum ReducerError {
    /// The action requires unlocked admin access.
    #[error("admin access is locked")]
    AdminLocked,
    /// A gate answer arrived while no challenge was shown.
    #[error("no parental challenge is active")]
    NoActiveChallenge,
}

/// Applies `action` to `state` and returns the effects to run.
///
/// # Errors
///
/// Returns [`ReducerError`] when an action is not allowed in the current admin state.
pub fn reduce_launcher(
    state: &mut LauncherState,
    action: LauncherAction,
) -> Result<Vec<LauncherEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        LauncherAction::LoadAvailableApps { filter } => {
            let ticket = state.load_tickets.issue();
            effects.push(LauncherEffect::QueryInstalledApps { ticket, filter });
        }
        LauncherAction::AvailableAppsLoaded { ticket, apps } => {
            if state.load_tickets.complete(ticket) {
                state.available_apps = dedupe_by_package_id(apps);
            }
        }
        LauncherAction::AvailableAppsLoadFailed { ticket } => {
            state.load_tickets.complete(ticket);
        }
        LauncherAction::SelectApp { app } => {
            effects.push(LauncherEffect::PersistSelection { app });
        }
        LauncherAction::SelectionPersisted { app } => {
            if !state.is_selected(&app.package_id) {
                state.selected_apps.push(app);
            }
        }
        LauncherAction::DeselectApp { app } => {
            effects.push(LauncherEffect::PersistDeselection { app });
        }
        LauncherAction::DeselectionPersisted { package_id } => {
            state
                .selected_apps
                .retain(|app| app.package_id != package_id);
        }
        LauncherAction::SelectedAppsObserved { apps } => {
            state.selected_apps = dedupe_by_package_id(apps);
        }
        LauncherAction::LaunchApp { package_id } => {
            effects.push(LauncherEffect::LaunchPackage { package_id });
        }
        LauncherAction::RequestAdminAccess { challenge } => {
            if !state.admin.is_unlocked() {
                state.admin = AdminAccess::Challenge {
                    challenge,
                    failed_attempts: 0,
                };
            }
        }
        LauncherAction::SubmitGateAnswer {
            answer,
            next_challenge,
        } => {
            let AdminAccess::Challenge {
                challenge,
                failed_attempts,
            } = state.admin
            else {
                return Err(ReducerError::NoActiveChallenge);
            };
            state.admin = if challenge.accepts(&answer) {
                AdminAccess::Unlocked
            } else {
                AdminAccess::Challenge {
                    challenge: next_challenge,
                    failed_attempts: failed_attempts.saturating_add(1),
                }
            };
        }
        LauncherAction::CancelAdminChallenge => {
            if state.admin.active_challenge().is_some() {
                state.admin = AdminAccess::Locked;
            }
        }
        LauncherAction::LockAdmin => {
            state.admin = AdminAccess::Locked;
        }
        LauncherAction::ExitRestrictedMode => {
            if !state.admin.is_unlocked() {
                return Err(ReducerError::AdminLocked);
            }
            state.admin = AdminAccess::Locked;
            effects.push(LauncherEffect::ClearDefaultHome);
        }
        LauncherAction::DefaultLauncherResolved { is_default } => {
            state.default_launcher = if is_default {
                DefaultLauncherStatus::IsDefault
            } else {
                DefaultLauncherStatus::NotDefault {
                    prompt_visible: true,
                }
            };
        }
        LauncherAction::DefaultLauncherUnavailable => {
            state.default_launcher = DefaultLauncherStatus::Unavailable;
        }
        LauncherAction::AcceptDefaultLauncherPrompt => {
            if state.default_launcher.prompt_visible() {
                state.default_launcher = DefaultLauncherStatus::NotDefault {
                    prompt_visible: false,
                };
                effects.push(LauncherEffect::OpenHomeSettings);
            }
        }
        LauncherAction::DismissDefaultLauncherPrompt => {
            if state.default_launcher.prompt_visible() {
                state.default_launcher = DefaultLauncherStatus::NotDefault {
                    prompt_visible: false,
                };
            }
        }
    }

    state.loading = state.load_tickets.in_flight();
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn app(id: &str, name: &str) -> AppInfo {
        AppInfo::new(id, name)
    }

    fn issue_load(state: &mut LauncherState) -> LoadTicket {
        let effects = reduce_launcher(state, LauncherAction::LoadAvailableApps { filter: None })
            .expect("load");
        match effects.as_slice() {
            [LauncherEffect::QueryInstalledApps { ticket, .. }] => *ticket,
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn loading_is_raised_by_the_request_and_cleared_by_its_completion() {
        let mut state = LauncherState::default();
        assert!(!state.loading);

        let ticket = issue_load(&mut state);
        assert!(state.loading);

        reduce_launcher(
            &mut state,
            LauncherAction::AvailableAppsLoaded {
                ticket,
                apps: vec![app("com.a", "A"), app("com.b", "B")],
            },
        )
        .expect("loaded");
        assert!(!state.loading);
        assert_eq!(state.available_apps.len(), 2);
    }

    #[test]
    fn older_query_finishing_last_is_discarded() {
        let mut state = LauncherState::default();
        let slow = issue_load(&mut state);
        let fast = issue_load(&mut state);

        reduce_launcher(
            &mut state,
            LauncherAction::AvailableAppsLoaded {
                ticket: fast,
                apps: vec![app("com.new", "New")],
            },
        )
        .expect("fast");
        assert!(!state.loading);

        reduce_launcher(
            &mut state,
            LauncherAction::AvailableAppsLoaded {
                ticket: slow,
                apps: vec![app("com.old", "Old")],
            },
        )
        .expect("slow");

        assert!(!state.loading);
        assert_eq!(state.available_apps, vec![app("com.new", "New")]);
    }

    #[test]
    fn older_query_finishing_first_is_applied_while_newer_stays_loading() {
        let mut state = LauncherState::default();
        let first = issue_load(&mut state);
        let second = issue_load(&mut state);

        reduce_launcher(
            &mut state,
            LauncherAction::AvailableAppsLoaded {
                ticket: first,
                apps: vec![app("com.a", "A")],
            },
        )
        .expect("first");
        assert!(state.loading);
        assert_eq!(state.available_apps, vec![app("com.a", "A")]);

        reduce_launcher(&mut state, LauncherAction::AvailableAppsLoadFailed { ticket: second })
            .expect("second failed");
        assert!(!state.loading);
        assert_eq!(state.available_apps, vec![app("com.a", "A")]);
    }

    #[test]
    fn optimistic_selection_never_duplicates_an_observed_entry() {
        let mut state = LauncherState::default();
        reduce_launcher(
            &mut state,
            LauncherAction::SelectedAppsObserved {
                apps: vec![app("com.a", "A"), app("com.a", "A")],
            },
        )
        .expect("observed");
        reduce_launcher(
            &mut state,
            LauncherAction::SelectionPersisted {
                app: app("com.a", "A"),
            },
        )
        .expect("persisted");

        assert_eq!(state.selected_apps, vec![app("com.a", "A")]);

        reduce_launcher(
            &mut state,
            LauncherAction::DeselectionPersisted {
                package_id: "com.a".to_string(),
            },
        )
        .expect("removed");
        assert!(state.selected_apps.is_empty());
    }

    #[test]
    fn selection_intents_only_emit_effects() {
        let mut state = LauncherState::default();

        let effects = reduce_launcher(
            &mut state,
            LauncherAction::SelectApp {
                app: app("com.a", "A"),
            },
        )
        .expect("select");

        assert_eq!(
            effects,
            vec![LauncherEffect::PersistSelection {
                app: app("com.a", "A")
            }]
        );
        assert!(state.selected_apps.is_empty());
    }

    #[test]
    fn wrong_gate_answer_rotates_the_challenge() {
        let mut state = LauncherState::default();
        reduce_launcher(
            &mut state,
            LauncherAction::RequestAdminAccess {
                challenge: ParentalChallenge::new(2, 3),
            },
        )
        .expect("request");

        reduce_launcher(
            &mut state,
            LauncherAction::SubmitGateAnswer {
                answer: "6".to_string(),
                next_challenge: ParentalChallenge::new(4, 4),
            },
        )
        .expect("wrong answer");
        assert_eq!(
            state.admin,
            AdminAccess::Challenge {
                challenge: ParentalChallenge::new(4, 4),
                failed_attempts: 1,
            }
        );

        reduce_launcher(
            &mut state,
            LauncherAction::SubmitGateAnswer {
                answer: "8".to_string(),
                next_challenge: ParentalChallenge::new(1, 1),
            },
        )
        .expect("right answer");
        assert_eq!(state.admin, AdminAccess::Unlocked);
    }

    #[test]
    fn exiting_restricted_mode_requires_unlock() {
        let mut state = LauncherState::default();

        assert_eq!(
            reduce_launcher(&mut state, LauncherAction::ExitRestrictedMode),
            Err(ReducerError::AdminLocked)
        );
        assert_eq!(
            reduce_launcher(
                &mut state,
                LauncherAction::SubmitGateAnswer {
                    answer: "2".to_string(),
                    next_challenge: ParentalChallenge::new(1, 1),
                }
            ),
            Err(ReducerError::NoActiveChallenge)
        );

        state.admin = AdminAccess::Unlocked;
        let effects =
            reduce_launcher(&mut state, LauncherAction::ExitRestrictedMode).expect("exit");
        assert_eq!(effects, vec![LauncherEffect::ClearDefaultHome]);
        assert_eq!(state.admin, AdminAccess::Locked);
    }

    #[test]
    fn default_launcher_prompt_opens_settings_once() {
        let mut state = LauncherState::default();
        reduce_launcher(
            &mut state,
            LauncherAction::DefaultLauncherResolved { is_default: false },
        )
        .expect("resolved");
        assert!(state.default_launcher.prompt_visible());

        let effects = reduce_launcher(&mut state, LauncherAction::AcceptDefaultLauncherPrompt)
            .expect("accept");
        assert_eq!(effects, vec![LauncherEffect::OpenHomeSettings]);
        assert!(!state.default_launcher.prompt_visible());

        let effects = reduce_launcher(&mut state, LauncherAction::AcceptDefaultLauncherPrompt)
            .expect("accept again");
        assert!(effects.is_empty());
    }
}

//! Synchronization controller for the launcher.
//!
//! [`LauncherController`] owns the observable [`LauncherState`], runs reducer effects against the
//! injected host services, and keeps `selected_apps` in step with the selection store through the
//! [`SelectionSync`] task returned at construction. All state changes go through
//! [`reduce_launcher`]; the controller only executes the effects the reducer asks for.

use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
    future::Future,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
};

use futures::{
    channel::mpsc::{self, UnboundedSender},
    future::{AbortHandle, Abortable, LocalBoxFuture},
    stream::LocalBoxStream,
    FutureExt, StreamExt,
};
use leptos::logging;
use thiserror::Error;

use crate::{
    host::LauncherHostContext,
    installed_apps,
    model::{AppInfo, LauncherState},
    parental_gate::ParentalChallenge,
    persistence::{self, MigrationError, MigrationReport},
    reducer::{reduce_launcher, LauncherAction, LauncherEffect, ReducerError},
    repository::{SelectedAppInfoStream, SelectionError, SelectionRepository},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure of a controller operation.
pub enum LauncherError {
    /// The action is not allowed in the current state.
    #[error(transparent)]
    Reducer(#[from] ReducerError),
    /// The selection store failed.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// The legacy migration failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// A host service failed.
    #[error("host call failed: {0}")]
    Host(String),
}

/// Stream of state snapshots returned by [`LauncherController::subscribe`].
pub type LauncherStateStream = LocalBoxStream<'static, LauncherState>;

struct ControllerInner {
    host: LauncherHostContext,
    repository: SelectionRepository,
    state: RefCell<LauncherState>,
    subscribers: RefCell<Vec<UnboundedSender<LauncherState>>>,
    sync_abort: AbortHandle,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        self.sync_abort.abort();
    }
}

/// Background task applying selection-store emissions to the controller.
///
/// Must be spawned on the owner's local executor. It ends when the last controller handle is
/// dropped.
#[must_use = "selection sync does nothing unless spawned"]
pub struct SelectionSync {
    task: Abortable<LocalBoxFuture<'static, ()>>,
}

impl Future for SelectionSync {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.task.poll_unpin(cx).map(|_| ())
    }
}

#[derive(Clone)]
/// Shared handle to the launcher state and its host-backed operations.
pub struct LauncherController {
    inner: Rc<ControllerInner>,
}

impl LauncherController {
    /// Creates a controller and starts observing the selection store.
    pub fn new(host: LauncherHostContext) -> (Self, SelectionSync) {
        let repository = SelectionRepository::new(host.selected_app_store());
        let observed = repository.observe_selected();
        let (sync_abort, registration) = AbortHandle::new_pair();
        let inner = Rc::new(ControllerInner {
            host,
            repository,
            state: RefCell::new(LauncherState::default()),
            subscribers: RefCell::new(Vec::new()),
            sync_abort,
        });
        let task = run_selection_sync(Rc::downgrade(&inner), observed).boxed_local();
        (
            Self { inner },
            SelectionSync {
                task: Abortable::new(task, registration),
            },
        )
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> LauncherState {
        self.inner.state.borrow().clone()
    }

    /// Returns the last applied installed-app list.
    pub fn available_apps(&self) -> Vec<AppInfo> {
        self.inner.state.borrow().available_apps.clone()
    }

    /// Returns the selected apps.
    pub fn selected_apps(&self) -> Vec<AppInfo> {
        self.inner.state.borrow().selected_apps.clone()
    }

    /// Returns whether an installed-app query is outstanding.
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Returns the host strategy token for diagnostics.
    pub fn host_strategy_name(&self) -> &'static str {
        self.inner.host.host_strategy_name()
    }

    /// Opens a stream of state snapshots, starting with the current one.
    pub fn subscribe(&self) -> LauncherStateStream {
        let (tx, rx) = mpsc::unbounded();
        if tx.unbounded_send(self.state()).is_ok() {
            self.inner.subscribers.borrow_mut().push(tx);
        }
        rx.boxed_local()
    }

    /// Applies `action` immediately and returns a future running its effects.
    pub fn dispatch(
        &self,
        action: LauncherAction,
    ) -> impl Future<Output = Result<(), LauncherError>> + 'static {
        let applied = self.apply(action);
        let controller = self.clone();
        async move { controller.run_effects(applied?).await }
    }

    /// Starts an installed-app query.
    ///
    /// `loading` is raised before this returns; the future settles the query. Results of a query
    /// overtaken by a newer one are discarded.
    pub fn load_available_apps(&self, filter: Option<&str>) -> impl Future<Output = ()> + 'static {
        let pending = self.dispatch(LauncherAction::LoadAvailableApps {
            filter: filter.map(str::to_string),
        });
        async move {
            if let Err(err) = pending.await {
                logging::warn!("load available apps failed: {err}");
            }
        }
    }

    /// Persists `app` as selected and appends it locally.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Selection`] when the store rejects the write; local state is
    /// left untouched.
    pub async fn select_app(&self, app: AppInfo) -> Result<(), LauncherError> {
        self.dispatch(LauncherAction::SelectApp { app }).await
    }

    /// Removes `app` from the selection and from local state.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Selection`] when the store rejects the delete.
    pub async fn deselect_app(&self, app: AppInfo) -> Result<(), LauncherError> {
        self.dispatch(LauncherAction::DeselectApp { app }).await
    }

    /// Starts `package_id`; does nothing when it can no longer be launched.
    pub async fn launch_app(&self, package_id: &str) {
        if let Err(err) = self
            .dispatch(LauncherAction::LaunchApp {
                package_id: package_id.to_string(),
            })
            .await
        {
            logging::warn!("launch {package_id} failed: {err}");
        }
    }

    /// Removes selections whose package the registry no longer reports.
    ///
    /// Returns the number of removed selections.
    ///
    /// # Errors
    ///
    /// Returns an error when the registry or the selection store fails.
    pub async fn prune_stale_selections(&self) -> Result<usize, LauncherError> {
        let registry = self.inner.host.package_registry();
        let installed = registry
            .list_packages()
            .await
            .map_err(LauncherError::Host)?
            .into_iter()
            .map(|package| package.package_id)
            .collect::<HashSet<_>>();

        let mut removed = 0;
        for app in self.inner.repository.list_selected().await? {
            if installed.contains(&app.package_id) {
                continue;
            }
            self.deselect_app(app).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Shows a fresh parental challenge.
    pub fn request_admin_access(&self) {
        self.apply_logged(LauncherAction::RequestAdminAccess {
            challenge: ParentalChallenge::random(),
        });
    }

    /// Answers the active challenge; returns whether admin options are now unlocked.
    ///
    /// A wrong answer replaces the challenge with a new one.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::NoActiveChallenge`] when no challenge is shown.
    pub fn submit_gate_answer(&self, answer: &str) -> Result<bool, LauncherError> {
        self.apply(LauncherAction::SubmitGateAnswer {
            answer: answer.to_string(),
            next_challenge: ParentalChallenge::random(),
        })?;
        Ok(self.inner.state.borrow().admin.is_unlocked())
    }

    /// Closes the challenge without answering.
    pub fn cancel_admin_challenge(&self) {
        self.apply_logged(LauncherAction::CancelAdminChallenge);
    }

    /// Hides admin options.
    pub fn lock_admin(&self) {
        self.apply_logged(LauncherAction::LockAdmin);
    }

    /// Gives up the default-home role.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::AdminLocked`] unless admin options are unlocked, or
    /// [`LauncherError::Host`] when the role service fails.
    pub async fn exit_restricted_mode(&self) -> Result<(), LauncherError> {
        self.dispatch(LauncherAction::ExitRestrictedMode).await
    }

    /// Hides the default-launcher prompt and opens the system home settings.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Host`] when the settings page cannot be opened.
    pub async fn accept_default_launcher_prompt(&self) -> Result<(), LauncherError> {
        self.dispatch(LauncherAction::AcceptDefaultLauncherPrompt).await
    }

    /// Hides the default-launcher prompt.
    pub fn dismiss_default_launcher_prompt(&self) {
        self.apply_logged(LauncherAction::DismissDefaultLauncherPrompt);
    }

    /// Runs the legacy-selection migration and resolves the default-home role.
    pub async fn boot(&self) -> Option<MigrationReport> {
        let prefs = self.inner.host.prefs_store();
        let registry = self.inner.host.package_registry();
        let report = match persistence::migrate_legacy_selection(
            prefs.as_ref(),
            registry.as_ref(),
            &self.inner.repository,
        )
        .await
        {
            Ok(Some(report)) => {
                logging::log!(
                    "migrated {} legacy selections, skipped {} uninstalled",
                    report.migrated.len(),
                    report.skipped_uninstalled.len()
                );
                Some(report)
            }
            Ok(None) => None,
            Err(err) => {
                logging::warn!("legacy selection migration failed: {err}");
                None
            }
        };
        self.refresh_default_launcher().await;
        report
    }

    /// Re-queries whether this launcher is the default home screen.
    pub async fn refresh_default_launcher(&self) {
        let action = if self.inner.host.capabilities().launcher_role.is_available() {
            let role = self.inner.host.launcher_role();
            match role.is_default_home().await {
                Ok(is_default) => LauncherAction::DefaultLauncherResolved { is_default },
                Err(err) => {
                    logging::warn!("default launcher query failed: {err}");
                    LauncherAction::DefaultLauncherUnavailable
                }
            }
        } else {
            LauncherAction::DefaultLauncherUnavailable
        };
        self.apply_logged(action);
    }

    fn apply(&self, action: LauncherAction) -> Result<Vec<LauncherEffect>, ReducerError> {
        let (effects, changed) = {
            let mut state = self.inner.state.borrow_mut();
            let previous = state.clone();
            let effects = reduce_launcher(&mut state, action)?;
            let changed = (*state != previous).then(|| state.clone());
            (effects, changed)
        };
        if let Some(snapshot) = changed {
            self.publish(snapshot);
        }
        Ok(effects)
    }

    fn apply_logged(&self, action: LauncherAction) {
        if let Err(err) = self.apply(action) {
            logging::warn!("launcher reducer error: {err}");
        }
    }

    fn publish(&self, snapshot: LauncherState) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
    }

    async fn run_effects(&self, effects: Vec<LauncherEffect>) -> Result<(), LauncherError> {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            queue.extend(self.run_effect(effect).await?);
        }
        Ok(())
    }

    async fn run_effect(
        &self,
        effect: LauncherEffect,
    ) -> Result<Vec<LauncherEffect>, LauncherError> {
        let follow_up = match effect {
            LauncherEffect::QueryInstalledApps { ticket, filter } => {
                let registry = self.inner.host.package_registry();
                match installed_apps::query_installed_apps(registry.as_ref(), filter.as_deref())
                    .await
                {
                    Ok(apps) => LauncherAction::AvailableAppsLoaded { ticket, apps },
                    Err(err) => {
                        logging::warn!("installed app query failed: {err}");
                        LauncherAction::AvailableAppsLoadFailed { ticket }
                    }
                }
            }
            LauncherEffect::PersistSelection { app } => {
                if let Err(err) = self.inner.repository.add(&app).await {
                    logging::warn!("select app persist failed: {err}");
                    return Err(err.into());
                }
                LauncherAction::SelectionPersisted { app }
            }
            LauncherEffect::PersistDeselection { app } => {
                if let Err(err) = self.inner.repository.remove(&app).await {
                    logging::warn!("deselect app persist failed: {err}");
                    return Err(err.into());
                }
                LauncherAction::DeselectionPersisted {
                    package_id: app.package_id,
                }
            }
            LauncherEffect::LaunchPackage { package_id } => {
                self.launch_package(&package_id).await;
                return Ok(Vec::new());
            }
            LauncherEffect::OpenHomeSettings => {
                let role = self.inner.host.launcher_role();
                role.open_home_settings().await.map_err(|err| {
                    logging::warn!("open home settings failed: {err}");
                    LauncherError::Host(err)
                })?;
                return Ok(Vec::new());
            }
            LauncherEffect::ClearDefaultHome => {
                let role = self.inner.host.launcher_role();
                role.clear_default_home().await.map_err(|err| {
                    logging::warn!("clear default home failed: {err}");
                    LauncherError::Host(err)
                })?;
                return Ok(Vec::new());
            }
        };
        Ok(self.apply(follow_up)?)
    }

    async fn launch_package(&self, package_id: &str) {
        if !self.inner.host.capabilities().package_launch.is_available() {
            logging::debug_warn!("package launch unavailable; ignoring {package_id}");
            return;
        }
        let registry = self.inner.host.package_registry();
        let entry = match registry.resolve_launch_entry(package_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                logging::debug_warn!("no launch entry for {package_id}");
                return;
            }
            Err(err) => {
                logging::warn!("launch entry lookup for {package_id} failed: {err}");
                return;
            }
        };
        if let Err(err) = registry.launch(&entry).await {
            logging::warn!("launch {package_id} failed: {err}");
        }
    }

    async fn apply_observed(&self, snapshot: Result<Vec<AppInfo>, SelectionError>) {
        match snapshot {
            Ok(apps) => {
                let registry = self.inner.host.package_registry();
                let apps = installed_apps::hydrate_icons(registry.as_ref(), apps).await;
                self.apply_logged(LauncherAction::SelectedAppsObserved { apps });
            }
            Err(err) => logging::warn!("selected apps observation failed: {err}"),
        }
    }
}

async fn run_selection_sync(
    controller: Weak<ControllerInner>,
    mut observed: SelectedAppInfoStream,
) {
    while let Some(snapshot) = observed.next().await {
        let Some(inner) = controller.upgrade() else {
            break;
        };
        LauncherController { inner }.apply_observed(snapshot).await;
    }
}

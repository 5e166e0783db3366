//! Launcher UI composition: restricted home grid, parental gate, app picker, and the
//! default-launcher prompt.

use futures::StreamExt;
use leptos::*;
use platform_host::{HostServices, IconHandle};

use crate::{
    controller::LauncherController,
    host::LauncherHostContext,
    model::{picker_sections, AdminAccess, AppInfo, LauncherState},
};

/// Image source used for apps without a resolvable icon.
pub const FALLBACK_ICON_SRC: &str = "/assets/kiddo/app-fallback.svg";

/// Returns the `<img src>` for an app icon.
pub fn icon_src(icon: Option<&IconHandle>) -> String {
    match icon {
        Some(icon) if !icon.is_fallback() => icon.as_str().to_string(),
        _ => FALLBACK_ICON_SRC.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Screen currently shown by [`LauncherShell`].
pub enum LauncherRoute {
    /// Restricted grid of selected apps.
    #[default]
    Home,
    /// Admin app picker.
    Picker,
}

#[derive(Clone, Copy)]
/// Leptos context for reading launcher state and forwarding user intents.
pub struct LauncherRuntimeContext {
    /// Shared controller.
    pub controller: StoredValue<LauncherController>,
    /// Reactive mirror of the controller state.
    pub state: RwSignal<LauncherState>,
    /// Active screen.
    pub route: RwSignal<LauncherRoute>,
}

impl LauncherRuntimeContext {
    /// Starts an installed-app query.
    pub fn load_available_apps(&self, filter: Option<String>) {
        spawn_local(
            self.controller
                .get_value()
                .load_available_apps(filter.as_deref()),
        );
    }

    /// Adds or removes `app` from the selection.
    pub fn toggle_app(&self, app: AppInfo, select: bool) {
        let controller = self.controller.get_value();
        spawn_local(async move {
            let package_id = app.package_id.clone();
            let result = if select {
                controller.select_app(app).await
            } else {
                controller.deselect_app(app).await
            };
            if let Err(err) = result {
                logging::warn!("toggle {package_id} failed: {err}");
            }
        });
    }

    /// Launches a selected app.
    pub fn launch_app(&self, package_id: String) {
        let controller = self.controller.get_value();
        spawn_local(async move { controller.launch_app(&package_id).await });
    }

    /// Shows the parental gate.
    pub fn request_admin_access(&self) {
        self.controller.get_value().request_admin_access();
    }

    /// Answers the parental gate; returns whether admin options unlocked.
    pub fn submit_gate_answer(&self, answer: &str) -> bool {
        match self.controller.get_value().submit_gate_answer(answer) {
            Ok(unlocked) => unlocked,
            Err(err) => {
                logging::warn!("gate answer rejected: {err}");
                false
            }
        }
    }

    /// Closes the parental gate.
    pub fn cancel_admin_challenge(&self) {
        self.controller.get_value().cancel_admin_challenge();
    }

    /// Hides admin options.
    pub fn lock_admin(&self) {
        self.controller.get_value().lock_admin();
    }

    /// Opens the picker; ignored unless admin options are unlocked.
    pub fn open_picker(&self) {
        if !self.state.get_untracked().admin.is_unlocked() {
            logging::debug_warn!("picker requested while admin is locked");
            return;
        }
        self.route.set(LauncherRoute::Picker);
    }

    /// Leaves the picker, relocks admin options, and prunes uninstalled selections.
    pub fn close_picker(&self) {
        let controller = self.controller.get_value();
        controller.lock_admin();
        self.route.set(LauncherRoute::Home);
        spawn_local(async move {
            match controller.prune_stale_selections().await {
                Ok(0) => {}
                Ok(removed) => logging::log!("pruned {removed} stale selections"),
                Err(err) => logging::warn!("prune stale selections failed: {err}"),
            }
        });
    }

    /// Gives up the default-home role.
    pub fn exit_restricted_mode(&self) {
        let controller = self.controller.get_value();
        spawn_local(async move {
            if let Err(err) = controller.exit_restricted_mode().await {
                logging::warn!("exit restricted mode failed: {err}");
            }
        });
    }

    /// Opens the system default-home settings.
    pub fn accept_default_launcher_prompt(&self) {
        let controller = self.controller.get_value();
        spawn_local(async move {
            if let Err(err) = controller.accept_default_launcher_prompt().await {
                logging::warn!("open home settings failed: {err}");
            }
        });
    }

    /// Hides the default-launcher prompt.
    pub fn dismiss_default_launcher_prompt(&self) {
        self.controller.get_value().dismiss_default_launcher_prompt();
    }
}

#[component]
/// Provides [`LauncherRuntimeContext`] to descendant components and boots persisted state.
pub fn LauncherProvider(
    /// Injected host bundle assembled by the entry layer.
    host_services: HostServices,
    children: Children,
) -> impl IntoView {
    let (controller, sync) = LauncherController::new(LauncherHostContext::new(host_services));
    let state = create_rw_signal(controller.state());
    let route = create_rw_signal(LauncherRoute::Home);

    spawn_local(sync);

    let mut snapshots = controller.subscribe();
    spawn_local(async move {
        while let Some(snapshot) = snapshots.next().await {
            if state.try_set(snapshot).is_some() {
                break;
            }
        }
    });

    let boot_controller = controller.clone();
    spawn_local(async move {
        boot_controller.boot().await;
    });

    provide_context(LauncherRuntimeContext {
        controller: store_value(controller),
        state,
        route,
    });

    children().into_view()
}

/// Returns the current [`LauncherRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`LauncherProvider`].
pub fn use_launcher_runtime() -> LauncherRuntimeContext {
    use_context::<LauncherRuntimeContext>().expect("LauncherRuntimeContext not provided")
}

#[component]
/// Top-level launcher surface switching between the home grid and the picker.
pub fn LauncherShell() -> impl IntoView {
    let runtime = use_launcher_runtime();

    view! {
        <main class="kiddo-launcher">
            {move || match runtime.route.get() {
                LauncherRoute::Home => view! { <HomeScreen /> }.into_view(),
                LauncherRoute::Picker => view! { <AppPickerScreen /> }.into_view(),
            }}
            <DefaultLauncherPrompt />
        </main>
    }
}

#[component]
/// Restricted grid of selected apps with the parent settings entry point.
pub fn HomeScreen() -> impl IntoView {
    let runtime = use_launcher_runtime();
    let state = runtime.state;

    view! {
        <section class="kiddo-home" aria-label="Allowed apps">
            <header class="kiddo-home-bar">
                <button
                    class="kiddo-settings-button"
                    aria-label="Parent settings"
                    on:click=move |_| runtime.request_admin_access()
                >
                    "⚙"
                </button>
            </header>
            <ul class="kiddo-app-grid" role="list">
                <For
                    each=move || state.get().selected_apps
                    key=|app| app.package_id.clone()
                    let:app
                >
                    <AppTile app />
                </For>
            </ul>
            <Show when=move || state.get().selected_apps.is_empty() fallback=|| ()>
                <p class="kiddo-empty">"No apps yet. Ask a parent to add some."</p>
            </Show>
            <ParentalGateDialog />
            <AdminOptionsDialog />
        </section>
    }
}

#[component]
fn AppTile(app: AppInfo) -> impl IntoView {
    let runtime = use_launcher_runtime();
    let src = icon_src(app.icon.as_ref());
    let package_id = app.package_id.clone();

    view! {
        <li class="kiddo-app-tile">
            <button
                aria-label=app.name.clone()
                on:click=move |_| runtime.launch_app(package_id.clone())
            >
                <img class="kiddo-app-icon" src=src alt="" />
                <span class="kiddo-app-name">{app.name}</span>
            </button>
        </li>
    }
}

#[component]
/// Arithmetic challenge shown before admin options.
pub fn ParentalGateDialog() -> impl IntoView {
    let runtime = use_launcher_runtime();
    let answer = create_rw_signal(String::new());
    let challenge = create_memo(move |_| runtime.state.get().admin.active_challenge());
    let failed_attempts = move || match runtime.state.get().admin {
        AdminAccess::Challenge {
            failed_attempts, ..
        } => failed_attempts,
        _ => 0,
    };
    let submit = move || {
        runtime.submit_gate_answer(&answer.get_untracked());
        answer.set(String::new());
    };

    view! {
        <Show when=move || challenge.get().is_some() fallback=|| ()>
            <div class="kiddo-dialog-backdrop">
                <section
                    class="kiddo-dialog"
                    role="dialog"
                    aria-modal="true"
                    aria-labelledby="kiddo-gate-title"
                >
                    <h2 id="kiddo-gate-title">"Parents only"</h2>
                    <form on:submit=move |ev: ev::SubmitEvent| {
                        ev.prevent_default();
                        submit();
                    }>
                        <p id="kiddo-gate-prompt">
                            {move || challenge.get().map(|c| c.prompt()).unwrap_or_default()}
                        </p>
                        <input
                            aria-labelledby="kiddo-gate-prompt"
                            type="text"
                            inputmode="numeric"
                            autocomplete="off"
                            prop:value=move || answer.get()
                            on:input=move |ev| answer.set(event_target_value(&ev))
                        />
                        <Show when=move || { failed_attempts() > 0 } fallback=|| ()>
                            <p class="kiddo-gate-error" role="alert">
                                "Wrong answer, try again."
                            </p>
                        </Show>
                        <div class="kiddo-dialog-actions">
                            <button
                                type="button"
                                on:click=move |_| runtime.cancel_admin_challenge()
                            >
                                "Cancel"
                            </button>
                            <button type="submit">"Submit"</button>
                        </div>
                    </form>
                </section>
            </div>
        </Show>
    }
}

#[component]
fn AdminOptionsDialog() -> impl IntoView {
    let runtime = use_launcher_runtime();

    view! {
        <Show when=move || runtime.state.get().admin.is_unlocked() fallback=|| ()>
            <div class="kiddo-dialog-backdrop">
                <section
                    class="kiddo-dialog"
                    role="dialog"
                    aria-modal="true"
                    aria-label="Parent options"
                >
                    <button on:click=move |_| runtime.open_picker()>"Add App"</button>
                    <button on:click=move |_| runtime.exit_restricted_mode()>
                        "Exit Baby Mode"
                    </button>
                    <button on:click=move |_| runtime.lock_admin()>"Close"</button>
                </section>
            </div>
        </Show>
    }
}

#[component]
/// Admin screen for choosing which apps appear in restricted mode.
pub fn AppPickerScreen() -> impl IntoView {
    let runtime = use_launcher_runtime();
    let state = runtime.state;
    let query = create_rw_signal(String::new());
    let sections = create_memo(move |_| {
        let state = state.get();
        picker_sections(&state.available_apps, &state.selected_apps, &query.get())
    });

    create_effect(move |_| {
        let filter = query.get();
        runtime.load_available_apps(Some(filter).filter(|filter| !filter.is_empty()));
    });

    view! {
        <section class="kiddo-picker" aria-label="Choose apps">
            <header class="kiddo-picker-bar">
                <input
                    type="search"
                    placeholder="Search apps"
                    aria-label="Search apps"
                    prop:value=move || query.get()
                    on:input=move |ev| query.set(event_target_value(&ev))
                />
            </header>
            <Show when=move || state.get().loading fallback=|| ()>
                <p class="kiddo-loading" role="status">"Loading apps…"</p>
            </Show>
            <PickerSection
                title="Selected Apps"
                apps=Signal::derive(move || sections.get().selected)
                selected=true
            />
            <PickerSection
                title="Unselected Apps"
                apps=Signal::derive(move || sections.get().unselected)
                selected=false
            />
            <Show when=move || !state.get().loading && sections.get().is_empty() fallback=|| ()>
                <p class="kiddo-empty">"No apps found"</p>
            </Show>
            <footer class="kiddo-picker-footer">
                <button class="kiddo-done" on:click=move |_| runtime.close_picker()>
                    "Done"
                </button>
            </footer>
        </section>
    }
}

#[component]
fn PickerSection(title: &'static str, apps: Signal<Vec<AppInfo>>, selected: bool) -> impl IntoView {
    view! {
        <Show when=move || !apps.get().is_empty() fallback=|| ()>
            <section class="kiddo-picker-section">
                <h2>{title}</h2>
                <ul role="list">
                    <For each=move || apps.get() key=|app| app.package_id.clone() let:app>
                        <PickerRow app selected />
                    </For>
                </ul>
            </section>
        </Show>
    }
}

#[component]
fn PickerRow(app: AppInfo, selected: bool) -> impl IntoView {
    let runtime = use_launcher_runtime();
    let src = icon_src(app.icon.as_ref());
    let name = app.name.clone();
    let label = if selected { "Remove" } else { "Add" };
    let app = store_value(app);

    view! {
        <li class="kiddo-picker-row">
            <img class="kiddo-app-icon" src=src alt="" />
            <span class="kiddo-app-name">{name}</span>
            <button
                aria-pressed=selected.to_string()
                on:click=move |_| runtime.toggle_app(app.get_value(), !selected)
            >
                {label}
            </button>
        </li>
    }
}

#[component]
/// Bottom sheet asking to make this launcher the default home screen.
pub fn DefaultLauncherPrompt() -> impl IntoView {
    let runtime = use_launcher_runtime();

    view! {
        <Show
            when=move || runtime.state.get().default_launcher.prompt_visible()
            fallback=|| ()
        >
            <aside class="kiddo-bottom-sheet" role="dialog" aria-labelledby="kiddo-default-title">
                <h2 id="kiddo-default-title">"Make Kiddo Guard your home screen"</h2>
                <p>"Restricted mode only holds while this launcher is the default home app."</p>
                <div class="kiddo-dialog-actions">
                    <button on:click=move |_| runtime.dismiss_default_launcher_prompt()>
                        "Not Now"
                    </button>
                    <button on:click=move |_| runtime.accept_default_launcher_prompt()>
                        "Set as Default"
                    </button>
                </div>
            </aside>
        </Show>
    }
}

/// Mounts the launcher into the document body.
#[cfg(all(feature = "csr", target_arch = "wasm32"))]
pub fn mount_launcher(host_services: HostServices) {
    mount_to_body(move || {
        view! {
            <LauncherProvider host_services>
                <LauncherShell />
            </LauncherProvider>
        }
    });
}

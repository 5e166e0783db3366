//! Native entry point for the kid-mode launcher.
//!
//! Each invocation boots a [`LauncherController`] over an injected [`HostServices`] bundle (the
//! `kiddo` binary passes the durable native one), runs a single command, and returns the lines to
//! print. Selection changes go through the controller, so they land in the selection store before
//! the process exits.

use futures::{executor::LocalPool, task::LocalSpawnExt};
use kiddo_runtime::{AppInfo, LauncherController, LauncherHostContext};
use platform_host::HostServices;

/// Usage text printed by `kiddo help`.
pub const USAGE: &str = "\
Usage: kiddo <command> [args]

Commands:
  apps [query]          List launchable apps, [x] marks allowed ones
  selected              List the allowed apps
  select <package-id>   Allow an installed app
  deselect <package-id> Remove an app from the allowed set
  launch <package-id>   Start an allowed app
  prune                 Drop allowed apps that are no longer installed
  help                  Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One parsed `kiddo` invocation.
pub enum CliCommand {
    /// List installed apps, optionally filtered by name.
    Apps {
        /// Case-insensitive name query.
        filter: Option<String>,
    },
    /// List selected apps.
    Selected,
    /// Select an installed app.
    Select {
        /// Package to select.
        package_id: String,
    },
    /// Deselect an app.
    Deselect {
        /// Package to deselect.
        package_id: String,
    },
    /// Launch a selected app.
    Launch {
        /// Package to launch.
        package_id: String,
    },
    /// Remove selections that are no longer installed.
    Prune,
    /// Print usage.
    Help,
}

/// Parses command-line arguments (program name excluded).
///
/// # Errors
///
/// Returns a message for unknown commands or wrong argument counts.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliCommand, String> {
    let mut args = args.into_iter();
    let Some(cmd) = args.next() else {
        return Ok(CliCommand::Help);
    };
    let rest = args.collect::<Vec<_>>();

    match cmd.as_str() {
        "apps" => Ok(CliCommand::Apps {
            filter: (!rest.is_empty()).then(|| rest.join(" ")),
        }),
        "selected" => no_args(&cmd, &rest, CliCommand::Selected),
        "select" => Ok(CliCommand::Select {
            package_id: single_package_id(&cmd, rest)?,
        }),
        "deselect" => Ok(CliCommand::Deselect {
            package_id: single_package_id(&cmd, rest)?,
        }),
        "launch" => Ok(CliCommand::Launch {
            package_id: single_package_id(&cmd, rest)?,
        }),
        "prune" => no_args(&cmd, &rest, CliCommand::Prune),
        "help" | "--help" | "-h" => Ok(CliCommand::Help),
        other => Err(format!("unknown command: {other}")),
    }
}

fn no_args(cmd: &str, rest: &[String], command: CliCommand) -> Result<CliCommand, String> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(format!("`{cmd}` takes no arguments"))
    }
}

fn single_package_id(cmd: &str, rest: Vec<String>) -> Result<String, String> {
    match <[String; 1]>::try_from(rest) {
        Ok([package_id]) => Ok(package_id),
        Err(_) => Err(format!("usage: kiddo {cmd} <package-id>")),
    }
}

/// Boots the launcher over `services` and runs `command`.
///
/// Boot includes the one-time legacy selection migration.
///
/// # Errors
///
/// Returns a message when the command fails or refers to an unknown app.
pub fn run(services: HostServices, command: CliCommand) -> Result<Vec<String>, String> {
    if command == CliCommand::Help {
        return Ok(USAGE.lines().map(str::to_string).collect());
    }

    let mut pool = LocalPool::new();
    let (controller, sync) = LauncherController::new(LauncherHostContext::new(services));
    pool.spawner()
        .spawn_local(sync)
        .map_err(|err| format!("failed to start selection sync: {err}"))?;

    pool.run_until(controller.boot());
    pool.run_until_stalled();
    let output = pool.run_until(execute(&controller, command));
    pool.run_until_stalled();
    output
}

async fn execute(
    controller: &LauncherController,
    command: CliCommand,
) -> Result<Vec<String>, String> {
    match command {
        CliCommand::Apps { filter } => {
            controller.load_available_apps(filter.as_deref()).await;
            let state = controller.state();
            Ok(state
                .available_apps
                .iter()
                .map(|app| app_line(app, state.is_selected(&app.package_id)))
                .collect())
        }
        CliCommand::Selected => Ok(controller
            .selected_apps()
            .iter()
            .map(|app| app_line(app, true))
            .collect()),
        CliCommand::Select { package_id } => {
            controller.load_available_apps(None).await;
            let app = controller
                .available_apps()
                .into_iter()
                .find(|app| app.package_id == package_id)
                .ok_or_else(|| format!("{package_id} is not an installed app"))?;
            let name = app.name.clone();
            controller
                .select_app(app)
                .await
                .map_err(|err| err.to_string())?;
            Ok(vec![format!("selected {package_id} ({name})")])
        }
        CliCommand::Deselect { package_id } => {
            let app = controller
                .selected_apps()
                .into_iter()
                .find(|app| app.package_id == package_id)
                .ok_or_else(|| format!("{package_id} is not selected"))?;
            controller
                .deselect_app(app)
                .await
                .map_err(|err| err.to_string())?;
            Ok(vec![format!("deselected {package_id}")])
        }
        CliCommand::Launch { package_id } => {
            if !controller.state().is_selected(&package_id) {
                return Err(format!("{package_id} is not an allowed app"));
            }
            controller.launch_app(&package_id).await;
            Ok(vec![format!("launch requested for {package_id}")])
        }
        CliCommand::Prune => {
            let removed = controller
                .prune_stale_selections()
                .await
                .map_err(|err| err.to_string())?;
            Ok(vec![format!("pruned {removed} stale selections")])
        }
        CliCommand::Help => Ok(USAGE.lines().map(str::to_string).collect()),
    }
}

fn app_line(app: &AppInfo, selected: bool) -> String {
    let mark = if selected { "[x]" } else { "[ ]" };
    format!("{mark} {}\t{}", app.package_id, app.name)
}

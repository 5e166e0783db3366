use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use kiddo_cli::{run, CliCommand};
use platform_host_native::{build_host_services, ApplicationDir, NativeHostConfig};
use pretty_assertions::assert_eq;

struct TempRoot(PathBuf);

impl TempRoot {
    fn new(label: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir()
            .join(format!("kiddo_cli_{label}_{}_{}", process::id(), now));
        fs::create_dir_all(&path).expect("create temp dir");
        Self(path)
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn config(root: &TempRoot) -> NativeHostConfig {
    let applications = root.0.join("applications");
    fs::create_dir_all(&applications).expect("create applications dir");
    fs::write(
        applications.join("org.kids.paint.desktop"),
        "[Desktop Entry]\nType=Application\nName=Paint\nExec=true %f\n",
    )
    .expect("write entry");
    NativeHostConfig {
        data_dir: root.0.join("data"),
        application_dirs: vec![ApplicationDir::user(applications)],
        icon_dirs: Vec::new(),
    }
}

fn run_native(config: &NativeHostConfig, command: CliCommand) -> Result<Vec<String>, String> {
    run(build_host_services(config)?, command)
}

#[test]
fn selection_survives_across_invocations() {
    let root = TempRoot::new("durable");
    let config = config(&root);

    run_native(
        &config,
        CliCommand::Select {
            package_id: "org.kids.paint".to_string(),
        },
    )
    .expect("select");

    assert_eq!(
        run_native(&config, CliCommand::Selected).expect("selected"),
        vec!["[x] org.kids.paint\tPaint".to_string()]
    );
    assert!(config.database_path().is_file());
}

#[test]
fn uninstalled_selection_is_pruned_on_a_later_run() {
    let root = TempRoot::new("prune");
    let config = config(&root);
    run_native(
        &config,
        CliCommand::Select {
            package_id: "org.kids.paint".to_string(),
        },
    )
    .expect("select");

    fs::remove_file(root.0.join("applications/org.kids.paint.desktop")).expect("uninstall");

    assert_eq!(
        run_native(&config, CliCommand::Prune).expect("prune"),
        vec!["pruned 1 stale selections".to_string()]
    );
    assert_eq!(
        run_native(&config, CliCommand::Selected).expect("selected"),
        Vec::<String>::new()
    );
}

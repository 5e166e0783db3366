//! `kiddo` binary: runs one launcher command against the native host.

use std::env;
use std::process::ExitCode;

use kiddo_cli::{parse_args, run, CliCommand, USAGE};
use platform_host_native::{build_host_services, NativeHostConfig};

fn main() -> ExitCode {
    let command = match parse_args(env::args().skip(1)) {
        Ok(CliCommand::Help) => {
            eprintln!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let result = NativeHostConfig::from_env()
        .and_then(|config| build_host_services(&config))
        .and_then(|services| run(services, command));

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

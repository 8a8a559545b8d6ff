//! ShipThat Launcher
//!
//! Updates the installed application from its GitHub releases, then starts it.

use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use shipthat_launcher::app::{self, RunOptions, UpdateOutcome};
use shipthat_launcher::github::{GithubClient, DEFAULT_API_BASE};
use shipthat_launcher::logging::{init_logger, log_error, log_info};
use shipthat_launcher::paths::{launcher_dir, launcher_file_name, CONFIG_FILE_NAME};
use shipthat_launcher::LauncherError;

#[derive(Parser, Debug)]
#[command(name = "launcher", version, about = "Update from GitHub releases, then launch")]
struct Cli {
    /// Settings file (default: config.json beside the launcher)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory updated in place (default: the launcher's directory)
    #[arg(long, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    /// Own filename, never deleted or overwritten (default: running executable's name)
    #[arg(long, value_name = "NAME")]
    launcher_name: Option<String>,

    /// Release API base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Launch without checking for updates
    #[arg(long)]
    skip_update: bool,

    /// Exit immediately on failure instead of waiting for Enter
    #[arg(long)]
    non_interactive: bool,
}

fn resolve_options(cli: &Cli) -> Result<RunOptions, LauncherError> {
    let base = match (&cli.config, &cli.install_dir) {
        (Some(_), Some(_)) => None,
        _ => Some(launcher_dir()?),
    };
    let base_dir = || base.clone().unwrap_or_default();

    Ok(RunOptions {
        config_path: cli
            .config
            .clone()
            .unwrap_or_else(|| base_dir().join(CONFIG_FILE_NAME)),
        install_dir: cli.install_dir.clone().unwrap_or_else(base_dir),
        launcher_name: cli.launcher_name.clone().unwrap_or_else(launcher_file_name),
        skip_update: cli.skip_update,
    })
}

fn wait_for_acknowledgement() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger();

    let result = resolve_options(&cli).and_then(|opts| {
        let client = GithubClient::new(&cli.api_base);
        app::run(&opts, &client)
    });

    match result {
        Ok(report) => {
            match report.update {
                UpdateOutcome::Installed { release, .. } => log_info(&format!("Updated to {}", release)),
                UpdateOutcome::Unavailable { reason } => log_info(&format!("Update skipped: {}", reason)),
                UpdateOutcome::UpToDate | UpdateOutcome::Skipped => {}
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error(&e.to_string());
            if !cli.non_interactive {
                wait_for_acknowledgement();
            }
            ExitCode::FAILURE
        }
    }
}

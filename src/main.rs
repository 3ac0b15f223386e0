//! gamingfix - main entry point
//!
//! Wires the production collaborators (PowerShell, winget) into the engine and
//! maps run-aborting failures to a non-zero exit code. Degraded runs still
//! exit 0.

use std::process::ExitCode;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use gamingfix::cli::Cli;
use gamingfix::logging::{self, LogConfig};
use gamingfix::{
    Collaborators, Engine, EngineConfig, PowerShell, ReconcileError, RunSummary, SystemElevation,
    SystemRunner, WingetClient,
};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(&LogConfig::default());
    info!("gamingfix {} starting", env!("CARGO_PKG_VERSION"));
    debug!("CLI arguments parsed: {:?}", cli);

    // Child processes receive the same console interrupt and end on their own
    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Interrupted; stopping before the run completes");
        std::process::exit(130);
    }) {
        warn!("Failed to install interrupt handler: {}", e);
    }

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ReconcileError>() {
                Some(fatal) => print_fatal(fatal),
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let runner = SystemRunner;
    let powershell = PowerShell::new(&runner);
    let elevation = SystemElevation::new(&runner);
    let winget = WingetClient::new(&runner);

    let engine = Engine::new(
        EngineConfig::new(cli.include_legacy_console_companion),
        Collaborators {
            elevation: &elevation,
            packages: &powershell,
            registration: &powershell,
            installer: &winget,
            services: &powershell,
        },
    );

    engine.run().context("Reconciliation aborted")
}

/// Print a terminating error with the action the user has to take.
fn print_fatal(err: &ReconcileError) {
    eprint!("{}", fatal_message(err));
}

fn fatal_message(err: &ReconcileError) -> String {
    let body = match err {
        ReconcileError::NotElevated => "ERROR: Administrator privileges required\n   \
             Package registration and service configuration need an\n   \
             elevated session.\n\n   \
             Solution: right-click your terminal, choose \"Run as administrator\",\n   \
             then run gamingfix again.\n"
            .to_string(),
        ReconcileError::ClientMissing { client, hint } => format!(
            "ERROR: {} is required to install missing components\n\n   \
             Solution: {}, then run gamingfix again.\n",
            client, hint
        ),
        other => format!("ERROR: {}\n", other),
    };
    format!("\n{}\n", body)
}

//! Privilege Guard
//!
//! Verifies the process runs elevated before anything else happens. Package
//! registration for all users and service configuration both need
//! administrator rights, and elevation cannot be acquired from inside the
//! process, so a failed check ends the run.

use tracing::{debug, info};

use crate::command_runner::CommandRunner;
use crate::error::{ReconcileError, Result};
#[cfg(windows)]
use crate::powershell::{PowerShell, commands::TestElevation};

/// Elevation check primitive. Pure query, no side effects.
pub trait ElevationCheck {
    fn is_elevated(&self) -> bool;
}

/// Host elevation check.
///
/// On Windows this asks PowerShell whether the current principal holds the
/// Administrator role; elsewhere it checks for EUID 0.
pub struct SystemElevation<'a> {
    #[cfg_attr(not(windows), allow(dead_code))]
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemElevation<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl ElevationCheck for SystemElevation<'_> {
    #[cfg(windows)]
    fn is_elevated(&self) -> bool {
        match PowerShell::new(self.runner).run(&TestElevation) {
            Ok(out) => parse_principal_check(&out.stdout),
            Err(e) => {
                debug!("Elevation check could not run: {}", e);
                false
            }
        }
    }

    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }
}

/// Interpret the `IsInRole` output; anything but `True` means not elevated.
pub fn parse_principal_check(stdout: &str) -> bool {
    stdout.trim().eq_ignore_ascii_case("true")
}

/// Fail with `NotElevated` unless the check passes.
pub fn require_elevation(check: &dyn ElevationCheck) -> Result<()> {
    debug!("Checking for administrator privileges...");
    if !check.is_elevated() {
        return Err(ReconcileError::NotElevated);
    }
    info!("Running with administrator privileges");
    Ok(())
}

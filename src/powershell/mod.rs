//! PowerShell-backed system primitives.
//!
//! Cmdlet invocations are typed: each struct in [`commands`] implements
//! [`PowerShellCommand`] and produces the exact script text that runs. The
//! struct definition is the contract; names are validated and quoted before
//! they are spliced into a script.
//!
//! [`PowerShell`] executes those commands through a [`CommandRunner`] and
//! implements the collaborator traits the engine consumes (see [`host`]).

pub mod commands;
pub mod host;

use tracing::debug;

use crate::command_runner::{CommandOutput, CommandRunner};
use crate::error::{ReconcileError, Result};

/// Executable used for every cmdlet.
pub const POWERSHELL_EXE: &str = "powershell.exe";

/// Trait for typed PowerShell invocations.
///
/// - `to_script()`: the script passed to `-Command`, exactly as it runs.
/// - `cmdlet()`: the primary cmdlet, used in logs and error context.
pub trait PowerShellCommand {
    fn to_script(&self) -> String;
    fn cmdlet(&self) -> &'static str;
}

/// Runs [`PowerShellCommand`]s non-interactively.
pub struct PowerShell<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> PowerShell<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Full argument vector for `powershell.exe`.
    pub fn args_for(command: &dyn PowerShellCommand) -> Vec<String> {
        vec![
            "-NoLogo".to_string(),
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-ExecutionPolicy".to_string(),
            "Bypass".to_string(),
            "-Command".to_string(),
            command.to_script(),
        ]
    }

    /// Run a command and capture its output without judging the exit code.
    pub fn run(&self, command: &dyn PowerShellCommand) -> Result<CommandOutput> {
        debug!("PowerShell {}: {}", command.cmdlet(), command.to_script());
        self.runner.run(POWERSHELL_EXE, &Self::args_for(command))
    }

    /// Run a command and fail on a non-zero exit.
    pub fn run_checked(&self, command: &dyn PowerShellCommand) -> Result<CommandOutput> {
        let output = self.run(command)?;
        output.ensure_success(command.cmdlet())?;
        Ok(output)
    }
}

/// Reject names that could break out of a quoted PowerShell string.
///
/// Package family names and service names only use ASCII alphanumerics,
/// `.`, `-` and `_`.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(name)
    } else {
        Err(ReconcileError::InvalidName(name.to_string()))
    }
}

/// Single-quote a literal for PowerShell (embedded quotes are doubled).
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

//! External process execution.
//!
//! Every external program this tool touches (`powershell.exe`, `winget`) is
//! spawned through a [`CommandRunner`]. [`SystemRunner`] is the production
//! implementation; [`MockRunner`] records invocations and replays canned
//! outputs for tests.
//!
//! Calls block until the child exits. No timeout is applied: a hung installer
//! hangs the run.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{ReconcileError, Result};

/// Trait for spawning a program with arguments and capturing its output.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Output from an external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the program exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
            success: false,
        }
    }

    /// Check if the program succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(ReconcileError::command(format!(
                "{} failed (exit code {}): {}",
                context,
                self.exit_code.unwrap_or(-1),
                self.failure_text()
            )))
        }
    }

    /// Best text to show for a failure: stderr, else stdout.
    pub fn failure_text(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Production runner that spawns the program directly (no intermediate shell).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("spawn: {} {:?}", program, args);

        // stdin is null: every invocation must be non-interactive
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ReconcileError::command(format!("Failed to spawn {}: {}", program, e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };
        debug!(
            "{} exited with {:?} ({} bytes stdout)",
            program,
            result.exit_code,
            result.stdout.len()
        );
        Ok(result)
    }
}

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Test-double runner that records invocations and returns pre-configured responses.
///
/// Responses are consumed in order; once exhausted every call returns an empty
/// successful output.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: RefCell<VecDeque<Result<CommandOutput>>>,
    invocations: RefCell<Vec<Invocation>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<CommandOutput>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Queue one more response.
    pub fn push_response(&self, response: Result<CommandOutput>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.invocations.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::ok("")))
    }
}

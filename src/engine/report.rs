//! Per-unit outcomes of one run.
//!
//! Outcomes are only logged; nothing is persisted between runs.

use strum::Display;
use tracing::{info, warn};

use crate::services::ServiceOutcome;

/// Outcome of reconciling one package component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunResult {
    /// Present before the run; re-registered from its manifest
    #[strum(serialize = "already satisfied")]
    AlreadySatisfied,
    /// Absent, installed, and visible to a fresh inspection
    #[strum(serialize = "installed")]
    Installed,
    /// The install ran but a fresh inspection still finds nothing
    #[strum(serialize = "install unverified")]
    InstallUnverified,
    /// Absent and there is no source to install it from
    #[strum(serialize = "missing, no install source")]
    InstallSkippedNoSource,
    /// The registration primitive failed on an existing manifest
    #[strum(serialize = "registration failed")]
    RegisterFailed,
    /// Present, but no record had a manifest on disk
    #[strum(serialize = "no registerable manifest")]
    RegisterSkippedNoManifest,
}

impl RunResult {
    /// Whether the component reached the desired state this run.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::AlreadySatisfied | Self::Installed)
    }
}

/// Outcome of one redistributable install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedistOutcome {
    /// The client exited successfully
    Completed,
    /// The client ran and exited non-zero
    ExitedWithError(Option<i32>),
    /// The client could not be run
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub components: Vec<(&'static str, RunResult)>,
    pub services: Vec<(&'static str, ServiceOutcome)>,
    pub redistributables: Vec<(&'static str, RedistOutcome)>,
}

impl RunSummary {
    /// Units that did not reach the desired state.
    pub fn degraded_count(&self) -> usize {
        let components = self
            .components
            .iter()
            .filter(|(_, r)| !r.is_satisfied())
            .count();
        let services = self
            .services
            .iter()
            .filter(|(_, o)| matches!(o, ServiceOutcome::NotFound | ServiceOutcome::Failed(_)))
            .count();
        let redists = self
            .redistributables
            .iter()
            .filter(|(_, o)| *o != RedistOutcome::Completed)
            .count();
        components + services + redists
    }

    pub fn log(&self) {
        info!("==== Summary ====");
        for (label, result) in &self.components {
            if result.is_satisfied() {
                info!("  {:<40} {}", label, result);
            } else {
                warn!("  {:<40} {}", label, result);
            }
        }
        for (name, outcome) in &self.services {
            match outcome {
                ServiceOutcome::AlreadyRunning => info!("  {:<40} running", name),
                ServiceOutcome::Converged { .. } => info!("  {:<40} started", name),
                ServiceOutcome::NotFound => warn!("  {:<40} not found", name),
                ServiceOutcome::Failed(reason) => warn!("  {:<40} failed: {}", name, reason),
            }
        }
        for (label, outcome) in &self.redistributables {
            match outcome {
                RedistOutcome::Completed => info!("  {:<40} ok", label),
                RedistOutcome::ExitedWithError(code) => {
                    warn!("  {:<40} installer exit code {}", label, code.unwrap_or(-1))
                }
                RedistOutcome::Failed(reason) => warn!("  {:<40} failed: {}", label, reason),
            }
        }
        match self.degraded_count() {
            0 => info!("All components reconciled"),
            n => warn!("{} item(s) need attention; re-run after resolving the warnings above", n),
        }
    }
}

//! Component Reconciliation Engine
//!
//! One idempotent pass over the target lists:
//!
//! 1. Privilege guard (fatal when not elevated, before any other call)
//! 2. Each component: inspect → install if absent → register from a fresh inspection
//! 3. Each service: ensure automatic + running
//! 4. Each redistributable: install unconditionally (winget skips installed ones)
//!
//! Only `NotElevated` and `ClientMissing` stop the run. Every other failure is
//! logged at the unit boundary and the pass moves on. Nothing is remembered
//! between runs; repeated runs are safe because every decision is re-derived
//! from live queries.

pub mod report;

use tracing::{error, info, warn};

use crate::components::{ComponentSpec, REDISTRIBUTABLES, RedistSpec, SERVICES, target_components};
use crate::error::Result;
use crate::installer::{PackageInstallerClient, install_from_source};
use crate::packages::{PackageInspector, PackageQuery, PackageRegistrar, PackageRegistration};
use crate::privilege::{ElevationCheck, require_elevation};
use crate::services::{ServiceControl, ServiceOutcome, ServiceReconciler, ServiceSpec};

pub use report::{RedistOutcome, RunResult, RunSummary};

/// What a run reconciles. Built once at startup and passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub components: Vec<ComponentSpec>,
    pub services: Vec<ServiceSpec>,
    pub redistributables: Vec<RedistSpec>,
}

impl EngineConfig {
    /// The embedded target lists.
    pub fn new(include_legacy_console_companion: bool) -> Self {
        Self {
            components: target_components(include_legacy_console_companion),
            services: SERVICES.to_vec(),
            redistributables: REDISTRIBUTABLES.to_vec(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

/// System primitives the engine drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub elevation: &'a dyn ElevationCheck,
    pub packages: &'a dyn PackageQuery,
    pub registration: &'a dyn PackageRegistration,
    pub installer: &'a dyn PackageInstallerClient,
    pub services: &'a dyn ServiceControl,
}

pub struct Engine<'a> {
    config: EngineConfig,
    host: Collaborators<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(config: EngineConfig, host: Collaborators<'a>) -> Self {
        Self { config, host }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline. `Err` only for run-aborting failures.
    pub fn run(&self) -> Result<RunSummary> {
        require_elevation(self.host.elevation)?;

        let mut summary = RunSummary::default();

        info!("Reconciling {} package(s)", self.config.components.len());
        for spec in &self.config.components {
            let result = self.ensure_component(spec)?;
            info!("{}: {}", spec.label, result);
            summary.components.push((spec.label, result));
        }

        info!("Reconciling {} service(s)", self.config.services.len());
        let reconciler = ServiceReconciler::new(self.host.services);
        for service in &self.config.services {
            let outcome = reconciler.ensure_running(service.name).unwrap_or_else(|e| {
                warn!("Could not reconcile service {}: {}", service.name, e);
                ServiceOutcome::Failed(e.to_string())
            });
            summary.services.push((service.name, outcome));
        }

        info!(
            "Installing {} redistributable(s)",
            self.config.redistributables.len()
        );
        for redist in &self.config.redistributables {
            let outcome = self.ensure_redistributable(redist)?;
            summary.redistributables.push((redist.label, outcome));
        }

        summary.log();
        Ok(summary)
    }

    /// Converge one package component. `Err` only for `ClientMissing`.
    pub fn ensure_component(&self, spec: &ComponentSpec) -> Result<RunResult> {
        info!("Checking {} ({})", spec.label, spec.name);
        let inspector = PackageInspector::new(self.host.packages);

        let initial = inspector.find_packages(spec.name);
        let mut install_attempted = false;

        if initial.is_empty() {
            match spec.source {
                Some(source) => {
                    install_attempted = true;
                    match install_from_source(self.host.installer, source, spec.label) {
                        Ok(_) => {}
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => warn!("Installing {} failed: {}", spec.label, e),
                    }
                }
                // The registrar reports the absence below
                None => info!("{} has no install source; repair only", spec.label),
            }
        } else {
            info!("{} is installed ({} record(s))", spec.label, initial.len());
        }

        // Re-inspect: an install may have changed what is on disk
        let records = inspector.find_packages(spec.name);
        let registrar = PackageRegistrar::new(self.host.registration);

        let report = match registrar.register_from_records(spec.name, &records) {
            Ok(report) => report,
            Err(e) => {
                error!("{}", e);
                return Ok(RunResult::RegisterFailed);
            }
        };

        let result = if install_attempted {
            if records.is_empty() {
                warn!(
                    "{} still not visible after install; it may finish in the background",
                    spec.label
                );
                RunResult::InstallUnverified
            } else if report.registered.is_empty() {
                RunResult::RegisterSkippedNoManifest
            } else {
                RunResult::Installed
            }
        } else if initial.is_empty() {
            RunResult::InstallSkippedNoSource
        } else if report.registered.is_empty() {
            RunResult::RegisterSkippedNoManifest
        } else {
            RunResult::AlreadySatisfied
        };
        Ok(result)
    }

    /// Install a runtime with no inspection step. `Err` only for `ClientMissing`.
    pub fn ensure_redistributable(&self, redist: &RedistSpec) -> Result<RedistOutcome> {
        match install_from_source(self.host.installer, redist.source, redist.label) {
            Ok(outcome) if outcome.success => Ok(RedistOutcome::Completed),
            Ok(outcome) => Ok(RedistOutcome::ExitedWithError(outcome.exit_code)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Installing {} failed: {}", redist.label, e);
                Ok(RedistOutcome::Failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::{CommandOutput, MockRunner};
    use crate::installer::{WINGET_NO_APPLICABLE_UPGRADE, WingetClient};
    use crate::mock::MockHost;

    #[test]
    fn test_config_lists() {
        let config = EngineConfig::new(true);
        assert_eq!(config.components, target_components(true));
        assert_eq!(config.services.len(), SERVICES.len());
        assert_eq!(config.redistributables.len(), 3);
        assert_eq!(EngineConfig::default(), EngineConfig::new(false));
    }

    #[test]
    fn test_present_redistributable_is_completed() {
        let runner = MockRunner::with_responses(vec![
            Ok(CommandOutput::ok("v1.9.25200\n")),
            Ok(CommandOutput {
                stdout: "No available upgrade found.\n".to_string(),
                stderr: String::new(),
                exit_code: Some(WINGET_NO_APPLICABLE_UPGRADE),
                success: false,
            }),
        ]);
        let winget = WingetClient::new(&runner);
        let host = MockHost::new();
        let engine = Engine::new(
            EngineConfig::default(),
            Collaborators {
                elevation: &host,
                packages: &host,
                registration: &host,
                installer: &winget,
                services: &host,
            },
        );

        let outcome = engine.ensure_redistributable(&REDISTRIBUTABLES[1]).unwrap();
        assert_eq!(outcome, RedistOutcome::Completed);
    }
}

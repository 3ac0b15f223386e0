//! gamingfix library
//!
//! Reconciles the Xbox / Gaming Services stack on a Windows machine toward a
//! working state: packages present and registered, services automatic and
//! running, runtimes installed.

pub mod cli;
pub mod command_runner;
pub mod components;
pub mod engine;
pub mod error;
pub mod installer;
pub mod logging;
pub mod mock;
pub mod packages;
pub mod powershell;
pub mod privilege;
pub mod services;

// Re-export main types for convenience
pub use command_runner::{CommandOutput, CommandRunner, SystemRunner};
pub use components::{ComponentSpec, RedistSpec, target_components};
pub use engine::{Collaborators, Engine, EngineConfig, RedistOutcome, RunResult, RunSummary};
pub use error::{ReconcileError, Result};
pub use installer::{
    InstallOutcome, InstallRequest, PackageInstallerClient, PackageSource, SourceChannel,
    WingetClient, install_from_source,
};
pub use logging::LogConfig;
pub use packages::{
    InstalledPackage, ManifestStatus, PackageInspector, PackageQuery, PackageRecord,
    PackageRegistrar, PackageRegistration, PackageScope, RegistrationReport, UnregisterableReason,
};
pub use powershell::PowerShell;
pub use privilege::{ElevationCheck, SystemElevation, require_elevation};
pub use services::{
    RunState, ServiceControl, ServiceOutcome, ServiceReconciler, ServiceSpec, ServiceStatus,
    StartMode,
};

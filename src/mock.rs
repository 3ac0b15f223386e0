//! In-memory host for testing.
//!
//! `MockHost` implements every collaborator trait over plain maps and records
//! each primitive call in order, so engine-level tests can assert both the
//! final machine state and exactly which primitives ran.
//!
//! Installs are simulated through a catalog: installing a source id appends
//! the catalog's row for that id to the all-users scope. Manifest files are
//! real files; tests place them in temporary directories.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, Result};
use crate::installer::{InstallOutcome, InstallRequest, PackageInstallerClient};
use crate::packages::{InstalledPackage, PackageQuery, PackageRegistration, PackageScope};
use crate::privilege::ElevationCheck;
use crate::services::{RunState, ServiceControl, ServiceStatus, StartMode};

/// One primitive call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    IsElevated,
    Query(String, PackageScope),
    Register(PathBuf),
    ClientProbe,
    Install(String),
    GetService(String),
    SetStartup(String, StartMode),
    StartService(String),
}

impl HostCall {
    /// Everything except the elevation check.
    pub fn is_side_collaborator(&self) -> bool {
        !matches!(self, Self::IsElevated)
    }
}

#[derive(Debug)]
pub struct MockHost {
    pub elevated: bool,
    pub client_available: bool,
    /// Installs that report success but change nothing
    pub install_is_noop: bool,
    packages: RefCell<HashMap<(String, PackageScope), Vec<InstalledPackage>>>,
    catalog: HashMap<String, InstalledPackage>,
    services: RefCell<HashMap<String, ServiceStatus>>,
    failing_registrations: HashSet<PathBuf>,
    registered: RefCell<Vec<PathBuf>>,
    calls: RefCell<Vec<HostCall>>,
    installs: Cell<usize>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// An elevated host with winget available and nothing installed.
    pub fn new() -> Self {
        Self {
            elevated: true,
            client_available: true,
            install_is_noop: false,
            packages: RefCell::new(HashMap::new()),
            catalog: HashMap::new(),
            services: RefCell::new(HashMap::new()),
            failing_registrations: HashSet::new(),
            registered: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            installs: Cell::new(0),
        }
    }

    /// Mark a package as installed in `scope` at `location`.
    pub fn add_package(&self, name: &str, scope: PackageScope, location: &Path) {
        self.packages
            .borrow_mut()
            .entry((name.to_string(), scope))
            .or_default()
            .push(InstalledPackage::new(name, location));
    }

    /// What installing `source_id` puts on the machine.
    pub fn add_catalog_entry(&mut self, source_id: &str, name: &str, location: &Path) {
        self.catalog
            .insert(source_id.to_string(), InstalledPackage::new(name, location));
    }

    pub fn add_service(&self, name: &str, mode: StartMode, state: RunState) {
        self.services
            .borrow_mut()
            .insert(name.to_string(), ServiceStatus { mode, state });
    }

    /// Make registration of `manifest` fail.
    pub fn fail_registration(&mut self, manifest: &Path) {
        self.failing_registrations.insert(manifest.to_path_buf());
    }

    pub fn service(&self, name: &str) -> Option<ServiceStatus> {
        self.services.borrow().get(name).copied()
    }

    /// Every row for `name`, across scopes.
    pub fn installed(&self, name: &str) -> Vec<InstalledPackage> {
        self.packages
            .borrow()
            .iter()
            .filter(|((n, _), _)| n == name)
            .flat_map(|(_, rows)| rows.clone())
            .collect()
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        self.registered.borrow().clone()
    }

    pub fn install_count(&self) -> usize {
        self.installs.get()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl ElevationCheck for MockHost {
    fn is_elevated(&self) -> bool {
        self.record(HostCall::IsElevated);
        self.elevated
    }
}

impl PackageQuery for MockHost {
    fn query(&self, name: &str, scope: PackageScope) -> Result<Vec<InstalledPackage>> {
        self.record(HostCall::Query(name.to_string(), scope));
        Ok(self
            .packages
            .borrow()
            .get(&(name.to_string(), scope))
            .cloned()
            .unwrap_or_default())
    }
}

impl PackageRegistration for MockHost {
    fn register(&self, manifest: &Path) -> Result<()> {
        self.record(HostCall::Register(manifest.to_path_buf()));
        if self.failing_registrations.contains(manifest) {
            return Err(ReconcileError::command(
                "Add-AppxPackage failed (exit code 1): Deployment failed with HRESULT: 0x80073CF6",
            ));
        }
        self.registered.borrow_mut().push(manifest.to_path_buf());
        Ok(())
    }
}

impl PackageInstallerClient for MockHost {
    fn name(&self) -> &str {
        "winget"
    }

    fn is_available(&self) -> bool {
        self.record(HostCall::ClientProbe);
        self.client_available
    }

    fn install(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        self.record(HostCall::Install(request.source.id.to_string()));
        self.installs.set(self.installs.get() + 1);

        if !self.install_is_noop {
            if let Some(row) = self.catalog.get(request.source.id) {
                let mut packages = self.packages.borrow_mut();
                let rows = packages
                    .entry((row.name.clone(), PackageScope::AllUsers))
                    .or_default();
                if !rows.contains(row) {
                    rows.push(row.clone());
                }
            }
        }

        Ok(InstallOutcome {
            success: true,
            exit_code: Some(0),
            output: format!("Successfully installed {}", request.source.id),
        })
    }
}

impl ServiceControl for MockHost {
    fn get(&self, name: &str) -> Result<Option<ServiceStatus>> {
        self.record(HostCall::GetService(name.to_string()));
        Ok(self.service(name))
    }

    fn set_startup_type(&self, name: &str, mode: StartMode) -> Result<()> {
        self.record(HostCall::SetStartup(name.to_string(), mode));
        match self.services.borrow_mut().get_mut(name) {
            Some(status) => {
                status.mode = mode;
                Ok(())
            }
            None => Err(ReconcileError::service(name, "service does not exist")),
        }
    }

    fn start(&self, name: &str) -> Result<()> {
        self.record(HostCall::StartService(name.to_string()));
        match self.services.borrow_mut().get_mut(name) {
            Some(status) if status.mode == StartMode::Disabled => {
                Err(ReconcileError::service(name, "service is disabled"))
            }
            Some(status) => {
                status.state = RunState::Running;
                Ok(())
            }
            None => Err(ReconcileError::service(name, "service does not exist")),
        }
    }
}

//! Package Registrar
//!
//! Re-declares installed packages from their on-disk manifests. This repairs
//! the "installed but not properly registered" state without refetching
//! payload, so it runs even for packages that look healthy.
//!
//! Records without a usable manifest are skipped with a warning. A failure of
//! the registration primitive on a manifest that exists is escalated.

use std::path::PathBuf;

use tracing::{info, warn};

use super::{ManifestStatus, PackageRecord, PackageRegistration, UnregisterableReason};
use crate::error::{ReconcileError, Result};

/// What one registration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Manifests successfully re-registered
    pub registered: Vec<PathBuf>,
    /// Records skipped, with the reason
    pub skipped: Vec<UnregisterableReason>,
}

impl RegistrationReport {
    /// True when there were no records at all.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.skipped.is_empty()
    }
}

pub struct PackageRegistrar<'a> {
    primitive: &'a dyn PackageRegistration,
}

impl<'a> PackageRegistrar<'a> {
    pub fn new(primitive: &'a dyn PackageRegistration) -> Self {
        Self { primitive }
    }

    /// Register every record of `name` that has a manifest on disk.
    pub fn register_from_records(
        &self,
        name: &str,
        records: &[PackageRecord],
    ) -> Result<RegistrationReport> {
        let mut report = RegistrationReport::default();

        if records.is_empty() {
            warn!("{} is not installed; nothing to register", name);
            return Ok(report);
        }

        for record in records {
            match &record.manifest {
                ManifestStatus::Unregisterable(reason) => {
                    warn!("Skipping registration of {}: {}", record.name, reason);
                    report.skipped.push(reason.clone());
                }
                ManifestStatus::Ready(manifest) => {
                    info!("Registering {} from {}", record.name, manifest.display());
                    self.primitive.register(manifest).map_err(|e| {
                        ReconcileError::Registration {
                            name: record.name.clone(),
                            manifest: manifest.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    report.registered.push(manifest.clone());
                }
            }
        }

        Ok(report)
    }
}

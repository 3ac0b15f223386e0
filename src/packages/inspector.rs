//! Package Inspector
//!
//! Finds installed records for a package name. A package may be provisioned
//! machine-wide and also registered for the current user, so both scopes are
//! queried and the results merged; when the all-users scope yields nothing the
//! current-user rows are all that remain.
//!
//! Absence is a normal outcome: query failures are logged and reported as
//! "no records", never as errors.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::{InstalledPackage, PackageQuery, PackageRecord, PackageScope};

/// Scopes queried, broadest first.
const SCOPES: [PackageScope; 2] = [PackageScope::AllUsers, PackageScope::CurrentUser];

pub struct PackageInspector<'a> {
    query: &'a dyn PackageQuery,
}

impl<'a> PackageInspector<'a> {
    pub fn new(query: &'a dyn PackageQuery) -> Self {
        Self { query }
    }

    /// Installed records for `name`, de-duplicated across scopes.
    pub fn find_packages(&self, name: &str) -> Vec<PackageRecord> {
        let mut rows: Vec<InstalledPackage> = Vec::new();

        for scope in SCOPES {
            match self.query.query(name, scope) {
                Ok(found) => {
                    debug!("{}: {} record(s) in {} scope", name, found.len(), scope);
                    rows.extend(found);
                }
                Err(e) => warn!("Package query for {} ({} scope) failed: {}", name, scope, e),
            }
        }

        let records: Vec<PackageRecord> = dedup(rows)
            .into_iter()
            .map(PackageRecord::from_installed)
            .collect();
        debug!("{}: {} distinct record(s)", name, records.len());
        records
    }
}

/// Collapse rows naming the same package at the same location.
///
/// Windows paths compare case-insensitively, so the key is lowercased.
fn dedup(rows: Vec<InstalledPackage>) -> Vec<InstalledPackage> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let location = row
                .install_location
                .as_ref()
                .map(|p| p.display().to_string().to_lowercase())
                .unwrap_or_default();
            seen.insert((row.name.to_lowercase(), location))
        })
        .collect()
}

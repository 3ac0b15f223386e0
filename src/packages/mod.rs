//! Installed-package model and the collaborator contracts around it.
//!
//! - `inspector` — find installed records for a package name across scopes
//! - `registrar` — re-register records from their on-disk manifests

pub mod inspector;
pub mod registrar;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::Result;

pub use inspector::PackageInspector;
pub use registrar::{PackageRegistrar, RegistrationReport};

/// Manifest filename inside a package's install location.
pub const MANIFEST_FILE: &str = "AppxManifest.xml";

/// Install scope a package query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum PackageScope {
    /// Every user profile on the machine (requires elevation)
    #[strum(serialize = "all-users")]
    AllUsers,
    /// Only the user running this process
    #[strum(serialize = "current-user")]
    CurrentUser,
}

/// Raw row returned by the package query primitive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstalledPackage {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "InstallLocation", default)]
    pub install_location: Option<PathBuf>,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, install_location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            install_location: Some(install_location.into()),
        }
    }
}

/// Why a record cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnregisterableReason {
    /// The query returned no install location
    NoInstallLocation,
    /// The install location exists in the record but the manifest file does not
    ManifestMissing(PathBuf),
}

impl fmt::Display for UnregisterableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInstallLocation => write!(f, "no install location"),
            Self::ManifestMissing(path) => write!(f, "manifest not found at {}", path.display()),
        }
    }
}

/// Whether a record carries a usable manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestStatus {
    Ready(PathBuf),
    Unregisterable(UnregisterableReason),
}

/// An installed package instance, classified by manifest availability.
///
/// Built fresh from each query; never stored across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub install_location: Option<PathBuf>,
    pub manifest: ManifestStatus,
}

impl PackageRecord {
    /// Classify a raw query row by probing the manifest on disk.
    pub fn from_installed(pkg: InstalledPackage) -> Self {
        let manifest = match pkg.install_location.as_deref() {
            None => ManifestStatus::Unregisterable(UnregisterableReason::NoInstallLocation),
            Some(location) if location.as_os_str().is_empty() => {
                ManifestStatus::Unregisterable(UnregisterableReason::NoInstallLocation)
            }
            Some(location) => manifest_status(location),
        };
        Self {
            name: pkg.name,
            install_location: pkg.install_location,
            manifest,
        }
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        match &self.manifest {
            ManifestStatus::Ready(path) => Some(path),
            ManifestStatus::Unregisterable(_) => None,
        }
    }
}

fn manifest_status(location: &Path) -> ManifestStatus {
    let manifest = location.join(MANIFEST_FILE);
    if manifest.is_file() {
        ManifestStatus::Ready(manifest)
    } else {
        ManifestStatus::Unregisterable(UnregisterableReason::ManifestMissing(manifest))
    }
}

/// Package query primitive.
pub trait PackageQuery {
    /// Installed packages matching `name` in `scope`; empty when absent.
    fn query(&self, name: &str, scope: PackageScope) -> Result<Vec<InstalledPackage>>;
}

/// Package registration primitive.
pub trait PackageRegistration {
    /// Re-declare a deployed package from its manifest.
    fn register(&self, manifest: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_manifest_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "<Package/>").unwrap();

        let record =
            PackageRecord::from_installed(InstalledPackage::new("Microsoft.GamingApp", dir.path()));
        assert_eq!(
            record.manifest,
            ManifestStatus::Ready(dir.path().join(MANIFEST_FILE))
        );
        assert_eq!(record.manifest_path(), Some(dir.path().join(MANIFEST_FILE).as_path()));
    }

    #[test]
    fn test_record_without_manifest_is_unregisterable() {
        let dir = tempfile::tempdir().unwrap();
        let record =
            PackageRecord::from_installed(InstalledPackage::new("Microsoft.GamingApp", dir.path()));
        assert_eq!(
            record.manifest,
            ManifestStatus::Unregisterable(UnregisterableReason::ManifestMissing(
                dir.path().join(MANIFEST_FILE)
            ))
        );
        assert!(record.manifest_path().is_none());
    }

    #[test]
    fn test_record_without_location() {
        let pkg = InstalledPackage {
            name: "Microsoft.WindowsStore".to_string(),
            install_location: None,
        };
        let record = PackageRecord::from_installed(pkg);
        assert_eq!(
            record.manifest,
            ManifestStatus::Unregisterable(UnregisterableReason::NoInstallLocation)
        );

        let pkg = InstalledPackage::new("Microsoft.WindowsStore", "");
        let record = PackageRecord::from_installed(pkg);
        assert_eq!(
            record.manifest,
            ManifestStatus::Unregisterable(UnregisterableReason::NoInstallLocation)
        );
    }

    #[test]
    fn test_installed_package_deserializes_powershell_shape() {
        let json = concat!(
            r#"{"Name":"Microsoft.GamingServices","#,
            r#""InstallLocation":"C:\\Program Files\\WindowsApps\\Microsoft.GamingServices_1"}"#
        );
        let pkg: InstalledPackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.name, "Microsoft.GamingServices");
        assert!(pkg.install_location.is_some());

        let json = r#"{"Name":"Microsoft.GamingServices","InstallLocation":null}"#;
        let pkg: InstalledPackage = serde_json::from_str(json).unwrap();
        assert!(pkg.install_location.is_none());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(PackageScope::AllUsers.to_string(), "all-users");
        assert_eq!(PackageScope::CurrentUser.to_string(), "current-user");
        assert_eq!("current-user".parse::<PackageScope>().unwrap(), PackageScope::CurrentUser);
    }
}

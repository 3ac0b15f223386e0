//! Typed cmdlet invocations.
//!
//! | Struct               | Cmdlet |
//! |----------------------|--------|
//! | `GetAppxPackage`     | `Get-AppxPackage [-AllUsers]` |
//! | `RegisterAppxManifest` | `Add-AppxPackage -DisableDevelopmentMode -Register` |
//! | `GetServiceStatus`   | `Get-Service` |
//! | `SetServiceStartup`  | `Set-Service -StartupType` |
//! | `StartService`       | `Start-Service` |
//! | `TestElevation`      | `WindowsPrincipal.IsInRole(Administrator)` |
//!
//! Query commands emit compressed JSON so the host can parse them with serde.

use std::path::PathBuf;

use super::{PowerShellCommand, quote, validate_identifier};
use crate::error::Result;
use crate::packages::PackageScope;
use crate::services::StartMode;

/// Terminate on the first cmdlet error so failures surface as a non-zero exit.
const STRICT: &str = "$ErrorActionPreference = 'Stop'; ";

/// Raised by `Get-Service` for unknown names (and for some access failures).
const NOT_FOUND_EXCEPTION: &str = "Microsoft.PowerShell.Commands.ServiceCommandException";

// ============================================================================
// Packages
// ============================================================================

/// Installed packages matching a name, as a JSON array of
/// `{Name, InstallLocation}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAppxPackage {
    name: String,
    scope: PackageScope,
}

impl GetAppxPackage {
    pub fn new(name: &str, scope: PackageScope) -> Result<Self> {
        Ok(Self {
            name: validate_identifier(name)?.to_string(),
            scope,
        })
    }
}

impl PowerShellCommand for GetAppxPackage {
    fn to_script(&self) -> String {
        let all_users = match self.scope {
            PackageScope::AllUsers => " -AllUsers",
            PackageScope::CurrentUser => "",
        };
        format!(
            "{STRICT}ConvertTo-Json -Compress -InputObject @(Get-AppxPackage -Name {}{} | \
             Select-Object Name, InstallLocation)",
            quote(&self.name),
            all_users
        )
    }

    fn cmdlet(&self) -> &'static str {
        "Get-AppxPackage"
    }
}

/// Re-register a deployed package from its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAppxManifest {
    pub manifest: PathBuf,
}

impl PowerShellCommand for RegisterAppxManifest {
    fn to_script(&self) -> String {
        format!(
            "{STRICT}Add-AppxPackage -DisableDevelopmentMode -Register {}",
            quote(&self.manifest.display().to_string())
        )
    }

    fn cmdlet(&self) -> &'static str {
        "Add-AppxPackage"
    }
}

// ============================================================================
// Services
// ============================================================================

/// `{StartType, Status}` as strings, or no output when the service is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetServiceStatus {
    name: String,
}

impl GetServiceStatus {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: validate_identifier(name)?.to_string(),
        })
    }
}

impl PowerShellCommand for GetServiceStatus {
    fn to_script(&self) -> String {
        // Only a missing service yields empty output; other errors stay terminating.
        // Enums are stringified explicitly; ConvertTo-Json would emit numbers.
        format!(
            "{STRICT}$s = $null; \
             try {{ $s = Get-Service -Name {} }} \
             catch [{NOT_FOUND_EXCEPTION}] {{ \
             if ($_.CategoryInfo.Category -ne 'ObjectNotFound') {{ throw }} }}; \
             if ($s) {{ [pscustomobject]@{{ \
             StartType = \"$($s.StartType)\"; Status = \"$($s.Status)\" }} \
             | ConvertTo-Json -Compress }}",
            quote(&self.name)
        )
    }

    fn cmdlet(&self) -> &'static str {
        "Get-Service"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetServiceStartup {
    name: String,
    mode: StartMode,
}

impl SetServiceStartup {
    pub fn new(name: &str, mode: StartMode) -> Result<Self> {
        Ok(Self {
            name: validate_identifier(name)?.to_string(),
            mode,
        })
    }
}

impl PowerShellCommand for SetServiceStartup {
    fn to_script(&self) -> String {
        format!(
            "{STRICT}Set-Service -Name {} -StartupType {}",
            quote(&self.name),
            self.mode
        )
    }

    fn cmdlet(&self) -> &'static str {
        "Set-Service"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartService {
    name: String,
}

impl StartService {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: validate_identifier(name)?.to_string(),
        })
    }
}

impl PowerShellCommand for StartService {
    fn to_script(&self) -> String {
        format!("{STRICT}Start-Service -Name {}", quote(&self.name))
    }

    fn cmdlet(&self) -> &'static str {
        "Start-Service"
    }
}

// ============================================================================
// Elevation
// ============================================================================

/// Prints `True` when the current principal is an administrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestElevation;

impl PowerShellCommand for TestElevation {
    fn to_script(&self) -> String {
        "([Security.Principal.WindowsPrincipal][Security.Principal.WindowsIdentity]::GetCurrent())\
         .IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator)"
            .to_string()
    }

    fn cmdlet(&self) -> &'static str {
        "WindowsPrincipal.IsInRole"
    }
}

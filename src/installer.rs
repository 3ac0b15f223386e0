//! Package Installer
//!
//! Fetches and silently installs packages through the package-source client
//! (`winget`). The client's exit status and output are logged but not parsed:
//! the next inspection pass is what verifies an install. The exit codes winget
//! uses for an already-present package count as success.
//!
//! # Field to Flag Mapping
//!
//! | `InstallRequest` field | winget flag |
//! |------------------------|-------------|
//! | `source.id`            | `--id <id> --exact` |
//! | `source.channel`       | `--source msstore\|winget` |
//! | (always)               | `--silent --disable-interactivity` |
//! | (always)               | `--accept-package-agreements --accept-source-agreements` |

use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::command_runner::CommandRunner;
use crate::error::{ReconcileError, Result};

/// Distribution channel a package is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SourceChannel {
    /// Microsoft Store catalog
    MsStore,
    /// Community winget manifests
    Winget,
}

/// Source-specific identifier of an installable package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageSource {
    pub id: &'static str,
    pub channel: SourceChannel,
}

impl PackageSource {
    pub const fn store(id: &'static str) -> Self {
        Self {
            id,
            channel: SourceChannel::MsStore,
        }
    }

    pub const fn winget(id: &'static str) -> Self {
        Self {
            id,
            channel: SourceChannel::Winget,
        }
    }
}

/// One unattended install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub source: PackageSource,
    pub label: String,
}

impl InstallRequest {
    /// Arguments passed to `winget`, in order.
    pub fn to_cli_args(&self) -> Vec<String> {
        vec![
            "install".to_string(),
            "--id".to_string(),
            self.source.id.to_string(),
            "--exact".to_string(),
            "--source".to_string(),
            self.source.channel.to_string(),
            "--silent".to_string(),
            "--accept-package-agreements".to_string(),
            "--accept-source-agreements".to_string(),
            "--disable-interactivity".to_string(),
        ]
    }
}

/// What the client reported. Not a verification of the install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Package-source client capability.
pub trait PackageInstallerClient {
    /// Human-readable client name for error messages.
    fn name(&self) -> &str;

    /// Whether the client can be invoked at all.
    fn is_available(&self) -> bool;

    fn install(&self, request: &InstallRequest) -> Result<InstallOutcome>;
}

const WINGET: &str = "winget";

/// `APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE` (0x8A15002B): no newer version.
pub const WINGET_NO_APPLICABLE_UPGRADE: i32 = 0x8A15002B_u32 as i32;
/// `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED` (0x8A150061).
pub const WINGET_PACKAGE_ALREADY_INSTALLED: i32 = 0x8A150061_u32 as i32;

/// Exit codes meaning the package is already present.
fn is_already_installed(exit_code: Option<i32>) -> bool {
    matches!(
        exit_code,
        Some(WINGET_NO_APPLICABLE_UPGRADE | WINGET_PACKAGE_ALREADY_INSTALLED)
    )
}

const WINGET_HINT: &str =
    "install or update \"App Installer\" (Microsoft.DesktopAppInstaller) from the Microsoft Store";

/// `winget` driven through a [`CommandRunner`].
pub struct WingetClient<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> WingetClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl PackageInstallerClient for WingetClient<'_> {
    fn name(&self) -> &str {
        WINGET
    }

    fn is_available(&self) -> bool {
        match self.runner.run(WINGET, &["--version".to_string()]) {
            Ok(out) if out.success => {
                debug!("winget {}", out.stdout.trim());
                true
            }
            Ok(out) => {
                debug!("winget --version exited with {:?}", out.exit_code);
                false
            }
            Err(e) => {
                debug!("winget not runnable: {}", e);
                false
            }
        }
    }

    fn install(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let out = self.runner.run(WINGET, &request.to_cli_args())?;
        let success = if !out.success && is_already_installed(out.exit_code) {
            info!("{} is already installed", request.label);
            true
        } else {
            out.success
        };
        let mut output = out.stdout;
        if !out.stderr.trim().is_empty() {
            output.push_str(&out.stderr);
        }
        Ok(InstallOutcome {
            success,
            exit_code: out.exit_code,
            output,
        })
    }
}

/// Install `source` unattended, failing fast when the client is missing.
pub fn install_from_source(
    client: &dyn PackageInstallerClient,
    source: PackageSource,
    label: &str,
) -> Result<InstallOutcome> {
    if !client.is_available() {
        return Err(ReconcileError::client_missing(client.name(), WINGET_HINT));
    }

    info!("Installing {} ({} from {})", label, source.id, source.channel);
    let request = InstallRequest {
        source,
        label: label.to_string(),
    };
    let outcome = client.install(&request)?;

    for line in outcome.output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        debug!("[{}] {}", client.name(), line);
    }
    if outcome.success {
        info!("{} install finished", label);
    } else {
        warn!(
            "{} install exited with code {}",
            label,
            outcome.exit_code.unwrap_or(-1)
        );
    }
    Ok(outcome)
}

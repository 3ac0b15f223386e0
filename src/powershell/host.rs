//! Collaborator implementations over PowerShell.
//!
//! `Get-AppxPackage` and `Get-Service` results come back as compressed JSON.
//! `ConvertTo-Json` emits a bare object for a single row and an array for
//! several, so both shapes are accepted.

use std::path::Path;

use serde::Deserialize;

use super::commands::{
    GetAppxPackage, GetServiceStatus, RegisterAppxManifest, SetServiceStartup, StartService,
};
use super::PowerShell;
use crate::error::{ReconcileError, Result};
use crate::packages::{InstalledPackage, PackageQuery, PackageRegistration, PackageScope};
use crate::services::{RunState, ServiceControl, ServiceStatus, StartMode};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Parse `Get-AppxPackage | Select-Object Name, InstallLocation` JSON output.
pub fn parse_packages(stdout: &str) -> Result<Vec<InstalledPackage>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let rows = match serde_json::from_str::<OneOrMany<InstalledPackage>>(trimmed)? {
        OneOrMany::Many(rows) => rows,
        OneOrMany::One(row) => vec![row],
    };
    Ok(rows)
}

#[derive(Deserialize)]
struct ServiceRow {
    #[serde(rename = "StartType")]
    start_type: String,
    #[serde(rename = "Status")]
    status: String,
}

/// Parse the `{StartType, Status}` object; empty output means no such service.
pub fn parse_service_status(stdout: &str) -> Result<Option<ServiceStatus>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let row: ServiceRow = serde_json::from_str(trimmed)?;
    let mode: StartMode = row
        .start_type
        .parse()
        .map_err(|_| ReconcileError::parse(format!("unknown start type {:?}", row.start_type)))?;
    let state: RunState = row
        .status
        .parse()
        .map_err(|_| ReconcileError::parse(format!("unknown service status {:?}", row.status)))?;
    Ok(Some(ServiceStatus { mode, state }))
}

impl PackageQuery for PowerShell<'_> {
    fn query(&self, name: &str, scope: PackageScope) -> Result<Vec<InstalledPackage>> {
        let output = self.run_checked(&GetAppxPackage::new(name, scope)?)?;
        parse_packages(&output.stdout)
    }
}

impl PackageRegistration for PowerShell<'_> {
    fn register(&self, manifest: &Path) -> Result<()> {
        self.run_checked(&RegisterAppxManifest {
            manifest: manifest.to_path_buf(),
        })?;
        Ok(())
    }
}

impl ServiceControl for PowerShell<'_> {
    fn get(&self, name: &str) -> Result<Option<ServiceStatus>> {
        let output = self
            .run_checked(&GetServiceStatus::new(name)?)
            .map_err(|e| ReconcileError::service(name, e.to_string()))?;
        parse_service_status(&output.stdout)
    }

    fn set_startup_type(&self, name: &str, mode: StartMode) -> Result<()> {
        self.run_checked(&SetServiceStartup::new(name, mode)?)
            .map_err(|e| ReconcileError::service(name, e.to_string()))?;
        Ok(())
    }

    fn start(&self, name: &str) -> Result<()> {
        self.run_checked(&StartService::new(name)?)
            .map_err(|e| ReconcileError::service(name, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::{CommandOutput, MockRunner};
    use crate::powershell::POWERSHELL_EXE;
    use std::path::PathBuf;

    #[test]
    fn test_parse_packages_shapes() {
        assert!(parse_packages("").unwrap().is_empty());
        assert!(parse_packages("[]\r\n").unwrap().is_empty());

        let one = r#"{"Name":"Microsoft.GamingApp","InstallLocation":"C:\\Apps\\GamingApp"}"#;
        assert_eq!(parse_packages(one).unwrap().len(), 1);

        let many = concat!(
            r#"[{"Name":"Microsoft.GamingApp","InstallLocation":"C:\\A"},"#,
            r#"{"Name":"Microsoft.GamingApp","InstallLocation":null}]"#
        );
        let rows = parse_packages(many).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].install_location, Some(PathBuf::from("C:\\A")));
        assert_eq!(rows[1].install_location, None);
    }

    #[test]
    fn test_parse_packages_rejects_garbage() {
        assert!(matches!(
            parse_packages("Get-AppxPackage : Access is denied"),
            Err(ReconcileError::Json(_))
        ));
    }

    #[test]
    fn test_parse_service_status() {
        assert_eq!(parse_service_status("  \r\n").unwrap(), None);
        let status = parse_service_status(r#"{"StartType":"Manual","Status":"Stopped"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(status.mode, StartMode::Manual);
        assert_eq!(status.state, RunState::Stopped);
        assert!(matches!(
            parse_service_status(r#"{"StartType":"Weird","Status":"Stopped"}"#),
            Err(ReconcileError::Parse(_))
        ));
    }

    #[test]
    fn test_query_runs_powershell() {
        let runner = MockRunner::with_responses(vec![Ok(CommandOutput::ok(
            r#"[{"Name":"Microsoft.WindowsStore","InstallLocation":"C:\\Store"}]"#,
        ))]);
        let ps = PowerShell::new(&runner);
        let rows = ps
            .query("Microsoft.WindowsStore", PackageScope::AllUsers)
            .unwrap();
        assert_eq!(rows.len(), 1);

        let calls = runner.invocations();
        assert_eq!(calls[0].program, POWERSHELL_EXE);
        assert!(calls[0].args.last().unwrap().contains("-AllUsers"));
    }

    #[test]
    fn test_invalid_name_never_spawns() {
        let runner = MockRunner::new();
        let ps = PowerShell::new(&runner);
        assert!(matches!(
            ps.query("bad name", PackageScope::CurrentUser),
            Err(ReconcileError::InvalidName(_))
        ));
        assert!(runner.invocations().is_empty());
    }

    #[test]
    fn test_register_failure_is_error() {
        let runner = MockRunner::with_responses(vec![Ok(CommandOutput::failed(
            1,
            "Deployment failed with HRESULT: 0x80073CF6",
        ))]);
        let ps = PowerShell::new(&runner);
        let err = ps
            .register(Path::new("C:\\Apps\\AppxManifest.xml"))
            .unwrap_err();
        assert!(err.to_string().contains("0x80073CF6"));
    }

    #[test]
    fn test_service_failure_names_service() {
        let runner = MockRunner::with_responses(vec![Ok(CommandOutput::failed(
            1,
            "Service 'Xbox Live Auth Manager' cannot be started",
        ))]);
        let ps = PowerShell::new(&runner);
        let err = ps.start("XblAuthManager").unwrap_err();
        match err {
            ReconcileError::Service { name, .. } => assert_eq!(name, "XblAuthManager"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_service_is_none_but_denied_query_is_error() {
        let runner = MockRunner::with_responses(vec![
            Ok(CommandOutput::ok("")),
            Ok(CommandOutput::failed(
                1,
                "Get-Service : Cannot open GamingServices service on computer '.'",
            )),
        ]);
        let ps = PowerShell::new(&runner);

        assert_eq!(ps.get("XblGameSave").unwrap(), None);
        match ps.get("GamingServices") {
            Err(ReconcileError::Service { name, reason }) => {
                assert_eq!(name, "GamingServices");
                assert!(reason.contains("Cannot open"));
            }
            other => panic!("expected a service error, got {other:?}"),
        }
    }
}

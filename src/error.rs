//! Error handling module for gamingfix
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Only `NotElevated` and `ClientMissing` abort a run; the engine converts every
//! other variant into a logged, per-component outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the reconciliation library
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The process lacks administrative rights
    #[error("Administrator privileges required: restart this tool from an elevated terminal")]
    NotElevated,

    /// The package-source client needed for an install is not on this machine
    #[error("{client} is not available: {hint}")]
    ClientMissing { client: String, hint: String },

    /// The registration primitive failed on a manifest that exists
    #[error("Failed to register {name} from {}: {reason}", manifest.display())]
    Registration {
        name: String,
        manifest: PathBuf,
        reason: String,
    },

    /// A service primitive (query, set startup type, start) failed
    #[error("Service error for {name}: {reason}")]
    Service { name: String, reason: String },

    /// An external program could not be spawned or waited on
    #[error("Command execution failed: {0}")]
    Command(String),

    /// Output from an external program did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// A package or service name contains characters unsafe to pass to a shell
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// IO errors (manifest probing, process pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    /// Create a client-missing error
    pub fn client_missing(client: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::ClientMissing {
            client: client.into(),
            hint: hint.into(),
        }
    }

    /// Create a service error
    pub fn service(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Service {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a command execution error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error must stop the whole run rather than a single component
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotElevated | Self::ClientMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::client_missing("winget", "install App Installer");
        assert_eq!(err.to_string(), "winget is not available: install App Installer");

        let err = ReconcileError::service("GamingServices", "access denied");
        assert_eq!(err.to_string(), "Service error for GamingServices: access denied");
    }

    #[test]
    fn test_registration_display_includes_manifest() {
        let err = ReconcileError::Registration {
            name: "Microsoft.GamingApp".to_string(),
            manifest: PathBuf::from("C:/Apps/AppxManifest.xml"),
            reason: "0x80073CF6".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Microsoft.GamingApp"));
        assert!(msg.contains("AppxManifest.xml"));
        assert!(msg.contains("0x80073CF6"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReconcileError = io_err.into();
        assert!(matches!(err, ReconcileError::Io(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ReconcileError::NotElevated.is_fatal());
        assert!(ReconcileError::client_missing("winget", "x").is_fatal());
        assert!(!ReconcileError::service("svc", "x").is_fatal());
        assert!(!ReconcileError::command("spawn failed").is_fatal());
    }
}

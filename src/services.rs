//! Service Reconciler
//!
//! Drives an OS service toward `{Automatic, Running}`:
//!
//! ```text
//! Unknown --query--> NotFound | Found(mode, state)
//! Found(mode != Automatic, _)      --set_startup_type--> Found(Automatic, state)
//! Found(Automatic, state != Running) --start-----------> Found(Automatic, Running)
//! Found(Automatic, Running)        --noop
//! ```
//!
//! A missing service is tolerated: several gaming services only appear once
//! their app package is installed.

use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::error::Result;

/// Configured startup mode, as reported by `Get-Service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize)]
pub enum StartMode {
    Boot,
    System,
    Automatic,
    Manual,
    Disabled,
}

/// Current run state, as reported by `Get-Service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize)]
pub enum RunState {
    Stopped,
    StartPending,
    StopPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub mode: StartMode,
    pub state: RunState,
}

/// Service control primitive.
pub trait ServiceControl {
    /// Current status, or `None` when no such service exists.
    fn get(&self, name: &str) -> Result<Option<ServiceStatus>>;
    fn set_startup_type(&self, name: &str, mode: StartMode) -> Result<()>;
    fn start(&self, name: &str) -> Result<()>;
}

/// A service the run must leave enabled and started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: &'static str,
}

/// Result of reconciling one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    NotFound,
    AlreadyRunning,
    Converged { changed_mode: bool, started: bool },
    Failed(String),
}

pub struct ServiceReconciler<'a> {
    control: &'a dyn ServiceControl,
}

impl<'a> ServiceReconciler<'a> {
    pub fn new(control: &'a dyn ServiceControl) -> Self {
        Self { control }
    }

    /// Ensure `name` starts automatically and is running.
    pub fn ensure_running(&self, name: &str) -> Result<ServiceOutcome> {
        let Some(status) = self.control.get(name)? else {
            warn!("Service {} not found; skipping", name);
            return Ok(ServiceOutcome::NotFound);
        };

        // Each transition is attempted even when the other one fails
        let mut first_error = None;

        let changed_mode = status.mode != StartMode::Automatic;
        if changed_mode {
            info!("Setting {} startup type: {} -> Automatic", name, status.mode);
            if let Err(e) = self.control.set_startup_type(name, StartMode::Automatic) {
                warn!("Could not set {} to Automatic: {}", name, e);
                first_error = Some(e);
            }
        }

        let started = status.state != RunState::Running;
        if started {
            info!("Starting {} (currently {})", name, status.state);
            if let Err(e) = self.control.start(name) {
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        if !changed_mode && !started {
            info!("Service {} already automatic and running", name);
            return Ok(ServiceOutcome::AlreadyRunning);
        }
        Ok(ServiceOutcome::Converged {
            changed_mode,
            started,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Get,
        SetStartup(StartMode),
        Start,
    }

    struct FakeControl {
        status: RefCell<Option<ServiceStatus>>,
        calls: RefCell<Vec<Call>>,
        fail_set: bool,
        fail_start: bool,
    }

    impl FakeControl {
        fn new(status: Option<ServiceStatus>) -> Self {
            Self {
                status: RefCell::new(status),
                calls: RefCell::new(Vec::new()),
                fail_set: false,
                fail_start: false,
            }
        }
    }

    impl ServiceControl for FakeControl {
        fn get(&self, _name: &str) -> Result<Option<ServiceStatus>> {
            self.calls.borrow_mut().push(Call::Get);
            Ok(*self.status.borrow())
        }

        fn set_startup_type(&self, name: &str, mode: StartMode) -> Result<()> {
            self.calls.borrow_mut().push(Call::SetStartup(mode));
            if self.fail_set {
                return Err(ReconcileError::service(name, "Access is denied"));
            }
            if let Some(status) = self.status.borrow_mut().as_mut() {
                status.mode = mode;
            }
            Ok(())
        }

        fn start(&self, name: &str) -> Result<()> {
            self.calls.borrow_mut().push(Call::Start);
            if self.fail_start {
                return Err(ReconcileError::service(name, "Cannot start service"));
            }
            if let Some(status) = self.status.borrow_mut().as_mut() {
                status.state = RunState::Running;
            }
            Ok(())
        }
    }

    #[test]
    fn test_missing_service_is_tolerated() {
        let control = FakeControl::new(None);
        let outcome = ServiceReconciler::new(&control)
            .ensure_running("GamingServices")
            .unwrap();
        assert_eq!(outcome, ServiceOutcome::NotFound);
        assert_eq!(*control.calls.borrow(), vec![Call::Get]);
    }

    #[test]
    fn test_manual_stopped_converges() {
        let control = FakeControl::new(Some(ServiceStatus {
            mode: StartMode::Manual,
            state: RunState::Stopped,
        }));
        let outcome = ServiceReconciler::new(&control)
            .ensure_running("GamingServices")
            .unwrap();

        assert_eq!(
            outcome,
            ServiceOutcome::Converged {
                changed_mode: true,
                started: true
            }
        );
        assert_eq!(
            *control.calls.borrow(),
            vec![Call::Get, Call::SetStartup(StartMode::Automatic), Call::Start]
        );
        assert_eq!(
            *control.status.borrow(),
            Some(ServiceStatus {
                mode: StartMode::Automatic,
                state: RunState::Running
            })
        );
    }

    #[test]
    fn test_satisfied_service_is_noop() {
        let control = FakeControl::new(Some(ServiceStatus {
            mode: StartMode::Automatic,
            state: RunState::Running,
        }));
        let outcome = ServiceReconciler::new(&control)
            .ensure_running("XblAuthManager")
            .unwrap();
        assert_eq!(outcome, ServiceOutcome::AlreadyRunning);
        assert_eq!(*control.calls.borrow(), vec![Call::Get]);
    }

    #[test]
    fn test_disabled_running_only_changes_mode() {
        let control = FakeControl::new(Some(ServiceStatus {
            mode: StartMode::Disabled,
            state: RunState::Running,
        }));
        let outcome = ServiceReconciler::new(&control)
            .ensure_running("GamingServicesNet")
            .unwrap();
        assert_eq!(
            outcome,
            ServiceOutcome::Converged {
                changed_mode: true,
                started: false
            }
        );
    }

    #[test]
    fn test_start_failure_propagates() {
        let mut control = FakeControl::new(Some(ServiceStatus {
            mode: StartMode::Automatic,
            state: RunState::Stopped,
        }));
        control.fail_start = true;
        let result = ServiceReconciler::new(&control).ensure_running("XblGameSave");
        assert!(matches!(result, Err(ReconcileError::Service { .. })));
    }

    #[test]
    fn test_refused_startup_change_still_starts() {
        let mut control = FakeControl::new(Some(ServiceStatus {
            mode: StartMode::Manual,
            state: RunState::Stopped,
        }));
        control.fail_set = true;
        let result = ServiceReconciler::new(&control).ensure_running("GamingServices");

        match result {
            Err(ReconcileError::Service { reason, .. }) => assert!(reason.contains("denied")),
            other => panic!("expected the startup error, got {other:?}"),
        }
        assert_eq!(
            *control.calls.borrow(),
            vec![Call::Get, Call::SetStartup(StartMode::Automatic), Call::Start]
        );
        assert_eq!(
            *control.status.borrow(),
            Some(ServiceStatus {
                mode: StartMode::Manual,
                state: RunState::Running
            })
        );
    }

    #[test]
    fn test_enum_parsing_matches_powershell_names() {
        assert_eq!("Automatic".parse::<StartMode>().unwrap(), StartMode::Automatic);
        assert_eq!("StartPending".parse::<RunState>().unwrap(), RunState::StartPending);
        assert!("AutomaticDelayedStart".parse::<StartMode>().is_err());
    }
}

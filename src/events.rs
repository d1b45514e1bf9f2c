//! Host print-lifecycle events.
//!
//! The host delivers print-job phase changes on its own thread.  The
//! coordinator reacts to a subset of them:
//!
//! ```text
//!   Started ──▶ pre-check, arm       Done / Failed ──┐
//!   Resumed ──▶ arm                  Cancelled     ──┼─▶ disarm
//!   Paused, Idle ──▶ (nothing)       Error         ──┘
//! ```

use core::fmt;

/// Print-job phase as reported by the host.  Owned by the host; the
/// coordinator only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintPhase {
    #[default]
    Idle,
    Started,
    Resumed,
    Paused,
    Done,
    Failed,
    Cancelled,
    Error,
}

/// What the coordinator does with the monitors for a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Abort the print if a sensor already reads fault, then arm.
    PreCheckAndArm,
    Arm,
    Disarm,
    Ignore,
}

impl PrintPhase {
    /// Map a host event name to a phase.  Unknown names yield `None`.
    pub fn from_host_event(name: &str) -> Option<Self> {
        match name.trim() {
            "PrintStarted" => Some(Self::Started),
            "PrintResumed" => Some(Self::Resumed),
            "PrintPaused" => Some(Self::Paused),
            "PrintDone" => Some(Self::Done),
            "PrintFailed" => Some(Self::Failed),
            "PrintCancelled" => Some(Self::Cancelled),
            "Error" => Some(Self::Error),
            _ => None,
        }
    }

    /// The coordinator's transition table.
    pub fn action(self) -> LifecycleAction {
        match self {
            Self::Started => LifecycleAction::PreCheckAndArm,
            Self::Resumed => LifecycleAction::Arm,
            Self::Done | Self::Failed | Self::Cancelled | Self::Error => LifecycleAction::Disarm,
            Self::Idle | Self::Paused => LifecycleAction::Ignore,
        }
    }

    /// A print job is in progress, paused or not.  Monitors stay armed
    /// through a pause.
    pub fn is_job_active(self) -> bool {
        matches!(self, Self::Started | Self::Resumed | Self::Paused)
    }
}

impl fmt::Display for PrintPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Started => "PrintStarted",
            Self::Resumed => "PrintResumed",
            Self::Paused => "PrintPaused",
            Self::Done => "PrintDone",
            Self::Failed => "PrintFailed",
            Self::Cancelled => "PrintCancelled",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

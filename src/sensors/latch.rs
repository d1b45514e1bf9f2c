//! Fault latch.
//!
//! The latch decides what a settled sample means for the printer.  It is
//! pure state: the monitor samples the pin, feeds the result here under its
//! lock, and performs the side effects the verdict asks for after releasing
//! the lock.
//!
//! ## Latch lifecycle
//!
//! 1. A fault sample on a clear latch yields [`Verdict::Trigger`] and sets
//!    the latch.  Under [`ResendPolicy::SendRepeatedly`] the latch is
//!    released again immediately, so every later fault sample also triggers.
//! 2. Fault samples on a set latch yield [`Verdict::Suppressed`].
//! 3. An ok sample releases the latch only when the policy does not pause
//!    the print.  A pausing policy keeps the latch until the next arm
//!    (print resumed or restarted).

use crate::config::{ResendPolicy, SensorConfig};

/// The parts of a [`SensorConfig`] that steer the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPolicy {
    pub pause_on_fault: bool,
    pub resend: ResendPolicy,
}

impl From<&SensorConfig> for FaultPolicy {
    fn from(config: &SensorConfig) -> Self {
        Self {
            pause_on_fault: config.pause_on_fault,
            resend: config.resend_policy,
        }
    }
}

/// Outcome of feeding one settled sample to the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Report the fault (pause and/or send gcode).
    Trigger,
    /// Fault already reported; nothing to do.
    Suppressed,
    /// Level reads ok.  `unlatched` is true if a reported fault was cleared.
    Ok { unlatched: bool },
}

/// Per-monitor latch.
#[derive(Debug, Default, Clone)]
pub struct Latch {
    latched: bool,
    /// Fault reports since construction.
    triggers: u32,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the latch.  Called on every arm.
    pub fn reset(&mut self) {
        self.latched = false;
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn trigger_count(&self) -> u32 {
        self.triggers
    }

    /// Feed a settled sample (`fault` = pin reads the fault level).
    pub fn evaluate(&mut self, fault: bool, policy: FaultPolicy) -> Verdict {
        if fault {
            if self.latched {
                return Verdict::Suppressed;
            }
            self.latched = policy.resend == ResendPolicy::SendOnce;
            self.triggers = self.triggers.saturating_add(1);
            Verdict::Trigger
        } else {
            let unlatched = self.latched && !policy.pause_on_fault;
            if unlatched {
                self.latched = false;
            }
            Verdict::Ok { unlatched }
        }
    }
}

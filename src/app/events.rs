//! Outbound monitor events.
//!
//! Monitors and the coordinator emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them (log, forward to a UI, count).

use crate::error::Error;
use crate::events::PrintPhase;
use crate::sensors::SensorKind;

/// Structured events emitted by the monitor core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Edge detection installed, latch reset.
    Armed(SensorKind),

    /// Edge detection removed.
    Disarmed(SensorKind),

    /// A fault was reported to the printer.
    FaultDetected {
        sensor: SensorKind,
        paused: bool,
        commands_sent: usize,
    },

    /// A bounce arrived while the fault was already reported.
    BounceIgnored(SensorKind),

    /// The settled level reads ok.  `unlatched` is true if this cleared a
    /// previously reported fault.
    ConditionOk { sensor: SensorKind, unlatched: bool },

    /// The print was cancelled at start because the sensor already read fault.
    PrintAborted(SensorKind),

    /// The sensor was taken out of service.
    SensorFailed { sensor: SensorKind, error: Error },

    /// The coordinator handled a lifecycle event.
    Lifecycle(PrintPhase),
}

//! Log-based adapters.
//!
//! [`LogEventSink`] writes every [`MonitorEvent`] to the `log` facade as a
//! single tagged line.  [`LogPrinter`] stands in for the host's printer
//! channel when no printer is attached: pause, cancel and gcode are logged
//! instead of sent.

use log::{error, info, warn};

use crate::app::events::MonitorEvent;
use crate::app::ports::{EventSink, PrintActionSink};

/// Adapter that logs every [`MonitorEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Armed(sensor) => info!("ARM   | {}", sensor),
            MonitorEvent::Disarmed(sensor) => info!("DISARM| {}", sensor),
            MonitorEvent::FaultDetected {
                sensor,
                paused,
                commands_sent,
            } => {
                warn!(
                    "FAULT | {} | paused={} gcode_lines={}",
                    sensor, paused, commands_sent
                );
            }
            MonitorEvent::BounceIgnored(sensor) => info!("BOUNCE| {} (latched)", sensor),
            MonitorEvent::ConditionOk { sensor, unlatched } => {
                info!("OK    | {} | unlatched={}", sensor, unlatched);
            }
            MonitorEvent::PrintAborted(sensor) => warn!("ABORT | {} at print start", sensor),
            MonitorEvent::SensorFailed { sensor, error: e } => {
                error!("FAIL  | {} | {}", sensor, e);
            }
            MonitorEvent::Lifecycle(phase) => info!("PHASE | {}", phase),
        }
    }
}

/// Printer channel that only logs what it would have done.
#[derive(Debug, Default)]
pub struct LogPrinter;

impl LogPrinter {
    pub fn new() -> Self {
        Self
    }
}

impl PrintActionSink for LogPrinter {
    fn pause(&self) {
        info!("printer: pause");
    }

    fn cancel(&self) {
        info!("printer: cancel");
    }

    fn send_commands(&self, commands: &[String]) {
        for line in commands {
            info!("printer: send {}", line);
        }
    }
}

//! Print-lifecycle coordinator.
//!
//! [`PrintLifecycleCoordinator`] owns both sensor monitors and reacts to the
//! host's print-job phases:
//!
//! | Phase                          | Action                                   |
//! |--------------------------------|------------------------------------------|
//! | Started                        | cancel if a sensor already faults, arm   |
//! | Resumed                        | arm (resets latches)                     |
//! | Done, Failed, Cancelled, Error | disarm                                   |
//! | anything else                  | nothing                                  |
//!
//! Lifecycle events and settings changes arrive on the host thread, hence
//! `&mut self`.  Edge callbacks run concurrently on the edge runtime and
//! only touch monitor state, which carries its own lock.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::PluginSettings;
use crate::events::{LifecycleAction, PrintPhase};
use crate::runtime::EdgeRuntime;
use crate::sensors::monitor::{MonitorPorts, MonitorSnapshot, SensorMonitor};
use crate::sensors::{SensorKind, SensorStatus, StatusResponse};

use super::events::MonitorEvent;

pub struct PrintLifecycleCoordinator {
    settings: PluginSettings,
    ports: MonitorPorts,
    runtime: EdgeRuntime,
    nonuniform: Arc<SensorMonitor>,
    overfill: Arc<SensorMonitor>,
    /// Last phase the host reported.
    phase: PrintPhase,
}

impl PrintLifecycleCoordinator {
    /// Build both monitors from `settings` and configure their pins.
    /// Monitors start disarmed; the first `Started` event arms them.
    pub fn new(settings: PluginSettings, ports: MonitorPorts, runtime: EdgeRuntime) -> Self {
        let (nonuniform, overfill) = build_monitors(&settings, &ports, &runtime);
        let coordinator = Self {
            settings,
            ports,
            runtime,
            nonuniform,
            overfill,
            phase: PrintPhase::Idle,
        };
        coordinator.setup_sensors();
        coordinator
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// React to a host print-job phase.
    pub fn on_event(&mut self, phase: PrintPhase) {
        match phase.action() {
            LifecycleAction::PreCheckAndArm => {
                self.abort_if_faulted();
                self.arm_all(phase);
            }
            LifecycleAction::Arm => self.arm_all(phase),
            LifecycleAction::Disarm => self.disarm_all(phase),
            LifecycleAction::Ignore => {
                debug!("{}: no sensor action", phase);
                self.phase = phase;
                return;
            }
        }
        self.phase = phase;
        self.ports.events.emit(&MonitorEvent::Lifecycle(phase));
    }

    /// React to a host event by name.  Unknown names are ignored.
    pub fn on_host_event(&mut self, name: &str) {
        match PrintPhase::from_host_event(name) {
            Some(phase) => self.on_event(phase),
            None => debug!("host event '{}' ignored", name.trim()),
        }
    }

    /// Replace the settings wholesale.
    ///
    /// The old monitors are disarmed and dropped, new ones are built and set
    /// up, and if a print job is in progress they are armed straight away.
    pub fn apply_settings(&mut self, settings: PluginSettings) {
        for monitor in self.monitors() {
            monitor.disarm();
        }
        let (nonuniform, overfill) = build_monitors(&settings, &self.ports, &self.runtime);
        self.settings = settings;
        self.nonuniform = nonuniform;
        self.overfill = overfill;
        info!("settings applied, sensors rebuilt");

        self.setup_sensors();
        if self.phase.is_job_active() {
            self.arm_all(self.phase);
        }
    }

    /// Disarm both monitors ahead of process exit.
    pub fn shutdown(&mut self) {
        for monitor in self.monitors() {
            monitor.disarm();
        }
        info!("filament sensors shut down");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn monitor(&self, kind: SensorKind) -> &Arc<SensorMonitor> {
        match kind {
            SensorKind::Nonuniform => &self.nonuniform,
            SensorKind::Overfill => &self.overfill,
        }
    }

    pub fn status(&self, kind: SensorKind) -> SensorStatus {
        self.monitor(kind).status()
    }

    /// Status API body for one sensor.
    pub fn status_response(&self, kind: SensorKind) -> StatusResponse {
        StatusResponse::from(self.status(kind))
    }

    /// Status API body for one sensor, serialised.
    pub fn status_json(&self, kind: SensorKind) -> String {
        let response = self.status_response(kind);
        serde_json::to_string(&response)
            .unwrap_or_else(|_| format!(r#"{{"status":"{}"}}"#, response.status))
    }

    pub fn snapshots(&self) -> [MonitorSnapshot; 2] {
        [self.nonuniform.snapshot(), self.overfill.snapshot()]
    }

    pub fn phase(&self) -> PrintPhase {
        self.phase
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    // ── Internal ──────────────────────────────────────────────

    fn monitors(&self) -> [&Arc<SensorMonitor>; 2] {
        [&self.nonuniform, &self.overfill]
    }

    /// Select pin numbering and configure every enabled sensor input.
    fn setup_sensors(&self) {
        if !self.settings.any_sensor_enabled() {
            info!("pins not configured, sensors inactive until configured");
            return;
        }
        let mode = self.settings.mode;
        info!("using {} pin numbering", mode);
        if let Err(e) = self.ports.gpio.set_numbering(mode) {
            error!("pin numbering setup failed: {}", e);
            for monitor in self.monitors() {
                if monitor.is_enabled() {
                    monitor.take_out_of_service(e.into());
                }
            }
            return;
        }
        for monitor in self.monitors() {
            if let Err(e) = monitor.setup() {
                debug!("{} sensor left out of service: {}", monitor.kind(), e);
            }
        }
    }

    /// A print must not start on a sensor that already reads fault.
    fn abort_if_faulted(&self) {
        for monitor in self.monitors() {
            if !monitor.is_enabled() {
                continue;
            }
            let kind = monitor.kind();
            match monitor.is_ok() {
                Ok(true) => {}
                Ok(false) => {
                    warn!("printing aborted: {}!", kind.fault_message());
                    self.ports.actions.cancel();
                    self.ports.events.emit(&MonitorEvent::PrintAborted(kind));
                }
                Err(e) => warn!("{} sensor pre-check skipped: {}", kind, e),
            }
        }
    }

    fn arm_all(&self, phase: PrintPhase) {
        for monitor in self.monitors() {
            if !monitor.is_enabled() {
                continue;
            }
            info!("{}: enabling filament {} sensor", phase, monitor.kind());
            if let Err(e) = monitor.arm() {
                warn!("{}: {} sensor not armed: {}", phase, monitor.kind(), e);
            }
        }
    }

    fn disarm_all(&self, phase: PrintPhase) {
        info!("{}: disabling filament sensors", phase);
        for monitor in self.monitors() {
            monitor.disarm();
        }
    }
}

fn build_monitors(
    settings: &PluginSettings,
    ports: &MonitorPorts,
    runtime: &EdgeRuntime,
) -> (Arc<SensorMonitor>, Arc<SensorMonitor>) {
    let build = |kind| {
        SensorMonitor::new(
            kind,
            settings.sensor_config(kind),
            ports.clone(),
            runtime.clone(),
        )
    };
    (build(SensorKind::Nonuniform), build(SensorKind::Overfill))
}

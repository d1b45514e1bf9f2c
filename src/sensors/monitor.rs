//! Debounced sensor monitor.
//!
//! One monitor per physical switch.  The GPIO backend calls back once per raw
//! edge; the monitor turns each edge into a debounce task on the
//! [`EdgeRuntime`] that waits out the bounce interval, re-samples the pin and
//! feeds the settled level to the [`Latch`].
//!
//! ```text
//!  edge ─▶ dispatch_edge ─▶ task: sleep(bounce) ─▶ settle ─▶ Latch::evaluate
//!                                                              │
//!                       pause() / send_commands() ◀── Trigger ─┘
//! ```
//!
//! ## Cancellation
//!
//! Every arm and disarm bumps an epoch and drops the pending debounce tasks.
//! A task that is already past its wait when that happens still re-checks
//! the epoch under the state lock, so it cannot act on a stale arming.
//!
//! ## Failure
//!
//! Invalid settings or a failing GPIO backend take the monitor out of
//! service: edge detection is removed, the failure is logged at error level,
//! and status queries report [`SensorStatus::Disabled`].  Nothing retries
//! automatically; only a settings reload builds a fresh monitor.

use std::cell::RefCell;
use std::sync::Arc;

use edge_executor::Task;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::PinState;
use log::{debug, error, info, warn};

use crate::app::events::MonitorEvent;
use crate::app::ports::{EdgeCallback, EventSink, GpioPort, PrintActionSink};
use crate::config::{ResendPolicy, SensorConfig};
use crate::error::{Error, Result};
use crate::pins::{Edge, Pull};
use crate::runtime::EdgeRuntime;

use super::latch::{FaultPolicy, Latch, Verdict};
use super::{SensorKind, SensorStatus};

/// Debounce tasks tracked per monitor.  Edges beyond this while all slots
/// are still waiting are chatter and get dropped.
const MAX_PENDING_DEBOUNCES: usize = 8;

/// The ports a monitor talks to.  Shared by both monitors.
#[derive(Clone)]
pub struct MonitorPorts {
    pub gpio: Arc<dyn GpioPort>,
    pub actions: Arc<dyn PrintActionSink>,
    pub events: Arc<dyn EventSink>,
}

#[derive(Debug, Default)]
struct MonitorState {
    armed: bool,
    /// Arm generation; debounce tasks carry the epoch they were spawned in.
    epoch: u32,
    latch: Latch,
    /// Error that took the sensor out of service.
    failure: Option<Error>,
}

/// Point-in-time view of a monitor for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub kind: SensorKind,
    pub enabled: bool,
    pub armed: bool,
    pub latched: bool,
    pub trigger_count: u32,
    pub failure: Option<Error>,
}

type PendingTasks = heapless::Vec<Task<()>, MAX_PENDING_DEBOUNCES>;

pub struct SensorMonitor {
    kind: SensorKind,
    config: SensorConfig,
    policy: FaultPolicy,
    ports: MonitorPorts,
    runtime: EdgeRuntime,
    state: Mutex<CriticalSectionRawMutex, RefCell<MonitorState>>,
    pending: Mutex<CriticalSectionRawMutex, RefCell<PendingTasks>>,
}

impl SensorMonitor {
    pub fn new(
        kind: SensorKind,
        config: SensorConfig,
        ports: MonitorPorts,
        runtime: EdgeRuntime,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            policy: FaultPolicy::from(&config),
            config,
            ports,
            runtime,
            state: Mutex::new(RefCell::new(MonitorState::default())),
            pending: Mutex::new(RefCell::new(PendingTasks::new())),
        })
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    // ── Setup and arming ──────────────────────────────────────

    /// Validate settings and configure the pin as a pulled-up input.
    /// The numbering scheme must already be selected on the GPIO port.
    pub fn setup(&self) -> Result<()> {
        if !self.is_enabled() {
            info!("{} sensor pin not configured", self.kind);
            return Ok(());
        }
        self.config
            .validate()
            .map_err(|e| self.take_out_of_service(e.into()))?;
        self.ports
            .gpio
            .configure_input(self.config.pin, Pull::Up)
            .map_err(|e| self.take_out_of_service(e.into()))?;
        info!(
            "filament {} sensor active on GPIO pin [{}]",
            self.kind, self.config.pin
        );
        if self.ports.gpio.read(self.config.pin) == Ok(self.config.expected_level()) {
            warn!(
                "{} sensor reads fault at rest (switch = {}), prints will be cancelled",
                self.kind, self.config.switch
            );
        }
        Ok(())
    }

    /// Reset the latch and (re)install edge detection on both edges.
    ///
    /// Any previous registration is removed first, so arming twice leaves a
    /// single live callback.  No-op for a disabled sensor.
    pub fn arm(self: &Arc<Self>) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if let Some(failure) = self.failure() {
            warn!("{} sensor not armed, out of service: {}", self.kind, failure);
            return Err(Error::SensorFailed(self.kind));
        }
        self.config
            .validate()
            .map_err(|e| self.take_out_of_service(e.into()))?;

        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.armed = false;
            s.epoch = s.epoch.wrapping_add(1);
            s.latch.reset();
        });
        self.cancel_pending();

        let pin = self.config.pin;
        self.ports.gpio.unregister_edge_callback(pin);

        let monitor = Arc::downgrade(self);
        let callback: EdgeCallback = Box::new(move |edge_pin| {
            if let Some(monitor) = monitor.upgrade() {
                monitor.dispatch_edge(edge_pin);
            }
        });
        self.ports
            .gpio
            .register_edge_callback(pin, Edge::Both, self.config.debounce(), callback)
            .map_err(|e| self.take_out_of_service(e.into()))?;

        self.state.lock(|s| s.borrow_mut().armed = true);
        info!("{} sensor armed on pin {}", self.kind, pin);
        self.ports.events.emit(&MonitorEvent::Armed(self.kind));
        Ok(())
    }

    /// Remove edge detection and cancel pending debounces.  The latch is left
    /// as is; the next arm resets it.  No-op for a disabled sensor.
    pub fn disarm(&self) {
        if !self.is_enabled() {
            return;
        }
        self.ports.gpio.unregister_edge_callback(self.config.pin);
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.armed = false;
            s.epoch = s.epoch.wrapping_add(1);
        });
        self.cancel_pending();
        info!("{} sensor disarmed", self.kind);
        self.ports.events.emit(&MonitorEvent::Disarmed(self.kind));
    }

    // ── Queries ───────────────────────────────────────────────

    /// Sample the pin: `true` if it does not read the fault level.
    pub fn is_ok(&self) -> Result<bool> {
        if !self.is_enabled() {
            return Err(Error::SensorDisabled(self.kind));
        }
        if self.failure().is_some() {
            return Err(Error::SensorFailed(self.kind));
        }
        let level = self.sample()?;
        Ok(level != self.config.expected_level())
    }

    /// Tri-state status for the status API.
    pub fn status(&self) -> SensorStatus {
        if !self.is_enabled() || self.failure().is_some() {
            return SensorStatus::Disabled;
        }
        // The latch only counts while armed; afterwards the live level rules.
        let latched = self.state.lock(|s| {
            let s = s.borrow();
            s.armed && s.latch.is_latched()
        });
        if latched {
            return SensorStatus::Fault;
        }
        match self.is_ok() {
            Ok(true) => SensorStatus::Ok,
            Ok(false) => SensorStatus::Fault,
            Err(_) => SensorStatus::Disabled,
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.state.lock(|s| {
            let s = s.borrow();
            MonitorSnapshot {
                kind: self.kind,
                enabled: self.is_enabled(),
                armed: s.armed,
                latched: s.latch.is_latched(),
                trigger_count: s.latch.trigger_count(),
                failure: s.failure,
            }
        })
    }

    pub fn failure(&self) -> Option<Error> {
        self.state.lock(|s| s.borrow().failure)
    }

    // ── Edge handling ─────────────────────────────────────────

    /// Handle one raw edge: wait out the bounce interval, re-sample and act.
    ///
    /// Never fails.  The result is dropped if the monitor is disarmed or
    /// re-armed while waiting, and edges on a disarmed monitor are ignored.
    pub async fn on_edge(&self, pin: i32) {
        let epoch = self.current_epoch();
        self.debounce(pin, epoch).await;
    }

    async fn debounce(&self, pin: i32, epoch: u32) {
        if !self.is_enabled() {
            return;
        }
        async_io_mini::Timer::after(self.config.debounce()).await;
        self.settle(pin, epoch);
    }

    /// Edge callback body: spawn the debounce task and track it for
    /// cancellation.  Runs on the GPIO backend's context.
    ///
    /// A task is only spawned once a pending slot is free, so the runtime's
    /// run queue never holds more than [`MAX_PENDING_DEBOUNCES`] debounces
    /// per monitor however fast the pin chatters.
    fn dispatch_edge(self: &Arc<Self>, pin: i32) {
        let epoch = self.current_epoch();
        let spawned = self.pending.lock(|p| {
            let mut p = p.borrow_mut();
            p.retain(|t| !t.is_finished());
            if p.is_full() {
                return false;
            }
            let monitor = Arc::clone(self);
            let task = self.runtime.spawn(async move {
                monitor.debounce(pin, epoch).await;
            });
            p.push(task).is_ok()
        });
        if !spawned {
            debug!(
                "{} sensor: {} debounces already pending, dropping edge",
                self.kind, MAX_PENDING_DEBOUNCES
            );
        }
    }

    /// Post-debounce step: sample, run the latch, perform side effects.
    fn settle(&self, pin: i32, epoch: u32) {
        if !self.is_current(epoch) {
            debug!("{} sensor: stale edge on pin {} ignored", self.kind, pin);
            return;
        }
        let Ok(level) = self.sample() else {
            return;
        };
        let fault = level == self.config.expected_level();

        let verdict = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if !s.armed || s.epoch != epoch || s.failure.is_some() {
                return None;
            }
            Some(s.latch.evaluate(fault, self.policy))
        });

        match verdict {
            None => debug!("{} sensor: disarmed during debounce", self.kind),
            Some(Verdict::Trigger) => self.report_fault(),
            Some(Verdict::Suppressed) => {
                info!("{} sensor callback but no trigger state change", self.kind);
                self.ports.events.emit(&MonitorEvent::BounceIgnored(self.kind));
            }
            Some(Verdict::Ok { unlatched }) => {
                info!("{} sensor reads ok", self.kind);
                self.ports.events.emit(&MonitorEvent::ConditionOk {
                    sensor: self.kind,
                    unlatched,
                });
            }
        }
    }

    fn report_fault(&self) {
        warn!("{} sensor: {}!", self.kind, self.kind.fault_message());
        if self.config.resend_policy == ResendPolicy::SendOnce {
            info!("sending gcode only once");
        }
        if self.config.pause_on_fault {
            info!("pausing print");
            self.ports.actions.pause();
        }
        if !self.config.fault_gcode.is_empty() {
            info!(
                "sending {} {} fault gcode line(s)",
                self.config.fault_gcode.len(),
                self.kind
            );
            self.ports.actions.send_commands(&self.config.fault_gcode);
        }
        self.ports.events.emit(&MonitorEvent::FaultDetected {
            sensor: self.kind,
            paused: self.config.pause_on_fault,
            commands_sent: self.config.fault_gcode.len(),
        });
    }

    // ── Internal ──────────────────────────────────────────────

    fn sample(&self) -> Result<PinState> {
        self.ports
            .gpio
            .read(self.config.pin)
            .map_err(|e| self.take_out_of_service(e.into()))
    }

    fn current_epoch(&self) -> u32 {
        self.state.lock(|s| s.borrow().epoch)
    }

    fn is_current(&self, epoch: u32) -> bool {
        self.state.lock(|s| {
            let s = s.borrow();
            s.armed && s.epoch == epoch
        })
    }

    /// Drop every tracked debounce task, outside the lock.
    fn cancel_pending(&self) {
        let cancelled = self.pending.lock(|p| core::mem::take(&mut *p.borrow_mut()));
        drop(cancelled);
    }

    /// Record a fatal error and stop monitoring.  Returns the error for `?`.
    pub fn take_out_of_service(&self, error: Error) -> Error {
        let first = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.armed = false;
            s.epoch = s.epoch.wrapping_add(1);
            if s.failure.is_some() {
                return false;
            }
            s.failure = Some(error);
            true
        });
        if first {
            if self.is_enabled() {
                self.ports.gpio.unregister_edge_callback(self.config.pin);
            }
            error!(
                "{} sensor out of service ({}), print is NOT protected",
                self.kind, error
            );
            self.ports.events.emit(&MonitorEvent::SensorFailed {
                sensor: self.kind,
                error,
            });
        }
        error
    }
}

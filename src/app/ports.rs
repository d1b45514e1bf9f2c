//! Port traits — the hexagonal boundary between the monitor core and the outside world.
//!
//! ```text
//!   GpioPort ──▶ SensorMonitor ──▶ PrintActionSink
//!                      │
//!   SettingsPort ──▶ Coordinator ──▶ EventSink
//! ```
//!
//! Driven adapters (GPIO backend, printer command channel, settings store,
//! log output) implement these traits.  Monitors run their debounce work on
//! the edge runtime thread while lifecycle events arrive on the host thread,
//! so every port used by a monitor is `Send + Sync` and takes `&self`.

use core::time::Duration;

use embedded_hal::digital::PinState;

use crate::config::PluginSettings;
use crate::pins::{Edge, PinNumbering, Pull};

use super::events::MonitorEvent;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: hardware ↔ monitor)
// ───────────────────────────────────────────────────────────────

/// Callback invoked by the GPIO backend once per raw edge, with the
/// originating pin.  Runs on the backend's interrupt context and must
/// return quickly.
pub type EdgeCallback = Box<dyn Fn(i32) + Send + Sync + 'static>;

/// Digital input primitive with edge detection.
pub trait GpioPort: Send + Sync {
    /// Select the pin numbering scheme for all subsequent calls.
    fn set_numbering(&self, mode: PinNumbering) -> Result<(), GpioError>;

    /// Configure `pin` as an input with the given bias.
    fn configure_input(&self, pin: i32, pull: Pull) -> Result<(), GpioError>;

    /// Sample the current level of `pin`.
    fn read(&self, pin: i32) -> Result<PinState, GpioError>;

    /// Install edge detection on `pin`.  The backend suppresses edges that
    /// arrive within `bounce` of the previously delivered one.
    fn register_edge_callback(
        &self,
        pin: i32,
        edge: Edge,
        bounce: Duration,
        callback: EdgeCallback,
    ) -> Result<(), GpioError>;

    /// Remove edge detection from `pin`.  Returns normally if none is installed.
    fn unregister_edge_callback(&self, pin: i32);
}

// ───────────────────────────────────────────────────────────────
// Print action sink (driven adapter: monitor → printer)
// ───────────────────────────────────────────────────────────────

/// The host's printer-control channel.
///
/// Shared by both monitors and the coordinator pre-check; calls may arrive
/// concurrently from either sensor's debounce task.  Implementations own
/// their serialisation.
pub trait PrintActionSink: Send + Sync {
    /// Pause the running print job.
    fn pause(&self);

    /// Cancel the running print job.
    fn cancel(&self);

    /// Send gcode lines to the printer, in order.
    fn send_commands(&self, commands: &[String]);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`MonitorEvent`]s through this port.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &MonitorEvent);
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: settings store → core)
// ───────────────────────────────────────────────────────────────

/// Read-only access to the persisted plugin settings.
///
/// Returns [`PluginSettings::default()`] if nothing has been stored yet.
pub trait SettingsPort {
    fn load(&self) -> Result<PluginSettings, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from settings loading and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored settings failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`GpioPort`] operations.  Each carries the pin involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Numbering scheme could not be applied.
    NumberingRejected,
    /// Pin could not be configured as an input.
    SetupFailed(i32),
    /// Level read failed.
    ReadFailed(i32),
    /// Edge detection could not be installed.
    EdgeDetectFailed(i32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NumberingRejected => write!(f, "pin numbering mode rejected"),
            Self::SetupFailed(pin) => write!(f, "input setup failed on pin {}", pin),
            Self::ReadFailed(pin) => write!(f, "read failed on pin {}", pin),
            Self::EdgeDetectFailed(pin) => write!(f, "edge detection failed on pin {}", pin),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GpioError {}

//! Unified error type for the monitor core.
//!
//! A single `Error` enum that every subsystem converts into.  All variants
//! are `Copy` so a monitor can record the error that took it out of service
//! and hand it to status queries without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, GpioError};
use crate::sensors::SensorKind;

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Sensor settings are malformed or out of range.
    Config(ConfigError),
    /// The GPIO backend failed (setup, edge registration or read).
    Hardware(GpioError),
    /// The sensor has no pin configured.
    SensorDisabled(SensorKind),
    /// The sensor was taken out of service by an earlier failure.
    SensorFailed(SensorKind),
    /// The edge runtime could not be started.
    Runtime(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::SensorDisabled(kind) => write!(f, "{kind} sensor not configured"),
            Self::SensorFailed(kind) => write!(f, "{kind} sensor out of service"),
            Self::Runtime(msg) => write!(f, "runtime: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Hardware(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

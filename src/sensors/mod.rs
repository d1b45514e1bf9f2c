//! Sensor subsystem: the debounced monitor and its latch policy.
//!
//! Two monitors run side by side, one per physical switch.  Each converts raw
//! edge interrupts into at most one fault report per fault episode.

pub mod latch;
pub mod monitor;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which physical sensor a monitor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Filament diameter/uniformity switch.
    Nonuniform,
    /// Filament overfill switch.
    Overfill,
}

impl SensorKind {
    pub const ALL: [Self; 2] = [Self::Nonuniform, Self::Overfill];

    /// Parse the lowercase name used by the CLI and status API.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nonuniform" => Some(Self::Nonuniform),
            "overfill" => Some(Self::Overfill),
            _ => None,
        }
    }

    /// Log line for a freshly reported fault.
    pub fn fault_message(self) -> &'static str {
        match self {
            Self::Nonuniform => "nonuniform filament detected",
            Self::Overfill => "filament overfilled",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nonuniform => f.write_str("nonuniform"),
            Self::Overfill => f.write_str("overfill"),
        }
    }
}

/// Tri-state answer to a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    /// No pin configured, or the sensor was taken out of service.
    Disabled,
    /// No fault.
    Ok,
    /// Fault reported (latched) or currently reading the fault level.
    Fault,
}

impl SensorStatus {
    /// Code served by the status API: `-1` disabled, `1` ok, `0` fault.
    pub fn code(self) -> &'static str {
        match self {
            Self::Disabled => "-1",
            Self::Ok => "1",
            Self::Fault => "0",
        }
    }
}

/// Body of the status API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl From<SensorStatus> for StatusResponse {
    fn from(status: SensorStatus) -> Self {
        Self {
            status: status.code().to_owned(),
        }
    }
}

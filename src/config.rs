//! Plugin settings and per-sensor configuration.
//!
//! [`PluginSettings`] is what the settings store holds.  Each monitor gets an
//! immutable [`SensorConfig`] derived from it; a settings change replaces the
//! configs wholesale rather than mutating them.

use core::time::Duration;

use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins::{self, PIN_DISABLED, PinNumbering};
use crate::sensors::SensorKind;

/// Shortest accepted bounce interval.
pub const MIN_BOUNCE_MS: u32 = 1;
/// Longest accepted bounce interval.
pub const MAX_BOUNCE_MS: u32 = 10_000;

/// Settings for one sensor input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// GPIO pin, `-1` when no sensor is fitted.
    pub pin: i32,
    /// Bounce interval in milliseconds.
    pub bounce_ms: u32,
    /// Level (0 or 1) the switch reads when the fault condition is present.
    pub switch: u8,
    /// Gcode sent on fault, one command per line.
    pub fault_gcode: String,
    /// Pause the print when the fault is detected.
    pub pause_print: bool,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            pin: PIN_DISABLED,
            bounce_ms: 250,
            switch: 1,
            fault_gcode: String::new(),
            pause_print: true,
        }
    }
}

/// Everything the settings store holds for the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub nonuniform: SensorSettings,
    pub overfill: SensorSettings,
    /// Pin numbering scheme shared by both sensors.
    pub mode: PinNumbering,
    /// Send fault gcode once per fault instead of on every bounce.
    pub send_gcode_only_once: bool,
}

impl PluginSettings {
    /// Parse settings from their JSON form.  Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| {
            log::warn!("settings: parse error: {}", e);
            ConfigError::Corrupted
        })
    }

    pub fn sensor(&self, kind: SensorKind) -> &SensorSettings {
        match kind {
            SensorKind::Nonuniform => &self.nonuniform,
            SensorKind::Overfill => &self.overfill,
        }
    }

    pub fn resend_policy(&self) -> ResendPolicy {
        if self.send_gcode_only_once {
            ResendPolicy::SendOnce
        } else {
            ResendPolicy::SendRepeatedly
        }
    }

    /// Build the immutable config for one sensor's monitor.
    pub fn sensor_config(&self, kind: SensorKind) -> SensorConfig {
        let s = self.sensor(kind);
        SensorConfig {
            pin: s.pin,
            bounce_ms: s.bounce_ms,
            switch: s.switch,
            pause_on_fault: s.pause_print,
            fault_gcode: split_gcode(&s.fault_gcode),
            resend_policy: self.resend_policy(),
            numbering: self.mode,
        }
    }

    /// True if at least one sensor has a pin assigned.
    pub fn any_sensor_enabled(&self) -> bool {
        SensorKind::ALL
            .iter()
            .any(|&kind| !pins::is_disabled(self.sensor(kind).pin))
    }
}

/// Split stored gcode text into commands, one per non-blank line.
fn split_gcode(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Whether the latch sticks after a fault report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendPolicy {
    /// Report once per fault episode; bounces while faulted are ignored.
    SendOnce,
    /// Re-report on every bounce sampled while the fault persists.
    SendRepeatedly,
}

/// Immutable configuration for one [`SensorMonitor`](crate::sensors::monitor::SensorMonitor).
///
/// Values are carried as loaded; [`validate`](Self::validate) runs when the
/// monitor arms so a bad value takes out only that sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub pin: i32,
    pub bounce_ms: u32,
    pub switch: u8,
    pub pause_on_fault: bool,
    pub fault_gcode: Vec<String>,
    pub resend_policy: ResendPolicy,
    pub numbering: PinNumbering,
}

impl SensorConfig {
    /// A config with no pin assigned.
    pub fn disabled() -> Self {
        PluginSettings::default().sensor_config(SensorKind::Nonuniform)
    }

    pub fn is_enabled(&self) -> bool {
        !pins::is_disabled(self.pin)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.bounce_ms))
    }

    /// Level that represents the fault condition.
    pub fn expected_level(&self) -> PinState {
        PinState::from(self.switch != 0)
    }

    /// Range-check pin, bounce and polarity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        pins::validate_pin(self.pin, self.numbering)?;
        if !(MIN_BOUNCE_MS..=MAX_BOUNCE_MS).contains(&self.bounce_ms) {
            return Err(ConfigError::ValidationFailed("bounce must be 1–10000 ms"));
        }
        if self.switch > 1 {
            return Err(ConfigError::ValidationFailed("switch polarity must be 0 or 1"));
        }
        Ok(())
    }
}

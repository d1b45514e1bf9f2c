//! GPIO pin identities and numbering schemes.
//!
//! Sensor pins are plain `i32` identifiers so the settings store can carry the
//! `-1` "not configured" sentinel.  Whether a number is valid depends on the
//! numbering scheme selected for the header:
//!
//! | Scheme  | Meaning                       | Valid inputs              |
//! |---------|-------------------------------|---------------------------|
//! | `Board` | Physical 40-pin header number | GPIO-capable header pins  |
//! | `Bcm`   | Broadcom channel number       | 0–27                      |

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Sentinel pin value meaning "sensor not configured".
pub const PIN_DISABLED: i32 = -1;

/// Physical header pins that are wired to a GPIO channel.
/// Power and ground pins are excluded.
const BOARD_GPIO_PINS: [i32; 28] = [
    3, 5, 7, 8, 10, 11, 12, 13, 15, 16, 18, 19, 21, 22, 23, 24, 26, 27, 28, 29, 31, 32, 33, 35,
    36, 37, 38, 40,
];

/// Highest Broadcom channel exposed on the header.
const BCM_MAX_CHANNEL: i32 = 27;

/// Pin numbering scheme.  Serialised as the integer the settings UI stores
/// (`0` = board, `1` = BCM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PinNumbering {
    #[default]
    Board,
    Bcm,
}

impl TryFrom<u8> for PinNumbering {
    type Error = ConfigError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Board),
            1 => Ok(Self::Bcm),
            _ => Err(ConfigError::ValidationFailed("mode must be 0 (board) or 1 (BCM)")),
        }
    }
}

impl From<PinNumbering> for u8 {
    fn from(mode: PinNumbering) -> Self {
        match mode {
            PinNumbering::Board => 0,
            PinNumbering::Bcm => 1,
        }
    }
}

impl core::fmt::Display for PinNumbering {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Board => write!(f, "board"),
            Self::Bcm => write!(f, "BCM"),
        }
    }
}

/// Input bias applied when a sensor pin is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
    None,
}

/// Which transitions raise an edge callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// `true` if `pin` is the "not configured" sentinel.
pub fn is_disabled(pin: i32) -> bool {
    pin == PIN_DISABLED
}

/// Check that `pin` addresses a usable input under `numbering`.
pub fn validate_pin(pin: i32, numbering: PinNumbering) -> Result<(), ConfigError> {
    let ok = match numbering {
        PinNumbering::Board => BOARD_GPIO_PINS.contains(&pin),
        PinNumbering::Bcm => (0..=BCM_MAX_CHANNEL).contains(&pin),
    };
    if ok {
        Ok(())
    } else {
        Err(match numbering {
            PinNumbering::Board => {
                ConfigError::ValidationFailed("pin is not a GPIO-capable header pin")
            }
            PinNumbering::Bcm => ConfigError::ValidationFailed("BCM channel must be 0–27"),
        })
    }
}

//! Fuzz target: settings parsing and validation
//!
//! Feeds arbitrary bytes to `PluginSettings::from_json` and, when they
//! parse, derives and validates both sensor configs.  Verifies:
//! - No panics under arbitrary input
//! - A config that validates has an enabled pin and a bounce in range
//!
//! cargo fuzz run fuzz_settings

#![no_main]

use filamentwatch::config::{MAX_BOUNCE_MS, MIN_BOUNCE_MS, PluginSettings};
use filamentwatch::sensors::SensorKind;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(settings) = PluginSettings::from_json(text) else {
        return;
    };
    for kind in SensorKind::ALL {
        let config = settings.sensor_config(kind);
        if config.validate().is_ok() {
            assert!(config.is_enabled());
            assert!((MIN_BOUNCE_MS..=MAX_BOUNCE_MS).contains(&config.bounce_ms));
            assert!(config.fault_gcode.iter().all(|line| !line.trim().is_empty()));
        }
    }
});

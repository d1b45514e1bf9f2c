//! JSON settings file adapter.
//!
//! Implements [`SettingsPort`] over a JSON document on disk.  A missing file
//! means "never configured" and yields defaults (both sensors disabled).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, SettingsPort};
use crate::config::PluginSettings;

pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsPort for JsonSettingsStore {
    fn load(&self) -> Result<PluginSettings, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "settings: {} not found, using defaults",
                    self.path.display()
                );
                return Ok(PluginSettings::default());
            }
            Err(e) => {
                warn!("settings: failed to read {}: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let settings = PluginSettings::from_json(&text)?;
        info!("settings: loaded from {}", self.path.display());
        Ok(settings)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Settings are stored as RON. Missing fields fall back to their defaults,
//! so a settings file only needs the values it overrides.

use crate::connection::DEFAULT_CURVATURE;
use crate::graph::DEFAULT_HIT_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "blockwire.ron";

/// Error loading or storing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for these settings
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Values are out of range
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Interaction and presentation settings for the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Side of the square searched around the pointer when hit-testing
    pub hit_tolerance: f32,
    /// Smallest view scale
    pub min_zoom: f32,
    /// Largest view scale
    pub max_zoom: f32,
    /// Scale change per scroll unit
    pub zoom_speed: f32,
    /// Horizontal control offset of connection curves
    pub connection_curvature: f32,
    /// Names of the keys that delete the selected block (egui key names)
    pub delete_keys: Vec<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            min_zoom: 1.0,
            max_zoom: 10.0,
            zoom_speed: 0.001,
            connection_curvature: DEFAULT_CURVATURE,
            delete_keys: vec![egui::Key::Delete.name().to_string()],
        }
    }
}

impl EditorSettings {
    /// Parse settings from a RON string
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render settings as pretty RON
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_ron_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded editor settings");
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SettingsError> {
        let finite = [
            ("hit_tolerance", self.hit_tolerance),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("zoom_speed", self.zoom_speed),
            ("connection_curvature", self.connection_curvature),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SettingsError::Invalid(format!("{name} must be finite")));
        }
        if self.hit_tolerance <= 0.0 {
            return Err(SettingsError::Invalid("hit_tolerance must be positive".into()));
        }
        if self.min_zoom <= 0.0 || self.min_zoom > self.max_zoom {
            return Err(SettingsError::Invalid(format!(
                "zoom range [{}, {}] is empty or not positive",
                self.min_zoom, self.max_zoom
            )));
        }
        if let Some(name) = self.delete_keys.iter().find(|n| egui::Key::from_name(n).is_none()) {
            return Err(SettingsError::Invalid(format!("unknown key name: {name}")));
        }
        Ok(())
    }

    /// Whether `key` deletes the selected block
    pub fn is_delete_key(&self, key: egui::Key) -> bool {
        self.delete_keys.iter().any(|name| egui::Key::from_name(name) == Some(key))
    }
}

//! Persisted tuner settings: the A4 reference pitch and the instrument
//! preset, stored as a small JSON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use taut_core::tuning::{DEFAULT_A4_HZ, ReferenceConfig};

use crate::presets::InstrumentMode;

/// User-facing settings, loaded at startup and written by `taut set`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunerSettings {
    /// Reference pitch for A4, in Hz.
    pub a4: f32,
    /// Instrument preset mode.
    pub mode: InstrumentMode,
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self {
            a4: DEFAULT_A4_HZ,
            mode: InstrumentMode::Chromatic,
        }
    }
}

impl TunerSettings {
    /// Loads settings from `path`, falling back to defaults when the
    /// file does not exist. A malformed file or reference pitch is an
    /// error, not a silent fallback.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&data)
            .with_context(|| format!("malformed settings file {}", path.display()))?;
        // Reject a bad reference pitch here, before it can reach the
        // note mapper.
        settings.reference()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("cannot write settings file {}", path.display()))?;
        Ok(())
    }

    /// The validated reference configuration for the engine.
    pub fn reference(&self) -> Result<ReferenceConfig> {
        ReferenceConfig::new(self.a4).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taut.json");

        let settings = TunerSettings {
            a4: 442.0,
            mode: InstrumentMode::Guitar,
        };
        settings.save(&path).unwrap();

        let loaded = TunerSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = TunerSettings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, TunerSettings::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taut.json");
        fs::write(&path, "{not json").unwrap();
        assert!(TunerSettings::load(&path).is_err());
    }

    #[test]
    fn non_positive_reference_pitch_is_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taut.json");
        fs::write(&path, r#"{"a4": -440.0, "mode": "guitar"}"#).unwrap();
        assert!(TunerSettings::load(&path).is_err());
    }
}

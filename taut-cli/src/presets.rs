//! Instrument string presets for the reference-tone table.
//!
//! Static data only; none of this feeds the detection logic.

use std::collections::BTreeMap;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Which instrument's open strings populate the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentMode {
    /// No fixed strings; any note is detected.
    Chromatic,
    Guitar,
    Bass,
}

/// One open string: display name and target frequency in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringPreset {
    pub name: &'static str,
    pub frequency: f32,
}

/// Standard-tuning guitar strings, high to low.
pub const GUITAR_STRINGS: [StringPreset; 6] = [
    StringPreset { name: "E4", frequency: 329.628 },
    StringPreset { name: "B3", frequency: 246.942 },
    StringPreset { name: "G3", frequency: 196.000 },
    StringPreset { name: "D3", frequency: 146.832 },
    StringPreset { name: "A2", frequency: 110.000 },
    StringPreset { name: "E2", frequency: 82.407 },
];

/// Standard-tuning bass strings, high to low.
pub const BASS_STRINGS: [StringPreset; 4] = [
    StringPreset { name: "G2", frequency: 98.000 },
    StringPreset { name: "D2", frequency: 73.416 },
    StringPreset { name: "A1", frequency: 55.000 },
    StringPreset { name: "E1", frequency: 41.203 },
];

/// Name-to-frequency lookup across every preset, for `taut tone E2`.
static STRING_MAP: Lazy<BTreeMap<&'static str, f32>> = Lazy::new(|| {
    GUITAR_STRINGS
        .iter()
        .chain(BASS_STRINGS.iter())
        .map(|s| (s.name, s.frequency))
        .collect()
});

/// The open strings shown for a mode. Chromatic has none.
pub fn strings_for(mode: InstrumentMode) -> &'static [StringPreset] {
    match mode {
        InstrumentMode::Guitar => &GUITAR_STRINGS,
        InstrumentMode::Bass => &BASS_STRINGS,
        InstrumentMode::Chromatic => &[],
    }
}

/// Resolves a string name like "E2" to its target frequency.
pub fn string_frequency(name: &str) -> Option<f32> {
    STRING_MAP.get(name).copied()
}

//! # Musical Tuning Module
//!
//! Equal-temperament note mapping and tuning classification.
//! Handles the conversion of a detected frequency into a note name,
//! octave, exact reference frequency, and signed cents deviation, all
//! relative to a configurable A4 reference pitch.
//!
//! ## Features
//! - MIDI-style semitone indexing (69 = A4)
//! - Validated, user-adjustable reference pitch
//! - Cents deviation always consistent with the chosen semitone
//! - Qualitative tuning bands for display

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The twelve pitch-class names, rooted at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Default reference pitch for A4, in Hz.
pub const DEFAULT_A4_HZ: f32 = 440.0;

/// Absolute cents deviation at or below this counts as in tune.
pub const IN_TUNE_CENTS: f32 = 5.0;

/// Absolute cents deviation above this counts as out of tune.
pub const OUT_OF_TUNE_CENTS: f32 = 20.0;

/// MIDI note number of A4.
const A4_NOTE_INDEX: i32 = 69;

/// Validated reference pitch for A4.
///
/// The engine reads this once per cycle, so replacing it mid-session
/// affects the next cycle only and never rewrites past results.
///
/// Serialized as the bare frequency; deserialization runs the same
/// validation as [`ReferenceConfig::new`], so a persisted config can
/// never smuggle in a malformed pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct ReferenceConfig {
    a4: f32,
}

/// Rejection of a malformed configuration value, raised at the
/// configuration boundary before anything reaches the note mapper.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("reference pitch must be a positive, finite frequency, got {0} Hz")]
    InvalidReferencePitch(f32),
}

impl ReferenceConfig {
    /// Builds a reference configuration, rejecting non-positive or
    /// non-finite pitches.
    pub fn new(a4: f32) -> Result<Self, ConfigError> {
        if !a4.is_finite() || a4 <= 0.0 {
            return Err(ConfigError::InvalidReferencePitch(a4));
        }
        Ok(Self { a4 })
    }

    /// The reference frequency of A4, in Hz. Always positive.
    pub fn a4(&self) -> f32 {
        self.a4
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self { a4: DEFAULT_A4_HZ }
    }
}

impl TryFrom<f32> for ReferenceConfig {
    type Error = ConfigError;

    fn try_from(a4: f32) -> Result<Self, Self::Error> {
        Self::new(a4)
    }
}

impl From<ReferenceConfig> for f32 {
    fn from(config: ReferenceConfig) -> Self {
        config.a4
    }
}

/// The nearest equal-temperament note for a detected frequency.
///
/// Derived deterministically from the frequency and the reference
/// pitch; recomputed every cycle, no independent lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteResult {
    /// Semitone index on the MIDI scale, 69 = A4.
    pub note_index: i32,
    /// Pitch-class name from [`NOTE_NAMES`].
    pub name: &'static str,
    /// Octave number in scientific pitch notation.
    pub octave: i32,
    /// Equal-temperament frequency of the chosen semitone under the
    /// current reference pitch, in Hz.
    pub exact_frequency: f32,
    /// Signed deviation of the input from `exact_frequency`, in cents.
    /// Typically within [-50, +50] but unclamped.
    pub cents_deviation: f32,
}

/// Maps a frequency to the nearest equal-temperament note.
///
/// The nearest semitone is chosen by rounding the continuous pitch
/// index `12 * log2(f / a4) + 69`, and the deviation is reported
/// relative to that semitone's exact frequency.
///
/// Defined only for `frequency > 0` and `a4 > 0`; non-positive inputs
/// produce non-finite results rather than a checked error, since
/// validation belongs to the configuration boundary.
pub fn map_to_note(frequency: f32, a4: f32) -> NoteResult {
    let note_index = (12.0 * (frequency / a4).log2() + A4_NOTE_INDEX as f32).round() as i32;
    let name = NOTE_NAMES[note_index.rem_euclid(12) as usize];
    let octave = note_index.div_euclid(12) - 1;
    let exact_frequency = a4 * 2.0_f32.powf((note_index - A4_NOTE_INDEX) as f32 / 12.0);
    let cents_deviation = 1200.0 * (frequency / exact_frequency).log2();
    NoteResult {
        note_index,
        name,
        octave,
        exact_frequency,
        cents_deviation,
    }
}

/// Qualitative tuning band for a cents deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToneBand {
    /// Within 5 cents of the target.
    InTune,
    /// More than 5 and at most 20 cents off.
    Acceptable,
    /// More than 20 cents off.
    OutOfTune,
}

/// Buckets a cents deviation by its magnitude. Boundary values are
/// inclusive on the in-tune side: exactly 5 is in tune, exactly 20 is
/// acceptable.
pub fn classify(cents_deviation: f32) -> ToneBand {
    let magnitude = cents_deviation.abs();
    if magnitude <= IN_TUNE_CENTS {
        ToneBand::InTune
    } else if magnitude <= OUT_OF_TUNE_CENTS {
        ToneBand::Acceptable
    } else {
        ToneBand::OutOfTune
    }
}

// taut-core/src/lib.rs

//! The core logic for the taut guitar & bass tuner.
//! This crate turns windows of raw microphone samples into musical
//! notes: autocorrelation pitch detection, equal-temperament note
//! mapping, and tuning classification. It is completely headless and
//! contains no audio I/O or terminal code; capture and display live
//! behind the traits in [`engine`].

pub mod engine;
pub mod pitch;
pub mod tuning;

use serde::Serialize;

use tuning::{NoteResult, ToneBand};

/// One fixed-size window of mono audio samples.
///
/// Samples are nominally in `[-1.0, 1.0]`. A frame is immutable once
/// produced; the estimator borrows it for a single call and never
/// retains it afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    /// Raw mono samples.
    pub samples: Vec<f32>,
    /// Sampling rate at capture time, in Hz.
    pub sample_rate: u32,
}

impl SampleFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }
}

/// The outcome of one completed drive cycle, published to the result
/// sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TunerEvent {
    /// A periodic signal was detected and mapped to a note.
    Pitch {
        /// Detected fundamental frequency in Hz.
        frequency: f32,
        /// Nearest equal-temperament note and its deviation.
        note: NoteResult,
        /// Qualitative tuning band for the deviation.
        band: ToneBand,
    },
    /// The engine ran a full cycle but found nothing periodic. Distinct
    /// from "not running": consumers only see this while the engine is
    /// active.
    NoSignal,
}

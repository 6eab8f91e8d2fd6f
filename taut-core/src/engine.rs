//! # Estimation Loop
//!
//! The drive cycle that pulls sample frames, runs the estimator, and
//! publishes one result per cycle.
//!
//! The engine is a two-state machine (idle/running) driven by an
//! external periodic tick, such as a display-refresh timer. It owns no
//! thread and never blocks: the capture side lives behind
//! [`SampleSource`] and hands frames over without suspending, and the
//! sink side is fire-and-forget. Each cycle snapshots the reference
//! configuration once, so a concurrent settings change is observed
//! from the next cycle on.

use thiserror::Error;

use crate::pitch::{self, PitchEstimate};
use crate::tuning::{self, ReferenceConfig};
use crate::{SampleFrame, TunerEvent};

/// Failure of the capture boundary.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The capture device could not be opened, or died mid-session.
    /// Fatal to the running state; the engine transitions back to idle
    /// and surfaces this once, without retrying.
    #[error("sample source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies fixed-size windows of mono samples.
pub trait SampleSource {
    /// Opens the underlying capture device. Called exactly once per
    /// idle-to-running transition; returns the negotiated sample rate.
    fn acquire(&mut self) -> Result<u32, SourceError>;

    /// Pulls the next frame if one is ready. `Ok(None)` means nothing
    /// is buffered this tick; the cycle is skipped and retried on the
    /// next tick, not failed. Must not block.
    fn next_frame(&mut self) -> Result<Option<SampleFrame>, SourceError>;

    /// Relinquishes the capture device. Called exactly once per
    /// running-to-idle transition.
    fn release(&mut self);
}

/// Receives one event per completed drive cycle.
///
/// Delivery is fire-and-forget; an implementation must not block the
/// next cycle.
pub trait ResultSink {
    fn publish(&mut self, event: TunerEvent);
}

/// Whether the engine currently holds a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
}

/// The tuner drive loop: source in, estimator, mapper, classifier,
/// sink out.
pub struct TunerEngine<S, K> {
    source: S,
    sink: K,
    config: ReferenceConfig,
    state: EngineState,
    sample_rate: Option<u32>,
}

impl<S: SampleSource, K: ResultSink> TunerEngine<S, K> {
    pub fn new(source: S, sink: K, config: ReferenceConfig) -> Self {
        Self {
            source,
            sink,
            config,
            state: EngineState::Idle,
            sample_rate: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The sample rate negotiated at start, while running.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn reference(&self) -> ReferenceConfig {
        self.config
    }

    /// Replaces the reference configuration. The engine reads the
    /// config once per cycle, so the change takes effect on the next
    /// cycle and never reinterprets past results.
    pub fn set_reference(&mut self, config: ReferenceConfig) {
        self.config = config;
    }

    /// Idle-to-running transition. Acquires the sample source exactly
    /// once; on failure the engine stays idle and the error is
    /// surfaced to the caller. Starting while running is a no-op.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if self.state == EngineState::Running {
            return Ok(());
        }
        let sample_rate = self.source.acquire()?;
        self.sample_rate = Some(sample_rate);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Running-to-idle transition. Releases the sample source exactly
    /// once. Stopping while idle is a no-op. Takes effect before the
    /// next tick; no in-flight cycle is left partially applied.
    pub fn stop(&mut self) {
        if self.state == EngineState::Running {
            self.source.release();
            self.sample_rate = None;
            self.state = EngineState::Idle;
        }
    }

    /// Runs one drive cycle.
    ///
    /// While idle this is a no-op. While running, it pulls at most one
    /// frame: a missing frame skips the cycle without an event, a
    /// frame produces exactly one published event (a pitch or an
    /// explicit no-signal), and a source failure releases the source,
    /// returns the engine to idle, and surfaces the error once.
    pub fn tick(&mut self) -> Result<(), SourceError> {
        if self.state == EngineState::Idle {
            return Ok(());
        }

        // Per-cycle snapshot; a concurrent settings change is not
        // observed until the next cycle.
        let a4 = self.config.a4();

        match self.source.next_frame() {
            Ok(Some(frame)) => {
                let event = match pitch::estimate(&frame) {
                    PitchEstimate::Detected(frequency) => {
                        let note = tuning::map_to_note(frequency, a4);
                        let band = tuning::classify(note.cents_deviation);
                        TunerEvent::Pitch {
                            frequency,
                            note,
                            band,
                        }
                    }
                    PitchEstimate::NoPitch => TunerEvent::NoSignal,
                };
                self.sink.publish(event);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                self.source.release();
                self.sample_rate = None;
                self.state = EngineState::Idle;
                Err(err)
            }
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Tears the engine down into its boundary halves.
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}

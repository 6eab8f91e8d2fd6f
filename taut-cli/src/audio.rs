//! # Audio Capture Module
//!
//! Microphone capture behind the engine's sample-source boundary,
//! using CPAL for the platform stream. The device callback accumulates
//! samples and hands complete frames over a channel; the engine side
//! polls with `try_recv`, so a drive tick never blocks on capture.

use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, TryRecvError};
use taut_core::SampleFrame;
use taut_core::engine::{SampleSource, SourceError};
use tracing::{info, warn};

/// Samples per analysis frame (~46 ms at 44.1 kHz).
pub const FRAME_SIZE: usize = 2048;

/// Preferred capture rate in Hz.
const TARGET_SAMPLE_RATE: u32 = 44_100;

/// A [`SampleSource`] over the default input device.
///
/// Holds nothing until `acquire` opens the device; `release` drops the
/// stream and the engine can start again later.
pub struct MicSource {
    stream: Option<cpal::Stream>,
    frames: Option<Receiver<Vec<f32>>>,
    sample_rate: u32,
}

impl MicSource {
    pub fn new() -> Self {
        Self {
            stream: None,
            frames: None,
            sample_rate: 0,
        }
    }
}

impl Default for MicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MicSource {
    fn acquire(&mut self) -> Result<u32, SourceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| SourceError::Unavailable("no input device available".into()))?;
        info!(
            device = %device.name().unwrap_or_else(|_| "<unknown>".into()),
            "opening capture device"
        );

        let configs = device
            .supported_input_configs()
            .map_err(|e| SourceError::Unavailable(format!("cannot query input formats: {e}")))?
            .collect::<Vec<_>>();
        let supported = find_supported_config(configs, TARGET_SAMPLE_RATE)
            .ok_or_else(|| SourceError::Unavailable("no suitable mono f32 input format".into()))?;

        let rate = TARGET_SAMPLE_RATE.clamp(
            supported.min_sample_rate().0,
            supported.max_sample_rate().0,
        );
        let config = supported.with_sample_rate(cpal::SampleRate(rate));
        let sample_rate = config.sample_rate().0;
        let config: cpal::StreamConfig = config.into();

        let (sender, receiver) = crossbeam_channel::unbounded::<Vec<f32>>();
        let err_fn = |err| warn!("audio stream error: {err}");

        // The callback accumulates device buffers and emits fixed-size
        // frames; a slow consumer drops frames rather than stalling
        // capture.
        let mut pending: Vec<f32> = Vec::with_capacity(FRAME_SIZE * 2);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pending.extend_from_slice(data);
                    while pending.len() >= FRAME_SIZE {
                        let frame = pending[..FRAME_SIZE].to_vec();
                        let _ = sender.try_send(frame);
                        pending.drain(..FRAME_SIZE);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| SourceError::Unavailable(format!("cannot open input stream: {e}")))?;
        stream
            .play()
            .map_err(|e| SourceError::Unavailable(format!("cannot start input stream: {e}")))?;

        info!(sample_rate, "capture running");
        self.stream = Some(stream);
        self.frames = Some(receiver);
        self.sample_rate = sample_rate;
        Ok(sample_rate)
    }

    fn next_frame(&mut self) -> Result<Option<SampleFrame>, SourceError> {
        let Some(frames) = &self.frames else {
            return Err(SourceError::Unavailable("capture not acquired".into()));
        };
        match frames.try_recv() {
            Ok(samples) => Ok(Some(SampleFrame::new(samples, self.sample_rate))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(SourceError::Unavailable("capture stream closed".into()))
            }
        }
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("error pausing capture stream: {e}");
            }
            drop(stream);
        }
        self.frames = None;
        self.sample_rate = 0;
        info!("capture released");
    }
}

/// Picks the supported configuration closest to the target rate,
/// restricted to mono 32-bit float.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            min_diff.min(max_diff)
        })
}

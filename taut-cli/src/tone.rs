//! Reference tone synthesis on the default output device.
//!
//! A UI convenience for tuning by ear: the detection engine never
//! calls this, and playback runs independently of capture.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};

/// Peak amplitude of the synthesized tone.
const TONE_AMPLITUDE: f32 = 0.2;

/// Linear attack length, in seconds.
const ATTACK_SECS: f32 = 0.02;

/// Exponential release time constant, in seconds.
const RELEASE_SECS: f32 = 0.05;

/// Plays a sine tone at `frequency` Hz for `seconds`, blocking until
/// the release tail has faded out.
pub fn play_tone(frequency: f32, seconds: f32) -> Result<()> {
    if !frequency.is_finite() || frequency <= 0.0 {
        bail!("tone frequency must be positive, got {frequency} Hz");
    }
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("tone duration must be positive, got {seconds} s");
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no output device available")?;
    let supported = device
        .default_output_config()
        .context("cannot query the default output format")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        bail!(
            "default output device is not f32, got {:?}",
            supported.sample_format()
        );
    }
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0 as f32;
    let channels = config.channels as usize;

    let attack_samples = (ATTACK_SECS * sample_rate).max(1.0) as u64;
    let sustain_samples = (seconds * sample_rate) as u64;
    let release_samples = RELEASE_SECS * sample_rate;

    let mut clock: u64 = 0;
    let err_fn = |err| warn!("audio stream error: {err}");
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let gain = if clock < attack_samples {
                        TONE_AMPLITUDE * clock as f32 / attack_samples as f32
                    } else if clock < sustain_samples {
                        TONE_AMPLITUDE
                    } else {
                        TONE_AMPLITUDE
                            * (-((clock - sustain_samples) as f32) / release_samples).exp()
                    };
                    let t = clock as f32 / sample_rate;
                    let value = gain * (2.0 * std::f32::consts::PI * frequency * t).sin();
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                    clock += 1;
                }
            },
            err_fn,
            None,
        )
        .context("cannot open output stream")?;
    stream.play().context("cannot start output stream")?;

    info!(frequency, seconds, "playing reference tone");
    std::thread::sleep(Duration::from_secs_f32(seconds + 6.0 * RELEASE_SECS));
    drop(stream);
    Ok(())
}

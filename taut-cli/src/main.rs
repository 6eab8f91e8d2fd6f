//! # taut — a terminal guitar & bass tuner
//!
//! Captures microphone audio, runs the detection engine from
//! `taut-core` on a fixed drive tick, and renders the result as a
//! needle line on stdout. Also plays reference tones for the open
//! strings of the configured instrument.

mod audio;
mod display;
mod presets;
mod settings;
mod tone;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use taut_core::engine::TunerEngine;
use taut_core::tuning::ReferenceConfig;
use tracing::info;

use crate::audio::MicSource;
use crate::display::TerminalSink;
use crate::presets::InstrumentMode;
use crate::settings::TunerSettings;

/// Interval between drive ticks, roughly a display refresh.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Default settings file location.
const DEFAULT_SETTINGS_PATH: &str = "taut.json";

#[derive(Parser)]
#[command(name = "taut", version, about = "Guitar & bass tuner for the terminal")]
struct Cli {
    /// Path to the settings file.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Listen on the microphone and show the detected pitch.
    Listen {
        /// Reference pitch for A4 in Hz, overriding the settings file.
        #[arg(long)]
        a4: Option<f32>,
        /// Stop after this many seconds instead of running until killed.
        #[arg(long)]
        seconds: Option<f32>,
    },
    /// Play a reference tone for an open string or a frequency in Hz.
    Tone {
        /// String name (e.g. "E2", "A2") or a frequency in Hz.
        target: String,
        /// Tone length in seconds.
        #[arg(long, default_value_t = 2.0)]
        duration: f32,
    },
    /// Print the open-string reference table.
    Strings {
        /// Instrument preset, overriding the settings file.
        #[arg(long, value_enum)]
        mode: Option<InstrumentMode>,
    },
    /// Persist settings for later runs.
    Set {
        /// Reference pitch for A4 in Hz.
        #[arg(long)]
        a4: Option<f32>,
        /// Instrument preset.
        #[arg(long, value_enum)]
        mode: Option<InstrumentMode>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = TunerSettings::load(&cli.config)?;

    match cli.command {
        Command::Listen { a4, seconds } => listen(&settings, a4, seconds),
        Command::Tone { target, duration } => play_reference(&target, duration),
        Command::Strings { mode } => {
            print_strings(mode.unwrap_or(settings.mode));
            Ok(())
        }
        Command::Set { a4, mode } => persist_settings(&cli.config, settings, a4, mode),
    }
}

fn listen(settings: &TunerSettings, a4_override: Option<f32>, seconds: Option<f32>) -> Result<()> {
    let a4 = a4_override.unwrap_or(settings.a4);
    // Reject a malformed reference pitch before it reaches the mapper.
    let reference = ReferenceConfig::new(a4)?;

    let mut engine = TunerEngine::new(MicSource::new(), TerminalSink::new(), reference);
    engine.start()?;
    info!(a4, "listening; press Ctrl-C to stop");

    let started = Instant::now();
    loop {
        if let Err(err) = engine.tick() {
            // The source died mid-session; the engine is already idle.
            println!();
            bail!("capture failed: {err}");
        }
        if let Some(limit) = seconds {
            if started.elapsed() >= Duration::from_secs_f32(limit) {
                break;
            }
        }
        std::thread::sleep(TICK_INTERVAL);
    }

    engine.stop();
    println!();
    Ok(())
}

fn play_reference(target: &str, duration: f32) -> Result<()> {
    let frequency = match presets::string_frequency(target) {
        Some(frequency) => frequency,
        None => target
            .parse::<f32>()
            .map_err(|_| anyhow!("unknown string or frequency: {target}"))?,
    };
    tone::play_tone(frequency, duration)
}

fn print_strings(mode: InstrumentMode) {
    let strings = presets::strings_for(mode);
    if strings.is_empty() {
        println!("Chromatic mode: no fixed strings, any note is detected.");
        return;
    }
    for string in strings {
        println!("{:<3} {:>8.3} Hz", string.name, string.frequency);
    }
}

fn persist_settings(
    path: &Path,
    mut settings: TunerSettings,
    a4: Option<f32>,
    mode: Option<InstrumentMode>,
) -> Result<()> {
    if let Some(a4) = a4 {
        // Validate before persisting, so a bad value can never load.
        ReferenceConfig::new(a4)?;
        settings.a4 = a4;
    }
    if let Some(mode) = mode {
        settings.mode = mode;
    }
    settings.save(path)?;
    println!("saved settings to {}", path.display());
    Ok(())
}

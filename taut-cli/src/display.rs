//! Terminal rendering of tuner events: one line per cycle with the
//! note, frequency, deviation, and a needle gauge.

use std::io::{self, Write};

use taut_core::TunerEvent;
use taut_core::engine::ResultSink;
use taut_core::tuning::ToneBand;

/// Width of the needle gauge in characters. Odd, so the center mark
/// sits on a column.
const GAUGE_WIDTH: usize = 41;

/// The needle position clamps at this many cents off either side; the
/// printed deviation stays unclamped.
const GAUGE_RANGE_CENTS: f32 = 50.0;

/// A [`ResultSink`] that rewrites a single status line on stdout.
pub struct TerminalSink {
    out: io::Stdout,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for TerminalSink {
    fn publish(&mut self, event: TunerEvent) {
        // Fire-and-forget: a failed write must not stall the drive loop.
        let _ = write!(self.out, "\r\x1b[2K{}", render_event(&event));
        let _ = self.out.flush();
    }
}

fn render_event(event: &TunerEvent) -> String {
    match event {
        TunerEvent::Pitch {
            frequency,
            note,
            band,
        } => {
            let label = format!("{}{}", note.name, note.octave);
            format!(
                "{label:<4} {frequency:>8.2} Hz  {:>+7.1} cents  {}  {}",
                note.cents_deviation,
                render_needle(note.cents_deviation),
                band_label(*band),
            )
        }
        TunerEvent::NoSignal => {
            format!(
                "--   {:>8} Hz  {:>7} cents  {}  listening",
                "--",
                "--",
                render_needle_baseline(),
            )
        }
    }
}

fn band_label(band: ToneBand) -> &'static str {
    match band {
        ToneBand::InTune => "in tune",
        ToneBand::Acceptable => "close",
        ToneBand::OutOfTune => "off",
    }
}

/// Draws the gauge with the needle at the clamped cents position.
fn render_needle(cents: f32) -> String {
    let clamped = cents.clamp(-GAUGE_RANGE_CENTS, GAUGE_RANGE_CENTS);
    let position = ((clamped + GAUGE_RANGE_CENTS) / (2.0 * GAUGE_RANGE_CENTS)
        * (GAUGE_WIDTH - 1) as f32)
        .round() as usize;

    let mut gauge = baseline_chars();
    gauge[position] = '*';
    format!("[{}]", gauge.into_iter().collect::<String>())
}

fn render_needle_baseline() -> String {
    format!("[{}]", baseline_chars().into_iter().collect::<String>())
}

fn baseline_chars() -> Vec<char> {
    let mut gauge = vec!['-'; GAUGE_WIDTH];
    gauge[GAUGE_WIDTH / 2] = '|';
    gauge
}

#[cfg(test)]
mod tests {
    use super::*;
    use taut_core::tuning::{classify, map_to_note};

    #[test]
    fn centered_needle_replaces_the_center_mark() {
        let gauge = render_needle(0.0);
        assert_eq!(gauge.len(), GAUGE_WIDTH + 2);
        assert_eq!(gauge.chars().nth(1 + GAUGE_WIDTH / 2), Some('*'));
        assert!(!gauge.contains('|'));
    }

    #[test]
    fn needle_clamps_at_the_gauge_edges() {
        let sharp = render_needle(80.0);
        assert_eq!(sharp.chars().nth(GAUGE_WIDTH), Some('*'));
        let flat = render_needle(-80.0);
        assert_eq!(flat.chars().nth(1), Some('*'));
    }

    #[test]
    fn pitch_events_render_note_and_band() {
        let note = map_to_note(110.0, 440.0);
        let line = render_event(&TunerEvent::Pitch {
            frequency: 110.0,
            note,
            band: classify(note.cents_deviation),
        });
        assert!(line.starts_with("A2"));
        assert!(line.contains("110.00 Hz"));
        assert!(line.ends_with("in tune"));
    }

    #[test]
    fn no_signal_renders_distinctly() {
        let line = render_event(&TunerEvent::NoSignal);
        assert!(line.starts_with("--"));
        assert!(line.ends_with("listening"));
        assert!(!line.contains('*'));
    }
}

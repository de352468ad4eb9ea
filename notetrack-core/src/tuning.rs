//! # Pitch Mapping
//!
//! Maps transform bins to a fractional chromatic pitch scale anchored at
//! 440 Hz / 32 (a sub-octave A), twelve steps per octave, offset by nine
//! semitones. The table only depends on block size and sample rate and is
//! rebuilt whenever either changes.

use once_cell::sync::Lazy;

use crate::config::DetectorConfig;

/// Reference frequency of the pitch scale, `2 · 440 / 32` Hz.
pub const REFERENCE_FREQUENCY: f64 = 2.0 * 440.0 / 32.0;

/// Semitones between the reference and pitch 0 of the scale.
pub const REFERENCE_OFFSET: f64 = 9.0;

/// Fixed downward transposition from the table scale to emitted note numbers.
pub const NOTE_TRANSPOSE: i32 = 24;

/// Fractional pitch number per bin for one (block size, sample rate) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTable {
    block_size: usize,
    sample_rate: u32,
    pitches: Vec<f32>,
}

impl PitchTable {
    pub fn new(block_size: usize, sample_rate: u32) -> Self {
        let mut table = Self {
            block_size,
            sample_rate,
            pitches: Vec::with_capacity(block_size),
        };
        table.fill();
        table
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.block_size, config.sample_rate)
    }

    /// Recomputes every entry for a new block size and sample rate.
    pub fn rebuild(&mut self, block_size: usize, sample_rate: u32) {
        self.block_size = block_size;
        self.sample_rate = sample_rate;
        self.fill();
    }

    fn fill(&mut self) {
        let (block_size, sample_rate) = (self.block_size as u64, self.sample_rate as u64);
        self.pitches.clear();
        self.pitches.extend((0..block_size).map(|bin| {
            // Bin frequencies are whole hertz, truncated.
            let frequency = (bin * sample_rate / block_size) as f64;
            ((frequency / REFERENCE_FREQUENCY).log2() * 12.0 + REFERENCE_OFFSET) as f32
        }));
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The fractional pitch of `bin`, or `None` for a bin outside the table or
    /// one with no finite pitch (bin 0, and any bin whose truncated frequency
    /// is zero).
    pub fn pitch(&self, bin: usize) -> Option<f32> {
        self.pitches.get(bin).copied().filter(|pitch| pitch.is_finite())
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.pitches
    }
}

/// Rounds a fractional table pitch and applies the fixed transposition.
pub fn note_number(pitch: f32) -> i32 {
    pitch.round() as i32 - NOTE_TRANSPOSE
}

/// Names of the 128 MIDI note numbers, C-1 through G9.
static NOTE_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    const PITCH_CLASSES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    (0..128)
        .map(|note: i32| format!("{}{}", PITCH_CLASSES[(note % 12) as usize], note / 12 - 1))
        .collect()
});

/// Name of a note number, e.g. `A4` for 69. `None` outside 0-127.
pub fn note_name(note: i32) -> Option<&'static str> {
    usize::try_from(note)
        .ok()
        .and_then(|index| NOTE_NAMES.get(index))
        .map(String::as_str)
}

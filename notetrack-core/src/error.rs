//! Error types for the detection core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sample block arrived whose length differs from the configured block size.
    /// The buffers are sized for the configured length, so the host must stop.
    #[error("process got wrong buffer size ({actual} vs {expected})")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("invalid block size {0}: must be a power of two and at least 2")]
    InvalidBlockSize(usize),

    #[error("invalid sample rate {0}: must be positive")]
    InvalidSampleRate(u32),

    /// A note number that cannot be carried by a 7-bit MIDI data byte.
    #[error("note {0} is outside the MIDI range 0-127")]
    NoteOutOfRange(i32),
}

pub type Result<T> = std::result::Result<T, Error>;

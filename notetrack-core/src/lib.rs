// notetrack-core/src/lib.rs

//! The core logic for the monophonic note tracker.
//! This crate turns fixed-size blocks of audio samples into note on/off
//! events: a radix-2 spectral transform, dominant-bin selection, a
//! bin-to-pitch table and an edge-triggered note tracker. Apart from the
//! `audio` capture glue it is completely headless and does no I/O.

pub mod audio;
pub mod config;
pub mod detector;
pub mod error;
pub mod fft;
pub mod midi;
pub mod pitch;
pub mod tracker;
pub mod tuning;

pub use config::DetectorConfig;
pub use detector::NoteDetector;
pub use error::{Error, Result};
pub use midi::{NoteEvent, NoteEventKind, NoteEvents};

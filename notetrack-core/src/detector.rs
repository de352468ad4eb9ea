//! # Note Detector
//!
//! Owns the per-configuration buffers and the tracker state, and runs one
//! sample block through transform, bin selection, pitch lookup and tracking.
//! Reconfiguration takes `&mut self`, so it can never interleave with a
//! `process` call, and it builds every new buffer before replacing the old
//! ones: a failed reconfiguration leaves the detector untouched.

use rustfft::num_complex::Complex32;
use tracing::info;

use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::fft::SpectralTransform;
use crate::midi::{NoteEvent, NoteEvents};
use crate::pitch::find_dominant_bin;
use crate::tracker::NoteTracker;
use crate::tuning::{note_number, PitchTable};

#[derive(Debug, Clone)]
pub struct NoteDetector {
    config: DetectorConfig,
    transform: SpectralTransform,
    spectrum: Vec<Complex32>,
    pitch_table: PitchTable,
    tracker: NoteTracker,
    last_dominant_bin: Option<usize>,
}

impl NoteDetector {
    /// Builds a detector sized for `config`.
    ///
    /// All buffers are allocated here; `process` does not allocate.
    ///
    /// # Arguments
    /// * `config` - Block size and sample rate supplied by the host
    ///
    /// # Errors
    /// * `Error::InvalidBlockSize` / `Error::InvalidSampleRate` for a bad config
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transform: SpectralTransform::new(config.block_size)?,
            spectrum: vec![Complex32::default(); config.block_size],
            pitch_table: PitchTable::from_config(&config),
            tracker: NoteTracker::new(),
            last_dominant_bin: None,
            config,
        })
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Applies a new block size and sample rate, rebuilding every buffer the
    /// block size affects and the pitch table. The sounding note is kept.
    ///
    /// # Arguments
    /// * `block_size` - New samples per block, a power of two of at least 2
    /// * `sample_rate` - New sample rate in Hz
    ///
    /// # Errors
    /// * `Error::InvalidBlockSize` / `Error::InvalidSampleRate`; the detector is left unchanged
    pub fn reconfigure(&mut self, block_size: usize, sample_rate: u32) -> Result<()> {
        let config = DetectorConfig::new(block_size, sample_rate);
        config.validate()?;

        if block_size != self.config.block_size {
            let transform = SpectralTransform::new(block_size)?;
            self.transform = transform;
            self.spectrum = vec![Complex32::default(); block_size];
        }
        self.pitch_table.rebuild(block_size, sample_rate);
        self.config = config;
        self.last_dominant_bin = None;

        info!("block size is now {}, sample rate is now {} Hz", block_size, sample_rate);
        Ok(())
    }

    /// Host notification of a new block size. Same as `reconfigure` with the
    /// current sample rate.
    pub fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        self.reconfigure(block_size, self.config.sample_rate)
    }

    /// Host notification of a new sample rate. Only the pitch table depends
    /// on it, so the transform buffers are left alone.
    ///
    /// # Arguments
    /// * `sample_rate` - New sample rate in Hz
    ///
    /// # Errors
    /// * `Error::InvalidSampleRate` for a zero rate; the detector is left unchanged
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        let config = DetectorConfig::new(self.config.block_size, sample_rate);
        config.validate()?;

        self.pitch_table.rebuild(config.block_size, sample_rate);
        self.config = config;
        self.last_dominant_bin = None;

        info!("sample rate is now {} Hz", sample_rate);
        Ok(())
    }

    /// Processes one block and returns the note events it causes.
    ///
    /// This function:
    /// 1. Transforms the block into the detector's spectrum buffer
    /// 2. Selects the dominant bin above the noise floor
    /// 3. Looks up its pitch and converts it to a note number
    /// 4. Feeds the note to the tracker
    ///
    /// # Arguments
    /// * `samples` - Exactly one block of mono samples
    ///
    /// # Returns
    /// * `Ok(events)` - No events, a single on or off, or an off followed by an on
    ///
    /// # Errors
    /// * `Error::BlockSizeMismatch` if `samples` is not exactly one block long.
    ///   The host changed its block size without notifying the detector and
    ///   should stop.
    pub fn process(&mut self, samples: &[f32]) -> Result<NoteEvents> {
        if samples.len() != self.config.block_size {
            return Err(Error::BlockSizeMismatch {
                expected: self.config.block_size,
                actual: samples.len(),
            });
        }

        self.transform.process_real(samples, &mut self.spectrum)?;
        let bin = find_dominant_bin(&self.spectrum);
        self.last_dominant_bin = bin;

        let note = bin
            .and_then(|bin| self.pitch_table.pitch(bin))
            .map(note_number);
        Ok(self.tracker.update(note))
    }

    /// The note currently sounding, `None` during silence.
    pub fn current_note(&self) -> Option<i32> {
        self.tracker.current()
    }

    /// Dominant bin of the most recently processed block.
    pub fn last_dominant_bin(&self) -> Option<usize> {
        self.last_dominant_bin
    }

    /// Spectrum of the most recently processed block.
    pub fn spectrum(&self) -> &[Complex32] {
        &self.spectrum
    }

    pub fn pitch_table(&self) -> &PitchTable {
        &self.pitch_table
    }

    /// Releases the sounding note, if any. Used when the host stops.
    pub fn flush(&mut self) -> Option<NoteEvent> {
        self.tracker.reset()
    }
}

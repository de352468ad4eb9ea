//! # Detector Configuration
//!
//! The block size and sample rate the detector is sized for. Both are supplied
//! by the host; every derived buffer is rebuilt when either changes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Block size used when the host does not specify one.
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Sample rate used when the host does not specify one.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Samples per processing block. Power of two, at least 2.
    pub block_size: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl DetectorConfig {
    pub fn new(block_size: usize, sample_rate: u32) -> Self {
        Self {
            block_size,
            sample_rate,
        }
    }

    /// Checks that the block size is a power of two of at least 2 and the
    /// sample rate is positive.
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 2 || !self.block_size.is_power_of_two() {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Width of one frequency bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.block_size as f32
    }
}

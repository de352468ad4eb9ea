//! Layered application settings: built-in defaults, then an optional JSON
//! config file, then command-line flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notetrack_core::DetectorConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    /// Substring of the audio input device name.
    pub device: Option<String>,
    /// Substring of the MIDI output port name.
    pub midi_port: Option<String>,
    /// Create a virtual MIDI output port.
    pub virtual_port: bool,
}

impl AppConfig {
    /// Reads a config file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// Overrides detector settings with any values given on the command line.
    pub fn apply_detector_overrides(&mut self, block_size: Option<usize>, sample_rate: Option<u32>) {
        if let Some(block_size) = block_size {
            self.detector.block_size = block_size;
        }
        if let Some(sample_rate) = sample_rate {
            self.detector.sample_rate = sample_rate;
        }
    }
}

//! # Audio Capture Module
//!
//! Real-time audio input through CPAL (Cross-Platform Audio Library).
//! Device callbacks deliver interleaved frames in whatever quantity the
//! backend chooses; this module regroups channel 0 of those frames into
//! fixed-size blocks and hands each full block to the caller, on the audio
//! thread, without allocating.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use tracing::{error, info};

/// Collects mono samples into a pre-allocated block.
#[derive(Debug, Clone)]
pub struct BlockAccumulator {
    block: Vec<f32>,
    filled: usize,
}

impl BlockAccumulator {
    pub fn new(block_size: usize) -> Self {
        Self {
            block: vec![0.0; block_size],
            filled: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Appends the first channel of each frame in `data` and calls `on_block`
    /// every time a block fills up. Leftover samples carry over to the next call.
    ///
    /// # Arguments
    /// * `data` - Interleaved frames as delivered by the device callback
    /// * `channels` - Samples per frame; 0 is treated as 1
    /// * `on_block` - Called with each completed block
    pub fn push_interleaved<F>(&mut self, data: &[f32], channels: usize, mut on_block: F)
    where
        F: FnMut(&[f32]),
    {
        if self.block.is_empty() {
            return;
        }
        for frame in data.chunks(channels.max(1)) {
            self.block[self.filled] = frame[0];
            self.filled += 1;
            if self.filled == self.block.len() {
                on_block(&self.block);
                self.filled = 0;
            }
        }
    }
}

/// The stream configuration chosen for an input device.
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub stream: cpal::StreamConfig,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Picks an input device and a 32-bit float configuration for it.
///
/// # Arguments
/// * `device_name` - Substring of the device name to use; the default input device if `None`
/// * `preferred_rate` - Sample rate to ask for; the closest supported rate is used
///
/// # Returns
/// * `Ok((device, config))` - The device and the stream configuration to open it with
/// * `Err(e)` - No matching device, or no 32-bit float input format
pub fn select_input(
    device_name: Option<&str>,
    preferred_rate: u32,
) -> Result<(cpal::Device, InputConfig)> {
    let host = cpal::default_host();
    let device = match device_name {
        Some(name) => {
            let wanted = name.to_lowercase();
            host.input_devices()?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&wanted))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("No input device matching '{}'", name))?
        }
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?,
    };

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, preferred_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = preferred_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let sample_rate = config.sample_rate().0;
    let channels = config.channels();

    info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate, channels);

    Ok((
        device,
        InputConfig {
            stream: config.into(),
            sample_rate,
            channels,
        },
    ))
}

/// Starts capture and calls `on_block` on the audio thread for every full
/// block of `block_size` mono samples.
///
/// # Arguments
/// * `device` - Input device from `select_input`
/// * `input` - Stream configuration from `select_input`
/// * `block_size` - Samples per block handed to `on_block`
/// * `on_block` - Block handler; runs on the audio thread and must not block
///
/// # Returns
/// * `Ok(stream)` - The playing stream; capture stops when it is dropped
/// * `Err(e)` - The stream could not be built or started
pub fn start_block_capture<F>(
    device: &cpal::Device,
    input: &InputConfig,
    block_size: usize,
    mut on_block: F,
) -> Result<cpal::Stream>
where
    F: FnMut(&[f32]) + Send + 'static,
{
    let channels = input.channels as usize;
    let mut accumulator = BlockAccumulator::new(block_size);

    let err_fn = |err: cpal::StreamError| error!("An error occurred on the audio stream: {}", err);

    let stream = device
        .build_input_stream(
            &input.stream,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                accumulator.push_interleaved(data, channels, &mut on_block);
            },
            err_fn,
            None,
        )
        .context("Failed to build input stream")?;

    stream.play()?;

    Ok(stream)
}

/// Names of all input devices on the default host.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    Ok(host
        .input_devices()?
        .filter_map(|d| d.name().ok())
        .collect())
}

/// Finds the best supported configuration for the target sample rate:
/// 32-bit float, fewest channels, then closest sample rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let distance = if target_rate < c.min_sample_rate().0 {
                c.min_sample_rate().0 - target_rate
            } else {
                target_rate.saturating_sub(c.max_sample_rate().0)
            };
            (c.channels(), distance)
        })
}

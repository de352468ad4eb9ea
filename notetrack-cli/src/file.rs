//! Offline tracking of a WAV file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use notetrack_core::{NoteDetector, NoteEvent};
use serde::Serialize;
use tracing::info;

/// A note event together with the block that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    /// Index of the block whose analysis produced the event.
    pub block: usize,
    /// Start of that block, in seconds.
    pub time: f64,
    #[serde(flatten)]
    pub event: NoteEvent,
}

/// Decoded mono audio.
#[derive(Debug, Clone)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Reads the first channel of a WAV file as floats in [-1, 1].
pub fn read_mono(path: &Path) -> Result<MonoAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file '{}'", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("WAV file '{}' has no channels", path.display());
    }
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
    };

    info!(
        "Read {} frames at {} Hz from '{}'",
        interleaved.len() / channels,
        spec.sample_rate,
        path.display()
    );

    Ok(MonoAudio {
        samples: interleaved.into_iter().step_by(channels).collect(),
        sample_rate: spec.sample_rate,
    })
}

/// Runs `samples` through `detector` block by block. The final partial block
/// is padded with silence, and a note still sounding at the end is switched
/// off at the end time.
pub fn track(detector: &mut NoteDetector, samples: &[f32]) -> Result<Vec<TimedEvent>> {
    let config = detector.config();
    let seconds_per_block = config.block_size as f64 / config.sample_rate as f64;
    let mut block = vec![0.0; config.block_size];
    let mut events = Vec::new();

    let mut block_count = 0;
    for (index, chunk) in samples.chunks(config.block_size).enumerate() {
        block[..chunk.len()].copy_from_slice(chunk);
        block[chunk.len()..].fill(0.0);

        for event in detector.process(&block)? {
            events.push(TimedEvent {
                block: index,
                time: index as f64 * seconds_per_block,
                event,
            });
        }
        block_count = index + 1;
    }

    if let Some(event) = detector.flush() {
        events.push(TimedEvent {
            block: block_count,
            time: block_count as f64 * seconds_per_block,
            event,
        });
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notetrack_core::DetectorConfig;
    use std::f32::consts::PI;

    fn tone(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn reads_first_channel_of_int_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16_384i16, -1), (-16_384, -1), (0, -1)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_mono(&path).unwrap();
        assert_eq!(audio.sample_rate, 22_050);
        assert_eq!(audio.samples, vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn tracks_tone_then_silence() {
        let mut detector = NoteDetector::new(DetectorConfig::new(128, 48_000)).unwrap();
        let mut samples = tone(6000.0, 48_000, 128 * 4);
        samples.extend(std::iter::repeat(0.0).take(128 * 2));

        let events = track(&mut detector, &samples).unwrap();
        assert_eq!(
            events,
            vec![
                TimedEvent {
                    block: 0,
                    time: 0.0,
                    event: NoteEvent::on(78)
                },
                TimedEvent {
                    block: 4,
                    time: 4.0 * 128.0 / 48_000.0,
                    event: NoteEvent::off(78)
                },
            ]
        );
    }

    #[test]
    fn note_at_end_is_released() {
        let mut detector = NoteDetector::new(DetectorConfig::new(128, 48_000)).unwrap();
        // Two and a half blocks: the last one is zero padded.
        let samples = tone(3000.0, 48_000, 320);

        let events = track(&mut detector, &samples).unwrap();
        assert_eq!(events.first().map(|e| e.event), Some(NoteEvent::on(66)));
        let last = events.last().unwrap();
        assert_eq!(last.event, NoteEvent::off(66));
        assert_eq!(last.block, 3);
    }

    #[test]
    fn serializes_flat() {
        let event = TimedEvent {
            block: 2,
            time: 0.5,
            event: NoteEvent::on(60),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"block":2,"time":0.5,"kind":"on","note":60}"#
        );
    }
}

//! End-to-end behaviour of the detection pipeline on synthesized blocks.

use std::f32::consts::PI;

use approx::assert_abs_diff_eq;
use notetrack_core::fft::{spectrum_to_magnitudes, SpectralTransform};
use notetrack_core::pitch::find_dominant_bin;
use notetrack_core::{DetectorConfig, NoteDetector, NoteEvent};
use rustfft::num_complex::Complex32;

const BLOCK_SIZE: usize = 128;
const SAMPLE_RATE: u32 = 48_000;

fn sine_hz(block_size: usize, sample_rate: u32, frequency: f32, amplitude: f32) -> Vec<f32> {
    (0..block_size)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn detector() -> NoteDetector {
    NoteDetector::new(DetectorConfig::new(BLOCK_SIZE, SAMPLE_RATE)).unwrap()
}

fn transform(samples: &[f32]) -> Vec<Complex32> {
    let mut spectrum = vec![Complex32::default(); samples.len()];
    SpectralTransform::new(samples.len())
        .unwrap()
        .process_real(samples, &mut spectrum)
        .unwrap();
    spectrum
}

#[test]
fn sine_peaks_within_one_bin() {
    let sample_rate = 44_100;
    for exponent in 3..=10 {
        let block_size = 1usize << exponent;
        let bin_width = sample_rate as f32 / block_size as f32;
        for fraction in [0.0, 0.3, 0.5, 0.8] {
            let target_bin = block_size as f32 / 8.0 + fraction;
            let frequency = target_bin * bin_width;
            let spectrum = transform(&sine_hz(block_size, sample_rate, frequency, 1.0));

            let bin = find_dominant_bin(&spectrum).expect("a full-scale sine is above the floor");
            assert!(
                (bin as f32 - target_bin).abs() <= 1.0,
                "N={} f={} picked bin {}",
                block_size,
                frequency,
                bin
            );
        }
    }
}

#[test]
fn transform_is_linear() {
    let x = sine_hz(256, SAMPLE_RATE, 1500.0, 0.7);
    let y: Vec<f32> = (0..256).map(|i| ((i * 37) % 19) as f32 / 19.0 - 0.5).collect();
    let (a, b) = (2.5f32, -0.75f32);
    let combined: Vec<f32> = x.iter().zip(&y).map(|(x, y)| a * x + b * y).collect();

    let tx = transform(&x);
    let ty = transform(&y);
    let tc = transform(&combined);

    for ((c, x), y) in tc.iter().zip(&tx).zip(&ty) {
        let expected = *x * a + *y * b;
        assert_abs_diff_eq!(c.re, expected.re, epsilon = 1e-3);
        assert_abs_diff_eq!(c.im, expected.im, epsilon = 1e-3);
    }
}

#[test]
fn silence_releases_note() {
    let mut detector = detector();
    let zeros = vec![0.0; BLOCK_SIZE];

    assert!(detector.process(&zeros).unwrap().is_empty());
    assert_eq!(detector.last_dominant_bin(), None);

    detector.process(&sine_hz(BLOCK_SIZE, SAMPLE_RATE, 6000.0, 0.5)).unwrap();
    let events = detector.process(&zeros).unwrap();
    assert_eq!(events.as_slice(), &[NoteEvent::off(78)]);
    assert_eq!(detector.current_note(), None);
}

#[test]
fn repeated_pitch_emits_once() {
    let mut detector = detector();
    let block = sine_hz(BLOCK_SIZE, SAMPLE_RATE, 6000.0, 0.5);

    assert_eq!(detector.process(&block).unwrap().len(), 1);
    assert!(detector.process(&block).unwrap().is_empty());
    assert!(detector.process(&block).unwrap().is_empty());
}

#[test]
fn pitch_jump_emits_off_before_on() {
    let mut detector = detector();
    detector.process(&sine_hz(BLOCK_SIZE, SAMPLE_RATE, 6000.0, 0.5)).unwrap();

    let events = detector.process(&sine_hz(BLOCK_SIZE, SAMPLE_RATE, 3000.0, 0.5)).unwrap();
    assert_eq!(events.as_slice(), &[NoteEvent::off(78), NoteEvent::on(66)]);
    assert_eq!(events[0].to_midi(), Ok([0x80, 78, 64]));
    assert_eq!(events[1].to_midi(), Ok([0x90, 66, 64]));
}

#[test]
fn bin_sixteen_scenario() {
    let mut detector = detector();
    let block = sine_hz(BLOCK_SIZE, SAMPLE_RATE, 16.0 * 375.0, 0.5);

    let magnitudes = spectrum_to_magnitudes(&transform(&block));
    assert_eq!(magnitudes.len(), BLOCK_SIZE / 2);

    let events = detector.process(&block).unwrap();
    assert_eq!(detector.last_dominant_bin(), Some(16));

    let expected = detector.pitch_table().pitch(16).unwrap().round() as i32 - 24;
    assert_eq!(expected, 78);
    assert_eq!(events.as_slice(), &[NoteEvent::on(expected)]);
}

#[test]
fn dc_never_becomes_a_note() {
    let mut spectrum = vec![Complex32::default(); BLOCK_SIZE];
    spectrum[0] = Complex32::new(1.0e9, 0.0);
    assert_eq!(find_dominant_bin(&spectrum), None);

    let mut detector = detector();
    assert!(detector.process(&vec![1.0; BLOCK_SIZE]).unwrap().is_empty());
    assert_eq!(detector.current_note(), None);
}

#[test]
fn quiet_signal_stays_below_floor() {
    let mut detector = detector();
    // |X| / N = amplitude / 2, below 1/128.
    let block = sine_hz(BLOCK_SIZE, SAMPLE_RATE, 6000.0, 0.01);
    assert!(detector.process(&block).unwrap().is_empty());
}

#[test]
fn reconfigured_detector_keeps_tracking() {
    let mut detector = detector();
    detector.process(&sine_hz(BLOCK_SIZE, SAMPLE_RATE, 6000.0, 0.5)).unwrap();

    detector.reconfigure(256, SAMPLE_RATE).unwrap();
    // 6000 Hz is bin 32 at 256 points: same pitch, no new events.
    let events = detector.process(&sine_hz(256, SAMPLE_RATE, 6000.0, 0.5)).unwrap();
    assert!(events.is_empty());
    assert_eq!(detector.last_dominant_bin(), Some(32));
    assert_eq!(detector.current_note(), Some(78));
}

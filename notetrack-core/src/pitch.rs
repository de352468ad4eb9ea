//! # Dominant-Bin Selection
//!
//! Picks the bin most likely to carry the fundamental of a monophonic input:
//! the loudest bin of the lower half of the spectrum whose normalized
//! magnitude clears a fixed noise floor. No interpolation, windowing or
//! harmonic correction is applied.

use rustfft::num_complex::Complex32;

/// Normalized magnitude (`|X[i]| / N`) a bin must exceed to count as signal.
pub const NOISE_FLOOR: f32 = 1.0 / 128.0;

/// Returns the index of the strongest bin above the noise floor, or `None`
/// when every bin is below it.
///
/// Only bins `1..N/2` are candidates. Bin 0 is never returned: it has no
/// pitch, whatever its magnitude. Ties keep the lowest index, since a
/// candidate replaces the current best only on strict improvement.
pub fn find_dominant_bin(spectrum: &[Complex32]) -> Option<usize> {
    let block_size = spectrum.len() as f32;
    let mut best: Option<(usize, f32)> = None;

    for (bin, coefficient) in spectrum.iter().enumerate().take(spectrum.len() / 2).skip(1) {
        let magnitude = coefficient.norm();
        if magnitude / block_size <= NOISE_FLOOR {
            continue;
        }
        match best {
            Some((_, best_magnitude)) if magnitude <= best_magnitude => {}
            _ => best = Some((bin, magnitude)),
        }
    }

    best.map(|(bin, _)| bin)
}

//! # Spectral Transform
//!
//! Radix-2 decimation-in-time Cooley-Tukey transform over a fixed block size.
//! The recursion ping-pongs between the caller's buffer and a scratch buffer
//! owned by the transform, and the twiddle factors are computed once when the
//! transform is built, so processing a block never allocates.

use rustfft::num_complex::Complex32;

use crate::error::{Error, Result};

/// A forward DFT of a fixed power-of-two size.
#[derive(Debug, Clone)]
pub struct SpectralTransform {
    size: usize,
    /// `exp(-j·2π·k/N)` for k in 0..N/2.
    twiddles: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl SpectralTransform {
    /// Builds a transform for blocks of `size` samples.
    ///
    /// This function:
    /// 1. Checks that `size` is a power of two of at least 2
    /// 2. Precomputes the `size / 2` twiddle factors
    /// 3. Allocates the scratch buffer the recursion ping-pongs through
    ///
    /// # Arguments
    /// * `size` - Number of samples per block
    ///
    /// # Errors
    /// * `Error::InvalidBlockSize` if `size` is not a power of two of at least 2
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(Error::InvalidBlockSize(size));
        }

        let twiddles = (0..size / 2)
            .map(|k| {
                let angle = -2.0 * std::f64::consts::PI * k as f64 / size as f64;
                Complex32::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();

        Ok(Self {
            size,
            twiddles,
            scratch: vec![Complex32::default(); size],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Transforms `buffer` in place.
    ///
    /// The buffer is first copied into the scratch buffer, which seeds the
    /// recursion; the finished spectrum ends up back in `buffer`.
    ///
    /// # Arguments
    /// * `buffer` - Time-domain values on entry, frequency bins 0..N-1 on return
    ///
    /// # Errors
    /// * `Error::BlockSizeMismatch` if `buffer` is not exactly `size()` long
    pub fn process(&mut self, buffer: &mut [Complex32]) -> Result<()> {
        if buffer.len() != self.size {
            return Err(Error::BlockSizeMismatch {
                expected: self.size,
                actual: buffer.len(),
            });
        }

        // The recursion reads its first level from the scratch buffer.
        self.scratch.copy_from_slice(buffer);
        butterfly(buffer, &mut self.scratch, &self.twiddles, self.size, 1);
        Ok(())
    }

    /// Loads real samples into `output` and transforms them.
    ///
    /// # Arguments
    /// * `samples` - One block of real-valued samples
    /// * `output` - Receives the complex spectrum; must be `size()` long
    ///
    /// # Errors
    /// * `Error::BlockSizeMismatch` if `samples` or `output` is not `size()` long
    pub fn process_real(&mut self, samples: &[f32], output: &mut [Complex32]) -> Result<()> {
        if samples.len() != self.size {
            return Err(Error::BlockSizeMismatch {
                expected: self.size,
                actual: samples.len(),
            });
        }
        for (bin, &sample) in output.iter_mut().zip(samples) {
            *bin = Complex32::new(sample, 0.0);
        }
        self.process(output)
    }
}

/// One level of the decomposition. `buf` receives the combined result, `out`
/// holds the two interleaved half-size sub-results once the recursive calls
/// return. Sub-sequences are addressed by offsetting both slices by `step`.
fn butterfly(
    buf: &mut [Complex32],
    out: &mut [Complex32],
    twiddles: &[Complex32],
    n: usize,
    step: usize,
) {
    if step >= n {
        return;
    }

    butterfly(out, buf, twiddles, n, step * 2);
    butterfly(&mut out[step..], &mut buf[step..], twiddles, n, step * 2);

    for i in (0..n).step_by(2 * step) {
        let t = twiddles[i / 2] * out[i + step];
        buf[i / 2] = out[i] + t;
        buf[(i + n) / 2] = out[i] - t;
    }
}

/// Magnitudes of the lower half of a spectrum. The upper half of a real
/// input's transform mirrors the lower half and is skipped.
///
/// # Arguments
/// * `spectrum` - Complex spectrum from `SpectralTransform::process`
///
/// # Returns
/// * `Vec<f32>` - `|X[i]|` for i in 0..N/2
pub fn spectrum_to_magnitudes(spectrum: &[Complex32]) -> Vec<f32> {
    spectrum
        .iter()
        .take(spectrum.len() / 2)
        .map(|c| c.norm())
        .collect()
}

//! Numpy-style 1D helpers.
//!
//! Only the pieces the engine needs: sample time axes, one-sided FFT
//! frequency axes and first differences.

use alloc::vec::Vec;
use core::ops::Sub;
use num_traits::{Float, FromPrimitive};

/// Sample instants `i / fs` for `i in 0..n`.
///
/// Mirrors `np.arange(n) / fs`.
pub fn time_axis<F>(n: usize, fs: F) -> Vec<F>
where
    F: Float + FromPrimitive,
{
    (0..n)
        .map(|i| F::from_usize(i).unwrap_or_else(F::nan) / fs)
        .collect()
}

/// Non-negative frequency bins of a length-`n` real FFT.
///
/// Mirrors `np.fft.rfftfreq(n, 1/fs)`: `n/2 + 1` bins spaced `fs/n` apart.
pub fn rfftfreq<F>(n: usize, fs: F) -> Vec<F>
where
    F: Float + FromPrimitive,
{
    if n == 0 {
        return Vec::new();
    }
    let n_f = F::from_usize(n).unwrap_or_else(F::nan);
    (0..n / 2 + 1)
        .map(|k| F::from_usize(k).unwrap_or_else(F::nan) * fs / n_f)
        .collect()
}

/// First differences `x[i+1] - x[i]`.
pub fn diff<F>(x: &[F]) -> Vec<F>
where
    F: Copy + Sub<Output = F>,
{
    x.windows(2).map(|w| w[1] - w[0]).collect()
}

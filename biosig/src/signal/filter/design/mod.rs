//! Butterworth IIR design into cascaded second-order sections.
//!
//! The design runs in the analog zero/pole/gain domain: prototype, band
//! transform, bilinear map, then pairing into biquads.

use nalgebra::{Complex, RealField};
use num_traits::One;

mod kernels;
mod relative_degree;
mod zpk;

pub use kernels::*;
pub(crate) use relative_degree::*;
pub use zpk::*;

/// Band type of a designed filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterBandType {
    /// Pass below the cutoff.
    Lowpass,
    /// Pass above the cutoff.
    Highpass,
    /// Pass between two cutoffs.
    Bandpass,
}

/// Zeros, poles and system gain of a transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct ZpkFormatFilter<F>
where
    F: RealField,
{
    /// Zeros.
    pub z: Vec<Complex<F>>,
    /// Poles.
    pub p: Vec<Complex<F>>,
    /// System gain.
    pub k: F,
}

/// One biquad section with its direct-form-II-transposed state.
///
/// `a[0]` is always one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sos<F> {
    /// Numerator coefficients.
    pub b: [F; 3],
    /// Denominator coefficients.
    pub a: [F; 3],
    /// First state register.
    pub zi0: F,
    /// Second state register.
    pub zi1: F,
}

impl<F> Sos<F>
where
    F: RealField + Copy,
{
    /// Section with zeroed state.
    pub fn new(b: [F; 3], a: [F; 3]) -> Self {
        Self {
            b,
            a,
            zi0: F::zero(),
            zi1: F::zero(),
        }
    }

    /// Split a flat `[b0, b1, b2, a0, a1, a2, ...]` array as printed by
    /// `scipy.signal.butter(..., output="sos")`.
    ///
    /// Trailing values that do not fill a full section are ignored.
    pub fn from_scipy_dyn(sections: usize, flat: Vec<F>) -> Vec<Sos<F>> {
        flat.chunks_exact(6)
            .take(sections)
            .map(|c| Sos::new([c[0], c[1], c[2]], [c[3], c[4], c[5]]))
            .collect()
    }

    /// Zero both state registers.
    pub fn reset(&mut self) {
        self.zi0 = F::zero();
        self.zi1 = F::zero();
    }
}

/// Complex frequency response of cascaded sections at `freqs` (Hz).
///
/// Evaluates `prod(B(e^jw) / A(e^jw))` with `w = 2 pi f / fs`.
pub fn sosfreqz(sos: &[Sos<f64>], freqs: &[f64], fs: f64) -> Vec<Complex<f64>> {
    freqs
        .iter()
        .map(|&f| {
            let w = 2.0 * core::f64::consts::PI * f / fs;
            let z1 = Complex::new(0.0, -w).exp();
            let z2 = z1 * z1;
            sos.iter().fold(Complex::one(), |h, s| {
                let num = z2 * s.b[2] + z1 * s.b[1] + s.b[0];
                let den = z2 * s.a[2] + z1 * s.a[1] + s.a[0];
                h * num / den
            })
        })
        .collect()
}

/// Magnitude of [`sosfreqz`].
pub fn sosfreqz_abs(sos: &[Sos<f64>], freqs: &[f64], fs: f64) -> Vec<f64> {
    sosfreqz(sos, freqs, fs)
        .into_iter()
        .map(|h| h.norm())
        .collect()
}

use biosig_core::{num_rs::time_axis, Error, Result};
use ndarray::Array1;

/// Capability traits implemented by the DSP kernels.
pub mod traits;

/// Butterworth design and zero-phase filtering.
pub mod filter;

/// Spectral windows.
pub mod windows;

/// FFT helpers, periodogram and Welch PSD.
pub mod spectral;

/// Local-maximum search.
pub mod peak;

/// Waveform synthesis.
pub mod wave;

/// An ordered, fixed-length run of real samples taken at a fixed rate.
///
/// A `Signal` is never mutated once built; every stage returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl Signal {
    /// Build a signal, rejecting a sampling rate that is not finite and positive.
    ///
    /// An empty sample buffer is allowed; downstream stages treat it as a
    /// degenerate input.
    pub fn new(samples: Vec<f64>, sampling_rate: f64) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(Error::invalid(
                "sampling_rate",
                format!("sampling rate must be finite and > 0, got {sampling_rate}"),
            ));
        }
        Ok(Self {
            samples,
            sampling_rate,
        })
    }

    /// Sample values.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sampling rate in Hz.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Nyquist frequency in Hz.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sampling_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the signal holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds, `len / sampling_rate`.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }

    /// Sample instants in seconds.
    pub fn time_axis(&self) -> Vec<f64> {
        time_axis(self.samples.len(), self.sampling_rate)
    }

    /// A new signal at the same rate carrying `samples`.
    pub fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self {
            samples,
            sampling_rate: self.sampling_rate,
        }
    }

    /// Copy the samples into an [`ndarray`] vector.
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.samples.clone())
    }

    /// Give up ownership of the sample buffer.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn duration_follows_rate() {
        let signal = Signal::new(vec![0.0; 500], 250.0).expect("valid signal");
        assert_abs_diff_eq!(signal.duration(), 2.0);
        assert_abs_diff_eq!(signal.nyquist(), 125.0);
        assert_abs_diff_eq!(signal.time_axis()[250], 1.0);
    }

    #[test]
    fn rejects_non_positive_rate() {
        for fs in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let err = Signal::new(vec![1.0], fs).expect_err("invalid rate");
            assert!(matches!(err, Error::InvalidParameter { ref arg, .. } if arg == "sampling_rate"));
        }
    }

    #[test]
    fn with_samples_keeps_rate() {
        let signal = Signal::new(vec![1.0, 2.0], 100.0).expect("valid signal");
        let other = signal.with_samples(vec![3.0]);
        assert_eq!(other.sampling_rate(), 100.0);
        assert_eq!(other.samples(), &[3.0]);
        assert_eq!(signal.samples(), &[1.0, 2.0]);
        assert_eq!(other.to_array().len(), 1);
    }
}

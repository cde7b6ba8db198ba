//! Normalization, detrending and zero-phase filtering.
//!
//! Conditioning never mutates its input. Degenerate but well-formed input
//! (an empty buffer, a constant signal) produces a defined result and a
//! `warn!` event instead of an error. Malformed parameters such as a cutoff
//! at or above Nyquist are always rejected.

use core::str::FromStr;

use biosig_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ConditioningDefaults;
use crate::signal::Signal;
use crate::stats;

mod filter_spec;
mod pipeline;

pub use filter_spec::FilterSpec;
pub use pipeline::ConditioningStep;

/// Amplitude normalization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMethod {
    /// Zero mean, unit population variance.
    ZScore,
    /// Linear map of `[min, max]` onto a caller-chosen range.
    MinMax,
    /// Linear map of `[min, max]` onto `[0, 1]`.
    Unit,
}

impl NormalizeMethod {
    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            NormalizeMethod::ZScore => "zscore",
            NormalizeMethod::MinMax => "minmax",
            NormalizeMethod::Unit => "unit",
        }
    }
}

impl FromStr for NormalizeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zscore" => Ok(NormalizeMethod::ZScore),
            "minmax" => Ok(NormalizeMethod::MinMax),
            "unit" => Ok(NormalizeMethod::Unit),
            other => Err(Error::invalid(
                "method",
                format!("unknown normalization `{other}`; expected zscore, minmax or unit"),
            )),
        }
    }
}

/// Noise-reduction recipe; `None` fields take the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum NoiseReduction {
    /// Bandpass; defaults to 0.5 Hz up to one Hz below Nyquist.
    Bandpass {
        /// Lower edge in Hz.
        lowcut: Option<f64>,
        /// Upper edge in Hz.
        highcut: Option<f64>,
    },
    /// Lowpass; defaults to a quarter of the sampling rate.
    Lowpass {
        /// Hz.
        cutoff: Option<f64>,
    },
    /// Median; defaults to the configured kernel.
    Median {
        /// Window length.
        kernel_size: Option<usize>,
    },
    /// Baseline-wander highpass; defaults to the configured cutoff.
    Baseline {
        /// Hz.
        cutoff: Option<f64>,
    },
}

impl NoiseReduction {
    /// Stable tag used in logs and pipeline errors.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseReduction::Bandpass { .. } => "bandpass",
            NoiseReduction::Lowpass { .. } => "lowpass",
            NoiseReduction::Median { .. } => "median",
            NoiseReduction::Baseline { .. } => "baseline",
        }
    }

    /// Concrete filter for a signal sampled at `sampling_rate`.
    pub fn resolve(&self, sampling_rate: f64, defaults: &ConditioningDefaults) -> Result<FilterSpec> {
        let order = defaults.filter_order;
        match *self {
            NoiseReduction::Bandpass { lowcut, highcut } => FilterSpec::bandpass(
                lowcut.unwrap_or(0.5),
                highcut.unwrap_or(sampling_rate / 2.0 - 1.0),
                order,
                sampling_rate,
            ),
            NoiseReduction::Lowpass { cutoff } => {
                FilterSpec::lowpass(cutoff.unwrap_or(sampling_rate / 4.0), order, sampling_rate)
            }
            NoiseReduction::Median { kernel_size } => {
                FilterSpec::median(kernel_size.unwrap_or(defaults.median_kernel))
            }
            NoiseReduction::Baseline { cutoff } => FilterSpec::baseline(
                cutoff.unwrap_or(defaults.baseline_cutoff),
                order,
                sampling_rate,
            ),
        }
    }
}

/// Stateless conditioning stages sharing one set of defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalConditioner {
    defaults: ConditioningDefaults,
}

impl SignalConditioner {
    /// Conditioner using `defaults` wherever a call leaves a parameter open.
    pub fn new(defaults: ConditioningDefaults) -> Self {
        Self { defaults }
    }

    /// Defaults this conditioner fills in.
    pub fn defaults(&self) -> &ConditioningDefaults {
        &self.defaults
    }

    /// Rescale amplitudes.
    ///
    /// `range_min`/`range_max` are only read by [`NormalizeMethod::MinMax`].
    /// A zero-variance or constant signal yields all zeros and a warning.
    pub fn normalize(
        &self,
        signal: &Signal,
        method: NormalizeMethod,
        range_min: f64,
        range_max: f64,
    ) -> Signal {
        let x = signal.samples();
        if x.is_empty() {
            warn!(method = method.name(), "normalizing an empty signal");
            return signal.clone();
        }
        let samples = match method {
            NormalizeMethod::ZScore => {
                let std = stats::stdev::<_, f64>(x.iter()).0;
                if std == 0.0 {
                    warn!("zero standard deviation; z-score returns all zeros");
                    vec![0.0; x.len()]
                } else {
                    stats::zscore::<_, f64>(x.iter()).collect()
                }
            }
            NormalizeMethod::MinMax => rescale(x, range_min, range_max),
            NormalizeMethod::Unit => rescale(x, 0.0, 1.0),
        };
        signal.with_samples(samples)
    }

    /// Subtract the mean.
    pub fn remove_dc_offset(&self, signal: &Signal) -> Signal {
        if signal.is_empty() {
            warn!("removing DC offset from an empty signal");
            return signal.clone();
        }
        let mean = stats::mean::<_, f64>(signal.samples().iter()).0;
        signal.with_samples(signal.samples().iter().map(|v| v - mean).collect())
    }

    /// Zero-phase Butterworth bandpass between `lowcut` and `highcut` Hz.
    pub fn apply_bandpass_filter(
        &self,
        signal: &Signal,
        lowcut: f64,
        highcut: f64,
        order: usize,
    ) -> Result<Signal> {
        FilterSpec::bandpass(lowcut, highcut, order, signal.sampling_rate())?.apply(signal)
    }

    /// Zero-phase Butterworth lowpass at `cutoff` Hz.
    pub fn apply_lowpass_filter(&self, signal: &Signal, cutoff: f64, order: usize) -> Result<Signal> {
        FilterSpec::lowpass(cutoff, order, signal.sampling_rate())?.apply(signal)
    }

    /// Zero-phase Butterworth highpass at `cutoff` Hz.
    pub fn apply_highpass_filter(
        &self,
        signal: &Signal,
        cutoff: f64,
        order: usize,
    ) -> Result<Signal> {
        FilterSpec::highpass(cutoff, order, signal.sampling_rate())?.apply(signal)
    }

    /// Sliding median; an even `kernel_size` is bumped to the next odd value.
    pub fn apply_median_filter(&self, signal: &Signal, kernel_size: usize) -> Result<Signal> {
        FilterSpec::median(kernel_size)?.apply(signal)
    }

    /// Highpass at `cutoff` Hz, or the configured baseline cutoff.
    pub fn remove_baseline_wander(&self, signal: &Signal, cutoff: Option<f64>) -> Result<Signal> {
        FilterSpec::baseline(
            cutoff.unwrap_or(self.defaults.baseline_cutoff),
            self.defaults.filter_order,
            signal.sampling_rate(),
        )?
        .apply(signal)
    }

    /// Apply one noise-reduction recipe.
    pub fn reduce_noise(&self, signal: &Signal, method: NoiseReduction) -> Result<Signal> {
        method
            .resolve(signal.sampling_rate(), &self.defaults)?
            .apply(signal)
    }
}

fn rescale(x: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    match stats::min_max::<_, f64>(x.iter()) {
        Some((min, max)) if max > min => x
            .iter()
            .map(|v| (v - min) / (max - min) * (hi - lo) + lo)
            .collect(),
        _ => {
            warn!("constant signal; min-max scaling returns all zeros");
            vec![0.0; x.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sig(samples: Vec<f64>) -> Signal {
        Signal::new(samples, 100.0).expect("signal")
    }

    #[test]
    fn zscore_has_zero_mean_unit_std() {
        let c = SignalConditioner::default();
        let out = c.normalize(&sig(vec![1.0, 2.0, 3.0, 4.0, 5.0]), NormalizeMethod::ZScore, 0.0, 1.0);
        let d = stats::describe(out.samples()).expect("non-empty");
        assert_abs_diff_eq!(d.mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.std, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_normalization_returns_zeros() {
        let c = SignalConditioner::default();
        for method in [NormalizeMethod::ZScore, NormalizeMethod::MinMax, NormalizeMethod::Unit] {
            let out = c.normalize(&sig(vec![3.0; 8]), method, -1.0, 1.0);
            assert_eq!(out.samples(), &[0.0; 8]);
        }
        let empty = c.normalize(&sig(Vec::new()), NormalizeMethod::ZScore, 0.0, 1.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn minmax_maps_onto_range() {
        let c = SignalConditioner::default();
        let out = c.normalize(&sig(vec![-2.0, 0.0, 2.0]), NormalizeMethod::MinMax, -1.0, 3.0);
        assert_eq!(out.samples(), &[-1.0, 1.0, 3.0]);
        let unit = c.normalize(&sig(vec![-2.0, 0.0, 2.0]), NormalizeMethod::Unit, -1.0, 3.0);
        assert_eq!(unit.samples(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn dc_offset_removed() {
        let c = SignalConditioner::default();
        let out = c.remove_dc_offset(&sig(vec![10.0, 11.0, 12.0, 13.0]));
        let mean: f64 = out.samples().iter().sum::<f64>() / 4.0;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_eq!(out.sampling_rate(), 100.0);
    }

    #[test]
    fn noise_reduction_defaults() {
        let d = ConditioningDefaults::default();
        let spec = NoiseReduction::Bandpass {
            lowcut: None,
            highcut: None,
        }
        .resolve(250.0, &d)
        .expect("bandpass");
        assert_eq!(
            spec,
            FilterSpec::Bandpass {
                lowcut: 0.5,
                highcut: 124.0,
                order: 4
            }
        );
        let spec = NoiseReduction::Lowpass { cutoff: None }
            .resolve(250.0, &d)
            .expect("lowpass");
        assert_eq!(spec, FilterSpec::Lowpass { cutoff: 62.5, order: 4 });
        let spec = NoiseReduction::Median { kernel_size: None }
            .resolve(250.0, &d)
            .expect("median");
        assert_eq!(spec, FilterSpec::Median { kernel_size: 3 });
        let spec = NoiseReduction::Baseline { cutoff: None }
            .resolve(250.0, &d)
            .expect("baseline");
        assert_eq!(spec, FilterSpec::Baseline { cutoff: 0.5, order: 4 });
    }

    #[test]
    fn baseline_wander_removal_flattens_drift() {
        let c = SignalConditioner::default();
        let fs = 250.0;
        let n = 2500;
        let drift: Vec<f64> = (0..n)
            .map(|i| 5.0 + 0.01 * i as f64 / fs)
            .collect();
        let out = c
            .remove_baseline_wander(&Signal::new(drift, fs).expect("signal"), None)
            .expect("highpass");
        let mid = &out.samples()[500..2000];
        assert!(mid.iter().all(|v| v.abs() < 1e-2));
    }

    #[test]
    fn parses_method_names() {
        assert_eq!("MinMax".parse::<NormalizeMethod>().expect("known"), NormalizeMethod::MinMax);
        assert!("l2".parse::<NormalizeMethod>().is_err());
    }
}

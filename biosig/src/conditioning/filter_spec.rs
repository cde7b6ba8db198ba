use biosig_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::kernel::KernelLifecycle;
use crate::signal::filter::design::{butter, FilterBandType};
use crate::signal::filter::{MedFiltConfig, MedFiltKernel, SosFiltFiltConfig, SosFiltFiltKernel};
use crate::signal::traits::{MedFilt1D, SosFiltFilt1D};
use crate::signal::Signal;

/// A validated filter request.
///
/// Build one with the constructors, which check every cutoff against the
/// Nyquist frequency of the rate it will run at. [`FilterSpec::apply`]
/// repeats that check against the signal it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterSpec {
    /// Butterworth lowpass, zero-phase.
    Lowpass {
        /// Hz.
        cutoff: f64,
        /// Filter order.
        order: usize,
    },
    /// Butterworth highpass, zero-phase.
    Highpass {
        /// Hz.
        cutoff: f64,
        /// Filter order.
        order: usize,
    },
    /// Butterworth bandpass, zero-phase.
    Bandpass {
        /// Lower edge in Hz.
        lowcut: f64,
        /// Upper edge in Hz.
        highcut: f64,
        /// Filter order.
        order: usize,
    },
    /// Sliding median.
    Median {
        /// Window length; even values are bumped to the next odd one.
        kernel_size: usize,
    },
    /// Highpass tuned for respiratory and motion drift.
    Baseline {
        /// Hz.
        cutoff: f64,
        /// Filter order.
        order: usize,
    },
}

fn check_order(order: usize) -> Result<()> {
    if order == 0 {
        return Err(Error::invalid("order", "filter order must be greater than zero"));
    }
    Ok(())
}

fn check_cutoff(arg: &'static str, cutoff: f64, nyquist: f64) -> Result<()> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(Error::invalid(arg, format!("{arg} must be > 0 Hz, got {cutoff}")));
    }
    if cutoff >= nyquist {
        return Err(Error::invalid(
            arg,
            format!("{arg} must be below the Nyquist frequency {nyquist} Hz, got {cutoff}"),
        ));
    }
    Ok(())
}

fn nyquist_of(sampling_rate: f64) -> Result<f64> {
    if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
        return Err(Error::invalid(
            "sampling_rate",
            format!("sampling rate must be finite and > 0, got {sampling_rate}"),
        ));
    }
    Ok(sampling_rate / 2.0)
}

impl FilterSpec {
    /// Lowpass at `cutoff` Hz for a signal sampled at `sampling_rate`.
    pub fn lowpass(cutoff: f64, order: usize, sampling_rate: f64) -> Result<Self> {
        let spec = FilterSpec::Lowpass { cutoff, order };
        spec.validate(sampling_rate)?;
        Ok(spec)
    }

    /// Highpass at `cutoff` Hz for a signal sampled at `sampling_rate`.
    pub fn highpass(cutoff: f64, order: usize, sampling_rate: f64) -> Result<Self> {
        let spec = FilterSpec::Highpass { cutoff, order };
        spec.validate(sampling_rate)?;
        Ok(spec)
    }

    /// Bandpass between `lowcut` and `highcut` Hz.
    ///
    /// Requires `0 < lowcut < highcut < sampling_rate / 2`.
    pub fn bandpass(lowcut: f64, highcut: f64, order: usize, sampling_rate: f64) -> Result<Self> {
        let spec = FilterSpec::Bandpass {
            lowcut,
            highcut,
            order,
        };
        spec.validate(sampling_rate)?;
        Ok(spec)
    }

    /// Sliding median of `kernel_size` samples.
    pub fn median(kernel_size: usize) -> Result<Self> {
        let spec = FilterSpec::Median { kernel_size };
        spec.validate(f64::INFINITY)?;
        Ok(spec)
    }

    /// Baseline-wander removal at `cutoff` Hz.
    pub fn baseline(cutoff: f64, order: usize, sampling_rate: f64) -> Result<Self> {
        let spec = FilterSpec::Baseline { cutoff, order };
        spec.validate(sampling_rate)?;
        Ok(spec)
    }

    /// Stable tag used in logs and pipeline errors.
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::Lowpass { .. } => "lowpass",
            FilterSpec::Highpass { .. } => "highpass",
            FilterSpec::Bandpass { .. } => "bandpass",
            FilterSpec::Median { .. } => "median",
            FilterSpec::Baseline { .. } => "baseline",
        }
    }

    /// Check the request against a signal sampled at `sampling_rate`.
    ///
    /// Median filters are rate independent and only need a non-zero window.
    pub fn validate(&self, sampling_rate: f64) -> Result<()> {
        match *self {
            FilterSpec::Median { kernel_size } => {
                if kernel_size == 0 {
                    return Err(Error::invalid(
                        "kernel_size",
                        "kernel size must be greater than zero",
                    ));
                }
                Ok(())
            }
            FilterSpec::Lowpass { cutoff, order }
            | FilterSpec::Highpass { cutoff, order }
            | FilterSpec::Baseline { cutoff, order } => {
                check_order(order)?;
                check_cutoff("cutoff", cutoff, nyquist_of(sampling_rate)?)
            }
            FilterSpec::Bandpass {
                lowcut,
                highcut,
                order,
            } => {
                check_order(order)?;
                let nyquist = nyquist_of(sampling_rate)?;
                check_cutoff("lowcut", lowcut, nyquist)?;
                check_cutoff("highcut", highcut, nyquist)?;
                if lowcut >= highcut {
                    return Err(Error::invalid(
                        "lowcut",
                        format!("lowcut ({lowcut} Hz) must be below highcut ({highcut} Hz)"),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Run the filter over `signal`, returning a signal of the same length and rate.
    ///
    /// An empty signal passes through unchanged with a warning.
    pub fn apply(&self, signal: &Signal) -> Result<Signal> {
        self.validate(signal.sampling_rate())?;
        if signal.is_empty() {
            warn!(filter = self.name(), "filtering an empty signal; returning it unchanged");
            return Ok(signal.clone());
        }
        let fs = signal.sampling_rate();
        let samples = match *self {
            FilterSpec::Median { kernel_size } => median_samples(signal.samples(), kernel_size)?,
            FilterSpec::Lowpass { cutoff, order } => {
                zero_phase(signal.samples(), order, &[cutoff], FilterBandType::Lowpass, fs)?
            }
            FilterSpec::Highpass { cutoff, order } | FilterSpec::Baseline { cutoff, order } => {
                zero_phase(signal.samples(), order, &[cutoff], FilterBandType::Highpass, fs)?
            }
            FilterSpec::Bandpass {
                lowcut,
                highcut,
                order,
            } => zero_phase(
                signal.samples(),
                order,
                &[lowcut, highcut],
                FilterBandType::Bandpass,
                fs,
            )?,
        };
        Ok(signal.with_samples(samples))
    }
}

fn zero_phase(
    x: &[f64],
    order: usize,
    cutoffs: &[f64],
    btype: FilterBandType,
    fs: f64,
) -> Result<Vec<f64>> {
    let sos = butter(order, cutoffs, btype, fs)?;
    let kernel = SosFiltFiltKernel::try_new(SosFiltFiltConfig { sos })?;
    Ok(kernel.run_alloc(x)?)
}

fn median_samples(x: &[f64], kernel_size: usize) -> Result<Vec<f64>> {
    let kernel_size = if kernel_size % 2 == 0 {
        warn!(
            kernel_size,
            adjusted = kernel_size + 1,
            "median kernel size must be odd; using the next odd size"
        );
        kernel_size + 1
    } else {
        kernel_size
    };
    let kernel = MedFiltKernel::try_new(MedFiltConfig { kernel_size })?;
    Ok(kernel.run_alloc(x)?)
}

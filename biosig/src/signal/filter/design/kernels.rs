//! Trait-first kernel for Butterworth design.

use crate::kernel::{check_sampling_rate, ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::IirDesign;

use super::{butter_zpk, zpk2sos, FilterBandType, Sos};

/// Highest order accepted by [`ButterKernel`].
///
/// Beyond this the cascaded sections lose precision near DC.
pub const MAX_BUTTER_ORDER: usize = 24;

/// Constructor config for [`ButterKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ButterConfig {
    /// Filter order.
    pub order: usize,
    /// Critical frequencies in Hz.
    pub wn: Vec<f64>,
    /// Band type.
    pub btype: FilterBandType,
    /// Sampling rate in Hz.
    pub fs: f64,
}

/// Trait-first Butterworth design kernel producing second-order sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterKernel {
    order: usize,
    wn: Vec<f64>,
    btype: FilterBandType,
}

impl ButterKernel {
    /// Critical frequencies normalized to Nyquist.
    pub fn normalized_wn(&self) -> &[f64] {
        &self.wn
    }
}

impl KernelLifecycle for ButterKernel {
    type Config = ButterConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_sampling_rate("fs", config.fs)?;
        if config.order == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "order must be greater than zero",
            });
        }
        if config.order > MAX_BUTTER_ORDER {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "order must not exceed 24",
            });
        }
        if config.wn.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "wn" });
        }
        if config.wn.len() > 2 {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "wn length must be 1 or 2",
            });
        }
        if config.wn.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "critical frequencies must be greater than 0",
            });
        }
        if config.wn.len() == 2 && config.wn[0] >= config.wn[1] {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "wn[0] must be less than wn[1]",
            });
        }
        let nyq = config.fs / 2.0;
        if config.wn.iter().any(|w| *w >= nyq) {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "digital wn must satisfy 0 < wn < fs/2",
            });
        }

        match config.btype {
            FilterBandType::Lowpass | FilterBandType::Highpass => {
                if config.wn.len() != 1 {
                    return Err(ConfigError::InvalidArgument {
                        arg: "wn",
                        reason: "lowpass/highpass designs require one critical frequency",
                    });
                }
            }
            FilterBandType::Bandpass => {
                if config.wn.len() != 2 {
                    return Err(ConfigError::InvalidArgument {
                        arg: "wn",
                        reason: "bandpass designs require two critical frequencies",
                    });
                }
            }
        }

        Ok(Self {
            order: config.order,
            wn: config.wn.iter().map(|w| w / nyq).collect(),
            btype: config.btype,
        })
    }
}

impl IirDesign for ButterKernel {
    type Output = Vec<Sos<f64>>;

    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation> {
        let zpk = butter_zpk(self.order, &self.wn, self.btype).map_err(|_| {
            ExecInvariantViolation::InvalidState {
                reason: "butterworth band transform rejected validated config",
            }
        })?;
        zpk2sos(&zpk).map_err(|_| ExecInvariantViolation::Numerical {
            reason: "designed roots could not be paired into sections",
        })
    }
}

/// Design a digital Butterworth filter as second-order sections.
///
/// `wn` is in Hz and must lie strictly inside `(0, fs/2)`.
pub fn butter(
    order: usize,
    wn: &[f64],
    btype: FilterBandType,
    fs: f64,
) -> biosig_core::Result<Vec<Sos<f64>>> {
    let kernel = ButterKernel::try_new(ButterConfig {
        order,
        wn: wn.to_vec(),
        btype,
        fs,
    })?;
    Ok(kernel.run_alloc()?)
}

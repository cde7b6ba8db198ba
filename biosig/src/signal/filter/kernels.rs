//! Trait-first kernel wrappers for filtering primitives.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::{MedFilt1D, SosFilt1D, SosFiltFilt1D};
use biosig_core::Error;
use core::iter::Sum;
use nalgebra::RealField;
use num_traits::Float;

use super::design::Sos;
use super::{medfilt, sosfilt_checked_slice, sosfilt_zi_checked_slice, sosfiltfilt_checked_slice};

fn check_sections<F>(sos: &[Sos<F>]) -> Result<(), ConfigError>
where
    F: RealField + Copy,
{
    if sos.is_empty() {
        return Err(ConfigError::EmptyInput { arg: "sos" });
    }
    if sos.iter().any(|s| s.a[0] != F::one()) {
        return Err(ConfigError::InvalidArgument {
            arg: "sos",
            reason: "sections must be normalized so that a[0] == 1",
        });
    }
    Ok(())
}

fn exec_violation(err: Error) -> ExecInvariantViolation {
    match err {
        Error::DegenerateInput { .. } => ExecInvariantViolation::InvalidState {
            reason: "filter input must be non-empty",
        },
        Error::Transform { .. } => ExecInvariantViolation::Numerical {
            reason: "section steady state is undefined",
        },
        _ => ExecInvariantViolation::InvalidState {
            reason: "filter rejected its input",
        },
    }
}

fn check_out_len(expected: usize, got: usize) -> Result<(), ExecInvariantViolation> {
    if expected != got {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected,
            got,
        });
    }
    Ok(())
}

/// Constructor config for [`SosFiltKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltConfig<F>
where
    F: RealField + Copy,
{
    /// Second-order sections with mutable filter state.
    pub sos: Vec<Sos<F>>,
}

/// Stateful causal 1D `sosfilt` kernel.
///
/// Section state carries over between calls.
#[derive(Debug, Clone)]
pub struct SosFiltKernel<F>
where
    F: RealField + Copy,
{
    sos: Vec<Sos<F>>,
}

impl<F> SosFiltKernel<F>
where
    F: RealField + Copy,
{
    /// Clear all section state.
    pub fn reset(&mut self) {
        self.sos.iter_mut().for_each(Sos::reset);
    }
}

impl<F> KernelLifecycle for SosFiltKernel<F>
where
    F: RealField + Copy,
{
    type Config = SosFiltConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_sections(&config.sos)?;
        Ok(Self { sos: config.sos })
    }
}

impl<F> SosFilt1D<F> for SosFiltKernel<F>
where
    F: RealField + Copy,
{
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        check_out_len(input.len(), out_slice.len())?;
        let y = sosfilt_checked_slice(input, &mut self.sos).map_err(exec_violation)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        sosfilt_checked_slice(input, &mut self.sos).map_err(exec_violation)
    }
}

/// Constructor config for [`SosFiltFiltKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltFiltConfig<F>
where
    F: RealField + Copy,
{
    /// Second-order sections used for forward-backward filtering.
    pub sos: Vec<Sos<F>>,
}

/// Stateless zero-phase 1D `sosfiltfilt` kernel.
#[derive(Debug, Clone)]
pub struct SosFiltFiltKernel<F>
where
    F: RealField + Copy,
{
    sos: Vec<Sos<F>>,
}

impl<F> SosFiltFiltKernel<F>
where
    F: RealField + Copy,
{
    /// The sections this kernel runs.
    pub fn sections(&self) -> &[Sos<F>] {
        &self.sos
    }
}

impl<F> KernelLifecycle for SosFiltFiltKernel<F>
where
    F: RealField + Copy + Sum,
{
    type Config = SosFiltFiltConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_sections(&config.sos)?;
        let mut probe = config.sos.clone();
        sosfilt_zi_checked_slice(&mut probe).map_err(|_| ConfigError::InvalidArgument {
            arg: "sos",
            reason: "sections with a pole at DC have no steady state",
        })?;
        Ok(Self { sos: config.sos })
    }
}

impl<F> SosFiltFilt1D<F> for SosFiltFiltKernel<F>
where
    F: RealField + Copy + Sum,
{
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        check_out_len(input.len(), out_slice.len())?;
        let y = sosfiltfilt_checked_slice(input, &self.sos).map_err(exec_violation)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        sosfiltfilt_checked_slice(input, &self.sos).map_err(exec_violation)
    }
}

/// Constructor config for [`MedFiltKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedFiltConfig {
    /// Odd window length.
    pub kernel_size: usize,
}

/// Zero-padded sliding-median kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedFiltKernel {
    kernel_size: usize,
}

impl KernelLifecycle for MedFiltKernel {
    type Config = MedFiltConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.kernel_size == 0 || config.kernel_size % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "kernel_size",
                reason: "kernel size must be odd",
            });
        }
        Ok(Self {
            kernel_size: config.kernel_size,
        })
    }
}

impl<F> MedFilt1D<F> for MedFiltKernel
where
    F: Float,
{
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        check_out_len(input.len(), out_slice.len())?;
        let y = medfilt(input, self.kernel_size).map_err(exec_violation)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        medfilt(input, self.kernel_size).map_err(exec_violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::design::{butter, FilterBandType};

    #[test]
    fn sosfilt_kernel_keeps_state_between_calls() {
        let sos = butter(2, &[10.0], FilterBandType::Lowpass, 100.0).expect("valid design");
        let x: Vec<f64> = (0..32).map(|i| (i as f64 * 0.3).sin()).collect();

        let mut whole = SosFiltKernel::try_new(SosFiltConfig { sos: sos.clone() })
            .expect("kernel should initialize");
        let expected = whole.run_alloc(&x).expect("sosfilt should run");

        let mut split = SosFiltKernel::try_new(SosFiltConfig { sos })
            .expect("kernel should initialize");
        let mut head = vec![0.0; 16];
        let mut tail = vec![0.0; 16];
        split.run_into(&x[..16], &mut head).expect("first half");
        split.run_into(&x[16..], &mut tail).expect("second half");
        head.extend(tail);
        assert_eq!(head, expected);

        split.reset();
        assert_eq!(split.run_alloc(&x).expect("after reset"), expected);
    }

    #[test]
    fn sosfiltfilt_kernel_matches_function_and_checks_lengths() {
        let sos = butter(4, &[1.0, 8.0], FilterBandType::Bandpass, 64.0).expect("valid design");
        let kernel = SosFiltFiltKernel::try_new(SosFiltFiltConfig { sos: sos.clone() })
            .expect("kernel should initialize");
        let x: Vec<f64> = (0..256).map(|i| (i as f64 * 0.5).sin()).collect();

        let actual = kernel.run_alloc(&x).expect("sosfiltfilt should run");
        let expected = sosfiltfilt_checked_slice(&x, &sos).expect("reference");
        assert_eq!(actual, expected);

        let mut too_short = vec![0.0f64; x.len() - 1];
        let err = kernel
            .run_into(&x, &mut too_short)
            .expect_err("output size mismatch must fail");
        assert!(matches!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: 256,
                got: 255
            }
        ));
        let err = kernel.run_alloc(&Vec::<f64>::new()).expect_err("empty input");
        assert!(matches!(err, ExecInvariantViolation::InvalidState { .. }));
    }

    #[test]
    fn constructors_reject_bad_sections() {
        let err = SosFiltKernel::<f64>::try_new(SosFiltConfig { sos: Vec::new() })
            .expect_err("empty sos must fail");
        assert_eq!(err, ConfigError::EmptyInput { arg: "sos" });

        let unnormalized = vec![Sos::new([1.0, 0.0, 0.0], [2.0, 0.0, 0.0])];
        assert!(SosFiltKernel::try_new(SosFiltConfig { sos: unnormalized }).is_err());

        let integrator = vec![Sos::new([1.0, 0.0, 0.0], [1.0, -1.0, 0.0])];
        assert!(SosFiltFiltKernel::try_new(SosFiltFiltConfig { sos: integrator }).is_err());
    }

    #[test]
    fn medfilt_kernel_validates_size() {
        assert!(MedFiltKernel::try_new(MedFiltConfig { kernel_size: 4 }).is_err());
        let kernel = MedFiltKernel::try_new(MedFiltConfig { kernel_size: 3 }).expect("odd");
        let y: Vec<f64> = kernel.run_alloc(&[0.0, 10.0, 0.0, 0.0]).expect("runs");
        assert_eq!(y, vec![0.0, 0.0, 0.0, 0.0]);
    }
}

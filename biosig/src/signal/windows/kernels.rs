//! Trait-first window generation kernel.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D};
use crate::signal::traits::WindowGenerate;

use super::{get_window, WindowKind};

/// Constructor config for [`WindowKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Window family.
    pub kind: WindowKind,
    /// Output length.
    pub nx: usize,
    /// `true` for the periodic variant, `false` for the symmetric one.
    pub fftbins: bool,
}

/// Trait-first window generation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowKernel {
    kind: WindowKind,
    nx: usize,
    fftbins: bool,
}

impl KernelLifecycle for WindowKernel {
    type Config = WindowConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.nx == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "nx",
                reason: "window length must be greater than 0",
            });
        }
        Ok(Self {
            kind: config.kind,
            nx: config.nx,
            fftbins: config.fftbins,
        })
    }
}

impl WindowGenerate<f64> for WindowKernel {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<f64> + ?Sized,
    {
        let out_slice = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if out_slice.len() != self.nx {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.nx,
                got: out_slice.len(),
            });
        }
        out_slice.copy_from_slice(&get_window(self.kind, self.nx, self.fftbins));
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<f64>, ExecInvariantViolation> {
        Ok(get_window(self.kind, self.nx, self.fftbins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn window_kernel_run_into_ndarray() {
        let kernel = WindowKernel::try_new(WindowConfig {
            kind: WindowKind::Boxcar,
            nx: 8,
            fftbins: false,
        })
        .expect("window kernel should initialize");

        let mut out = Array1::from(vec![0.0f64; 8]);
        kernel
            .run_into(&mut out)
            .expect("window run_into should succeed");
        out.iter()
            .for_each(|v| assert_abs_diff_eq!(*v, 1.0f64, epsilon = 1e-12));

        let mut short = vec![0.0f64; 7];
        assert!(kernel.run_into(&mut short).is_err());
    }

    #[test]
    fn window_kernel_constructor_rejects_empty_window() {
        let err = WindowKernel::try_new(WindowConfig {
            kind: WindowKind::Hamming,
            nx: 0,
            fftbins: false,
        })
        .expect_err("empty windows must fail");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "nx",
                reason: "window length must be greater than 0",
            }
        );
    }
}

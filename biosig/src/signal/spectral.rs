//! Real FFT helpers and PSD estimators analogous to `scipy.signal.periodogram`
//! and `scipy.signal.welch`.
//!
//! Both estimators use a periodic Hann window, remove each segment's mean and
//! report a one-sided density in units of power per Hz.

use crate::kernel::{
    check_sampling_rate, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::{Periodogram1D, WelchPsd1D};
use crate::signal::windows::{get_window, WindowKind};
use biosig_core::num_rs::rfftfreq;
use biosig_core::Error;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Default Welch segment length: `min(256, len / 4)`, at least one sample.
pub fn default_nperseg(len: usize) -> usize {
    (len / 4).min(256).max(1)
}

/// Non-negative half of the DFT of `x`, zero-padded or truncated to `nfft`.
///
/// Returns `nfft / 2 + 1` bins, like `numpy.fft.rfft(x, n=nfft)`.
pub fn rfft(x: &[f64], nfft: usize) -> Vec<Complex<f64>> {
    if nfft == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let mut buf = vec![Complex::new(0.0, 0.0); nfft];
    for (dst, src) in buf.iter_mut().zip(x.iter().copied()) {
        *dst = Complex::new(src, 0.0);
    }
    fft.process(&mut buf);
    buf.truncate(nfft / 2 + 1);
    buf
}

/// Inverse of [`rfft`], producing `n` real samples.
///
/// Bins beyond `n / 2 + 1` are ignored and missing bins are taken as zero,
/// like `numpy.fft.irfft(spec, n=n)`.
pub fn irfft(spec: &[Complex<f64>], n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(n);
    let mut buf = vec![Complex::new(0.0, 0.0); n];

    let n_freq = n / 2 + 1;
    let copied = n_freq.min(spec.len());
    buf[..copied].copy_from_slice(&spec[..copied]);

    if n > 1 {
        let max_k = if n.is_multiple_of(2) { n / 2 - 1 } else { n / 2 };
        for k in 1..=max_k {
            buf[n - k] = buf[k].conj();
        }
    }

    ifft.process(&mut buf);
    let scale = 1.0 / n as f64;
    buf.into_iter().map(|c| c.re * scale).collect()
}

fn onesided_density(spec: &[Complex<f64>], nfft: usize, fs: f64, norm: f64) -> Vec<f64> {
    spec.iter()
        .enumerate()
        .map(|(k, z)| {
            let v = z.norm_sqr() / (fs * norm);
            if k == 0 || (nfft.is_multiple_of(2) && k == nfft / 2) {
                v
            } else {
                2.0 * v
            }
        })
        .collect()
}

fn segment_starts(len: usize, nperseg: usize, noverlap: usize) -> Vec<usize> {
    let hop = nperseg - noverlap;
    let mut starts = Vec::new();
    let mut start = 0usize;
    while start + nperseg <= len {
        starts.push(start);
        start += hop;
    }
    starts
}

fn averaged_density(x: &[f64], fs: f64, nperseg: usize, noverlap: usize) -> (Vec<f64>, Vec<f64>) {
    let window = get_window(WindowKind::Hann, nperseg, true);
    let win_norm = window.iter().map(|w| w * w).sum::<f64>();
    let starts = segment_starts(x.len(), nperseg, noverlap);
    let mut accum = vec![0.0; nperseg / 2 + 1];

    for &start in &starts {
        let seg = &x[start..start + nperseg];
        let mean = seg.iter().sum::<f64>() / nperseg as f64;
        let tapered: Vec<f64> = seg
            .iter()
            .zip(window.iter())
            .map(|(v, w)| (v - mean) * w)
            .collect();
        let psd = onesided_density(&rfft(&tapered, nperseg), nperseg, fs, win_norm);
        for (a, p) in accum.iter_mut().zip(psd.iter()) {
            *a += *p;
        }
    }

    let inv = 1.0 / starts.len().max(1) as f64;
    for v in &mut accum {
        *v *= inv;
    }
    (rfftfreq(nperseg, fs), accum)
}

/// Constructor config for [`PeriodogramKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodogramConfig {
    /// Sampling frequency in Hz.
    pub fs: f64,
}

/// Single-segment PSD estimate over the whole input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodogramKernel {
    fs: f64,
}

impl KernelLifecycle for PeriodogramKernel {
    type Config = PeriodogramConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_sampling_rate("fs", config.fs)?;
        Ok(Self { fs: config.fs })
    }
}

impl Periodogram1D for PeriodogramKernel {
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized,
    {
        let (f, p) = self.run_alloc(input)?;
        copy_pair(&f, &p, freqs, pxx)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        if input.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "periodogram input must be non-empty",
            });
        }
        Ok(averaged_density(input, self.fs, input.len(), 0))
    }
}

/// Constructor config for [`WelchKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchConfig {
    /// Sampling frequency in Hz.
    pub fs: f64,
    /// Segment length; `None` picks [`default_nperseg`] per input.
    pub nperseg: Option<usize>,
}

/// Welch PSD with 50% overlapping segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchKernel {
    fs: f64,
    nperseg: Option<usize>,
}

impl WelchKernel {
    /// Segment length actually used for an input of `len` samples.
    pub fn effective_nperseg(&self, len: usize) -> usize {
        self.nperseg
            .unwrap_or_else(|| default_nperseg(len))
            .min(len)
            .max(1)
    }
}

impl KernelLifecycle for WelchKernel {
    type Config = WelchConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_sampling_rate("fs", config.fs)?;
        if config.nperseg == Some(0) {
            return Err(ConfigError::InvalidArgument {
                arg: "nperseg",
                reason: "nperseg must be > 0",
            });
        }
        Ok(Self {
            fs: config.fs,
            nperseg: config.nperseg,
        })
    }
}

impl WelchPsd1D for WelchKernel {
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized,
    {
        let (f, p) = self.run_alloc(input)?;
        copy_pair(&f, &p, freqs, pxx)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        if input.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "welch input must be non-empty",
            });
        }
        let nperseg = self.effective_nperseg(input.len());
        Ok(averaged_density(input, self.fs, nperseg, nperseg / 2))
    }
}

fn copy_pair<OF, OP>(
    f: &[f64],
    p: &[f64],
    freqs: &mut OF,
    pxx: &mut OP,
) -> Result<(), ExecInvariantViolation>
where
    OF: Write1D<f64> + ?Sized,
    OP: Write1D<f64> + ?Sized,
{
    let f_out = freqs
        .write_slice_mut()
        .map_err(ExecInvariantViolation::from)?;
    if f_out.len() != f.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "freqs",
            expected: f.len(),
            got: f_out.len(),
        });
    }
    let p_out = pxx.write_slice_mut().map_err(ExecInvariantViolation::from)?;
    if p_out.len() != p.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "pxx",
            expected: p.len(),
            got: p_out.len(),
        });
    }
    f_out.copy_from_slice(f);
    p_out.copy_from_slice(p);
    Ok(())
}

fn empty_psd_input() -> Error {
    Error::degenerate("cannot estimate a PSD from zero samples")
}

/// One-sided periodogram of `x` sampled at `fs`.
pub fn periodogram(x: &[f64], fs: f64) -> biosig_core::Result<(Vec<f64>, Vec<f64>)> {
    if x.is_empty() {
        return Err(empty_psd_input());
    }
    let kernel = PeriodogramKernel::try_new(PeriodogramConfig { fs })?;
    Ok(kernel.run_alloc(x)?)
}

/// One-sided Welch PSD of `x` sampled at `fs`.
///
/// `nperseg` defaults to [`default_nperseg`] and is capped at the input length.
pub fn welch(
    x: &[f64],
    fs: f64,
    nperseg: Option<usize>,
) -> biosig_core::Result<(Vec<f64>, Vec<f64>)> {
    if x.is_empty() {
        return Err(empty_psd_input());
    }
    let kernel = WelchKernel::try_new(WelchConfig { fs, nperseg })?;
    Ok(kernel.run_alloc(x)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;

    fn tone(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn rfft_irfft_round_trip() {
        for n in [7usize, 8, 33] {
            let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).cos() + i as f64 * 0.01).collect();
            let spec = rfft(&x, n);
            assert_eq!(spec.len(), n / 2 + 1);
            let back = irfft(&spec, n);
            for (a, b) in x.iter().zip(back.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn rfft_pads_and_truncates() {
        let x = [1.0, 1.0, 1.0, 1.0];
        let padded = rfft(&x, 8);
        assert_eq!(padded.len(), 5);
        assert_abs_diff_eq!(padded[0].re, 4.0, epsilon = 1e-12);

        let truncated = rfft(&x, 2);
        assert_eq!(truncated.len(), 2);
        assert_abs_diff_eq!(truncated[0].re, 2.0, epsilon = 1e-12);
        assert!(rfft(&x, 0).is_empty());
    }

    #[test]
    fn periodogram_peaks_at_tone() {
        let fs = 100.0;
        let x = tone(12.5, fs, 200);
        let (f, p) = periodogram(&x, fs).expect("periodogram");
        assert_eq!(f.len(), 101);
        let argmax = p
            .iter()
            .enumerate()
            .fold(0, |best, (i, v)| if *v > p[best] { i } else { best });
        assert_abs_diff_eq!(f[argmax], 12.5, epsilon = 1e-12);
    }

    #[test]
    fn welch_density_integrates_to_variance() {
        let fs = 256.0;
        let x = tone(32.0, fs, 4096);
        let (f, p) = welch(&x, fs, Some(256)).expect("welch");
        assert_eq!(f.len(), 129);
        assert_abs_diff_eq!(f[1] - f[0], 1.0, epsilon = 1e-12);
        let df = f[1] - f[0];
        let power: f64 = p.iter().sum::<f64>() * df;
        // A unit sine carries variance 1/2.
        assert_abs_diff_eq!(power, 0.5, epsilon = 1e-2);
    }

    #[test]
    fn welch_default_segment_length() {
        assert_eq!(default_nperseg(400), 100);
        assert_eq!(default_nperseg(10_000), 256);
        assert_eq!(default_nperseg(3), 1);

        let kernel = WelchKernel::try_new(WelchConfig {
            fs: 10.0,
            nperseg: Some(64),
        })
        .expect("welch kernel");
        assert_eq!(kernel.effective_nperseg(20), 20);

        let x = tone(1.0, 10.0, 40);
        let (f, p) = welch(&x, 10.0, None).expect("welch");
        assert_eq!(f.len(), 6);
        assert_eq!(p.len(), 6);
    }

    #[test]
    fn constant_input_has_no_density() {
        let (_, p) = welch(&[3.0; 64], 8.0, Some(16)).expect("welch");
        p.iter().for_each(|v| assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-20));
    }

    #[test]
    fn run_into_checks_buffers() {
        let kernel = PeriodogramKernel::try_new(PeriodogramConfig { fs: 4.0 }).expect("kernel");
        let x = [0.0, 1.0, 0.0, -1.0];
        let mut f = vec![0.0; 3];
        let mut p = vec![0.0; 3];
        kernel.run_into(&x, &mut f, &mut p).expect("run_into");
        assert_abs_diff_eq!(f[2], 2.0, epsilon = 1e-12);

        let mut short = vec![0.0; 2];
        assert!(kernel.run_into(&x, &mut short, &mut p).is_err());
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            welch(&[], 10.0, None),
            Err(Error::DegenerateInput { .. })
        ));
        assert!(matches!(
            periodogram(&[1.0], 0.0),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            welch(&[1.0, 2.0], 10.0, Some(0)),
            Err(Error::InvalidParameter { .. })
        ));
    }
}

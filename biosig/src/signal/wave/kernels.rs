//! Trait-first kernels for synthetic biomedical waveforms.

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;

use crate::kernel::{
    check_sampling_rate, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::Synthesize1D;
use biosig_core::Error;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Number of samples in `duration` seconds at `fs` Hz, rounded to nearest.
pub fn sample_count(duration: f64, fs: f64) -> usize {
    (duration * fs).round() as usize
}

fn check_timing(duration: f64, fs: f64) -> Result<(), ConfigError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ConfigError::InvalidArgument {
            arg: "duration",
            reason: "duration must be finite and > 0",
        });
    }
    check_sampling_rate("sampling_rate", fs)
}

fn check_noise_level(noise_level: f64) -> Result<f64, ConfigError> {
    if !noise_level.is_finite() || noise_level < 0.0 {
        return Err(ConfigError::InvalidArgument {
            arg: "noise_level",
            reason: "noise level must be finite and >= 0",
        });
    }
    Ok(noise_level)
}

fn add_noise<R>(out: &mut [f64], noise_level: f64, rng: &mut R) -> Result<(), ExecInvariantViolation>
where
    R: Rng + ?Sized,
{
    if noise_level == 0.0 {
        return Ok(());
    }
    let dist = Normal::new(0.0, noise_level).map_err(|_| ExecInvariantViolation::Numerical {
        reason: "noise level is not a valid standard deviation",
    })?;
    out.iter_mut().for_each(|v| *v += dist.sample(rng));
    Ok(())
}

/// Scale `x` so that its largest magnitude is one. All-zero input is left alone.
pub fn normalize_peak(x: &mut [f64]) {
    let peak = x.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if peak > 0.0 {
        x.iter_mut().for_each(|v| *v /= peak);
    }
}

fn bind_out<'a, O>(out: &'a mut O, expected: usize) -> Result<&'a mut [f64], ExecInvariantViolation>
where
    O: Write1D<f64> + ?Sized,
{
    let out = out
        .write_slice_mut()
        .map_err(ExecInvariantViolation::from)?;
    if out.len() != expected {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected,
            got: out.len(),
        });
    }
    Ok(out)
}

/// Constructor config for [`EcgKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcgConfig {
    /// Length in seconds.
    pub duration: f64,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Beats per minute.
    pub heart_rate: f64,
    /// Standard deviation of the additive Gaussian noise.
    pub noise_level: f64,
    /// Superimpose a 0.5 Hz respiratory drift.
    pub baseline_wander: bool,
}

/// Piecewise P-QRS-T beat model, normalized to unit peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcgKernel {
    len: usize,
    sampling_rate: f64,
    period: f64,
    baseline_wander: bool,
    noise_level: f64,
}

fn bump(pos: f64, centre: f64) -> f64 {
    (-((pos - centre) / 0.01).powi(2)).exp()
}

impl EcgKernel {
    /// Noise-free, unnormalized beat value at phase `pos` in `[0, 1)`.
    pub fn beat(pos: f64) -> f64 {
        if pos < 0.15 {
            0.1 * (PI * pos / 0.15).sin()
        } else if pos < 0.17 {
            -0.2 * bump(pos, 0.16)
        } else if pos < 0.20 {
            bump(pos, 0.18)
        } else if pos < 0.25 {
            -0.3 * bump(pos, 0.22)
        } else if pos < 0.55 {
            0.3 * (PI * (pos - 0.25) / 0.3).sin() * (-((pos - 0.4) / 0.15).powi(2)).exp()
        } else {
            0.0
        }
    }

    pub(super) fn sample(&self, t: f64) -> f64 {
        let pos = (t % self.period) / self.period;
        let mut v = Self::beat(pos);
        if self.baseline_wander {
            v += 0.1 * (2.0 * PI * 0.5 * t).sin();
        }
        v
    }
}

impl KernelLifecycle for EcgKernel {
    type Config = EcgConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_timing(config.duration, config.sampling_rate)?;
        if !config.heart_rate.is_finite() || config.heart_rate <= 0.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "heart_rate",
                reason: "heart rate must be finite and > 0",
            });
        }
        Ok(Self {
            len: sample_count(config.duration, config.sampling_rate),
            sampling_rate: config.sampling_rate,
            period: 60.0 / config.heart_rate,
            baseline_wander: config.baseline_wander,
            noise_level: check_noise_level(config.noise_level)?,
        })
    }
}

impl Synthesize1D<f64> for EcgKernel {
    fn output_len(&self) -> usize {
        self.len
    }

    fn run_into<R, O>(&self, rng: &mut R, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        R: Rng + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let out = bind_out(out, self.len)?;
        out.iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = self.sample(i as f64 / self.sampling_rate));
        add_noise(out, self.noise_level, rng)?;
        normalize_peak(out);
        Ok(())
    }

    fn run_alloc<R>(&self, rng: &mut R) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        R: Rng + ?Sized,
    {
        let mut out = vec![0.0; self.len];
        self.run_into(rng, &mut out)?;
        Ok(out)
    }
}

/// Classical EEG rhythm bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EegBand {
    /// 0.5 to 4 Hz.
    Delta,
    /// 4 to 8 Hz.
    Theta,
    /// 8 to 13 Hz.
    Alpha,
    /// 13 to 30 Hz.
    Beta,
    /// 30 to 40 Hz.
    Gamma,
}

impl EegBand {
    /// All bands, slowest first.
    pub const ALL: [EegBand; 5] = [
        EegBand::Delta,
        EegBand::Theta,
        EegBand::Alpha,
        EegBand::Beta,
        EegBand::Gamma,
    ];

    /// Band edges in Hz.
    pub fn range(self) -> (f64, f64) {
        match self {
            EegBand::Delta => (0.5, 4.0),
            EegBand::Theta => (4.0, 8.0),
            EegBand::Alpha => (8.0, 13.0),
            EegBand::Beta => (13.0, 30.0),
            EegBand::Gamma => (30.0, 40.0),
        }
    }

    /// Weight used when the caller does not choose one.
    pub fn default_amplitude(self) -> f64 {
        match self {
            EegBand::Delta | EegBand::Gamma => 0.1,
            EegBand::Theta | EegBand::Beta => 0.2,
            EegBand::Alpha => 0.3,
        }
    }

    /// Every band at its default weight.
    pub fn default_weights() -> Vec<(EegBand, f64)> {
        Self::ALL
            .iter()
            .map(|b| (*b, b.default_amplitude()))
            .collect()
    }

    /// Lower-case band name.
    pub fn name(self) -> &'static str {
        match self {
            EegBand::Delta => "delta",
            EegBand::Theta => "theta",
            EegBand::Alpha => "alpha",
            EegBand::Beta => "beta",
            EegBand::Gamma => "gamma",
        }
    }
}

impl fmt::Display for EegBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EegBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EegBand::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid("frequency_bands", format!("unknown EEG band `{s}`")))
    }
}

/// Constructor config for [`EegKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct EegConfig {
    /// Length in seconds.
    pub duration: f64,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Bands to mix and their amplitudes.
    pub bands: Vec<(EegBand, f64)>,
    /// Standard deviation of the additive Gaussian noise.
    pub noise_level: f64,
    /// Inject eye-blink bumps roughly every three seconds.
    pub artifacts: bool,
}

/// Band-oscillator mixture with optional blink artifacts, normalized to unit peak.
#[derive(Debug, Clone, PartialEq)]
pub struct EegKernel {
    len: usize,
    sampling_rate: f64,
    bands: Vec<(EegBand, f64)>,
    blinks: usize,
    noise_level: f64,
}

impl EegKernel {
    fn oscillators(&self, t: f64) -> f64 {
        self.bands
            .iter()
            .map(|(band, a)| {
                let (lo, hi) = band.range();
                let centre = (lo + hi) / 2.0;
                let spread = (hi - lo) / 4.0;
                a * (2.0 * PI * centre * t).sin()
                    + 0.3 * a * (2.0 * PI * (centre + spread) * t).sin()
                    + 0.2 * a * (2.0 * PI * (centre - spread) * t).sin()
            })
            .sum()
    }

    fn add_blinks<R>(&self, out: &mut [f64], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let width = (0.3 * self.sampling_rate) as usize;
        if width == 0 || out.is_empty() {
            return;
        }
        let half = width as f64 / 2.0;
        let quarter = width as f64 / 4.0;
        let shape: Vec<f64> = (0..width)
            .map(|k| 0.5 * (-((k as f64 - half) / quarter).powi(2)).exp())
            .collect();
        for _ in 0..self.blinks {
            let pos = rng.gen_range(0..out.len());
            let start = pos.saturating_sub(width / 2);
            out[start..]
                .iter_mut()
                .zip(shape.iter())
                .for_each(|(v, s)| *v += s);
        }
    }
}

impl KernelLifecycle for EegKernel {
    type Config = EegConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_timing(config.duration, config.sampling_rate)?;
        if config.bands.iter().any(|(_, a)| !a.is_finite()) {
            return Err(ConfigError::InvalidArgument {
                arg: "frequency_bands",
                reason: "band amplitudes must be finite",
            });
        }
        let blinks = if config.artifacts {
            (config.duration / 3.0).floor() as usize
        } else {
            0
        };
        Ok(Self {
            len: sample_count(config.duration, config.sampling_rate),
            sampling_rate: config.sampling_rate,
            bands: config.bands,
            blinks,
            noise_level: check_noise_level(config.noise_level)?,
        })
    }
}

impl Synthesize1D<f64> for EegKernel {
    fn output_len(&self) -> usize {
        self.len
    }

    fn run_into<R, O>(&self, rng: &mut R, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        R: Rng + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let out = bind_out(out, self.len)?;
        out.iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = self.oscillators(i as f64 / self.sampling_rate));
        self.add_blinks(out, rng);
        add_noise(out, self.noise_level, rng)?;
        normalize_peak(out);
        Ok(())
    }

    fn run_alloc<R>(&self, rng: &mut R) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        R: Rng + ?Sized,
    {
        let mut out = vec![0.0; self.len];
        self.run_into(rng, &mut out)?;
        Ok(out)
    }
}

/// Constructor config for [`ToneKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToneConfig {
    /// Length in seconds.
    pub duration: f64,
    /// Sampling rate in Hz.
    pub sampling_rate: f64,
    /// Tone frequencies in Hz.
    pub frequencies: Vec<f64>,
    /// Peak amplitude per tone; same length as `frequencies`.
    pub amplitudes: Vec<f64>,
    /// Phase offset in radians per tone; same length as `frequencies`.
    pub phases: Vec<f64>,
    /// Standard deviation of the additive Gaussian noise.
    pub noise_level: f64,
}

/// Sum of sinusoids plus optional Gaussian noise. Not normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneKernel {
    len: usize,
    sampling_rate: f64,
    tones: Vec<(f64, f64, f64)>,
    noise_level: f64,
}

impl ToneKernel {
    pub(super) fn sample(&self, t: f64) -> f64 {
        self.tones
            .iter()
            .map(|(f, a, phi)| a * (2.0 * PI * f * t + phi).sin())
            .sum()
    }
}

impl KernelLifecycle for ToneKernel {
    type Config = ToneConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_timing(config.duration, config.sampling_rate)?;
        let n = config.frequencies.len();
        if config.amplitudes.len() != n {
            return Err(ConfigError::InvalidArgument {
                arg: "amplitudes",
                reason: "amplitudes must have one entry per frequency",
            });
        }
        if config.phases.len() != n {
            return Err(ConfigError::InvalidArgument {
                arg: "phases",
                reason: "phases must have one entry per frequency",
            });
        }
        if config.frequencies.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "frequencies",
                reason: "tone frequencies must be finite and >= 0",
            });
        }
        let tones = config
            .frequencies
            .iter()
            .zip(config.amplitudes.iter())
            .zip(config.phases.iter())
            .map(|((f, a), phi)| (*f, *a, *phi))
            .collect();
        Ok(Self {
            len: sample_count(config.duration, config.sampling_rate),
            sampling_rate: config.sampling_rate,
            tones,
            noise_level: check_noise_level(config.noise_level)?,
        })
    }
}

impl Synthesize1D<f64> for ToneKernel {
    fn output_len(&self) -> usize {
        self.len
    }

    fn run_into<R, O>(&self, rng: &mut R, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        R: Rng + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let out = bind_out(out, self.len)?;
        out.iter_mut()
            .enumerate()
            .for_each(|(i, v)| *v = self.sample(i as f64 / self.sampling_rate));
        add_noise(out, self.noise_level, rng)?;
        Ok(())
    }

    fn run_alloc<R>(&self, rng: &mut R) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        R: Rng + ?Sized,
    {
        let mut out = vec![0.0; self.len];
        self.run_into(rng, &mut out)?;
        Ok(out)
    }
}

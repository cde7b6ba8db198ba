//! Synthetic ECG, EEG and tone generators with provenance metadata.

use crate::kernel::KernelLifecycle;
use crate::signal::traits::Synthesize1D;
use crate::signal::Signal;
use biosig_core::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

mod kernels;
pub use kernels::*;

/// Which generator produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// [`WaveformSynthesizer::generate_ecg`].
    Ecg,
    /// [`WaveformSynthesizer::generate_eeg`].
    Eeg,
    /// [`WaveformSynthesizer::generate_sine_wave`].
    Sine,
    /// [`WaveformSynthesizer::generate_multi_tone`].
    MultiTone,
}

/// One EEG band and the amplitude it was mixed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandWeight {
    /// Rhythm band.
    pub band: EegBand,
    /// Oscillator amplitude.
    pub amplitude: f64,
}

/// Generator-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynthesisParams {
    /// ECG beat model.
    Ecg {
        /// Beats per minute.
        heart_rate: f64,
        /// Whether 0.5 Hz drift was added.
        baseline_wander: bool,
    },
    /// EEG band mixture.
    Eeg {
        /// Bands and amplitudes.
        bands: Vec<BandWeight>,
        /// Whether blink artifacts were injected.
        artifacts: bool,
    },
    /// Single sinusoid.
    Sine {
        /// Hz.
        frequency: f64,
        /// Peak amplitude.
        amplitude: f64,
        /// Radians.
        phase: f64,
    },
    /// Sum of sinusoids.
    MultiTone {
        /// Hz, one per tone.
        frequencies: Vec<f64>,
        /// Peak amplitude, one per tone.
        amplitudes: Vec<f64>,
    },
}

/// Parameters a synthetic signal was generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisMetadata {
    /// Generator.
    pub kind: SignalKind,
    /// Seconds.
    pub duration: f64,
    /// Hz.
    pub sampling_rate: f64,
    /// Standard deviation of the additive noise.
    pub noise_level: f64,
    /// Generator-specific parameters.
    pub params: SynthesisParams,
}

/// Seedable source of synthetic test signals.
///
/// All randomness comes from the owned RNG, so two synthesizers built with
/// the same seed produce identical signals for identical call sequences.
#[derive(Debug, Clone)]
pub struct WaveformSynthesizer {
    rng: StdRng,
}

impl WaveformSynthesizer {
    /// Deterministic synthesizer.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Synthesizer seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    fn run<K>(&mut self, kernel: &K, sampling_rate: f64) -> Result<Signal>
    where
        K: Synthesize1D<f64>,
    {
        let samples = kernel.run_alloc(&mut self.rng)?;
        Signal::new(samples, sampling_rate)
    }

    /// ECG-like beat train normalized to unit peak.
    ///
    /// The output has `round(duration * sampling_rate)` samples.
    pub fn generate_ecg(
        &mut self,
        duration: f64,
        sampling_rate: f64,
        heart_rate: f64,
        noise_level: f64,
        add_baseline_wander: bool,
    ) -> Result<(Signal, SynthesisMetadata)> {
        let kernel = EcgKernel::try_new(EcgConfig {
            duration,
            sampling_rate,
            heart_rate,
            noise_level,
            baseline_wander: add_baseline_wander,
        })?;
        let signal = self.run(&kernel, sampling_rate)?;
        let meta = SynthesisMetadata {
            kind: SignalKind::Ecg,
            duration,
            sampling_rate,
            noise_level,
            params: SynthesisParams::Ecg {
                heart_rate,
                baseline_wander: add_baseline_wander,
            },
        };
        Ok((signal, meta))
    }

    /// EEG-like band mixture normalized to unit peak.
    ///
    /// `frequency_bands = None` mixes every band at its default amplitude.
    pub fn generate_eeg(
        &mut self,
        duration: f64,
        sampling_rate: f64,
        frequency_bands: Option<&[(EegBand, f64)]>,
        noise_level: f64,
        add_artifacts: bool,
    ) -> Result<(Signal, SynthesisMetadata)> {
        let bands = frequency_bands
            .map(<[_]>::to_vec)
            .unwrap_or_else(EegBand::default_weights);
        let kernel = EegKernel::try_new(EegConfig {
            duration,
            sampling_rate,
            bands: bands.clone(),
            noise_level,
            artifacts: add_artifacts,
        })?;
        let signal = self.run(&kernel, sampling_rate)?;
        let meta = SynthesisMetadata {
            kind: SignalKind::Eeg,
            duration,
            sampling_rate,
            noise_level,
            params: SynthesisParams::Eeg {
                bands: bands
                    .into_iter()
                    .map(|(band, amplitude)| BandWeight { band, amplitude })
                    .collect(),
                artifacts: add_artifacts,
            },
        };
        Ok((signal, meta))
    }

    /// `amplitude * sin(2 pi frequency t + phase)` plus noise.
    pub fn generate_sine_wave(
        &mut self,
        frequency: f64,
        duration: f64,
        sampling_rate: f64,
        amplitude: f64,
        phase: f64,
        noise_level: f64,
    ) -> Result<(Signal, SynthesisMetadata)> {
        let kernel = ToneKernel::try_new(ToneConfig {
            duration,
            sampling_rate,
            frequencies: vec![frequency],
            amplitudes: vec![amplitude],
            phases: vec![phase],
            noise_level,
        })?;
        let signal = self.run(&kernel, sampling_rate)?;
        let meta = SynthesisMetadata {
            kind: SignalKind::Sine,
            duration,
            sampling_rate,
            noise_level,
            params: SynthesisParams::Sine {
                frequency,
                amplitude,
                phase,
            },
        };
        Ok((signal, meta))
    }

    /// Sum of zero-phase sinusoids plus noise.
    ///
    /// `frequencies` and `amplitudes` must have the same length.
    pub fn generate_multi_tone(
        &mut self,
        frequencies: &[f64],
        amplitudes: &[f64],
        duration: f64,
        sampling_rate: f64,
        noise_level: f64,
    ) -> Result<(Signal, SynthesisMetadata)> {
        let kernel = ToneKernel::try_new(ToneConfig {
            duration,
            sampling_rate,
            frequencies: frequencies.to_vec(),
            amplitudes: amplitudes.to_vec(),
            phases: vec![0.0; frequencies.len()],
            noise_level,
        })?;
        let signal = self.run(&kernel, sampling_rate)?;
        let meta = SynthesisMetadata {
            kind: SignalKind::MultiTone,
            duration,
            sampling_rate,
            noise_level,
            params: SynthesisParams::MultiTone {
                frequencies: frequencies.to_vec(),
                amplitudes: amplitudes.to_vec(),
            },
        };
        Ok((signal, meta))
    }
}

impl Default for WaveformSynthesizer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

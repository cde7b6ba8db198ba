//! Frequency-domain analysis and dominant-frequency extraction.
//!
//! Power is scaled by the length of the unwindowed signal so spectra stay
//! comparable across window choices. Frequency resolution is always
//! `sampling_rate / transform_length`.

use biosig_core::num_rs::rfftfreq;
use biosig_core::{Error, Result};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::PeakConfig;
use crate::signal::peak::{find_peaks, rank_by_height, FindPeaksOptions};
use crate::signal::spectral::{irfft, periodogram, rfft, welch};
use crate::signal::windows::{get_window, WindowKind};
use crate::signal::Signal;

mod store;
pub use store::*;

/// PSD estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PsdMethod {
    /// Averaged overlapping segments; lower variance, coarser bins.
    Welch,
    /// One segment over the whole signal.
    Periodogram,
}

/// One ranked spectral peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantFrequency {
    /// Hz.
    pub frequency: f64,
    /// Power at the peak bin.
    pub power: f64,
    /// `sqrt(power)`.
    pub amplitude: f64,
}

/// Scalar statistics of a power spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSummary {
    /// Sum over all bins.
    pub total_power: f64,
    /// Mean over all bins.
    pub mean_power: f64,
    /// Largest bin.
    pub max_power: f64,
    /// Frequency of the first largest bin.
    pub max_frequency: f64,
    /// Hz per bin.
    pub frequency_resolution: f64,
    /// Transform length.
    pub fft_size: usize,
    /// Hz.
    pub sampling_rate: f64,
}

/// Output of [`SpectrumEngine::analyze_spectrum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Ascending, non-negative bin frequencies.
    pub frequencies: Vec<f64>,
    /// Power per bin, aligned with `frequencies`.
    pub power_spectrum: Vec<f64>,
    /// Strongest peaks, descending by power.
    pub dominant_frequencies: Vec<DominantFrequency>,
    /// Scalar statistics.
    pub summary: SpectrumSummary,
}

/// Spectrum analysis with configurable peak-search defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectrumEngine {
    peaks: PeakConfig,
}

fn check_signal(signal: &Signal) -> Result<()> {
    if signal.is_empty() {
        return Err(Error::degenerate("cannot compute a spectrum of zero samples"));
    }
    Ok(())
}

fn windowed(signal: &Signal, window: Option<WindowKind>) -> Vec<f64> {
    match window {
        None => signal.samples().to_vec(),
        Some(kind) => signal
            .samples()
            .iter()
            .zip(get_window(kind, signal.len(), false))
            .map(|(x, w)| x * w)
            .collect(),
    }
}

impl SpectrumEngine {
    /// Engine using `peaks` for [`Self::find_dominant_frequencies`] defaults.
    pub fn new(peaks: PeakConfig) -> Result<Self> {
        peaks.validate()?;
        Ok(Self { peaks })
    }

    /// Peak-search defaults.
    pub fn peak_config(&self) -> &PeakConfig {
        &self.peaks
    }

    /// Non-negative half of the (optionally windowed) DFT.
    ///
    /// `nfft` defaults to the signal length. A larger value zero-pads; a
    /// smaller one truncates the signal and logs a warning.
    pub fn compute_fft(
        &self,
        signal: &Signal,
        window: Option<WindowKind>,
        nfft: Option<usize>,
    ) -> Result<(Vec<f64>, Vec<Complex<f64>>)> {
        check_signal(signal)?;
        let n = nfft.unwrap_or(signal.len());
        if n == 0 {
            return Err(Error::invalid("nfft", "transform length must be greater than zero"));
        }
        if n < signal.len() {
            warn!(
                nfft = n,
                len = signal.len(),
                "nfft is shorter than the signal; trailing samples are discarded"
            );
        }
        let x = windowed(signal, window);
        Ok((rfftfreq(n, signal.sampling_rate()), rfft(&x, n)))
    }

    /// `|X|` per bin.
    pub fn compute_magnitude_spectrum(
        &self,
        signal: &Signal,
        window: Option<WindowKind>,
        nfft: Option<usize>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let (freqs, spec) = self.compute_fft(signal, window, nfft)?;
        Ok((freqs, spec.iter().map(|z| z.norm()).collect()))
    }

    /// `|X|^2 / N` per bin, with `N` the unwindowed signal length.
    pub fn compute_power_spectrum(
        &self,
        signal: &Signal,
        window: Option<WindowKind>,
        nfft: Option<usize>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let (freqs, spec) = self.compute_fft(signal, window, nfft)?;
        let n = signal.len() as f64;
        Ok((freqs, spec.iter().map(|z| z.norm_sqr() / n).collect()))
    }

    /// Real signal of length `n` from a one-sided spectrum.
    pub fn inverse_fft(&self, spectrum: &[Complex<f64>], n: usize) -> Result<Vec<f64>> {
        if spectrum.is_empty() {
            return Err(Error::degenerate("cannot invert an empty spectrum"));
        }
        if n == 0 {
            return Err(Error::invalid("n", "output length must be greater than zero"));
        }
        Ok(irfft(spectrum, n))
    }

    /// Power spectral density.
    ///
    /// Welch segments default to `min(256, len / 4)` samples.
    pub fn compute_psd(
        &self,
        signal: &Signal,
        method: PsdMethod,
        nperseg: Option<usize>,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        check_signal(signal)?;
        match method {
            PsdMethod::Welch => welch(signal.samples(), signal.sampling_rate(), nperseg),
            PsdMethod::Periodogram => periodogram(signal.samples(), signal.sampling_rate()),
        }
    }

    /// Rank local maxima of `power_spectrum`.
    ///
    /// Peaks must reach `relative_height` of the global maximum and lie at
    /// least `min_distance` Hz apart (default: `min_distance_fraction` of the
    /// analyzed bandwidth). At most `n_peaks` are returned, strongest first;
    /// equal powers keep ascending frequency order.
    pub fn find_dominant_frequencies(
        &self,
        frequencies: &[f64],
        power_spectrum: &[f64],
        n_peaks: Option<usize>,
        min_distance: Option<f64>,
    ) -> Result<Vec<DominantFrequency>> {
        if frequencies.len() != power_spectrum.len() {
            return Err(Error::invalid(
                "power_spectrum",
                format!(
                    "{} power values for {} frequencies",
                    power_spectrum.len(),
                    frequencies.len()
                ),
            ));
        }
        if frequencies.len() < 2 {
            return Ok(Vec::new());
        }
        let n_peaks = n_peaks.unwrap_or(self.peaks.n_peaks);
        let bandwidth = frequencies[frequencies.len() - 1] - frequencies[0];
        let min_distance =
            min_distance.unwrap_or(bandwidth * self.peaks.min_distance_fraction);
        if !min_distance.is_finite() || min_distance < 0.0 {
            return Err(Error::invalid("min_distance", "must be finite and >= 0"));
        }
        let resolution = frequencies[1] - frequencies[0];
        let distance = if resolution > 0.0 {
            ((min_distance / resolution) as usize).max(1)
        } else {
            1
        };

        let max_power = power_spectrum
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let peaks = find_peaks(
            power_spectrum,
            FindPeaksOptions {
                height: Some(max_power * self.peaks.relative_height),
                distance: Some(distance),
            },
        );

        Ok(rank_by_height(power_spectrum, &peaks)
            .into_iter()
            .take(n_peaks)
            .map(|i| DominantFrequency {
                frequency: frequencies[i],
                power: power_spectrum[i],
                amplitude: power_spectrum[i].sqrt(),
            })
            .collect())
    }

    /// Power spectrum, ranked peaks and summary statistics for `signal`.
    pub fn analyze_spectrum(
        &self,
        signal: &Signal,
        window: Option<WindowKind>,
    ) -> Result<SpectrumResult> {
        let (frequencies, power) = self.compute_power_spectrum(signal, window, None)?;
        let dominant = self.find_dominant_frequencies(&frequencies, &power, None, None)?;

        let total_power: f64 = power.iter().sum();
        let (argmax, max_power) = power
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });
        let fft_size = signal.len();
        let summary = SpectrumSummary {
            total_power,
            mean_power: total_power / power.len() as f64,
            max_power,
            max_frequency: frequencies[argmax],
            frequency_resolution: signal.sampling_rate() / fft_size as f64,
            fft_size,
            sampling_rate: signal.sampling_rate(),
        };

        Ok(SpectrumResult {
            frequencies,
            power_spectrum: power,
            dominant_frequencies: dominant,
            summary,
        })
    }

    /// [`Self::analyze_spectrum`], then hand the result to the persistence
    /// collaborators.
    ///
    /// Writing or storing failures are logged and do not fail the analysis.
    pub fn analyze_and_store(
        &self,
        signal: &Signal,
        window: Option<WindowKind>,
        signal_id: u64,
        writer: &SpectrumFileWriter,
        store: &mut dyn SpectrumStore,
    ) -> Result<SpectrumResult> {
        let result = self.analyze_spectrum(signal, window)?;
        let stored = writer
            .write(signal_id, &result.frequencies, &result.power_spectrum)
            .and_then(|path| {
                let path = path.display().to_string();
                store.insert_spectrum_analysis(&SpectrumRecord {
                    signal_id,
                    frequency_data_path: path.clone(),
                    fft_size: result.summary.fft_size,
                    frequency_resolution: result.summary.frequency_resolution,
                    dominant_frequency: result.dominant_frequencies.first().map(|d| d.frequency),
                    power_spectrum_path: path,
                })
            });
        match stored {
            Ok(analysis_id) => info!(signal_id, analysis_id, "stored spectrum analysis"),
            Err(e) => error!(signal_id, error = %e, "failed to store spectrum analysis"),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;

    fn tone(freq: f64, fs: f64, n: usize) -> Signal {
        let x = (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect();
        Signal::new(x, fs).expect("signal")
    }

    #[derive(Default)]
    struct Recorder {
        spectra: Vec<SpectrumRecord>,
        fail: bool,
    }

    impl SpectrumStore for Recorder {
        fn insert_signal(&mut self, _record: &SignalRecord) -> Result<u64> {
            Ok(1)
        }

        fn insert_spectrum_analysis(&mut self, record: &SpectrumRecord) -> Result<u64> {
            if self.fail {
                return Err(Error::Io {
                    path: record.frequency_data_path.clone(),
                    reason: "store offline".into(),
                });
            }
            self.spectra.push(record.clone());
            Ok(self.spectra.len() as u64)
        }
    }

    #[test]
    fn fft_lengths_and_padding() {
        let engine = SpectrumEngine::default();
        let sig = tone(5.0, 100.0, 100);
        let (f, x) = engine.compute_fft(&sig, None, None).expect("fft");
        assert_eq!(f.len(), 51);
        assert_eq!(x.len(), 51);
        let (f, _) = engine.compute_fft(&sig, Some(WindowKind::Hann), Some(256)).expect("padded");
        assert_eq!(f.len(), 129);
        assert_abs_diff_eq!(f[1], 100.0 / 256.0, epsilon = 1e-12);
        let (f, _) = engine.compute_fft(&sig, None, Some(50)).expect("truncated");
        assert_eq!(f.len(), 26);
    }

    #[test]
    fn fft_rejects_degenerate_requests() {
        let engine = SpectrumEngine::default();
        let empty = Signal::new(Vec::new(), 100.0).expect("signal");
        assert!(matches!(
            engine.compute_fft(&empty, None, None),
            Err(Error::DegenerateInput { .. })
        ));
        assert!(matches!(
            engine.compute_fft(&tone(1.0, 10.0, 10), None, Some(0)),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(engine.compute_psd(&empty, PsdMethod::Welch, None).is_err());
    }

    #[test]
    fn power_is_scaled_by_unwindowed_length() {
        let engine = SpectrumEngine::default();
        let sig = tone(10.0, 100.0, 100);
        let (_, p) = engine.compute_power_spectrum(&sig, None, None).expect("power");
        // |X[10]| = N/2 for a unit sine on an exact bin.
        assert_abs_diff_eq!(p[10], 25.0, epsilon = 1e-9);
        let (_, m) = engine.compute_magnitude_spectrum(&sig, None, None).expect("magnitude");
        assert_abs_diff_eq!(m[10], 50.0, epsilon = 1e-9);
        let (_, pw) = engine
            .compute_power_spectrum(&sig, Some(WindowKind::Hann), Some(400))
            .expect("windowed");
        assert!(pw.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn dominant_frequencies_respect_threshold_and_limit() {
        let engine = SpectrumEngine::default();
        let freqs: Vec<f64> = (0..=100).map(f64::from).collect();
        let mut power = vec![0.0; 101];
        power[10] = 10.0;
        power[20] = 5.0;
        power[30] = 0.5;
        power[40] = 8.0;
        let peaks = engine
            .find_dominant_frequencies(&freqs, &power, Some(2), None)
            .expect("peaks");
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].frequency, 10.0);
        assert_eq!(peaks[1].frequency, 40.0);
        assert_abs_diff_eq!(peaks[0].amplitude, 10.0f64.sqrt(), epsilon = 1e-12);

        let all = engine
            .find_dominant_frequencies(&freqs, &power, Some(10), None)
            .expect("peaks");
        // 0.5 is below 10% of the maximum.
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn min_distance_suppresses_weaker_neighbour() {
        let engine = SpectrumEngine::default();
        let freqs: Vec<f64> = (0..50).map(|i| i as f64 * 0.5).collect();
        let mut power = vec![0.0; 50];
        power[10] = 4.0;
        power[13] = 3.0;
        let close = engine
            .find_dominant_frequencies(&freqs, &power, None, Some(2.0))
            .expect("peaks");
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].frequency, 5.0);
        let loose = engine
            .find_dominant_frequencies(&freqs, &power, None, Some(1.0))
            .expect("peaks");
        assert_eq!(loose.len(), 2);
    }

    #[test]
    fn default_min_distance_is_a_fraction_of_bandwidth() {
        let engine = SpectrumEngine::default();
        // 1000 Hz at 0.5 Hz per bin: the default 10 Hz separation is 20 bins.
        let freqs: Vec<f64> = (0..=2000).map(|i| i as f64 * 0.5).collect();

        let mut close = vec![0.0; freqs.len()];
        close[400] = 4.0;
        close[410] = 3.0;
        let peaks = engine
            .find_dominant_frequencies(&freqs, &close, None, None)
            .expect("peaks");
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].frequency, 200.0);

        let mut apart = vec![0.0; freqs.len()];
        apart[400] = 4.0;
        apart[430] = 3.0;
        let peaks = engine
            .find_dominant_frequencies(&freqs, &apart, None, None)
            .expect("peaks");
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].frequency, 200.0);
        assert_eq!(peaks[1].frequency, 215.0);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let engine = SpectrumEngine::default();
        assert!(matches!(
            engine.find_dominant_frequencies(&[0.0, 1.0], &[1.0], None, None),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(engine
            .find_dominant_frequencies(&[0.0], &[1.0], None, None)
            .expect("single bin")
            .is_empty());
    }

    #[test]
    fn summary_statistics() {
        let engine = SpectrumEngine::default();
        let sig = tone(12.5, 100.0, 200);
        let result = engine.analyze_spectrum(&sig, None).expect("analysis");
        assert_eq!(result.summary.fft_size, 200);
        assert_abs_diff_eq!(result.summary.frequency_resolution, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.summary.max_frequency, 12.5, epsilon = 1e-12);
        assert_abs_diff_eq!(
            result.summary.mean_power * result.frequencies.len() as f64,
            result.summary.total_power,
            epsilon = 1e-9
        );
        assert_eq!(result.dominant_frequencies[0].frequency, 12.5);
    }

    #[test]
    fn analyze_and_store_writes_and_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = SpectrumFileWriter::new(dir.path());
        let engine = SpectrumEngine::default();
        let mut store = Recorder::default();
        let result = engine
            .analyze_and_store(&tone(10.0, 100.0, 100), None, 42, &writer, &mut store)
            .expect("analysis");
        assert_eq!(store.spectra.len(), 1);
        let record = &store.spectra[0];
        assert_eq!(record.signal_id, 42);
        assert_eq!(record.fft_size, 100);
        assert_eq!(record.dominant_frequency, Some(10.0));
        assert_eq!(record.frequency_data_path, record.power_spectrum_path);
        assert!(writer.path_for(42).exists());
        assert_eq!(result.frequencies.len(), 51);
    }

    #[test]
    fn store_failure_does_not_fail_analysis() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = SpectrumFileWriter::new(dir.path());
        let mut store = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let result = SpectrumEngine::default()
            .analyze_and_store(&tone(10.0, 100.0, 100), None, 1, &writer, &mut store)
            .expect("analysis still returned");
        assert!(store.spectra.is_empty());
        assert!(!result.dominant_frequencies.is_empty());
    }

    #[test]
    fn inverse_fft_round_trip() {
        let engine = SpectrumEngine::default();
        let sig = tone(3.0, 64.0, 77);
        let (_, spec) = engine.compute_fft(&sig, None, None).expect("fft");
        let back = engine.inverse_fft(&spec, sig.len()).expect("inverse");
        for (a, b) in sig.samples().iter().zip(back.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
        assert!(engine.inverse_fft(&[], 4).is_err());
    }

    #[test]
    fn engine_validates_peak_config() {
        assert!(SpectrumEngine::new(PeakConfig {
            relative_height: 1.5,
            ..PeakConfig::default()
        })
        .is_err());
        let engine = SpectrumEngine::new(PeakConfig {
            n_peaks: 1,
            ..PeakConfig::default()
        })
        .expect("engine");
        assert_eq!(engine.peak_config().n_peaks, 1);
    }
}

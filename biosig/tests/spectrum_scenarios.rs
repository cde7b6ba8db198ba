use approx::assert_abs_diff_eq;
use biosig::signal::wave::WaveformSynthesizer;
use biosig::signal::windows::WindowKind;
use biosig::spectrum::SpectrumEngine;
use biosig::Signal;
use dasp_signal::{rate, Signal as _};

#[test]
fn ten_hz_sine_has_one_dominant_bin() {
    let (sine, meta) = WaveformSynthesizer::with_seed(1)
        .generate_sine_wave(10.0, 2.0, 200.0, 1.0, 0.0, 0.0)
        .expect("valid sine");
    assert_eq!(sine.len(), 400);
    assert_eq!(meta.sampling_rate, 200.0);

    let result = SpectrumEngine::default()
        .analyze_spectrum(&sine, None)
        .expect("spectrum");
    assert_abs_diff_eq!(result.summary.frequency_resolution, 0.5, epsilon = 1e-12);
    assert_eq!(result.summary.fft_size, 400);
    assert_eq!(result.frequencies.len(), 201);
    assert_eq!(result.dominant_frequencies.len(), 1);
    assert_abs_diff_eq!(result.dominant_frequencies[0].frequency, 10.0, epsilon = 0.5);
    assert!(result.frequencies.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn synthesized_sine_matches_dasp_reference() {
    let fs = 200.0;
    let (sine, _) = WaveformSynthesizer::with_seed(3)
        .generate_sine_wave(7.0, 2.0, fs, 1.0, 0.0, 0.0)
        .expect("valid sine");
    let mut reference = rate(fs).const_hz(7.0).sine();
    for v in sine.samples() {
        assert_abs_diff_eq!(*v, reference.next(), epsilon = 1e-9);
    }
}

#[test]
fn equal_peaks_break_ties_toward_lower_frequency() {
    let fs = 200.0;
    let n = 400;
    let x: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / fs;
            (2.0 * std::f64::consts::PI * 5.0 * t).sin() + (2.0 * std::f64::consts::PI * 50.0 * t).sin()
        })
        .collect();
    let signal = Signal::new(x, fs).expect("signal");
    let engine = SpectrumEngine::default();
    let (freqs, power) = engine
        .compute_power_spectrum(&signal, None, None)
        .expect("power");

    // Force exactly equal heights so the tie-break is the only deciding factor.
    let mut power = power;
    let i5 = 10;
    let i50 = 100;
    power[i50] = power[i5];

    let peaks = engine
        .find_dominant_frequencies(&freqs, &power, Some(1), None)
        .expect("peaks");
    assert_eq!(peaks.len(), 1);
    assert_abs_diff_eq!(peaks[0].frequency, 5.0, epsilon = 1e-12);
}

#[test]
fn fft_round_trip_reconstructs_signal() {
    let (signal, _) = WaveformSynthesizer::with_seed(11)
        .generate_eeg(4.0, 256.0, None, 0.1, true)
        .expect("eeg");
    let engine = SpectrumEngine::default();
    let (_, spectrum) = engine.compute_fft(&signal, None, None).expect("fft");
    let back = engine.inverse_fft(&spectrum, signal.len()).expect("ifft");
    assert_eq!(back.len(), signal.len());
    for (a, b) in signal.samples().iter().zip(&back) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-10);
    }
}

#[test]
fn ecg_peaks_sit_on_heart_rate_harmonics() {
    let (ecg, _) = WaveformSynthesizer::with_seed(5)
        .generate_ecg(10.0, 250.0, 60.0, 0.0, false)
        .expect("ecg");
    assert_eq!(ecg.len(), 2500);
    let result = SpectrumEngine::default()
        .analyze_spectrum(&ecg, None)
        .expect("spectrum");
    assert!(!result.dominant_frequencies.is_empty());
    for peak in &result.dominant_frequencies {
        assert_abs_diff_eq!(peak.frequency, peak.frequency.round(), epsilon = 1e-9);
        assert!(peak.frequency >= 1.0);
    }
    let powers: Vec<f64> = result.dominant_frequencies.iter().map(|d| d.power).collect();
    assert!(powers.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn windowing_keeps_the_peak_bin() {
    let (sine, _) = WaveformSynthesizer::with_seed(2)
        .generate_sine_wave(12.0, 4.0, 128.0, 2.0, 0.3, 0.0)
        .expect("sine");
    let engine = SpectrumEngine::default();
    for window in [WindowKind::Hann, WindowKind::Hamming, WindowKind::Blackman] {
        let result = engine.analyze_spectrum(&sine, Some(window)).expect("spectrum");
        assert_abs_diff_eq!(result.summary.max_frequency, 12.0, epsilon = 1e-9);
    }
}

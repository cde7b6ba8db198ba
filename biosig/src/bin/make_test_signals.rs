//! Writes deterministic signal tables for manual testing.
//!
//! Usage: `make_test_signals [OUTPUT_DIR] [SEED]` (defaults: `data/signals`, 42).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use biosig::config::LogConfig;
use biosig::io::SignalLoader;
use biosig::observe::init_logging;
use biosig::signal::wave::WaveformSynthesizer;
use biosig::Signal;
use itertools::Itertools;
use tracing::info;

/// Header plus one row per sample; every column must have the same length.
fn write_columns(path: &Path, columns: &[(&str, Vec<f64>)]) -> Result<()> {
    let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    let mut text = columns.iter().map(|(name, _)| *name).join(",");
    text.push('\n');
    for i in 0..rows {
        text.push_str(&columns.iter().map(|(_, c)| c[i].to_string()).join(","));
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows, "wrote table");
    Ok(())
}

fn amplitude_only(path: &Path, name: &str, signal: &Signal) -> Result<()> {
    write_columns(path, &[(name, signal.samples().to_vec())])
}

fn main() -> Result<()> {
    init_logging(&LogConfig::default());

    let mut args = std::env::args().skip(1);
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "data/signals".into()));
    let seed = match args.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed '{s}'"))?,
        None => 42,
    };
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let loader = SignalLoader::default();
    let mut synth = WaveformSynthesizer::with_seed(seed);

    let (ecg, _) = synth.generate_ecg(10.0, 250.0, 72.0, 0.02, true)?;
    loader.save_csv(&ecg, out_dir.join("ecg_signal_with_time.csv"))?;

    let (ecg, _) = synth.generate_ecg(15.0, 250.0, 80.0, 0.03, true)?;
    amplitude_only(&out_dir.join("ecg_signal_no_time.csv"), "ecg_amplitude", &ecg)?;

    let (eeg, _) = synth.generate_eeg(10.0, 256.0, None, 0.05, true)?;
    write_columns(
        &out_dir.join("eeg_signal_with_time.csv"),
        &[("timestamp", eeg.time_axis()), ("eeg_channel1", eeg.samples().to_vec())],
    )?;

    let (eeg, _) = synth.generate_eeg(12.0, 256.0, None, 0.05, false)?;
    amplitude_only(&out_dir.join("eeg_signal_no_time.csv"), "eeg_amplitude", &eeg)?;

    let (ch1, _) = synth.generate_ecg(8.0, 250.0, 75.0, 0.02, true)?;
    let (ch2, _) = synth.generate_ecg(8.0, 250.0, 75.0, 0.025, true)?;
    let n = ch1.len();
    write_columns(
        &out_dir.join("ecg_multichannel.csv"),
        &[
            ("sample", (0..n).map(|i| i as f64).collect()),
            ("time", ch1.time_axis()),
            ("ecg_channel1", ch1.samples().to_vec()),
            ("ecg_channel2", ch2.samples().to_vec()),
            ("heart_rate", vec![75.0; n]),
        ],
    )?;

    let (ecg, _) = synth.generate_ecg(5.0, 500.0, 90.0, 0.015, true)?;
    loader.save_csv(&ecg, out_dir.join("ecg_high_freq.csv"))?;

    let (sine, _) = synth.generate_sine_wave(10.0, 5.0, 250.0, 1.0, 0.0, 0.05)?;
    loader.save_csv(&sine, out_dir.join("sine_10hz.csv"))?;

    let (tones, _) = synth.generate_multi_tone(&[5.0, 15.0, 30.0], &[1.0, 0.5, 0.3], 5.0, 250.0, 0.05)?;
    loader.save_csv(&tones, out_dir.join("multi_tone.csv"))?;

    info!(dir = %out_dir.display(), seed, "fixtures written");
    Ok(())
}

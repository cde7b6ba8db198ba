//! Persistence boundary for analysis results.
//!
//! The engine does not own a database. It writes spectra to CSV files and
//! hands path-bearing records to whatever implements [`SpectrumStore`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use biosig_core::{Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::io::SignalType;
use crate::signal::Signal;

/// Metadata describing a stored time-domain signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Owning patient, when known.
    pub patient_id: Option<u64>,
    /// Detected or declared signal type.
    pub signal_type: SignalType,
    /// Where the samples live.
    pub signal_data_path: String,
    /// Hz.
    pub sampling_rate: f64,
    /// Seconds.
    pub duration: f64,
    /// Channel count of the source file.
    pub number_of_channels: usize,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl SignalRecord {
    /// Single-channel record for `signal` stored at `path`.
    pub fn for_signal(signal: &Signal, signal_type: SignalType, path: impl AsRef<Path>) -> Self {
        Self {
            patient_id: None,
            signal_type,
            signal_data_path: path.as_ref().display().to_string(),
            sampling_rate: signal.sampling_rate(),
            duration: signal.duration(),
            number_of_channels: 1,
            notes: None,
        }
    }
}

/// Summary of one spectrum analysis, addressed by file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRecord {
    /// Analyzed signal.
    pub signal_id: u64,
    /// CSV holding the frequency axis.
    pub frequency_data_path: String,
    /// Transform length.
    pub fft_size: usize,
    /// Hz per bin.
    pub frequency_resolution: f64,
    /// Strongest peak, if any qualified.
    pub dominant_frequency: Option<f64>,
    /// CSV holding the power values.
    pub power_spectrum_path: String,
}

/// External persistence collaborator.
pub trait SpectrumStore {
    /// Persist signal metadata and return its id.
    fn insert_signal(&mut self, record: &SignalRecord) -> Result<u64>;

    /// Persist an analysis summary and return its id.
    fn insert_spectrum_analysis(&mut self, record: &SpectrumRecord) -> Result<u64>;
}

/// Writes `frequency,power_spectrum` tables under one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumFileWriter {
    dir: PathBuf,
}

impl SpectrumFileWriter {
    /// Writer rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a spectrum for `signal_id` is written to.
    pub fn path_for(&self, signal_id: u64) -> PathBuf {
        self.dir.join(format!("spectrum_signal_{signal_id}.csv"))
    }

    /// Write aligned frequency and power columns, returning the file path.
    pub fn write(&self, signal_id: u64, frequencies: &[f64], power: &[f64]) -> Result<PathBuf> {
        if frequencies.len() != power.len() {
            return Err(Error::invalid(
                "power_spectrum",
                format!(
                    "{} power values for {} frequencies",
                    power.len(),
                    frequencies.len()
                ),
            ));
        }
        let io_err = |path: &Path, e: std::io::Error| Error::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = self.path_for(signal_id);
        let body = frequencies
            .iter()
            .zip(power.iter())
            .map(|(f, p)| format!("{f},{p}"))
            .join("\n");
        let mut file = fs::File::create(&path).map_err(|e| io_err(&path, e))?;
        writeln!(file, "frequency,power_spectrum").map_err(|e| io_err(&path, e))?;
        if !body.is_empty() {
            writeln!(file, "{body}").map_err(|e| io_err(&path, e))?;
        }
        info!(path = %path.display(), bins = frequencies.len(), "wrote spectrum table");
        Ok(path)
    }
}

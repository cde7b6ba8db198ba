//! Delimited signal tables.
//!
//! A table has a header row, one numeric amplitude column and optionally a
//! time column. When a time column is present and no rate is given, the
//! rate is `1 / mean(diff(time))`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use biosig_core::num_rs::diff;
use biosig_core::{Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::signal::spectral::rfft;
use crate::signal::Signal;
use crate::stats;

/// Column names recognised as a time axis, in priority order.
pub const TIME_COLUMN_CANDIDATES: [&str; 5] = ["time", "t", "timestamp", "sample", "index"];

/// Coarse physiological classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    /// Electrocardiogram.
    Ecg,
    /// Electroencephalogram.
    Eeg,
    /// Neither heuristic matched.
    Unknown,
}

/// Column and rate overrides for [`SignalLoader::load_csv`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvOptions {
    /// Time column; otherwise the first of [`TIME_COLUMN_CANDIDATES`] present.
    pub time_column: Option<String>,
    /// Amplitude column; otherwise the first fully numeric non-time column.
    pub amplitude_column: Option<String>,
    /// Rate in Hz; wins over any time column.
    pub sampling_rate: Option<f64>,
}

/// Shape and statistics of a loaded signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    /// Source file, if the signal came from one.
    pub path: Option<String>,
    /// Number of samples.
    pub length: usize,
    /// Seconds.
    pub duration: f64,
    /// Hz.
    pub sampling_rate: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Every column of the source table.
    pub columns: Vec<String>,
    /// Column the rate was inferred from.
    pub time_column: Option<String>,
    /// Column the samples came from.
    pub amplitude_column: Option<String>,
}

struct Table {
    header: Vec<String>,
    // (one-based line number, cells)
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    fn parse(text: &str, delimiter: char) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());
        let header = match lines.next() {
            Some((_, line)) => split(line, delimiter),
            None => return Err(Error::degenerate("table has no header row")),
        };
        let rows = lines
            .map(|(line_no, line)| {
                let cells = split(line, delimiter);
                if cells.len() != header.len() {
                    return Err(Error::Parse {
                        line: line_no,
                        reason: format!(
                            "expected {} fields, found {}",
                            header.len(),
                            cells.len()
                        ),
                    });
                }
                Ok((line_no, cells))
            })
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Err(Error::degenerate("table has no data rows"));
        }
        Ok(Self { header, rows })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    fn is_numeric(&self, col: usize) -> bool {
        self.rows.iter().all(|(_, cells)| cells[col].parse::<f64>().is_ok())
    }

    fn column(&self, col: usize) -> Result<Vec<f64>> {
        self.rows
            .iter()
            .map(|(line, cells)| {
                cells[col].parse::<f64>().map_err(|_| Error::Parse {
                    line: *line,
                    reason: format!("column '{}': '{}' is not a number", self.header[col], cells[col]),
                })
            })
            .collect()
    }
}

fn split(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(|c| c.trim().to_string()).collect_vec()
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    Error::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Reads and writes signal tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalLoader {
    config: LoaderConfig,
}

impl SignalLoader {
    /// Loader using `config` for the fallback rate and delimiter.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Fallback rate and delimiter.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load one amplitude column from a delimited table.
    pub fn load_csv(
        &self,
        path: impl AsRef<Path>,
        options: &CsvOptions,
    ) -> Result<(Signal, SignalSummary)> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let table = Table::parse(&text, self.config.delimiter)?;

        let time_col = match options.time_column.as_deref() {
            Some(name) => Some(table.position(name).ok_or_else(|| {
                Error::invalid(
                    "time_column",
                    format!("no column '{name}' in [{}]", table.header.join(", ")),
                )
            })?),
            None => TIME_COLUMN_CANDIDATES
                .iter()
                .find_map(|name| table.position(name)),
        };

        let amp_col = match options.amplitude_column.as_deref() {
            Some(name) => table.position(name).ok_or_else(|| {
                Error::invalid(
                    "amplitude_column",
                    format!("no column '{name}' in [{}]", table.header.join(", ")),
                )
            })?,
            None => (0..table.header.len())
                .filter(|&c| Some(c) != time_col)
                .find(|&c| table.is_numeric(c))
                .ok_or_else(|| {
                    Error::invalid(
                        "amplitude_column",
                        format!(
                            "could not determine amplitude column; available columns: [{}]",
                            table.header.join(", ")
                        ),
                    )
                })?,
        };

        let samples = table.column(amp_col)?;
        let sampling_rate = match (options.sampling_rate, time_col) {
            (Some(fs), _) => fs,
            (None, Some(c)) => self.rate_from_time(&table.column(c)?),
            (None, None) => self.config.default_sampling_rate,
        };

        let signal = Signal::new(samples, sampling_rate)?;
        let mut summary = Self::summarize(&signal)?;
        summary.path = Some(path.display().to_string());
        summary.columns = table.header.clone();
        summary.time_column = time_col.map(|c| table.header[c].clone());
        summary.amplitude_column = Some(table.header[amp_col].clone());

        info!(
            path = %path.display(),
            samples = summary.length,
            sampling_rate = summary.sampling_rate,
            duration = summary.duration,
            "loaded signal"
        );
        Ok((signal, summary))
    }

    fn rate_from_time(&self, time: &[f64]) -> f64 {
        if time.len() < 2 {
            return self.config.default_sampling_rate;
        }
        let dt = stats::mean::<_, f64>(diff(time).iter()).0;
        if dt.is_finite() && dt > 0.0 {
            1.0 / dt
        } else {
            debug!(dt, "time column is not increasing; using the default rate");
            self.config.default_sampling_rate
        }
    }

    /// Wrap in-memory samples, rejecting an empty buffer.
    pub fn from_samples(
        &self,
        samples: Vec<f64>,
        sampling_rate: f64,
    ) -> Result<(Signal, SignalSummary)> {
        if samples.is_empty() {
            return Err(Error::degenerate("signal data is empty"));
        }
        let signal = Signal::new(samples, sampling_rate)?;
        let summary = Self::summarize(&signal)?;
        Ok((signal, summary))
    }

    /// Write `time,amplitude` rows, creating parent directories.
    pub fn save_csv(&self, signal: &Signal, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let file = fs::File::create(path).map_err(|e| io_error(path, e))?;
        let mut out = BufWriter::new(file);
        let d = self.config.delimiter;
        writeln!(out, "time{d}amplitude").map_err(|e| io_error(path, e))?;
        for (t, x) in signal.time_axis().iter().zip(signal.samples()) {
            writeln!(out, "{t}{d}{x}").map_err(|e| io_error(path, e))?;
        }
        out.flush().map_err(|e| io_error(path, e))?;
        info!(path = %path.display(), samples = signal.len(), "saved signal");
        Ok(())
    }

    /// Length, duration and descriptive statistics of `signal`.
    pub fn summarize(signal: &Signal) -> Result<SignalSummary> {
        let d = stats::describe(signal.samples())
            .ok_or_else(|| Error::degenerate("cannot summarize an empty signal"))?;
        Ok(SignalSummary {
            path: None,
            length: d.count,
            duration: signal.duration(),
            sampling_rate: signal.sampling_rate(),
            mean: d.mean,
            std: d.std,
            min: d.min,
            max: d.max,
            columns: Vec::new(),
            time_column: None,
            amplitude_column: None,
        })
    }

    /// Guess the physiological source from the strongest non-DC bin.
    ///
    /// ECG: dominant frequency in [0.5, 5] Hz at a 200..=500 Hz rate.
    /// EEG: dominant frequency in [0.5, 40] Hz at a 256..=512 Hz rate.
    pub fn detect_signal_type(signal: &Signal) -> SignalType {
        let n = signal.len();
        let half = n / 2;
        if half < 2 {
            return SignalType::Unknown;
        }
        let spectrum = rfft(signal.samples(), n);
        let (k, _) = spectrum[1..half]
            .iter()
            .map(|z| z.norm_sqr())
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });
        let fs = signal.sampling_rate();
        let dominant = (k + 1) as f64 * fs / n as f64;
        if (0.5..=5.0).contains(&dominant) && (200.0..=500.0).contains(&fs) {
            SignalType::Ecg
        } else if (0.5..=40.0).contains(&dominant) && (256.0..=512.0).contains(&fs) {
            SignalType::Eeg
        } else {
            SignalType::Unknown
        }
    }
}

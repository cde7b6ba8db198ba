//! Application-level defaults, loadable from JSON.
//!
//! Every section falls back to its [`Default`] when missing, so a config file
//! only needs the values it overrides.
//!
//! ```
//! use biosig::config::AnalysisConfig;
//!
//! let cfg = AnalysisConfig::from_json_str(r#"{ "peaks": { "n_peaks": 3 } }"#).unwrap();
//! assert_eq!(cfg.peaks.n_peaks, 3);
//! assert_eq!(cfg.loader.default_sampling_rate, 250.0);
//! ```

use std::fs;
use std::path::Path;

use biosig_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Per-step conditioning detail.
    Debug,
    /// Load and save events.
    #[default]
    Info,
    /// Degenerate inputs and coerced parameters.
    Warn,
    /// Collaborator failures only.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Logging subscriber settings, see [`crate::observe::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level when `RUST_LOG` and `filter` are unset.
    pub level: LogLevel,
    /// Colored output.
    pub ansi: bool,
    /// Explicit `EnvFilter` directive, e.g. `biosig=debug`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            ansi: true,
            filter: None,
        }
    }
}

/// Tabular ingestion defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rate used when a file has no usable time column, in Hz.
    pub default_sampling_rate: f64,
    /// Field separator.
    pub delimiter: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_sampling_rate: 250.0,
            delimiter: ',',
        }
    }
}

/// Dominant-frequency search defaults.
///
/// These thresholds are empirical, not clinically validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Maximum number of peaks reported.
    pub n_peaks: usize,
    /// Minimum peak separation as a fraction of the analyzed bandwidth.
    pub min_distance_fraction: f64,
    /// Minimum peak power as a fraction of the global maximum.
    pub relative_height: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            n_peaks: 5,
            min_distance_fraction: 0.01,
            relative_height: 0.1,
        }
    }
}

impl PeakConfig {
    /// Reject fractions outside `[0, 1]` and non-finite values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_distance_fraction) {
            return Err(Error::invalid(
                "min_distance_fraction",
                "must lie in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.relative_height) {
            return Err(Error::invalid("relative_height", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Defaults for conditioning calls that leave a parameter open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningDefaults {
    /// Butterworth order.
    pub filter_order: usize,
    /// Baseline-wander highpass cutoff in Hz.
    pub baseline_cutoff: f64,
    /// Median window length.
    pub median_kernel: usize,
}

impl Default for ConditioningDefaults {
    fn default() -> Self {
        Self {
            filter_order: 4,
            baseline_cutoff: 0.5,
            median_kernel: 3,
        }
    }
}

/// Top-level configuration threaded through the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ingestion.
    pub loader: LoaderConfig,
    /// Peak search.
    pub peaks: PeakConfig,
    /// Conditioning.
    pub conditioning: ConditioningDefaults,
    /// Logging.
    pub log: LogConfig,
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| Error::Parse {
            line: e.line(),
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::invalid("config", e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !self.loader.default_sampling_rate.is_finite() || self.loader.default_sampling_rate <= 0.0
        {
            return Err(Error::invalid(
                "default_sampling_rate",
                "must be finite and > 0",
            ));
        }
        self.peaks.validate()?;
        if self.conditioning.filter_order == 0 {
            return Err(Error::invalid("filter_order", "must be greater than zero"));
        }
        if self.conditioning.median_kernel == 0 {
            return Err(Error::invalid("median_kernel", "must be greater than zero"));
        }
        Ok(())
    }
}

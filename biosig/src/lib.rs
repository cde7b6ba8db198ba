//! Biomedical signal conditioning and spectrum analysis.
//!
//! The crate is organised leaf-first:
//!
//! - [`signal::wave`] synthesizes ECG/EEG-like test signals and tones.
//! - [`conditioning`] normalizes, detrends and zero-phase filters a [`Signal`].
//! - [`spectrum`] turns a signal into a [`spectrum::SpectrumResult`] and ranks its peaks.
//! - [`io`] reads and writes delimited signal tables.
//!
//! Every stage takes an in-memory [`Signal`] and returns a new one; nothing is
//! mutated in place.
#![deny(missing_docs)]

pub use biosig_core::{Error, Result};

/// Trait-first kernel substrate.
pub mod kernel;

/// Signal container and low-level DSP building blocks.
pub mod signal;

/// Descriptive statistics.
pub mod stats;

/// Signal conditioning stages and pipelines.
pub mod conditioning;

/// FFT/PSD analysis and dominant-frequency extraction.
pub mod spectrum;

/// Delimited-table ingestion and export.
pub mod io;

/// Application-level configuration.
pub mod config;

/// Logging bootstrap.
pub mod observe;

/// Plotting adapter for analysis results.
#[cfg(feature = "plot")]
pub mod plot;

pub use signal::Signal;

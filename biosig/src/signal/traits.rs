//! Trait interfaces for signal-processing capabilities.
//!
//! Kernels implement these so callers can hold any of them behind the same
//! `run_into`/`run_alloc` shape.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use rand::Rng;

/// 1D `sosfilt` capability.
pub trait SosFilt1D<T> {
    /// Run second-order-sections filtering into a caller-provided output buffer.
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run second-order-sections filtering and allocate output.
    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D `sosfiltfilt` capability.
pub trait SosFiltFilt1D<T> {
    /// Run zero-phase SOS filtering into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run zero-phase SOS filtering and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D sliding-median capability.
pub trait MedFilt1D<T> {
    /// Run median filtering into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run median filtering and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// IIR design capability.
pub trait IirDesign {
    /// Output representation produced by the design kernel.
    type Output;

    /// Run IIR design and allocate output representation.
    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation>;
}

/// Window generation capability.
pub trait WindowGenerate<T> {
    /// Run window generation into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Run window generation and allocate output samples.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}

/// One-sided periodogram capability.
pub trait Periodogram1D {
    /// Compute frequencies and PSD into caller-provided buffers.
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized;

    /// Compute frequencies and PSD, allocating both.
    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Welch averaged-segment PSD capability.
pub trait WelchPsd1D {
    /// Compute frequencies and PSD into caller-provided buffers.
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized;

    /// Compute frequencies and PSD, allocating both.
    fn run_alloc<I>(&self, input: &I) -> Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Random waveform synthesis capability.
///
/// The generator draws all of its randomness from `rng`, so a seeded RNG
/// reproduces the same waveform.
pub trait Synthesize1D<T> {
    /// Number of samples the kernel produces.
    fn output_len(&self) -> usize;

    /// Synthesize into a caller-provided output buffer.
    fn run_into<R, O>(&self, rng: &mut R, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        R: Rng + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Synthesize and allocate output.
    fn run_alloc<R>(&self, rng: &mut R) -> Result<Vec<T>, ExecInvariantViolation>
    where
        R: Rng + ?Sized;
}

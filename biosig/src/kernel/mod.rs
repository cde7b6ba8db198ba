//! Kernel substrate shared by the filter, spectral and synthesis modules.
//!
//! Kernels validate their config once in `try_new` and then run against
//! borrowed 1D buffers through the [`Read1D`]/[`Write1D`] adapters.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;

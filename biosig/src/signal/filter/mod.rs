/// Butterworth IIR design.
pub mod design;

mod ext;
mod kernels;
mod medfilt;
mod sosfilt;
mod sosfiltfilt;

pub use ext::*;
pub use kernels::*;
pub use medfilt::*;
pub use sosfilt::*;
pub use sosfiltfilt::*;

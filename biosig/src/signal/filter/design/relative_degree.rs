use biosig_core::{Error, Result};
use nalgebra::Complex;

/// Number of excess poles over zeros.
///
/// An improper transfer function (more zeros than poles) is rejected.
pub(crate) fn relative_degree_checked<F>(zeros: &[Complex<F>], poles: &[Complex<F>]) -> Result<usize> {
    poles.len().checked_sub(zeros.len()).ok_or_else(|| {
        Error::invalid(
            "zpk",
            "improper transfer function; poles must be >= zeros",
        )
    })
}

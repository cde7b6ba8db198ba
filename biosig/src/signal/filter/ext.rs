use core::ops::{Add, Sub};

use biosig_core::{Error, Result};

/// Odd extension of `x` by `n` samples at each end.
///
/// The left edge becomes `2*x[0] - x[n..0]` and the right edge mirrors the
/// same way about the last sample, so the first derivative is continuous.
///
/// ```
/// use biosig::signal::filter::odd_ext;
///
/// let x = [1.0, 2.0, 3.0, 5.0, 4.0];
/// let ext = odd_ext(&x, 2).unwrap();
/// assert_eq!(ext, vec![-1.0, 0.0, 1.0, 2.0, 3.0, 5.0, 4.0, 3.0, 1.0]);
/// ```
pub fn odd_ext<F>(x: &[F], n: usize) -> Result<Vec<F>>
where
    F: Copy + Add<Output = F> + Sub<Output = F>,
{
    if n == 0 {
        return Ok(x.to_vec());
    }
    if n >= x.len() {
        return Err(Error::invalid(
            "n",
            "extension length must be less than the input length",
        ));
    }

    let first = x[0];
    let last = x[x.len() - 1];
    let left = (1..=n).rev().map(|i| first + first - x[i]);
    let right = (1..=n).map(|i| last + last - x[x.len() - 1 - i]);

    let mut out = Vec::with_capacity(x.len() + 2 * n);
    out.extend(left);
    out.extend_from_slice(x);
    out.extend(right);
    Ok(out)
}

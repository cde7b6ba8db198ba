use biosig_core::{Error, Result};
use num_traits::Float;

use crate::stats::median_slice;

///
/// Sliding median over an odd-length window.
///
/// Positions beyond either edge read as zero, matching `scipy.signal.medfilt`.
/// Output length equals input length.
///
/// ```
/// use biosig::signal::filter::medfilt;
///
/// let y = medfilt(&[1.0, 9.0, 2.0, 3.0, 4.0], 3).unwrap();
/// assert_eq!(y, vec![1.0, 2.0, 3.0, 3.0, 3.0]);
/// ```
pub fn medfilt<F>(x: &[F], kernel_size: usize) -> Result<Vec<F>>
where
    F: Float,
{
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(Error::invalid("kernel_size", "kernel size must be odd"));
    }
    let half = kernel_size / 2;
    let mut window = Vec::with_capacity(kernel_size);
    let mut out = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        window.clear();
        for j in 0..kernel_size {
            let v = (i + j)
                .checked_sub(half)
                .and_then(|k| x.get(k).copied())
                .unwrap_or_else(F::zero);
            window.push(v);
        }
        let m = median_slice(&window)
            .ok_or_else(|| Error::degenerate("median window is empty"))?;
        out.push(m);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_isolated_spikes() {
        let mut x = vec![1.0f64; 20];
        x[7] = 50.0;
        x[13] = -50.0;
        let y = medfilt(&x, 5).expect("odd kernel");
        assert_eq!(y.len(), 20);
        assert!(y[3..17].iter().all(|v| *v == 1.0));
    }

    #[test]
    fn zero_padded_edges() {
        let y = medfilt(&[5.0f64, 5.0, 5.0], 5).expect("odd kernel");
        // windows: [0,0,5,5,5], [0,5,5,5,0], [5,5,5,0,0]
        assert_eq!(y, vec![5.0, 5.0, 5.0]);
        let y = medfilt(&[5.0f64, 5.0], 5).expect("odd kernel");
        assert_eq!(y, vec![0.0, 0.0]);
    }

    #[test]
    fn even_kernel_rejected() {
        assert!(medfilt(&[1.0f64, 2.0], 4).is_err());
        assert!(medfilt(&[1.0f64, 2.0], 0).is_err());
    }
}

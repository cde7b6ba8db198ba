//! Cosine-sum spectral windows.
//!
//! Symmetric windows (`fftbins = false`) match `numpy.hanning` and friends
//! and are what the spectrum engine multiplies into a signal. Periodic
//! windows (`fftbins = true`) match `scipy.signal.get_window` and feed the
//! PSD estimators.

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;

use biosig_core::Error;
use serde::{Deserialize, Serialize};

mod kernels;
pub use kernels::*;

/// Window family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Rectangular window; every coefficient is one.
    Boxcar,
    /// Hann (raised cosine).
    Hann,
    /// Hamming.
    Hamming,
    /// Three-term Blackman.
    Blackman,
}

impl WindowKind {
    fn weights(self) -> &'static [f64] {
        match self {
            WindowKind::Boxcar => &[1.0],
            WindowKind::Hann => &[0.5, 0.5],
            WindowKind::Hamming => &[0.54, 0.46],
            WindowKind::Blackman => &[0.42, 0.5, 0.08],
        }
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Boxcar => "boxcar",
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boxcar" | "rect" | "rectangular" => Ok(WindowKind::Boxcar),
            "hann" | "hanning" => Ok(WindowKind::Hann),
            "hamming" => Ok(WindowKind::Hamming),
            "blackman" => Ok(WindowKind::Blackman),
            other => Err(Error::invalid(
                "window",
                format!("unknown window `{other}`; expected hann, hamming, blackman or boxcar"),
            )),
        }
    }
}

/// Weighted cosine sum `sum_k (-1)^k a_k cos(2 pi k n / (M - 1))`.
fn general_cosine(m: usize, weights: &[f64]) -> Vec<f64> {
    if m == 1 {
        return vec![1.0];
    }
    let denom = (m - 1) as f64;
    (0..m)
        .map(|n| {
            weights
                .iter()
                .enumerate()
                .map(|(k, a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (2.0 * PI * k as f64 * n as f64 / denom).cos()
                })
                .sum()
        })
        .collect()
}

/// Window coefficients of length `nx`.
///
/// `fftbins = true` builds the periodic variant by generating `nx + 1`
/// symmetric points and dropping the last.
///
/// ```
/// use biosig::signal::windows::{get_window, WindowKind};
///
/// let w = get_window(WindowKind::Hann, 5, false);
/// assert_eq!(w.len(), 5);
/// assert!((w[2] - 1.0).abs() < 1e-12);
/// assert!(w[0].abs() < 1e-12);
/// ```
pub fn get_window(kind: WindowKind, nx: usize, fftbins: bool) -> Vec<f64> {
    if nx == 0 {
        return Vec::new();
    }
    if nx == 1 || kind == WindowKind::Boxcar {
        return vec![1.0; nx];
    }
    if fftbins {
        let mut w = general_cosine(nx + 1, kind.weights());
        w.truncate(nx);
        w
    } else {
        general_cosine(nx, kind.weights())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hamming_matches_numpy() {
        // numpy.hamming(5)
        let w = get_window(WindowKind::Hamming, 5, false);
        let want = [0.08, 0.54, 1.0, 0.54, 0.08];
        for (a, b) in w.iter().zip(want.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn blackman_is_symmetric_with_unit_peak() {
        let w = get_window(WindowKind::Blackman, 9, false);
        assert_abs_diff_eq!(w[4], 1.0, epsilon = 1e-12);
        for i in 0..9 {
            assert_abs_diff_eq!(w[i], w[8 - i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(w[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn periodic_hann_drops_final_zero() {
        // scipy.signal.get_window("hann", 4)
        let w = get_window(WindowKind::Hann, 4, true);
        let want = [0.0, 0.5, 1.0, 0.5];
        for (a, b) in w.iter().zip(want.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("Hann".parse::<WindowKind>().expect("known"), WindowKind::Hann);
        assert_eq!("hanning".parse::<WindowKind>().expect("known"), WindowKind::Hann);
        assert!("kaiser".parse::<WindowKind>().is_err());
        assert_eq!(WindowKind::Blackman.to_string(), "blackman");
        assert_eq!(get_window(WindowKind::Hann, 1, false), vec![1.0]);
        assert_eq!(get_window(WindowKind::Hann, 1, true), vec![1.0]);
        assert!(get_window(WindowKind::Hann, 0, true).is_empty());
    }
}

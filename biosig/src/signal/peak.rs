//! Local-maximum search analogous to `scipy.signal.find_peaks`.
//!
//! Only the height and distance criteria are supported. Where two candidates
//! compete with exactly equal heights the one with the lower index wins.

use core::cmp::Ordering;

/// Options for [`find_peaks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FindPeaksOptions<F>
where
    F: PartialOrd + Copy,
{
    /// Minimum peak height.
    pub height: Option<F>,
    /// Minimum index distance between retained peaks.
    pub distance: Option<usize>,
}

impl<F> Default for FindPeaksOptions<F>
where
    F: PartialOrd + Copy,
{
    fn default() -> Self {
        Self {
            height: None,
            distance: None,
        }
    }
}

/// Indices of local maxima, including the midpoint of flat plateaus.
///
/// A sample qualifies when its left neighbour is strictly lower and the
/// first differing sample on its right is strictly lower. The first and last
/// samples are never peaks.
pub fn local_maxima_1d<F>(x: &[F]) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// Indices of `peaks` in descending order of `x[peak]`.
///
/// The sort is stable, so equal heights keep their ascending index order.
pub fn rank_by_height<F>(x: &[F], peaks: &[usize]) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    let mut ranked = peaks.to_vec();
    ranked.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap_or(Ordering::Equal));
    ranked
}

/// Find local peaks with optional height and distance filtering.
///
/// Distance suppression visits candidates from tallest to shortest and keeps
/// one when it is at least `distance` samples from every peak kept so far.
/// The result is in ascending index order.
///
/// ```
/// use biosig::signal::peak::{find_peaks, FindPeaksOptions};
///
/// let x = [0.0, 1.0, 0.1, 0.9, 0.0, 2.0, 0.0];
/// let peaks = find_peaks(&x, FindPeaksOptions { height: Some(0.5), distance: Some(3) });
/// assert_eq!(peaks, vec![1, 5]);
/// ```
pub fn find_peaks<F>(x: &[F], options: FindPeaksOptions<F>) -> Vec<usize>
where
    F: PartialOrd + Copy,
{
    let mut peaks = local_maxima_1d(x);

    if let Some(height) = options.height {
        peaks.retain(|&idx| x[idx] >= height);
    }

    if let Some(distance) = options.distance {
        if distance > 1 && !peaks.is_empty() {
            let mut selected: Vec<usize> = Vec::new();
            for cand in rank_by_height(x, &peaks) {
                if selected.iter().all(|&kept| kept.abs_diff(cand) >= distance) {
                    selected.push(cand);
                }
            }
            selected.sort_unstable();
            peaks = selected;
        }
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_reports_midpoint() {
        let x = [0.0f64, 1.0, 2.0, 2.0, 2.0, 1.0, 3.0, 3.0, 0.0];
        assert_eq!(local_maxima_1d(&x), vec![3, 6]);
    }

    #[test]
    fn edges_and_open_plateaus_are_not_peaks() {
        assert_eq!(local_maxima_1d(&[5.0f64, 1.0, 0.0]), Vec::<usize>::new());
        assert_eq!(local_maxima_1d(&[0.0f64, 1.0, 1.0]), Vec::<usize>::new());
        assert_eq!(local_maxima_1d(&[0.0f64, 1.0]), Vec::<usize>::new());
    }

    #[test]
    fn find_peaks_applies_height_and_distance() {
        let x = [0.0f64, 1.0, 0.1, 0.9, 0.0, 2.0, 0.0];
        let peaks = find_peaks(
            &x,
            FindPeaksOptions {
                height: Some(0.5),
                distance: Some(3),
            },
        );
        assert_eq!(peaks, vec![1, 5]);

        let all = find_peaks(&x, FindPeaksOptions::default());
        assert_eq!(all, vec![1, 3, 5]);
    }

    #[test]
    fn equal_heights_prefer_lower_index() {
        let x = [0.0f64, 1.0, 0.0, 1.0, 0.0];
        let peaks = find_peaks(
            &x,
            FindPeaksOptions {
                height: None,
                distance: Some(3),
            },
        );
        assert_eq!(peaks, vec![1]);
        assert_eq!(rank_by_height(&x, &[3, 1]), vec![3, 1]);
        assert_eq!(rank_by_height(&x, &[1, 3]), vec![1, 3]);
    }
}

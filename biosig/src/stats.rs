use core::{borrow::Borrow, iter::Sum};
use num_traits::Float;

// Quick select finds the `k`th smallest element with 2N comparisons.
// NaN never compares lower or higher than the pivot, so it collapses into the
// pivot bucket instead of recursing forever.
fn quickselect<F>(y: &[F], k: usize) -> Option<F>
where
    F: PartialOrd + Copy,
{
    let n = y.len();
    if n == 1 {
        return Some(y[0]);
    }

    let pivot = *y.get(n / 2)?;
    let lower = y.iter().filter(|yi| **yi < pivot).copied().collect::<Vec<_>>();
    let upper = y.iter().filter(|yi| **yi > pivot).copied().collect::<Vec<_>>();
    let lowers = lower.len();
    let pivots = n - lowers - upper.len();

    if k < lowers {
        quickselect(&lower, k)
    } else if k < lowers + pivots {
        Some(pivot)
    } else {
        quickselect(&upper, k - lowers - pivots)
    }
}

/// Median of a slice; `None` when empty.
///
/// Even-length input averages the two central order statistics.
pub fn median_slice<F>(y: &[F]) -> Option<F>
where
    F: Float,
{
    let n = y.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => quickselect(y, n / 2),
        _ => {
            let lo = quickselect(y, n / 2 - 1)?;
            let hi = quickselect(y, n / 2)?;
            Some((lo + hi) / (F::one() + F::one()))
        }
    }
}

///
/// Compute the median of the signal, `y`
///
/// Return the median and the number of points
///
/// ```
/// use approx::assert_relative_eq;
/// use biosig::stats::median;
///
/// let y: [f64; 4] = [1., 2., 3., 4.];
/// assert_relative_eq!(2.5f64, median(y.iter()).0);
///
/// let y: [f64; 6] = [3., 1., 4., 2., 3., 5.];
/// assert_relative_eq!(3f64, median(y.iter()).0);
///
/// let y: &[f64] = &[];
/// assert_eq!((0f64, 0), median(y.iter()));
/// ```
pub fn median<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let y = y.map(|yi| *yi.borrow()).collect::<Vec<F>>();
    match median_slice(&y) {
        Some(m) => (m, y.len()),
        None => Default::default(),
    }
}

///
/// Compute the mean of the signal, `y`
///
/// Return the mean and the number of points averaged
///
/// ```
/// use approx::assert_relative_eq;
/// use biosig::stats::mean;
///
/// let y: [f64; 5] = [1., 2., 3., 4., 5.];
/// assert_relative_eq!(3f64, mean(y.iter()).0);
///
/// let y: &[f32] = &[];
/// assert_eq!((0f32, 0), mean(y.iter()));
/// ```
pub fn mean<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (sum, count) = y.fold((F::zero(), 0usize), |acc, yi| (acc.0 + *yi.borrow(), acc.1 + 1));
    if count > 0 {
        (sum / F::from(count).unwrap_or_else(F::nan), count)
    } else {
        Default::default()
    }
}

///
/// Compute the population variance (`ddof = 0`) of the signal, `y`
///
/// ```
/// use approx::assert_relative_eq;
/// use biosig::stats::variance;
///
/// let y: [f64; 5] = [1., 2., 3., 4., 5.];
/// assert_relative_eq!(2f64, variance(y.iter()).0);
/// ```
pub fn variance<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default + Sum,
    YI: Iterator + Clone,
    YI::Item: Borrow<F>,
{
    let (avg, n) = mean(y.clone());
    let sum: F = y
        .map(|f| {
            let delta = *f.borrow() - avg;
            delta * delta
        })
        .sum::<F>();
    if n > 0 {
        (sum / F::from(n).unwrap_or_else(F::nan), n)
    } else {
        Default::default()
    }
}

///
/// Compute the population standard deviation of the signal, `y`
///
/// ```
/// use approx::assert_relative_eq;
/// use biosig::stats::stdev;
///
/// let y: [f64; 5] = [1., 2., 3., 4., 5.];
/// assert_relative_eq!(1.41421356237, stdev(y.iter()).0, max_relative = 1e-8);
/// ```
pub fn stdev<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default + Sum,
    YI: Iterator + Clone,
    YI::Item: Borrow<F>,
{
    match variance(y) {
        (_, 0) => Default::default(),
        (v, n) => (v.sqrt(), n),
    }
}

/// Smallest and largest value; `None` when empty.
pub fn min_max<YI, F>(y: YI) -> Option<(F, F)>
where
    F: Float,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    y.map(|yi| *yi.borrow())
        .fold(None, |acc: Option<(F, F)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Standard score of each sample against the population mean and deviation.
///
/// A zero deviation yields non-finite scores; callers that need a defined
/// result for constant input check the deviation first.
pub fn zscore<YI, F>(y: YI) -> impl Iterator<Item = F>
where
    F: Float + Default + Sum,
    YI: Iterator + Clone,
    YI::Item: Borrow<F>,
{
    let mean = mean(y.clone()).0;
    let standard_deviation = stdev(y.clone()).0;
    y.map(move |yi| (*yi.borrow() - mean) / standard_deviation)
}

/// Descriptive summary of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Describe {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

/// Count, mean, population std and range of `y`; `None` when empty.
pub fn describe(y: &[f64]) -> Option<Describe> {
    let (min, max) = min_max(y.iter())?;
    let (mean, count) = mean(y.iter());
    Some(Describe {
        count,
        mean,
        std: stdev(y.iter()).0,
        min,
        max,
    })
}

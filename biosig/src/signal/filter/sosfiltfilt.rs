use core::{borrow::Borrow, cmp::min, iter::Sum};

use biosig_core::{Error, Result};
use nalgebra::RealField;
use tracing::warn;

use super::{design::Sos, odd_ext, sosfilt_checked_slice, sosfilt_zi_checked_slice};

/// Default odd-extension length used by [`sosfiltfilt_checked_slice`].
///
/// Three times the effective tap count, where first-order sections (both
/// `b[2]` and `a[2]` zero) count one tap less.
pub fn sosfiltfilt_padlen<F>(sos: &[Sos<F>]) -> usize
where
    F: RealField + Copy,
{
    let ntaps = 2 * sos.len() + 1;
    let bzeros = sos.iter().filter(|s| s.b[2] == F::zero()).count();
    let azeros = sos.iter().filter(|s| s.a[2] == F::zero()).count();
    3 * (ntaps - min(bzeros, azeros))
}

///
/// A forward-backward digital filter using cascaded second-order sections
///
/// The net phase response is zero, so features keep their sample position.
/// Inputs no longer than the default pad are extended by `len - 1` samples
/// instead, with a warning.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.sosfiltfilt.html#scipy.signal.sosfiltfilt>
///
pub fn sosfiltfilt_checked_slice<F>(y: &[F], sos: &[Sos<F>]) -> Result<Vec<F>>
where
    F: RealField + Copy + Sum,
{
    if sos.is_empty() {
        return Err(Error::invalid("sos", "at least one section is required"));
    }
    if y.is_empty() {
        return Err(Error::degenerate("sosfiltfilt input must be non-empty"));
    }
    let y_len = y.len();
    let padlen = sosfiltfilt_padlen(sos);
    let edge = if y_len <= padlen {
        warn!(
            len = y_len,
            padlen,
            "input shorter than filter pad; clamping odd extension to len - 1"
        );
        y_len - 1
    } else {
        padlen
    };
    let ext = odd_ext(y, edge)?;

    let mut init_sos = sos.to_vec();
    sosfilt_zi_checked_slice(init_sos.as_mut_slice())?;

    let x0 = ext[0];
    let mut sos_x = init_sos.clone();
    for s in sos_x.iter_mut() {
        s.zi0 *= x0;
        s.zi1 *= x0;
    }
    let y = sosfilt_checked_slice(&ext, sos_x.as_mut_slice())?;

    let y0 = *y
        .last()
        .ok_or_else(|| Error::degenerate("forward pass produced no samples"))?;
    let mut sos_y = init_sos;
    for s in sos_y.iter_mut() {
        s.zi0 *= y0;
        s.zi1 *= y0;
    }
    let mut y_rev = y;
    y_rev.reverse();
    let mut z = sosfilt_checked_slice(&y_rev, sos_y.as_mut_slice())?;
    z = z.into_iter().skip(edge).take(y_len).collect::<Vec<_>>();
    z.reverse();
    Ok(z)
}

///
/// Checked `sosfiltfilt` adapter for iterator-like inputs.
///
pub fn sosfiltfilt_checked<YI, F>(y: YI, sos: &[Sos<F>]) -> Result<Vec<F>>
where
    F: RealField + Copy + Sum,
    YI: IntoIterator,
    YI::Item: Borrow<F>,
{
    let y = y.into_iter().map(|yi| *yi.borrow()).collect::<Vec<F>>();
    sosfiltfilt_checked_slice(&y, sos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::design::{butter, FilterBandType};
    use dasp_signal::{rate, Signal as _};

    fn bandpass_10_50() -> Vec<Sos<f64>> {
        // 4th order butterworth bandpass 10 to 50 at 1666Hz
        let filter: [f64; 24] = [
            2.677_576_738_259_783_5e-5,
            5.355_153_476_519_567e-5,
            2.677_576_738_259_783_5e-5,
            1.0,
            -1.7991202154617734,
            0.8162578614819005,
            1.0,
            2.0,
            1.0,
            1.0,
            -1.8774769894419825,
            0.9094302413068086,
            1.0,
            -2.0,
            1.0,
            1.0,
            -1.9237959892866103,
            0.9263794671616161,
            1.0,
            -2.0,
            1.0,
            1.0,
            -1.978497311228862,
            0.9799894886973378,
        ];
        Sos::from_scipy_dyn(4, filter.to_vec())
    }

    #[test]
    fn passband_tone_survives_without_shift() {
        let sos = bandpass_10_50();
        assert_eq!(sosfiltfilt_padlen(&sos), 27);

        let sample_hz = 1666.;
        let seconds = 10;
        let mut signal = rate(sample_hz).const_hz(25.).sine();
        let sin_wave: Vec<f64> = (0..seconds * sample_hz as usize)
            .map(|_| signal.next())
            .collect::<Vec<_>>();

        let bp_wave = sosfiltfilt_checked(sin_wave.iter(), &sos).expect("valid input");
        assert_eq!(sin_wave.len(), bp_wave.len());
        for i in 2000..14000 {
            assert!(
                (bp_wave[i] - sin_wave[i]).abs() < 1e-3,
                "sample {i}: {} vs {}",
                bp_wave[i],
                sin_wave[i]
            );
        }
    }

    #[test]
    fn short_input_clamps_pad() {
        let sos = butter(4, &[5.0], FilterBandType::Lowpass, 100.0).expect("valid design");
        let x = [1.0, 2.0, 3.0, 2.0, 1.0];
        let y = sosfiltfilt_checked_slice(&x, &sos).expect("clamped pad");
        assert_eq!(y.len(), x.len());
        assert!(y.iter().all(|v| v.is_finite()));

        let one = sosfiltfilt_checked_slice(&[4.0], &sos).expect("single sample");
        assert_eq!(one.len(), 1);
        assert!((one[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_degenerate() {
        let sos = bandpass_10_50();
        let err = sosfiltfilt_checked_slice::<f64>(&[], &sos).expect_err("empty");
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }
}

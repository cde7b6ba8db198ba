use core::{borrow::Borrow, iter::Sum};

use biosig_core::{Error, Result};
use nalgebra::{Matrix2, RealField, Vector2};

use super::design::Sos;

///
/// Filter `y` through cascaded second-order sections.
///
/// Each section runs in direct form II transposed and carries its state
/// in `zi0`/`zi1`, which are updated in place so consecutive calls continue
/// where the previous one stopped.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.sosfilt.html>
///
pub fn sosfilt_checked_slice<F>(y: &[F], sos: &mut [Sos<F>]) -> Result<Vec<F>>
where
    F: RealField + Copy,
{
    if sos.is_empty() {
        return Err(Error::invalid("sos", "at least one section is required"));
    }
    let mut out = Vec::with_capacity(y.len());
    for &x in y {
        let mut x = x;
        for s in sos.iter_mut() {
            let [b0, b1, b2] = s.b;
            let [_, a1, a2] = s.a;
            let y = b0 * x + s.zi0;
            s.zi0 = b1 * x - a1 * y + s.zi1;
            s.zi1 = b2 * x - a2 * y;
            x = y;
        }
        out.push(x);
    }
    Ok(out)
}

///
/// Checked `sosfilt` adapter for iterator-like inputs.
///
pub fn sosfilt_checked<YI, F>(y: YI, sos: &mut [Sos<F>]) -> Result<Vec<F>>
where
    F: RealField + Copy,
    YI: IntoIterator,
    YI::Item: Borrow<F>,
{
    let y = y.into_iter().map(|yi| *yi.borrow()).collect::<Vec<F>>();
    sosfilt_checked_slice(&y, sos)
}

/// Steady-state initial conditions of one normalized biquad for a unit step.
///
/// Solves `(I - A^T) zi = b[1..] - a[1..] * b[0]` with `A` the companion
/// matrix of `a`. Returns `None` when the section has a pole at DC.
pub fn lfilter_zi_section<F>(b: &[F; 3], a: &[F; 3]) -> Option<[F; 2]>
where
    F: RealField + Copy,
{
    let i_minus_a = Matrix2::new(F::one() + a[1], -F::one(), a[2], F::one());
    let rhs = Vector2::new(b[1] - a[1] * b[0], b[2] - a[2] * b[0]);
    i_minus_a.lu().solve(&rhs).map(|zi| [zi[0], zi[1]])
}

///
/// Fill each section's state with the cascade's step-response steady state.
///
/// Section `i` gets its own `lfilter_zi` scaled by the DC gain of sections
/// `0..i`. Multiply the result by the first input sample to start filtering
/// without a transient.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.sosfilt_zi.html>
///
pub fn sosfilt_zi_checked_slice<F>(sos: &mut [Sos<F>]) -> Result<()>
where
    F: RealField + Copy + Sum,
{
    let mut scale = F::one();
    for s in sos.iter_mut() {
        let [zi0, zi1] = lfilter_zi_section(&s.b, &s.a).ok_or_else(|| Error::Transform {
            reason: "section has a pole at DC; steady state is undefined".into(),
        })?;
        s.zi0 = scale * zi0;
        s.zi1 = scale * zi1;
        scale *= s.b.iter().copied().sum::<F>() / s.a.iter().copied().sum::<F>();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::design::{butter, FilterBandType};
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_section_matches_direct_recursion() {
        let b = [0.2, 0.3, 0.1];
        let a = [1.0, -0.5, 0.25];
        let x = [1.0, 0.0, -1.0, 2.0, 0.5];
        let mut sos = vec![Sos::new(b, a)];
        let y = sosfilt_checked_slice(&x, &mut sos).expect("valid sections");

        // y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]
        let mut want = [0.0f64; 5];
        for n in 0..5 {
            let xm = |k: usize| if n >= k { x[n - k] } else { 0.0 };
            let ym = |k: usize, w: &[f64; 5]| if n >= k { w[n - k] } else { 0.0 };
            let v = b[0] * xm(0) + b[1] * xm(1) + b[2] * xm(2)
                - a[1] * ym(1, &want)
                - a[2] * ym(2, &want);
            want[n] = v;
        }
        for (g, w) in y.iter().zip(want.iter()) {
            assert_abs_diff_eq!(g, w, epsilon = 1e-12);
        }
    }

    #[test]
    fn zi_removes_step_transient() {
        let mut sos = butter(4, &[5.0], FilterBandType::Lowpass, 100.0).expect("valid design");
        sosfilt_zi_checked_slice(&mut sos).expect("stable sections");
        let y = sosfilt_checked_slice(&[1.0; 50], &mut sos).expect("valid sections");
        for v in y {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn pole_at_dc_is_reported() {
        let mut sos = vec![Sos::new([1.0, 0.0, 0.0], [1.0, -2.0, 1.0])];
        let err = sosfilt_zi_checked_slice(&mut sos).expect_err("singular");
        assert!(matches!(err, Error::Transform { .. }));
    }

    #[test]
    fn empty_sections_rejected() {
        let mut sos: Vec<Sos<f64>> = Vec::new();
        assert!(sosfilt_checked(vec![1.0, 2.0], &mut sos).is_err());
    }
}

//! Analog prototype, band transforms, bilinear map and biquad pairing.

use super::{relative_degree_checked, FilterBandType, Sos, ZpkFormatFilter};
use biosig_core::{Error, Result};
use core::f64::consts::PI;
use core::iter::repeat_n;
use nalgebra::Complex;
use num_traits::Zero;

/// Tolerance (relative to root magnitude) under which a root counts as real.
const REAL_ROOT_TOL: f64 = 1e-10;

/// Analog Butterworth low-pass prototype: unit cutoff, no zeros, unit gain.
///
/// Poles sit on the left half of the unit circle at `-exp(j pi m / 2N)`
/// for `m = -N+1, -N+3, ..., N-1`.
pub fn buttap(order: usize) -> ZpkFormatFilter<f64> {
    let n = order as f64;
    let p = (0..order)
        .map(|i| {
            let m = (2 * i) as f64 - n + 1.0;
            -Complex::new(0.0, PI * m / (2.0 * n)).exp()
        })
        .collect();
    ZpkFormatFilter {
        z: Vec::new(),
        p,
        k: 1.0,
    }
}

/// Move a unit-cutoff low-pass to cutoff `wo` (rad/s).
pub fn lp2lp_zpk(zpk: ZpkFormatFilter<f64>, wo: f64) -> Result<ZpkFormatFilter<f64>> {
    let degree = relative_degree_checked(&zpk.z, &zpk.p)?;
    Ok(ZpkFormatFilter {
        z: zpk.z.iter().map(|&z| z * wo).collect(),
        p: zpk.p.iter().map(|&p| p * wo).collect(),
        k: zpk.k * wo.powi(degree as i32),
    })
}

/// Turn a unit-cutoff low-pass into a high-pass with cutoff `wo`.
pub fn lp2hp_zpk(zpk: ZpkFormatFilter<f64>, wo: f64) -> Result<ZpkFormatFilter<f64>> {
    let degree = relative_degree_checked(&zpk.z, &zpk.p)?;
    let wo = Complex::from(wo);
    let mut z: Vec<_> = zpk.z.iter().map(|&z| wo / z).collect();
    let p = zpk.p.iter().map(|&p| wo / p).collect();
    z.extend(repeat_n(Complex::zero(), degree));

    let num: Complex<f64> = zpk.z.iter().map(|&z| -z).product();
    let den: Complex<f64> = zpk.p.iter().map(|&p| -p).product();
    Ok(ZpkFormatFilter {
        z,
        p,
        k: zpk.k * (num / den).re,
    })
}

/// Turn a unit-cutoff low-pass into a band-pass centred on `wo` with width `bw`.
///
/// Every root splits into two, so the order doubles.
pub fn lp2bp_zpk(zpk: ZpkFormatFilter<f64>, wo: f64, bw: f64) -> Result<ZpkFormatFilter<f64>> {
    let degree = relative_degree_checked(&zpk.z, &zpk.p)?;
    let wo2 = Complex::from(wo * wo);
    let split = |roots: &[Complex<f64>]| -> Vec<Complex<f64>> {
        let scaled: Vec<_> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
        let upper = scaled.iter().map(|&r| r + (r * r - wo2).sqrt());
        let lower = scaled.iter().map(|&r| r - (r * r - wo2).sqrt());
        upper.chain(lower).collect()
    };
    let mut z = split(&zpk.z);
    let p = split(&zpk.p);
    z.extend(repeat_n(Complex::zero(), degree));
    Ok(ZpkFormatFilter {
        z,
        p,
        k: zpk.k * bw.powi(degree as i32),
    })
}

/// Map an analog filter to the z-plane with the bilinear transform.
///
/// Zeros at infinity land on Nyquist (`z = -1`).
pub fn bilinear_zpk(zpk: ZpkFormatFilter<f64>, fs: f64) -> Result<ZpkFormatFilter<f64>> {
    let degree = relative_degree_checked(&zpk.z, &zpk.p)?;
    let fs2 = Complex::from(2.0 * fs);
    let mut z: Vec<_> = zpk.z.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let p = zpk.p.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    z.extend(repeat_n(Complex::new(-1.0, 0.0), degree));

    let num: Complex<f64> = zpk.z.iter().map(|&z| fs2 - z).product();
    let den: Complex<f64> = zpk.p.iter().map(|&p| fs2 - p).product();
    Ok(ZpkFormatFilter {
        z,
        p,
        k: zpk.k * (num / den).re,
    })
}

/// Digital Butterworth design in zpk form.
///
/// `wn` is normalized to Nyquist, so every entry lies in `(0, 1)`.
pub fn butter_zpk(order: usize, wn: &[f64], btype: FilterBandType) -> Result<ZpkFormatFilter<f64>> {
    // Pre-warp against fs = 2 so Nyquist sits at 1.
    let fs = 2.0;
    let warp = |w: f64| 2.0 * fs * (PI * w / fs).tan();
    let proto = buttap(order);
    let analog = match (btype, wn) {
        (FilterBandType::Lowpass, &[w]) => lp2lp_zpk(proto, warp(w))?,
        (FilterBandType::Highpass, &[w]) => lp2hp_zpk(proto, warp(w))?,
        (FilterBandType::Bandpass, &[lo, hi]) => {
            let (lo, hi) = (warp(lo), warp(hi));
            lp2bp_zpk(proto, (lo * hi).sqrt(), hi - lo)?
        }
        _ => {
            return Err(Error::invalid(
                "wn",
                "lowpass/highpass take one critical frequency, bandpass takes two",
            ))
        }
    };
    bilinear_zpk(analog, fs)
}

#[derive(Debug, Clone, Copy)]
struct RootPair {
    roots: [Complex<f64>; 2],
    first_order: bool,
}

impl RootPair {
    fn origin() -> Self {
        Self {
            roots: [Complex::zero(); 2],
            first_order: false,
        }
    }

    fn radius(&self) -> f64 {
        self.roots[0].norm().max(self.roots[1].norm())
    }

    fn quadratic(&self) -> [f64; 3] {
        let [r1, r2] = self.roots;
        [1.0, -(r1 + r2).re, (r1 * r2).re]
    }
}

fn is_real(r: &Complex<f64>) -> bool {
    r.im.abs() <= REAL_ROOT_TOL * r.norm().max(1.0)
}

fn pair_roots(roots: &[Complex<f64>], arg: &'static str) -> Result<Vec<RootPair>> {
    let upper: Vec<_> = roots.iter().filter(|r| !is_real(r) && r.im > 0.0).collect();
    let lower = roots.iter().filter(|r| !is_real(r) && r.im < 0.0).count();
    if upper.len() != lower {
        return Err(Error::invalid(
            arg,
            "complex roots must come in conjugate pairs",
        ));
    }

    let mut pairs: Vec<RootPair> = upper
        .into_iter()
        .map(|&r| RootPair {
            roots: [r, r.conj()],
            first_order: false,
        })
        .collect();

    let mut reals: Vec<f64> = roots.iter().filter(|r| is_real(r)).map(|r| r.re).collect();
    reals.sort_by(f64::total_cmp);
    let mut chunks = reals.chunks_exact(2);
    pairs.extend(chunks.by_ref().map(|c| RootPair {
        roots: [Complex::from(c[0]), Complex::from(c[1])],
        first_order: false,
    }));
    if let [r] = chunks.remainder() {
        pairs.push(RootPair {
            roots: [Complex::from(*r), Complex::zero()],
            first_order: true,
        });
    }
    Ok(pairs)
}

/// Pair zeros and poles into second-order sections.
///
/// Conjugate roots share a section and leftover real roots are paired in
/// ascending order. First-order sections come first, then sections by
/// increasing pole radius so the poles nearest the unit circle run last.
/// The gain is folded into the first numerator.
pub fn zpk2sos(zpk: &ZpkFormatFilter<f64>) -> Result<Vec<Sos<f64>>> {
    relative_degree_checked(&zpk.z, &zpk.p)?;
    let mut poles = pair_roots(&zpk.p, "p")?;
    let mut zeros = pair_roots(&zpk.z, "z")?;
    let n_sections = poles.len().max(zeros.len());
    if n_sections == 0 {
        return Ok(vec![Sos::new([zpk.k, 0.0, 0.0], [1.0, 0.0, 0.0])]);
    }
    poles.resize(n_sections, RootPair::origin());
    zeros.resize(n_sections, RootPair::origin());

    poles.sort_by(|a, b| {
        b.first_order
            .cmp(&a.first_order)
            .then(a.radius().total_cmp(&b.radius()))
    });
    zeros.sort_by_key(|z| !z.first_order);

    let mut sos: Vec<Sos<f64>> = zeros
        .iter()
        .zip(poles.iter())
        .map(|(z, p)| Sos::new(z.quadratic(), p.quadratic()))
        .collect();
    for b in sos[0].b.iter_mut() {
        *b *= zpk.k;
    }
    Ok(sos)
}

//! Quadrature, interpolation, and root-finding helpers.
//!
//! Everything here is deterministic: fixed node sets, fixed iteration
//! orders, no adaptive randomness.

use crate::calculator::CalcError;

/// Positive nodes of the 16-point Gauss-Legendre rule on [-1, 1].
const GL16_NODES: [f64; 8] = [
    0.095_012_509_837_637_4,
    0.281_603_550_779_258_9,
    0.458_016_777_657_227_4,
    0.617_876_244_402_643_8,
    0.755_404_408_355_003_0,
    0.865_631_202_387_831_8,
    0.944_575_023_073_232_6,
    0.989_400_934_991_649_9,
];

/// Weights matching [`GL16_NODES`].
const GL16_WEIGHTS: [f64; 8] = [
    0.189_450_610_455_068_5,
    0.182_603_415_044_923_6,
    0.169_156_519_395_002_5,
    0.149_595_988_816_576_7,
    0.124_628_971_255_533_9,
    0.095_158_511_682_492_8,
    0.062_253_523_938_647_9,
    0.027_152_459_411_754_1,
];

/// Composite 16-point Gauss-Legendre integral of `f` over `[a, b]`.
///
/// The interval is split into `panels` equal sub-intervals. Reversed
/// bounds give the negated integral.
pub fn gauss_legendre<F>(f: F, a: f64, b: f64, panels: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let panels = panels.max(1);
    let width = (b - a) / panels as f64;
    let half = 0.5 * width;
    let mut total = 0.0;
    for p in 0..panels {
        let mid = a + (p as f64 + 0.5) * width;
        let mut acc = 0.0;
        for (&x, &w) in GL16_NODES.iter().zip(GL16_WEIGHTS.iter()) {
            acc += w * (f(mid - half * x) + f(mid + half * x));
        }
        total += acc * half;
    }
    total
}

/// Simpson's rule on uniformly spaced samples.
///
/// With an even number of samples the last interval falls back to the
/// trapezoid rule.
#[must_use]
pub fn simpson(y: &[f64], dx: f64) -> f64 {
    match y.len() {
        0 | 1 => 0.0,
        2 => 0.5 * dx * (y[0] + y[1]),
        n => {
            let odd_end = if n % 2 == 1 { n } else { n - 1 };
            let mut acc = y[0] + y[odd_end - 1];
            for (i, v) in y.iter().enumerate().take(odd_end - 1).skip(1) {
                acc += if i % 2 == 1 { 4.0 * v } else { 2.0 * v };
            }
            let mut total = acc * dx / 3.0;
            if odd_end < n {
                total += 0.5 * dx * (y[n - 2] + y[n - 1]);
            }
            total
        }
    }
}

/// Cumulative trapezoid integral taken from the last sample backwards.
///
/// `out[i]` is the integral of `y` from sample `i` to the final sample,
/// so `out[last] == 0`.
#[must_use]
pub fn cumulative_from_top(y: &[f64], dx: f64) -> Vec<f64> {
    let mut out = vec![0.0; y.len()];
    for i in (0..y.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] + 0.5 * dx * (y[i] + y[i + 1]);
    }
    out
}

/// `n` points evenly spaced in log10 between `10^start` and `10^end`.
///
/// Matches the usual `logspace` convention: a single point yields
/// `10^start`, and both end points are included otherwise.
#[must_use]
pub fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        10f64.powf(end)
                    } else {
                        10f64.powf(start + step * i as f64)
                    }
                })
                .collect()
        }
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive.
#[must_use]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Linear interpolation on a monotone (ascending or descending) abscissa.
///
/// Returns `None` when `xq` lies outside the tabulated range or the
/// table is degenerate.
#[must_use]
pub fn interp_linear(x: &[f64], y: &[f64], xq: f64) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 || !xq.is_finite() {
        return None;
    }
    let ascending = x[n - 1] >= x[0];
    let (lo, hi) = if ascending {
        (x[0], x[n - 1])
    } else {
        (x[n - 1], x[0])
    };
    if xq < lo || xq > hi {
        return None;
    }

    // Index of the first sample strictly past xq in traversal order.
    let idx = if ascending {
        x[..n].partition_point(|&v| v <= xq)
    } else {
        x[..n].partition_point(|&v| v >= xq)
    };
    let i = idx.clamp(1, n - 1);
    let (x0, x1) = (x[i - 1], x[i]);
    let (y0, y1) = (y[i - 1], y[i]);
    if x1 == x0 {
        return Some(y0);
    }
    Some(y0 + (y1 - y0) * (xq - x0) / (x1 - x0))
}

/// Bisection root finder on `[a, b]`.
///
/// Requires a sign change between the end points. Infinite function
/// values are accepted as long as their sign is meaningful.
pub fn bisect<F>(f: F, mut a: f64, mut b: f64, xtol: f64, max_iter: usize) -> Result<f64, CalcError>
where
    F: Fn(f64) -> f64,
{
    let mut fa = f(a);
    let fb = f(b);
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.is_nan() || fb.is_nan() || fa.signum() == fb.signum() {
        return Err(CalcError::Numerical(format!(
            "root not bracketed on [{a}, {b}] (f(a)={fa:e}, f(b)={fb:e})"
        )));
    }

    for _ in 0..max_iter {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 || (b - a).abs() * 0.5 < xtol {
            return Ok(mid);
        }
        if fm.is_nan() {
            return Err(CalcError::Numerical(format!(
                "function undefined at {mid} during bisection"
            )));
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }
    Ok(0.5 * (a + b))
}

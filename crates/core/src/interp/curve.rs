//! Per-joint curve construction and evaluation.
//!
//! Every joint is fitted on its own against the shared knot times. Cubic
//! curves are stored in Hermite form (value and slope at each knot), which
//! covers both the natural spline and the monotone PCHIP fit.

/// Position of a query time relative to the knot vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Knot {
    /// The query lands exactly on knot `i`.
    Exact(usize),
    /// The query lies inside segment `[i, i + 1]` at local fraction `s`.
    Between(usize, f64),
}

/// Locates `t` in the strictly increasing `times`. Callers guarantee that
/// `t` lies within `[times[0], times[last]]`.
pub(crate) fn locate(times: &[f64], t: f64) -> Knot {
    match times.binary_search_by(|probe| probe.total_cmp(&t)) {
        Ok(index) => Knot::Exact(index),
        Err(0) => Knot::Exact(0),
        Err(index) if index >= times.len() => Knot::Exact(times.len() - 1),
        Err(index) => {
            let i = index - 1;
            let span = times[i + 1] - times[i];
            Knot::Between(i, ((t - times[i]) / span).clamp(0.0, 1.0))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JointCurve {
    Constant(f64),
    Linear { values: Vec<f64> },
    Hermite { values: Vec<f64>, slopes: Vec<f64> },
}

impl JointCurve {
    pub(crate) fn linear(values: Vec<f64>) -> Self {
        Self::Linear { values }
    }

    pub(crate) fn natural_spline(times: &[f64], values: Vec<f64>) -> Self {
        let slopes = natural_spline_slopes(times, &values);
        Self::Hermite { values, slopes }
    }

    pub(crate) fn pchip(times: &[f64], values: Vec<f64>) -> Self {
        let slopes = pchip_slopes(times, &values);
        Self::Hermite { values, slopes }
    }

    pub(crate) fn evaluate(&self, times: &[f64], knot: Knot) -> f64 {
        match (self, knot) {
            (Self::Constant(value), _) => *value,
            (Self::Linear { values } | Self::Hermite { values, .. }, Knot::Exact(i)) => values[i],
            (Self::Linear { values }, Knot::Between(i, s)) => {
                values[i] + (values[i + 1] - values[i]) * s
            }
            (Self::Hermite { values, slopes }, Knot::Between(i, s)) => {
                let h = times[i + 1] - times[i];
                hermite(values[i], slopes[i] * h, values[i + 1], slopes[i + 1] * h, s)
            }
        }
    }
}

fn hermite(p0: f64, m0: f64, p1: f64, m1: f64, s: f64) -> f64 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

fn secants(times: &[f64], values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let widths: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let deltas = values
        .windows(2)
        .zip(&widths)
        .map(|(w, h)| (w[1] - w[0]) / h)
        .collect();
    (widths, deltas)
}

/// Knot slopes of the natural cubic spline (zero second derivative at both
/// ends), derived from the second derivatives solved by the Thomas algorithm.
fn natural_spline_slopes(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let (h, delta) = secants(times, values);
    if n == 2 {
        return vec![delta[0]; 2];
    }

    // Tridiagonal system for the interior second derivatives m[1..n-1].
    let interior = n - 2;
    let mut diag = vec![0.0; interior];
    let mut rhs = vec![0.0; interior];
    for k in 0..interior {
        diag[k] = 2.0 * (h[k] + h[k + 1]);
        rhs[k] = 6.0 * (delta[k + 1] - delta[k]);
    }
    for k in 1..interior {
        let factor = h[k] / diag[k - 1];
        diag[k] -= factor * h[k];
        rhs[k] -= factor * rhs[k - 1];
    }
    let mut second = vec![0.0; n];
    for k in (0..interior).rev() {
        let upper = if k + 1 < interior {
            h[k + 1] * second[k + 2]
        } else {
            0.0
        };
        second[k + 1] = (rhs[k] - upper) / diag[k];
    }

    let mut slopes = Vec::with_capacity(n);
    for i in 0..n - 1 {
        slopes.push(delta[i] - h[i] * (2.0 * second[i] + second[i + 1]) / 6.0);
    }
    let last = n - 2;
    slopes.push(delta[last] + h[last] * (second[last] + 2.0 * second[last + 1]) / 6.0);
    slopes
}

/// Fritsch-Carlson slopes: weighted harmonic mean at interior knots, zero at
/// local extrema, and a shape-preserving three point estimate at the ends.
fn pchip_slopes(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let (h, delta) = secants(times, values);
    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (delta[k - 1], delta[k]);
        if d0 * d1 <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
    }
    slopes[0] = pchip_end_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

fn pchip_end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if signum(slope) != signum(d0) {
        0.0
    } else if signum(d0) != signum(d1) && slope.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        slope
    }
}

fn signum(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

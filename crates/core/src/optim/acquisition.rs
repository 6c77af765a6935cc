//! Acquisition scoring for the sequential search loop.
//!
//! All three strategies are expressed as "larger is better" scores over the
//! surrogate's predictive `(mean, std)` at a candidate, so selection is a
//! single argmax regardless of strategy. The standard-normal CDF uses the
//! Abramowitz–Stegun erf approximation (max error ~1.5e-7, far below the
//! resolution of a miss-rate objective).

use crate::config::Acquisition;

/// Predictive deviations below this are treated as degenerate (score 0).
const SIGMA_EPSILON: f64 = 1e-12;

impl Acquisition {
    /// Scores a candidate with predictive `mean`/`std` against the best
    /// observed objective value (`best`, minimized).
    pub fn score(&self, mean: f64, std: f64, best: f64) -> f64 {
        match *self {
            Self::Ei => {
                if std < SIGMA_EPSILON {
                    return 0.0;
                }
                let z = (best - mean) / std;
                (best - mean) * standard_normal_cdf(z) + std * standard_normal_pdf(z)
            }
            Self::Lcb { kappa } => -(mean - kappa * std),
            Self::Pi => {
                if std < SIGMA_EPSILON {
                    return 0.0;
                }
                standard_normal_cdf((best - mean) / std)
            }
        }
    }
}

/// Standard normal density.
pub fn standard_normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Standard normal cumulative distribution, `Phi(z) = (1 + erf(z/sqrt(2)))/2`.
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Error function via the Abramowitz–Stegun 7.1.26 rational approximation.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

//! Gaussian-process surrogate with an isotropic Matérn-2.5 kernel.
//!
//! The surrogate models the objective over the continuous relaxation of the
//! normalized exponent vector. Observations are centered; the signal
//! variance comes from the sample variance of the observations, and the
//! length-scale and nugget are selected by maximum marginal likelihood over
//! small log-spaced grids. Everything is dense and direct: the space is
//! three-dimensional and the history holds at most the evaluation budget,
//! so a flat-matrix Cholesky factorization is all the linear algebra needed.

/// Length-scale candidates in normalized-space units.
const LENGTH_SCALE_GRID: [f64; 8] = [0.1, 0.2, 0.35, 0.5, 0.75, 1.0, 1.5, 2.0];

/// Nugget (noise-variance) candidates relative to the signal variance.
const NUGGET_GRID: [f64; 3] = [1e-6, 1e-4, 1e-2];

/// Floor on the signal variance so a constant history still yields a
/// usable (exploration-driving) predictive deviation.
const MIN_SIGNAL_VARIANCE: f64 = 1e-6;

/// Fitted Gaussian-process regressor.
#[derive(Debug)]
pub struct GaussianProcess {
    xs: Vec<[f64; 3]>,
    /// Lower-triangular Cholesky factor of the kernel matrix, row-major.
    chol: Vec<f64>,
    /// `K^-1 (y - mean)`.
    alpha: Vec<f64>,
    y_mean: f64,
    signal_variance: f64,
    length_scale: f64,
}

impl GaussianProcess {
    /// Fits the surrogate to the observed history.
    ///
    /// Returns `None` when no hyper-parameter candidate yields a positive
    /// definite kernel matrix (the caller then falls back to random
    /// sampling).
    pub fn fit(xs: &[[f64; 3]], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n == 0 || ys.len() != n {
            return None;
        }

        let y_mean = ys.iter().sum::<f64>() / n as f64;
        let centered: Vec<f64> = ys.iter().map(|y| y - y_mean).collect();
        let signal_variance = (centered.iter().map(|y| y * y).sum::<f64>() / n as f64)
            .max(MIN_SIGNAL_VARIANCE);

        let mut best: Option<(f64, f64, f64, Vec<f64>, Vec<f64>)> = None;
        for &length_scale in &LENGTH_SCALE_GRID {
            for &nugget in &NUGGET_GRID {
                let Some((chol, alpha)) =
                    factorize(xs, signal_variance, length_scale, nugget * signal_variance, &centered)
                else {
                    continue;
                };
                let lml = log_marginal_likelihood(&centered, &alpha, &chol, n);
                if best.as_ref().map_or(true, |(b, ..)| lml > *b) {
                    best = Some((lml, length_scale, nugget, chol, alpha));
                }
            }
        }

        let (_, length_scale, _, chol, alpha) = best?;
        Some(Self {
            xs: xs.to_vec(),
            chol,
            alpha,
            y_mean,
            signal_variance,
            length_scale,
        })
    }

    /// Predictive mean and standard deviation at `x`.
    pub fn predict(&self, x: [f64; 3]) -> (f64, f64) {
        let n = self.xs.len();
        let k_star: Vec<f64> = self
            .xs
            .iter()
            .map(|xi| self.signal_variance * matern52(distance(*xi, x), self.length_scale))
            .collect();

        let mean = self.y_mean
            + k_star
                .iter()
                .zip(&self.alpha)
                .map(|(k, a)| k * a)
                .sum::<f64>();

        // Predictive variance: k(x,x) - v^T v with v = L^-1 k*.
        let v = solve_lower(&self.chol, n, &k_star);
        let reduction: f64 = v.iter().map(|vi| vi * vi).sum();
        let variance = (self.signal_variance - reduction).max(0.0);
        (mean, variance.sqrt())
    }

    /// The length-scale selected by the likelihood grid.
    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }
}

/// Matérn kernel with smoothness 2.5 as a function of distance `r`.
fn matern52(r: f64, length_scale: f64) -> f64 {
    let s = 5.0_f64.sqrt() * r / length_scale;
    (1.0 + s + s * s / 3.0) * (-s).exp()
}

/// Euclidean distance between two points.
fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(&b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Builds and factorizes the kernel matrix, escalating the jitter on
/// numerical failure. Returns the Cholesky factor and `K^-1 y`.
fn factorize(
    xs: &[[f64; 3]],
    signal_variance: f64,
    length_scale: f64,
    noise: f64,
    centered: &[f64],
) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = xs.len();
    let mut jitter = noise;
    for _ in 0..6 {
        let mut k = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let cov = signal_variance * matern52(distance(xs[i], xs[j]), length_scale);
                k[i * n + j] = if i == j { cov + jitter } else { cov };
            }
        }
        if cholesky_in_place(&mut k, n) {
            let alpha = solve_upper(&k, n, &solve_lower(&k, n, centered));
            return Some((k, alpha));
        }
        jitter *= 10.0;
    }
    None
}

/// Log marginal likelihood of the centered observations.
fn log_marginal_likelihood(centered: &[f64], alpha: &[f64], chol: &[f64], n: usize) -> f64 {
    let fit: f64 = centered.iter().zip(alpha).map(|(y, a)| y * a).sum();
    let log_det: f64 = (0..n).map(|i| chol[i * n + i].ln()).sum();
    -0.5 * fit - log_det - 0.5 * n as f64 * (2.0 * std::f64::consts::PI).ln()
}

/// In-place lower Cholesky factorization; `false` if the matrix is not
/// positive definite.
fn cholesky_in_place(a: &mut [f64], n: usize) -> bool {
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= a[i * n + k] * a[j * n + k];
            }
            if i == j {
                if sum <= 0.0 {
                    return false;
                }
                a[i * n + j] = sum.sqrt();
            } else {
                a[i * n + j] = sum / a[j * n + j];
            }
        }
        for j in (i + 1)..n {
            a[i * n + j] = 0.0;
        }
    }
    true
}

/// Solves `L x = b` by forward substitution.
fn solve_lower(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

/// Solves `L^T x = b` by back substitution.
fn solve_upper(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

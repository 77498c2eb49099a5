//! Polynomial Engine (spec.md §4.2).
//!
//! Fits a least-squares polynomial of configurable degree in one of
//! three bases, then evaluates the fit and its derivatives. Per
//! spec.md §9's "dispatch table, not reflection" guidance, the three
//! bases are just match arms on [`crate::config::PolyBasis`] rather
//! than a trait-object registry.
//!
//! A fit is always kept as a monomial coefficient vector, so `eval`/
//! `derivative` never need basis-specific recurrences. For the
//! orthogonal bases (Chebyshev, Legendre) that vector is the power-series
//! equivalent of a fit solved on the normalized domain `[-1, 1]` — the
//! basis only changes how that least-squares design matrix is built,
//! for conditioning, per spec.md's rationale. The monomial basis instead
//! skips the normal-equations path entirely and is fit directly in raw
//! latitude degrees via `polyfit-rs`, since routing it through the same
//! design matrix the orthogonal bases use would reproduce the
//! conditioning problem that basis exists to avoid.

use crate::config::PolyBasis;
use nalgebra::{DMatrix, DVector};

/// Result of [`fit`]: either a genuine least-squares polynomial, or the
/// "no jet" sentinel fit (empty finite support or a singular normal
/// matrix), per spec.md §4.2's failure mode.
#[derive(Debug, Clone)]
pub struct PolyFit {
    /// Monomial coefficients (ascending order) on the normalized domain.
    coeffs: Vec<f64>,
    /// `(lo, hi)` of the latitude support the fit was built over.
    domain: (f64, f64),
    degree: usize,
}

impl PolyFit {
    fn empty(degree: usize) -> Self {
        Self {
            coeffs: vec![0.0; degree + 1],
            domain: (0.0, 1.0),
            degree,
        }
    }

    /// `true` for the "no jet" sentinel fit: a fully zero coefficient
    /// vector, per spec.md §4.2 ("caller interprets this as 'no jet'").
    pub fn is_empty(&self) -> bool {
        self.coeffs.iter().all(|c| *c == 0.0)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    fn normalize(&self, phi: f64) -> f64 {
        let (lo, hi) = self.domain;
        if hi <= lo {
            0.0
        } else {
            2.0 * (phi - lo) / (hi - lo) - 1.0
        }
    }

    fn dx_dphi(&self) -> f64 {
        let (lo, hi) = self.domain;
        if hi <= lo {
            0.0
        } else {
            2.0 / (hi - lo)
        }
    }

    /// P(phi; c): Horner evaluation of the monomial-equivalent fit.
    pub fn eval(&self, phi: f64) -> f64 {
        horner(&self.coeffs, self.normalize(phi))
    }

    /// P'(phi; c), via the power rule in the normalized domain and the
    /// chain rule back to latitude degrees.
    pub fn derivative(&self, phi: f64) -> f64 {
        horner(&power_rule(&self.coeffs), self.normalize(phi)) * self.dx_dphi()
    }

    /// P''(phi; c).
    pub fn second_derivative(&self, phi: f64) -> f64 {
        let d1 = power_rule(&self.coeffs);
        let d2 = power_rule(&d1);
        horner(&d2, self.normalize(phi)) * self.dx_dphi().powi(2)
    }

    /// Samples the first derivative over `phi_samples`, for the
    /// extremum selector.
    pub fn derivative_curve(&self, phi_samples: &[f64]) -> Vec<f64> {
        phi_samples.iter().map(|&p| self.derivative(p)).collect()
    }
}

fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// d/dx of a monomial coefficient vector (ascending order).
fn power_rule(coeffs: &[f64]) -> Vec<f64> {
    if coeffs.len() <= 1 {
        return vec![0.0];
    }
    (1..coeffs.len()).map(|k| coeffs[k] * k as f64).collect()
}

/// Monomial coefficients (ascending, ascending degree, length `n+1`) of
/// the degree-`n` basis polynomial, built by the same three-term
/// recurrences `numpy.polynomial` uses.
fn basis_polynomial_coeffs(basis: PolyBasis, n: usize) -> Vec<f64> {
    // v[k] holds the monomial coefficients of B_k, k = 0..=n.
    let mut v: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    v.push(vec![1.0]);
    if n == 0 {
        return v[0].clone();
    }
    v.push(vec![0.0, 1.0]);
    for k in 2..=n {
        let prev1 = &v[k - 1];
        let prev2 = &v[k - 2];
        let mut next = vec![0.0; k + 1];
        match basis {
            PolyBasis::Chebyshev => {
                // T_k = 2x*T_{k-1} - T_{k-2}
                for (i, c) in prev1.iter().enumerate() {
                    next[i + 1] += 2.0 * c;
                }
                for (i, c) in prev2.iter().enumerate() {
                    next[i] -= c;
                }
            }
            PolyBasis::Legendre => {
                // k*P_k = (2k-1)x*P_{k-1} - (k-1)*P_{k-2}
                let kf = k as f64;
                for (i, c) in prev1.iter().enumerate() {
                    next[i + 1] += (2.0 * kf - 1.0) * c;
                }
                for (i, c) in prev2.iter().enumerate() {
                    next[i] -= (kf - 1.0) * c;
                }
                for coeff in next.iter_mut() {
                    *coeff /= kf;
                }
            }
            PolyBasis::Polynomial => {
                // B_k = x^k
                next[k] = 1.0;
            }
        }
        v.push(next);
    }
    v[n].clone()
}

/// Evaluates `B_0..B_degree` at `x` via the same recurrence used to
/// build `basis_polynomial_coeffs`, so the design matrix is assembled
/// directly from the recurrence (better conditioned than going through
/// monomial powers first) rather than by evaluating the monomial form.
fn basis_row(basis: PolyBasis, x: f64, degree: usize) -> Vec<f64> {
    let mut row = vec![0.0; degree + 1];
    row[0] = 1.0;
    if degree == 0 {
        return row;
    }
    row[1] = x;
    for k in 2..=degree {
        row[k] = match basis {
            PolyBasis::Chebyshev => 2.0 * x * row[k - 1] - row[k - 2],
            PolyBasis::Legendre => {
                let kf = k as f64;
                ((2.0 * kf - 1.0) * x * row[k - 1] - (kf - 1.0) * row[k - 2]) / kf
            }
            PolyBasis::Polynomial => x * row[k - 1],
        };
    }
    row
}

/// Least-squares fit `c = argmin sum (theta_i - P(phi_i; c))^2`.
///
/// `theta` entries that are NaN mask the corresponding `phi` out of the
/// fit (spec.md §4.2). Empty finite support or a singular normal matrix
/// both return [`PolyFit::empty`], which the caller reads as "no jet"
/// (spec.md §4.2's failure mode).
pub fn fit(basis: PolyBasis, phi: &[f64], theta: &[f64], degree: usize) -> PolyFit {
    let pairs: Vec<(f64, f64)> = phi
        .iter()
        .zip(theta.iter())
        .filter(|(_, t)| t.is_finite())
        .map(|(&p, &t)| (p, t))
        .collect();

    if pairs.len() < degree + 1 {
        return PolyFit::empty(degree);
    }

    let lo = pairs.iter().map(|(p, _)| *p).fold(f64::INFINITY, f64::min);
    let hi = pairs
        .iter()
        .map(|(p, _)| *p)
        .fold(f64::NEG_INFINITY, f64::max);
    if !(hi > lo) {
        return PolyFit::empty(degree);
    }

    if basis == PolyBasis::Polynomial {
        // `fit_monomial_via_polyfit_rs` is handed the same normalized
        // `[-1, 1]` abscissas the orthogonal bases solve on below, not
        // raw latitude degrees: a degree-12 Vandermonde system in raw
        // phi is exactly the ill-conditioning spec.md warns the
        // monomial basis is prone to, and normalizing first keeps that
        // risk no worse than the other two bases while still giving
        // the monomial basis its own `polyfit-rs` solve path instead of
        // the orthogonal bases' recurrence-built design matrix.
        let normalized_phi: Vec<f64> = pairs.iter().map(|(p, _)| 2.0 * (p - lo) / (hi - lo) - 1.0).collect();
        let theta_vals: Vec<f64> = pairs.iter().map(|(_, t)| *t).collect();
        return match fit_monomial_via_polyfit_rs(&normalized_phi, &theta_vals, degree) {
            Some(coeffs) if coeffs.iter().all(|v| v.is_finite()) => PolyFit { coeffs, domain: (lo, hi), degree },
            _ => PolyFit::empty(degree),
        };
    }

    let n = pairs.len();
    let mut a = DMatrix::<f64>::zeros(n, degree + 1);
    let mut y = DVector::<f64>::zeros(n);
    for (row, (p, t)) in pairs.iter().enumerate() {
        let x = 2.0 * (p - lo) / (hi - lo) - 1.0;
        let basis_row = basis_row(basis, x, degree);
        for (col, v) in basis_row.into_iter().enumerate() {
            a[(row, col)] = v;
        }
        y[row] = *t;
    }

    let at = a.transpose();
    let normal = &at * &a;
    let c = match normal.try_inverse() {
        Some(inv) => inv * (&at * &y),
        None => return PolyFit::empty(degree),
    };

    if c.iter().any(|v| !v.is_finite()) {
        return PolyFit::empty(degree);
    }

    // Convert the basis coefficients to their monomial equivalent so
    // eval/derivative never need to know which basis produced them.
    let mut monomial = vec![0.0; degree + 1];
    for k in 0..=degree {
        let basis_poly = basis_polynomial_coeffs(basis, k);
        for (j, coeff) in basis_poly.into_iter().enumerate() {
            monomial[j] += c[k] * coeff;
        }
    }

    PolyFit {
        coeffs: monomial,
        domain: (lo, hi),
        degree,
    }
}

/// Monomial ("power basis") fit computed via the `polyfit-rs` crate, the
/// teacher's own polynomial-fit dependency. This is [`fit`]'s direct
/// route for [`PolyBasis::Polynomial`]: the monomial basis skips the
/// orthogonal-basis normal-equations path entirely rather than going
/// through the same conditioning machinery that exists specifically to
/// work around monomials being ill-conditioned at high degree.
pub fn fit_monomial_via_polyfit_rs(phi: &[f64], theta: &[f64], degree: usize) -> Option<Vec<f64>> {
    let pairs: Vec<(f64, f64)> = phi
        .iter()
        .zip(theta.iter())
        .filter(|(_, t)| t.is_finite())
        .map(|(&p, &t)| (p, t))
        .collect();
    if pairs.len() < degree + 1 {
        return None;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
    polyfit_rs::polyfit(&xs, &ys, degree).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fits_a_line_exactly_in_every_basis() {
        let phi: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let theta: Vec<f64> = phi.iter().map(|p| 2.0 * p + 3.0).collect();
        for basis in [PolyBasis::Chebyshev, PolyBasis::Legendre, PolyBasis::Polynomial] {
            let f = fit(basis, &phi, &theta, 3);
            assert!(!f.is_empty());
            for &p in &[0.0, 5.0, 19.0] {
                assert_abs_diff_eq!(f.eval(p), 2.0 * p + 3.0, epsilon = 1e-6);
            }
            assert_abs_diff_eq!(f.derivative(10.0), 2.0, epsilon = 1e-6);
            assert_abs_diff_eq!(f.second_derivative(10.0), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn nan_entries_are_masked_out_of_the_fit() {
        let phi: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut theta: Vec<f64> = phi.iter().map(|p| 2.0 * p + 3.0).collect();
        theta[5] = f64::NAN;
        theta[10] = f64::NAN;
        let f = fit(PolyBasis::Chebyshev, &phi, &theta, 3);
        assert!(!f.is_empty());
        assert_abs_diff_eq!(f.eval(0.0), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_finite_support_returns_zero_coefficients() {
        let phi: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let theta: Vec<f64> = vec![f64::NAN; 20];
        let f = fit(PolyBasis::Legendre, &phi, &theta, 3);
        assert!(f.is_empty());
        assert_eq!(f.eval(5.0), 0.0);
    }

    #[test]
    fn too_few_points_for_degree_returns_empty() {
        let phi = vec![1.0, 2.0, 3.0];
        let theta = vec![1.0, 2.0, 3.0];
        let f = fit(PolyBasis::Polynomial, &phi, &theta, 12);
        assert!(f.is_empty());
    }

    #[test]
    fn bases_agree_within_half_degree_on_a_double_peak_profile() {
        // S2/S6: theta(phi) = 350 + 10*tanh((phi-25)/2) + 15*tanh((phi-45)/2)
        let phi: Vec<f64> = (0..=80).map(|i| i as f64).collect();
        let theta: Vec<f64> = phi
            .iter()
            .map(|p| 350.0 + 10.0 * ((p - 25.0) / 2.0).tanh() + 15.0 * ((p - 45.0) / 2.0).tanh())
            .collect();

        let mut peak_locations = Vec::new();
        for basis in [PolyBasis::Chebyshev, PolyBasis::Legendre, PolyBasis::Polynomial] {
            let f = fit(basis, &phi, &theta, 12);
            assert!(!f.is_empty());
            let samples: Vec<f64> = (0..=800).map(|i| i as f64 / 10.0).collect();
            let slopes = f.derivative_curve(&samples);
            let (idx, _) = slopes
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .unwrap();
            peak_locations.push(samples[idx]);
        }
        let lo = peak_locations.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = peak_locations
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(hi - lo < 0.5, "bases disagree by {} degrees", hi - lo);
    }
}

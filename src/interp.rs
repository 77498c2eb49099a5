//! Vertical Interpolator (spec.md §4.1).
//!
//! Realises the "2-D interpolation onto a finer grid, then per-theta-row
//! crossing scan" equivalent the spec explicitly sanctions: for each
//! theta level in the restricted `theta_domain`, the IPV row is
//! resampled in theta (column-wise, per spec) from the native isentropic
//! levels, then scanned across latitude for the bracket that contains
//! the target PV*. A scalar field sampled at the same bracket gives the
//! interpolated value at the dynamic tropopause.

use ndarray::{Array1, Array2};

/// One (latitude, value) pair produced by the interpolator, in the
/// emission order of `theta_domain` (ascending theta).
pub type CurvePoint = (f64, f64);

/// Interpolates the theta axis of `slab` (shape `(theta, lat)`) onto a
/// single target theta, linearly, independently for every latitude
/// column. Returns `None` for a column with no finite neighbors
/// bracketing `theta_target`.
fn interpolate_theta_row(theta_axis: &Array1<f64>, slab: &Array2<f64>, theta_target: f64) -> Array1<f64> {
    let n_lat = slab.shape()[1];
    let n_theta = theta_axis.len();
    let mut row = Array1::<f64>::from_elem(n_lat, f64::NAN);

    // theta_axis is strictly ascending (Grid invariant).
    let mut lo = 0usize;
    while lo + 1 < n_theta && theta_axis[lo + 1] < theta_target {
        lo += 1;
    }
    if lo + 1 >= n_theta {
        return row;
    }
    let (t0, t1) = (theta_axis[lo], theta_axis[lo + 1]);
    if !(theta_target >= t0 && theta_target <= t1) || t1 <= t0 {
        return row;
    }
    let frac = (theta_target - t0) / (t1 - t0);
    for j in 0..n_lat {
        let (v0, v1) = (slab[(lo, j)], slab[(lo + 1, j)]);
        row[j] = if v0.is_finite() && v1.is_finite() {
            v0 + frac * (v1 - v0)
        } else {
            f64::NAN
        };
    }
    row
}

/// Scans a latitude row of (column-wise theta-interpolated) IPV for the
/// bracket containing `pv_star`, preferring the bracket whose
/// interpolated crossing latitude is nearest `prefer_near` when more
/// than one bracket exists (spec.md §4.1's continuity rule for
/// non-monotone columns).
fn find_crossing(lat_axis: &Array1<f64>, ipv_row: &Array1<f64>, pv_star: f64, prefer_near: Option<f64>) -> Option<(usize, f64)> {
    let n = lat_axis.len();
    let mut candidates = Vec::new();
    for i in 0..n.saturating_sub(1) {
        let (a, b) = (ipv_row[i], ipv_row[i + 1]);
        if !a.is_finite() || !b.is_finite() {
            continue;
        }
        let bracket = (a - pv_star) * (b - pv_star) <= 0.0 && a != b;
        if bracket {
            let frac = (pv_star - a) / (b - a);
            let lat = lat_axis[i] + frac * (lat_axis[i + 1] - lat_axis[i]);
            candidates.push((i, frac, lat));
        }
    }
    if candidates.is_empty() {
        return None;
    }
    let chosen = match prefer_near {
        Some(near) => candidates
            .into_iter()
            .min_by(|(_, _, a), (_, _, b)| {
                (a - near).abs().partial_cmp(&(b - near).abs()).unwrap()
            })
            .unwrap(),
        None => candidates.into_iter().next().unwrap(),
    };
    Some((chosen.0, chosen.1))
}

/// Extracts the dynamic tropopause curve: for each theta level in
/// `theta_domain`, the latitude at which zonal-mean (or single-column)
/// IPV crosses `pv_star`. Emission order follows `theta_domain`
/// (ascending), matching [`crate::fields::DynamicTropopauseCurve`]'s
/// pre-cleaning invariant in spec.md §3.
pub fn extract_tropopause_curve(
    theta_axis: &Array1<f64>,
    lat_axis: &Array1<f64>,
    ipv_slab: &Array2<f64>,
    pv_star: f64,
    theta_domain: &[f64],
) -> Vec<CurvePoint> {
    let mut curve = Vec::new();
    let mut prev_lat: Option<f64> = None;
    for &theta_k in theta_domain {
        let row = interpolate_theta_row(theta_axis, ipv_slab, theta_k);
        if let Some((i, frac)) = find_crossing(lat_axis, &row, pv_star, prev_lat) {
            let lat = lat_axis[i] + frac * (lat_axis[i + 1] - lat_axis[i]);
            curve.push((lat, theta_k));
            prev_lat = Some(lat);
        }
    }
    curve
}

/// Samples `field_slab` at each `(latitude, theta)` point already found
/// by [`extract_tropopause_curve`] (cleaned or not), reusing the
/// crossing's own latitude rather than re-deriving it from `field_slab`
/// — this is what makes the wind-intensity call and the theta call
/// return values "from the same (φ, θ) pair" (spec.md §4.5's
/// invariant).
pub fn sample_field_at_points(
    theta_axis: &Array1<f64>,
    lat_axis: &Array1<f64>,
    field_slab: &Array2<f64>,
    points: &[CurvePoint],
) -> Vec<CurvePoint> {
    points
        .iter()
        .map(|&(lat, theta)| {
            let row = interpolate_theta_row(theta_axis, field_slab, theta);
            (lat, interpolate_at_lat(lat_axis, &row, lat))
        })
        .collect()
}

fn interpolate_at_lat(lat_axis: &Array1<f64>, row: &Array1<f64>, target: f64) -> f64 {
    let n = lat_axis.len();
    for i in 0..n.saturating_sub(1) {
        let (l0, l1) = (lat_axis[i], lat_axis[i + 1]);
        let within = (l0 <= target && target <= l1) || (l1 <= target && target <= l0);
        if within && l1 != l0 {
            let frac = (target - l0) / (l1 - l0);
            let (v0, v1) = (row[i], row[i + 1]);
            if v0.is_finite() && v1.is_finite() {
                return v0 + frac * (v1 - v0);
            }
        }
    }
    f64::NAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn extracts_a_clean_linear_tropopause() {
        // theta axis: 300..=420 step 10; lat axis -10..=80 step 1.
        let theta_axis: Array1<f64> = Array1::from((300..=420).step_by(10).map(|v| v as f64).collect::<Vec<_>>());
        let lat_axis: Array1<f64> = Array1::from((-10..=80).map(|v| v as f64).collect::<Vec<_>>());
        let n_theta = theta_axis.len();
        let n_lat = lat_axis.len();

        // ipv = 2.0 exactly where lat == theta - 350, decreasing in lat.
        let mut ipv = Array2::<f64>::zeros((n_theta, n_lat));
        for (ti, &theta) in theta_axis.iter().enumerate() {
            for (li, &lat) in lat_axis.iter().enumerate() {
                ipv[(ti, li)] = (theta - 350.0) / 10.0 - lat / 10.0 + 2.0;
            }
        }

        let theta_domain: Vec<f64> = (310..=400).map(|v| v as f64).collect();
        let curve = extract_tropopause_curve(&theta_axis, &lat_axis, &ipv, 2.0, &theta_domain);
        assert!(!curve.is_empty());
        for &(lat, theta) in &curve {
            let expected = theta - 350.0;
            assert!((lat - expected).abs() < 1e-6, "lat={} expected={}", lat, expected);
        }
    }

    #[test]
    fn unbracketed_column_contributes_no_point() {
        let theta_axis: Array1<f64> = array![300.0, 310.0, 320.0];
        let lat_axis: Array1<f64> = array![0.0, 10.0, 20.0];
        // IPV never reaches 2.0 anywhere.
        let ipv = Array2::<f64>::from_elem((3, 3), 0.5);
        let curve = extract_tropopause_curve(&theta_axis, &lat_axis, &ipv, 2.0, &[305.0]);
        assert!(curve.is_empty());
    }
}

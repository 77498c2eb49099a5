//! Extremum Selector / Jet Core (spec.md §4.5) — the heart of the
//! diagnostic: finds interior extrema of `dtheta/dphi`, restricts them
//! to the permitted latitude band and the poleward side of the thermal
//! crossing, then breaks ties between candidates using vertical wind
//! shear.

use crate::grid::Hemisphere;

/// One candidate jet-core latitude, carrying the shear value used for
/// tie-breaking.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    lat: f64,
    shear: f64,
}

/// Scans `slope` (samples of `dtheta/dphi` at `lat_samples`) for
/// interior local extrema matching `hemisphere`'s predicate (spec.md
/// §4.5 step 1). Boundary indices are excluded.
fn interior_extrema(hemisphere: Hemisphere, lat_samples: &[f64], slope: &[f64]) -> Vec<usize> {
    let n = slope.len();
    if n < 3 {
        return Vec::new();
    }
    (1..n - 1)
        .filter(|&i| i < lat_samples.len())
        .filter(|&i| hemisphere.is_extremum(slope[i - 1], slope[i], slope[i + 1]))
        .collect()
}

/// Linearly interpolates `shear_curve` (latitude, shear) at `lat`.
fn interpolate_shear(shear_curve: &[(f64, f64)], lat: f64) -> f64 {
    if shear_curve.is_empty() {
        return f64::NAN;
    }
    if let Some(&(_, s)) = shear_curve.iter().find(|(l, _)| *l == lat) {
        return s;
    }
    for w in shear_curve.windows(2) {
        let (l0, s0) = w[0];
        let (l1, s1) = w[1];
        let within = (l0 <= lat && lat <= l1) || (l1 <= lat && lat <= l0);
        if within && l1 != l0 {
            let frac = (lat - l0) / (l1 - l0);
            return s0 + frac * (s1 - s0);
        }
    }
    f64::NAN
}

/// Selects the subtropical jet-core latitude, per spec.md §4.5 steps
/// 1-5. Returns `None` (the sentinel) if no candidate survives the
/// latitude-band / crossing / shear filters.
///
/// `lat_samples`/`slope` are the fine-lattice samples of `dtheta/dphi`
/// the [`crate::poly::PolyFit`] produced; `shear_curve` is the
/// surface-to-tropopause wind shear as a function of latitude.
pub fn select(
    hemisphere: Hemisphere,
    lat_samples: &[f64],
    slope: &[f64],
    shear_curve: &[(f64, f64)],
    cross_lat: f64,
    min_lat: f64,
    max_lat: f64,
) -> Option<f64> {
    let extrema = interior_extrema(hemisphere, lat_samples, slope);

    let candidates: Vec<Candidate> = extrema
        .into_iter()
        .map(|i| lat_samples[i])
        .filter(|&lat| {
            let abs_lat = lat.abs();
            abs_lat >= min_lat && abs_lat <= max_lat && hemisphere.poleward_of(lat, cross_lat)
        })
        .map(|lat| Candidate {
            lat,
            shear: interpolate_shear(shear_curve, lat),
        })
        .collect();

    match candidates.len() {
        0 => None,
        1 => Some(candidates[0].lat),
        _ => {
            let max_shear = candidates
                .iter()
                .map(|c| c.shear)
                .fold(f64::NEG_INFINITY, f64::max);
            // Ties broken by the equatorward-most candidate (spec.md
            // §4.5 step 5).
            candidates
                .iter()
                .filter(|c| c.shear == max_shear)
                .min_by(|a, b| a.lat.abs().partial_cmp(&b.lat.abs()).unwrap())
                .map(|c| c.lat)
        }
    }
}

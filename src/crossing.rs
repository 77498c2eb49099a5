//! Tropopause Crossing Finder (spec.md §4.4).
//!
//! Interpolates the thermal and dynamic tropopause onto a common 1°
//! lattice and locates the sign change of `theta_dyn - theta_trop`.
//! This is the "single unambiguous definition to prefer" called out in
//! spec.md §9's design notes.

use crate::grid::Hemisphere;

/// Output of the crossing finder: the equatorward bound the selector
/// uses, and the theta level of the dynamic tropopause there. `flagged`
/// is set when no sign change existed and the equatorward-most lattice
/// point was used as a fallback (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub cross_lat: f64,
    pub cross_lev: f64,
    pub flagged: bool,
}

/// Linearly interpolates `(x, y)` pairs (sorted ascending in `x`) onto
/// `lattice`, returning `NAN` outside the pairs' support.
fn resample(pairs: &[(f64, f64)], lattice: &[f64]) -> Vec<f64> {
    lattice
        .iter()
        .map(|&x| {
            for w in pairs.windows(2) {
                let (x0, y0) = w[0];
                let (x1, y1) = w[1];
                if x0 <= x && x <= x1 && x1 > x0 {
                    let frac = (x - x0) / (x1 - x0);
                    return y0 + frac * (y1 - y0);
                }
            }
            f64::NAN
        })
        .collect()
}

/// Finds the crossing latitude between the externally supplied thermal
/// tropopause `theta_trop` (latitude, theta) pairs and the cleaned
/// dynamic tropopause curve `theta_dyn` (latitude, theta) pairs, for one
/// hemisphere.
pub fn find_crossing(hemisphere: Hemisphere, theta_trop: &[(f64, f64)], theta_dyn: &[(f64, f64)]) -> Option<Crossing> {
    if theta_trop.is_empty() || theta_dyn.is_empty() {
        return None;
    }

    let mut trop = theta_trop.to_vec();
    let mut dyn_ = theta_dyn.to_vec();
    trop.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    dyn_.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let lo = trop
        .first()
        .unwrap()
        .0
        .max(dyn_.first().unwrap().0)
        .ceil() as i64;
    let hi = trop.last().unwrap().0.min(dyn_.last().unwrap().0).floor() as i64;
    if lo > hi {
        return None;
    }
    let lattice: Vec<f64> = (lo..=hi).map(|v| v as f64).collect();

    let trop_on_lattice = resample(&trop, &lattice);
    let dyn_on_lattice = resample(&dyn_, &lattice);

    let diff: Vec<f64> = trop_on_lattice
        .iter()
        .zip(dyn_on_lattice.iter())
        .map(|(&t, &d)| d - t)
        .collect();

    let region: Vec<usize> = diff
        .iter()
        .enumerate()
        .filter(|(_, &d)| d.is_finite() && d > 0.0)
        .map(|(i, _)| i)
        .collect();

    let (chosen_idx, flagged) = if region.is_empty() {
        // No sign-change region anywhere: fall back to the
        // most-equatorward lattice point and flag, regardless of
        // hemisphere.
        let idx = (0..lattice.len())
            .min_by(|&a, &b| lattice[a].abs().partial_cmp(&lattice[b].abs()).unwrap())
            .unwrap();
        (idx, true)
    } else {
        let idx = match hemisphere {
            Hemisphere::North => *region.iter().max_by(|&&a, &&b| lattice[a].partial_cmp(&lattice[b]).unwrap()).unwrap(),
            Hemisphere::South => *region.iter().min_by(|&&a, &&b| lattice[a].partial_cmp(&lattice[b]).unwrap()).unwrap(),
        };
        (idx, false)
    };

    // Step one grid point poleward of the poleward-most boundary of the
    // dyn>trop region, landing just outside it — matching
    // `STJ_IPV_metric.py`'s `TropoCrossing`, where `new_lat` runs
    // pole-to-equator with increasing index (descending latitude for
    // NH, ascending for SH) and `new_lat[x_elem - 1]` steps to the
    // *previous* (more poleward) index. Our lattice instead runs
    // equator-to-pole in ascending latitude *value* for NH and
    // ascending (more-negative-to-less-negative) for SH, so "more
    // poleward" is a larger index for NH and a smaller index for SH —
    // the opposite of the raw index arithmetic in the source. Skipped
    // entirely when we already fell back to the equatorward-most point.
    let adjusted_idx = if flagged {
        chosen_idx
    } else {
        match hemisphere {
            Hemisphere::North => (chosen_idx + 1).min(lattice.len() - 1),
            Hemisphere::South => chosen_idx.saturating_sub(1),
        }
    };

    let cross_lat = lattice[adjusted_idx];
    let cross_lev = if dyn_on_lattice[adjusted_idx].is_finite() {
        dyn_on_lattice[adjusted_idx]
    } else {
        sample_nearest_finite(&dyn_on_lattice, adjusted_idx)
    };

    Some(Crossing {
        cross_lat,
        cross_lev,
        flagged,
    })
}

fn sample_nearest_finite(values: &[f64], from: usize) -> f64 {
    let mut radius = 0usize;
    loop {
        if radius > values.len() {
            return f64::NAN;
        }
        if from >= radius {
            let v = values[from - radius];
            if v.is_finite() {
                return v;
            }
        }
        if from + radius < values.len() {
            let v = values[from + radius];
            if v.is_finite() {
                return v;
            }
        }
        radius += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_poleward_most_crossing_nh() {
        // theta_trop constant 345K; theta_dyn is a plateau of 360K over
        // [20, 40] and 300K everywhere else on [0, 60] — a region
        // bounded on *both* sides well inside the domain, not a
        // domain-edge artifact. The poleward-most boundary of the
        // dyn>trop region is lat=40; the crossing lands one step
        // further poleward, at lat=41, outside the region.
        let trop: Vec<(f64, f64)> = (0..=60).map(|l| (l as f64, 345.0)).collect();
        let dyn_: Vec<(f64, f64)> = (0..=60)
            .map(|l| (l as f64, if (20..=40).contains(&l) { 360.0 } else { 300.0 }))
            .collect();
        let crossing = find_crossing(Hemisphere::North, &trop, &dyn_).unwrap();
        assert!(!crossing.flagged);
        assert_eq!(crossing.cross_lat, 41.0);
    }

    #[test]
    fn no_crossing_falls_back_and_flags() {
        let trop: Vec<(f64, f64)> = (0..=60).map(|l| (l as f64, 400.0)).collect();
        let dyn_: Vec<(f64, f64)> = (0..=60).map(|l| (l as f64, 330.0)).collect();
        let crossing = find_crossing(Hemisphere::North, &trop, &dyn_).unwrap();
        assert!(crossing.flagged);
        assert_eq!(crossing.cross_lat, 0.0);
    }

    #[test]
    fn mirrors_for_southern_hemisphere() {
        // Mirror image of `finds_poleward_most_crossing_nh`: dyn>trop
        // over [-40, -20], bounded on both sides inside [-60, 0]. The
        // poleward-most boundary is lat=-40; the crossing lands one
        // step further poleward (more negative), at lat=-41.
        let trop: Vec<(f64, f64)> = (-60..=0).map(|l| (l as f64, 345.0)).collect();
        let dyn_: Vec<(f64, f64)> = (-60..=0)
            .map(|l| (l as f64, if (-40..=-20).contains(&l) { 360.0 } else { 300.0 }))
            .collect();
        let crossing = find_crossing(Hemisphere::South, &trop, &dyn_).unwrap();
        assert!(!crossing.flagged);
        assert_eq!(crossing.cross_lat, -41.0);
    }
}

//! Monotonicity Cleaner (spec.md §4.3).
//!
//! The extractor can revisit the same latitude when the tropopause
//! folds near the jet core, which destroys the ordering the derivative
//! needs. This enforces a strictly monotonic latitude sequence (NH
//! ascending, SH descending) by discarding violating points in a single
//! forward sweep: at each adjacent pair, either the next point extends
//! the sequence, is a duplicate latitude resolved to the lowest theta,
//! or is dropped outright. Dropping a point never reconsiders earlier
//! ones, which is exactly the "restart the sweep from i" rule in
//! spec.md §4.3 collapsed into one pass — expressed here as
//! `Itertools::coalesce`, the same adjacent-pair-folding idiom the
//! teacher crate's `candidate.rs` reaches for via the same trait.

use crate::grid::Hemisphere;
use itertools::Itertools;

/// Cleans `curve` (latitude, theta) pairs in emission order, per
/// spec.md §4.3. The result satisfies spec.md §8's P4: strictly
/// monotone in latitude, hemisphere-oriented, with unique latitudes.
pub fn clean(hemisphere: Hemisphere, curve: &[(f64, f64)]) -> Vec<(f64, f64)> {
    curve
        .iter()
        .copied()
        .coalesce(|prev, next| {
            if next.0 == prev.0 {
                // Duplicate latitude: keep the lowest theta.
                Ok((prev.0, prev.1.min(next.1)))
            } else if hemisphere.orientation_ok(prev.0, next.0) {
                // Extends the sequence: emit `prev`, carry `next` forward.
                Err((prev, next))
            } else {
                // Violates monotonicity: drop `next`, keep accumulating on `prev`.
                Ok(prev)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_backtracking_points_nh() {
        let curve = vec![(10.0, 350.0), (20.0, 355.0), (15.0, 357.0), (25.0, 360.0)];
        let cleaned = clean(Hemisphere::North, &curve);
        assert_eq!(cleaned, vec![(10.0, 350.0), (20.0, 355.0), (25.0, 360.0)]);
    }

    #[test]
    fn drops_backtracking_points_sh() {
        let curve = vec![(-10.0, 350.0), (-20.0, 355.0), (-15.0, 357.0), (-25.0, 360.0)];
        let cleaned = clean(Hemisphere::South, &curve);
        assert_eq!(cleaned, vec![(-10.0, 350.0), (-20.0, 355.0), (-25.0, 360.0)]);
    }

    #[test]
    fn duplicate_latitude_keeps_lowest_theta() {
        let curve = vec![(10.0, 350.0), (12.0, 355.0), (12.0, 352.0), (14.0, 360.0)];
        let cleaned = clean(Hemisphere::North, &curve);
        assert_eq!(cleaned, vec![(10.0, 350.0), (12.0, 352.0), (14.0, 360.0)]);
    }

    #[test]
    fn result_is_strictly_monotone() {
        let curve = vec![
            (0.0, 340.0),
            (5.0, 345.0),
            (3.0, 346.0),
            (5.0, 344.0),
            (10.0, 350.0),
            (9.5, 351.0),
            (12.0, 352.0),
        ];
        let cleaned = clean(Hemisphere::North, &curve);
        for w in cleaned.windows(2) {
            assert!(w[1].0 > w[0].0);
        }
    }

    #[test]
    fn empty_curve_stays_empty() {
        assert!(clean(Hemisphere::North, &[]).is_empty());
    }
}

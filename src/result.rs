//! Per-cell jet detection result, and the zonal aggregation that can
//! reduce a row of per-longitude results into one (spec.md §3 / §4.6 /
//! §6 `zonal_opt`).

use crate::config::ZonalOption;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The outcome of detection for one (time, longitude, hemisphere) cell.
/// `None` is the sentinel spec.md §3 describes ("masked downstream"),
/// replacing the source's "set position to zero" convention (spec.md
/// §9).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JetResult {
    pub lat: Option<f64>,
    pub intens: Option<f64>,
    pub theta_lev: Option<f64>,
    pub cross_lat: Option<f64>,
}

impl JetResult {
    pub fn missing(cross_lat: Option<f64>) -> Self {
        Self {
            lat: None,
            intens: None,
            theta_lev: None,
            cross_lat,
        }
    }

    pub fn detected(lat: f64, intens: f64, theta_lev: f64, cross_lat: f64) -> Self {
        Self {
            lat: Some(lat),
            intens: Some(intens),
            theta_lev: Some(theta_lev),
            cross_lat: Some(cross_lat),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.lat.is_none()
    }
}

/// Reduces a row of per-longitude [`JetResult`]s for one (time,
/// hemisphere) according to `opt`, masking sentinels out of the
/// reduction (spec.md §4.6, P5).
///
/// `ZonalOption::None` returns the row unchanged: spec.md's P5
/// invariant that switching `zonal_opt` leaves unmasked per-longitude
/// positions untouched, only the reduction differs.
pub fn aggregate(opt: ZonalOption, row: &[JetResult]) -> Vec<JetResult> {
    match opt {
        ZonalOption::None => row.to_vec(),
        ZonalOption::Mean => vec![reduce(row, nanmean)],
        ZonalOption::Median => vec![reduce(row, nanmedian)],
    }
}

fn reduce(row: &[JetResult], f: fn(&[f64]) -> Option<f64>) -> JetResult {
    let lats: Vec<f64> = row.iter().filter_map(|r| r.lat).collect();
    let intens: Vec<f64> = row.iter().filter_map(|r| r.intens).collect();
    let levs: Vec<f64> = row.iter().filter_map(|r| r.theta_lev).collect();
    let cross: Vec<f64> = row.iter().filter_map(|r| r.cross_lat).collect();

    JetResult {
        lat: f(&lats),
        intens: f(&intens),
        theta_lev: f(&levs),
        cross_lat: f(&cross),
    }
}

fn nanmean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn nanmedian(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    })
}

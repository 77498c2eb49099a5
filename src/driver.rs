//! Driver (spec.md §4.6): the orchestration layer that strings the rest
//! of the crate together into the per-timestep, per-hemisphere,
//! per-longitude detection loop spec.md §2 describes, and applies the
//! zonal reduction spec.md §6 calls `zonal_opt`.
//!
//! Longitude columns are independent (spec.md §5): each is extracted,
//! fitted, and selected without touching any other column's state, so
//! the loop over longitude is handed to `rayon` the same way the
//! teacher crate parallelises its per-epoch solves.

use log::{debug, warn};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

use crate::cleaner;
use crate::config::Config;
use crate::crossing;
use crate::error::{Error, GridError};
use crate::grid::Hemisphere;
use crate::interp::{self, CurvePoint};
use crate::io::{DatasetSink, DatasetSource, InputSlice};
use crate::poly;
use crate::result::{self, JetResult};
use crate::selector;

/// Runs STJ detection over a full dataset, one timestep at a time.
pub struct Driver {
    cfg: Config,
}

impl Driver {
    /// Validates `cfg` once, up front, so every per-cell call downstream
    /// can assume a consistent configuration (spec.md §7).
    pub fn new(cfg: Config) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs every timestep `source` has, writing each hemisphere's row
    /// to `sink`.
    pub fn run(&self, source: &dyn DatasetSource, sink: &mut dyn DatasetSink) -> Result<(), GridError> {
        for t in 0..source.time_steps() {
            let slice = source.load(t)?;
            let epoch = slice.grid.time.get(t);
            let (north, south) = self.run_timestep(&slice, t);
            debug!("t={epoch}: nh rows={} sh rows={}", north.len(), south.len());
            sink.write_north(t, &north);
            sink.write_south(t, &south);
        }
        sink.finalize();
        Ok(())
    }

    /// Runs detection for every longitude at a single timestep, for both
    /// hemispheres, then applies the configured zonal reduction.
    pub fn run_timestep(&self, slice: &InputSlice, t: usize) -> (Vec<JetResult>, Vec<JetResult>) {
        let n_lon = slice.grid.lon.len();
        let lat_axis = slice.grid.lat.values();
        let theta_axis = slice.grid.theta.values();
        let trop_row = slice.tropopause.row(t);

        let per_lon: Vec<(JetResult, JetResult)> = (0..n_lon)
            .into_par_iter()
            .map(|lon| {
                let ipv_slab = slice.ipv.column_slab(t, lon);
                let u_slab = slice.uwnd.column_slab(t, lon);
                let surface_row = slice.uwnd.surface_proxy_row(t, lat_axis.len(), lon);

                let north = detect_cell_guarded(
                    Hemisphere::North,
                    &self.cfg,
                    theta_axis,
                    lat_axis,
                    &ipv_slab,
                    &u_slab,
                    &trop_row,
                    &surface_row,
                    t,
                    lon,
                );
                let south = detect_cell_guarded(
                    Hemisphere::South,
                    &self.cfg,
                    theta_axis,
                    lat_axis,
                    &ipv_slab,
                    &u_slab,
                    &trop_row,
                    &surface_row,
                    t,
                    lon,
                );
                (north, south)
            })
            .collect();

        let (north_row, south_row): (Vec<JetResult>, Vec<JetResult>) = per_lon.into_iter().unzip();
        let north_out = result::aggregate(self.cfg.zonal_opt, &north_row);
        let south_out = result::aggregate(self.cfg.zonal_opt, &south_row);
        (north_out, south_out)
    }
}

/// Indices of `lat_axis` belonging to `hemisphere` (lat >= 0 for North,
/// lat <= 0 for South), preserving the axis's own order.
fn hemisphere_indices(lat_axis: &Array1<f64>, hemisphere: Hemisphere) -> Vec<usize> {
    lat_axis
        .iter()
        .enumerate()
        .filter(|&(_, &lat)| match hemisphere {
            Hemisphere::North => lat >= 0.0,
            Hemisphere::South => lat <= 0.0,
        })
        .map(|(i, _)| i)
        .collect()
}

fn select_columns(slab: &Array2<f64>, idx: &[usize]) -> Array2<f64> {
    let n_theta = slab.shape()[0];
    let mut out = Array2::<f64>::zeros((n_theta, idx.len()));
    for (j, &i) in idx.iter().enumerate() {
        for k in 0..n_theta {
            out[(k, j)] = slab[(k, i)];
        }
    }
    out
}

fn closest_index(axis: &Array1<f64>, target: f64) -> usize {
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().partial_cmp(&(*b - target).abs()).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Linear interpolation over a sparse `(x, y)` curve, used for both the
/// shear lookup and the intensity readout.
fn interp_curve(curve: &[CurvePoint], at: f64) -> f64 {
    if curve.is_empty() {
        return f64::NAN;
    }
    if let Some(&(_, v)) = curve.iter().find(|(x, _)| *x == at) {
        return v;
    }
    for w in curve.windows(2) {
        let (x0, y0) = w[0];
        let (x1, y1) = w[1];
        let within = (x0 <= at && at <= x1) || (x1 <= at && at <= x0);
        if within && x1 != x0 {
            let frac = (at - x0) / (x1 - x0);
            return y0 + frac * (y1 - y0);
        }
    }
    f64::NAN
}

/// Wraps [`detect_cell`] at the cell boundary (spec.md §7): a transient
/// computation error in one cell — an internal invariant violation that
/// would otherwise panic the whole `rayon` pool — is caught, logged once
/// with `(time, longitude, hemisphere)`, and downgraded to the sentinel,
/// so one bad cell never takes the rest of the run down with it.
#[allow(clippy::too_many_arguments)]
fn detect_cell_guarded(
    hemisphere: Hemisphere,
    cfg: &Config,
    theta_axis: &Array1<f64>,
    lat_axis: &Array1<f64>,
    ipv_slab: &Array2<f64>,
    u_slab: &Array2<f64>,
    trop_row: &Array1<f64>,
    surface_row: &Array1<f64>,
    t: usize,
    lon: usize,
) -> JetResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        detect_cell(
            hemisphere,
            cfg,
            theta_axis,
            lat_axis,
            ipv_slab,
            u_slab,
            trop_row,
            surface_row,
        )
    }));
    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!("cell computation failed at t={t}, lon={lon}, hemisphere={hemisphere:?}; emitting sentinel");
            JetResult::missing(None)
        }
    }
}

/// Runs the full per-cell pipeline of spec.md §4 for one (hemisphere,
/// time, longitude) cell: extract, clean, fit, find the thermal
/// crossing, select the jet core, and read off intensity and level from
/// the *same* (φ, θ) pair the selector chose (spec.md §4.5's invariant).
#[allow(clippy::too_many_arguments)]
fn detect_cell(
    hemisphere: Hemisphere,
    cfg: &Config,
    theta_axis: &Array1<f64>,
    lat_axis: &Array1<f64>,
    ipv_slab: &Array2<f64>,
    u_slab: &Array2<f64>,
    trop_row: &Array1<f64>,
    surface_row: &Array1<f64>,
) -> JetResult {
    let idx = hemisphere_indices(lat_axis, hemisphere);
    if idx.len() < 3 {
        return JetResult::missing(None);
    }

    let sub_lat = Array1::from_iter(idx.iter().map(|&i| lat_axis[i]));
    let sub_ipv = select_columns(ipv_slab, &idx);
    let sub_u = select_columns(u_slab, &idx);
    let sub_trop = Array1::from_iter(idx.iter().map(|&i| trop_row[i]));
    let sub_surface = Array1::from_iter(idx.iter().map(|&i| surface_row[i]));

    let theta_domain: Vec<f64> = (0..cfg.theta_domain_len()).map(|i| cfg.theta_s + i as f64).collect();
    let pv_star = hemisphere.signed_pv(cfg.pv_value);

    let raw_curve = interp::extract_tropopause_curve(theta_axis, &sub_lat, &sub_ipv, pv_star, &theta_domain);
    let cleaned = cleaner::clean(hemisphere, &raw_curve);
    if cleaned.len() < cfg.fit_deg + 1 {
        return JetResult::missing(None);
    }

    let (lats, thetas): (Vec<f64>, Vec<f64>) = cleaned.iter().cloned().unzip();
    let fit = poly::fit(cfg.poly, &lats, &thetas, cfg.fit_deg);
    if fit.is_empty() {
        return JetResult::missing(None);
    }
    let slope = fit.derivative_curve(&lats);

    let trop_curve: Vec<CurvePoint> = sub_lat
        .iter()
        .zip(sub_trop.iter())
        .filter(|(_, t)| t.is_finite())
        .map(|(&l, &t)| (l, t))
        .collect();

    let crossing = match crossing::find_crossing(hemisphere, &trop_curve, &cleaned) {
        Some(c) => c,
        None => return JetResult::missing(None),
    };

    let u_on_curve = interp::sample_field_at_points(theta_axis, &sub_lat, &sub_u, &cleaned);
    let shear_curve: Vec<CurvePoint> = u_on_curve
        .iter()
        .map(|&(lat, u_val)| {
            let surf = sub_surface[closest_index(&sub_lat, lat)];
            (lat, u_val - surf)
        })
        .collect();

    let selected_lat = match selector::select(
        hemisphere,
        &lats,
        &slope,
        &shear_curve,
        crossing.cross_lat,
        cfg.min_lat,
        cfg.max_lat,
    ) {
        Some(lat) => lat,
        None => return JetResult::missing(Some(crossing.cross_lat)),
    };

    let intens = interp_curve(&u_on_curve, selected_lat);
    let theta_lev = fit.eval(selected_lat);

    JetResult::detected(selected_lat, intens, theta_lev, crossing.cross_lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IpvField, ThermalTropopause, WindField};
    use crate::grid::Grid;

    fn theta_fn(lat: f64) -> f64 {
        320.0 + lat + (0.02 / 3.0) * (lat - 30.0).powi(3)
    }

    fn trop_fn(lat: f64) -> f64 {
        if (13.0..=25.0).contains(&lat) {
            theta_fn(lat) - 5.0
        } else {
            theta_fn(lat) + 10.0
        }
    }

    fn synthetic_axes() -> (Array1<f64>, Array1<f64>) {
        let theta_axis = Array1::from((270..=440).step_by(2).map(|v| v as f64).collect::<Vec<_>>());
        let lat_axis = Array1::from((10..=50).map(|v| v as f64).collect::<Vec<_>>());
        (theta_axis, lat_axis)
    }

    #[test]
    fn single_jet_is_found_with_consistent_intensity_and_level() {
        let (theta_axis, lat_axis) = synthetic_axes();
        let n_theta = theta_axis.len();
        let n_lat = lat_axis.len();

        let mut ipv = Array2::<f64>::zeros((n_theta, n_lat));
        let mut u = Array2::<f64>::zeros((n_theta, n_lat));
        for (ti, &theta) in theta_axis.iter().enumerate() {
            for (li, &lat) in lat_axis.iter().enumerate() {
                ipv[(ti, li)] = (theta - theta_fn(lat)) / 5.0 + 2.0;
                u[(ti, li)] = 60.0 - 0.05 * (theta - 350.0);
            }
        }
        let trop_row: Array1<f64> = lat_axis.mapv(trop_fn);
        let surface_row = Array1::<f64>::from_elem(n_lat, 10.0);

        let cfg = Config::default();
        let result = detect_cell(
            Hemisphere::North,
            &cfg,
            &theta_axis,
            &lat_axis,
            &ipv,
            &u,
            &trop_row,
            &surface_row,
        );

        let lat = result.lat.expect("a jet should have been detected");
        assert!((lat - 30.0).abs() < 2.0, "jet lat {lat} far from expected 30");
        assert!(result.cross_lat.unwrap() < lat);

        let theta_lev = result.theta_lev.unwrap();
        let intens = result.intens.unwrap();
        let expected_intens = 60.0 - 0.05 * (theta_lev - 350.0);
        assert!(
            (intens - expected_intens).abs() < 1.0,
            "intensity {intens} not read from the same (lat, theta) pair as theta_lev {theta_lev}"
        );
    }

    #[test]
    fn flat_ipv_field_yields_no_jet() {
        let (theta_axis, lat_axis) = synthetic_axes();
        let n_theta = theta_axis.len();
        let n_lat = lat_axis.len();
        // IPV never reaches pv_star anywhere: no tropopause curve at all.
        let ipv = Array2::<f64>::from_elem((n_theta, n_lat), 0.5);
        let u = Array2::<f64>::zeros((n_theta, n_lat));
        let trop_row = Array1::<f64>::from_elem(n_lat, 340.0);
        let surface_row = Array1::<f64>::from_elem(n_lat, 10.0);

        let cfg = Config::default();
        let result = detect_cell(
            Hemisphere::North,
            &cfg,
            &theta_axis,
            &lat_axis,
            &ipv,
            &u,
            &trop_row,
            &surface_row,
        );
        assert!(result.is_missing());
    }

    #[test]
    fn run_timestep_produces_one_row_per_longitude_by_default() {
        let (theta_axis, lat_axis) = synthetic_axes();
        let n_theta = theta_axis.len();
        let n_lat = lat_axis.len();
        let n_lon = 2;
        let time = vec![hifitime::Epoch::from_mjd_utc(59000.0)];
        let lon = Array1::from(vec![0.0, 90.0]);

        let grid = Grid::new(lat_axis.clone(), lon, theta_axis.clone(), time).unwrap();

        let mut ipv_data = ndarray::Array4::<f64>::zeros((1, n_theta, n_lat, n_lon));
        let mut u_data = ndarray::Array4::<f64>::zeros((1, n_theta, n_lat, n_lon));
        for (ti, &theta) in theta_axis.iter().enumerate() {
            for (li, &lat) in lat_axis.iter().enumerate() {
                for lo in 0..n_lon {
                    ipv_data[(0, ti, li, lo)] = (theta - theta_fn(lat)) / 5.0 + 2.0;
                    u_data[(0, ti, li, lo)] = 60.0 - 0.05 * (theta - 350.0);
                }
            }
        }
        let ipv = IpvField::new(ipv_data, &grid).unwrap();
        let uwnd = WindField::new(u_data, &grid).unwrap();
        let trop_data = ndarray::Array2::from_shape_fn((1, n_lat), |(_, li)| trop_fn(lat_axis[li]));
        let tropopause = ThermalTropopause::new(trop_data, &grid).unwrap();

        let slice = InputSlice { grid, ipv, uwnd, tropopause };

        let driver = Driver::new(Config::default()).unwrap();
        let (north, _south) = driver.run_timestep(&slice, 0);
        assert_eq!(north.len(), 2);
        for cell in &north {
            assert!(!cell.is_missing());
        }
    }
}

//! Field data: IPV, zonal wind, and the externally supplied thermal
//! tropopause, plus the column-extraction helpers the interpolator and
//! selector operate on.

use crate::error::GridError;
use crate::grid::Grid;
use ndarray::{Array1, Array2, Array4};

/// Ertel's isentropic potential vorticity, indexed (time, theta, lat,
/// lon), in PVU. May contain non-finite values below the surface.
#[derive(Debug, Clone)]
pub struct IpvField {
    data: Array4<f64>,
}

impl IpvField {
    pub fn new(data: Array4<f64>, grid: &Grid) -> Result<Self, GridError> {
        check_shape(
            "ipv",
            data.shape(),
            &[grid.time.len(), grid.theta.len(), grid.lat.len(), grid.lon.len()],
        )?;
        Ok(Self { data })
    }

    /// The IPV column at a single (time, lat, lon) cell, one value per
    /// theta level, in theta-ascending order.
    pub fn column(&self, t: usize, lat: usize, lon: usize) -> Array1<f64> {
        self.data.slice(ndarray::s![t, .., lat, lon]).to_owned()
    }

    /// IPV slab for a single (time, lon) cell, shape (theta, lat).
    pub fn column_slab(&self, t: usize, lon: usize) -> Array2<f64> {
        self.data.slice(ndarray::s![t, .., .., lon]).to_owned()
    }

    /// Zonal mean IPV at a single time, shape (theta, lat).
    pub fn zonal_mean(&self, t: usize) -> Array2<f64> {
        let slab = self.data.slice(ndarray::s![t, .., .., ..]);
        let (n_theta, n_lat, n_lon) = (slab.shape()[0], slab.shape()[1], slab.shape()[2]);
        let mut out = Array2::<f64>::zeros((n_theta, n_lat));
        for k in 0..n_theta {
            for j in 0..n_lat {
                let mut sum = 0.0;
                let mut count = 0usize;
                for i in 0..n_lon {
                    let v = slab[(k, j, i)];
                    if v.is_finite() {
                        sum += v;
                        count += 1;
                    }
                }
                out[(k, j)] = if count > 0 { sum / count as f64 } else { f64::NAN };
            }
        }
        out
    }
}

/// Zonal wind u(time, theta, lat, lon), m/s.
#[derive(Debug, Clone)]
pub struct WindField {
    data: Array4<f64>,
}

impl WindField {
    pub fn new(data: Array4<f64>, grid: &Grid) -> Result<Self, GridError> {
        check_shape(
            "uwnd",
            data.shape(),
            &[grid.time.len(), grid.theta.len(), grid.lat.len(), grid.lon.len()],
        )?;
        Ok(Self { data })
    }

    pub fn column(&self, t: usize, lat: usize, lon: usize) -> Array1<f64> {
        self.data.slice(ndarray::s![t, .., lat, lon]).to_owned()
    }

    /// Wind slab for a single (time, lon) cell, shape (theta, lat).
    pub fn column_slab(&self, t: usize, lon: usize) -> Array2<f64> {
        self.data.slice(ndarray::s![t, .., .., lon]).to_owned()
    }

    /// Lowest theta level at which `u` is finite: the "surface proxy"
    /// used by the shear computation (spec.md §4.5).
    pub fn surface_proxy(&self, t: usize, lat: usize, lon: usize) -> Option<f64> {
        let col = self.column(t, lat, lon);
        col.iter().copied().find(|v| v.is_finite())
    }

    /// `surface_proxy` for every latitude in one (time, lon) column.
    pub fn surface_proxy_row(&self, t: usize, n_lat: usize, lon: usize) -> Array1<f64> {
        Array1::from_iter((0..n_lat).map(|lat| self.surface_proxy(t, lat, lon).unwrap_or(f64::NAN)))
    }
}

/// Thermal tropopause theta(time, lat) in Kelvin, supplied by an
/// external collaborator (spec.md §3/§6).
#[derive(Debug, Clone)]
pub struct ThermalTropopause {
    data: Array2<f64>,
}

impl ThermalTropopause {
    pub fn new(data: Array2<f64>, grid: &Grid) -> Result<Self, GridError> {
        check_shape("tropH_theta", data.shape(), &[grid.time.len(), grid.lat.len()])?;
        Ok(Self { data })
    }

    /// theta_trop(phi) row for a single time step.
    pub fn row(&self, t: usize) -> Array1<f64> {
        self.data.slice(ndarray::s![t, ..]).to_owned()
    }
}

fn check_shape(field: &'static str, found: &[usize], expected: &[usize]) -> Result<(), GridError> {
    if found == expected {
        Ok(())
    } else {
        Err(GridError::ShapeMismatch {
            field,
            found: found.to_vec(),
            expected: expected.to_vec(),
        })
    }
}

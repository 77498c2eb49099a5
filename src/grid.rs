//! Grid axes and the hemisphere dispatch tag.
//!
//! Replaces the source's inheritance-based hemisphere dispatch (spec.md
//! §9) with a small enum carrying everything orientation-dependent: the
//! sign of the target PV isosurface, the extremum predicate, and the
//! monotonicity direction the cleaner must enforce.

use crate::error::GridError;
use hifitime::Epoch;
use ndarray::Array1;

/// One monotonic 1-D coordinate axis (latitude, longitude, theta, or time).
#[derive(Debug, Clone, PartialEq)]
pub struct Axis1d {
    values: Array1<f64>,
}

impl Axis1d {
    /// Builds an axis, checking it is non-empty and strictly monotonic
    /// (either direction).
    pub fn new(name: &'static str, values: Array1<f64>) -> Result<Self, GridError> {
        if values.is_empty() {
            return Err(GridError::EmptyAxis { axis: name });
        }
        let ascending = values[0] < values[values.len() - 1];
        let monotonic = values.windows(2).into_iter().all(|w| {
            if ascending {
                w[0] < w[1]
            } else {
                w[0] > w[1]
            }
        });
        if !monotonic {
            return Err(GridError::NotMonotonic { axis: name });
        }
        Ok(Self { values })
    }

    /// Builds a strictly ascending axis, as required for the theta
    /// (isentropic level) coordinate specifically.
    pub fn new_ascending(name: &'static str, values: Array1<f64>) -> Result<Self, GridError> {
        let axis = Self::new(name, values)?;
        if axis.values[0] > axis.values[axis.values.len() - 1] {
            return Err(GridError::ThetaNotAscending);
        }
        Ok(axis)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn get(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Linear index of the element closest to `target`.
    pub fn closest(&self, target: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, &v) in self.values.iter().enumerate() {
            let d = (v - target).abs();
            if d < best_dist {
                best_dist = d;
                best = i;
            }
        }
        best
    }
}

/// The calendar time axis. Kept as typed [`Epoch`]s rather than raw
/// floats so the CF-style time units spec.md §6 describes are resolved
/// once, at load time, by the I/O collaborator that builds the
/// [`Grid`] — nothing downstream parses a time unit string again.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    values: Vec<Epoch>,
}

impl TimeAxis {
    /// Builds a time axis, checking it is non-empty and strictly
    /// ascending (time never runs backwards or repeats a step).
    pub fn new(values: Vec<Epoch>) -> Result<Self, GridError> {
        if values.is_empty() {
            return Err(GridError::EmptyAxis { axis: "time" });
        }
        if values.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridError::NotMonotonic { axis: "time" });
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Epoch {
        self.values[i]
    }

    pub fn values(&self) -> &[Epoch] {
        &self.values
    }
}

/// The grid an [`crate::fields::IpvField`]/[`crate::fields::WindField`]
/// pair is defined over.
#[derive(Debug, Clone)]
pub struct Grid {
    pub lat: Axis1d,
    pub lon: Axis1d,
    pub theta: Axis1d,
    pub time: TimeAxis,
}

impl Grid {
    pub fn new(
        lat: Array1<f64>,
        lon: Array1<f64>,
        theta: Array1<f64>,
        time: Vec<Epoch>,
    ) -> Result<Self, GridError> {
        Ok(Self {
            lat: Axis1d::new("lat", lat)?,
            lon: Axis1d::new("lon", lon)?,
            theta: Axis1d::new_ascending("theta", theta)?,
            time: TimeAxis::new(time)?,
        })
    }
}

/// Tagged hemisphere dispatch: carries the sign of the target PV value,
/// the extremum predicate (min for NH, max for SH) and the monotonicity
/// orientation the cleaner enforces, so no branch elsewhere in the crate
/// needs to ask "which hemisphere is this?" more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Sign-adjusted PV* target for this hemisphere, given the configured
    /// magnitude (always positive in [`crate::config::Config::pv_value`]).
    pub fn signed_pv(&self, magnitude: f64) -> f64 {
        match self {
            Hemisphere::North => magnitude,
            Hemisphere::South => -magnitude,
        }
    }

    /// `true` if `next` is a valid successor to `prev` under this
    /// hemisphere's required latitude ordering (NH ascending, SH
    /// descending), per spec.md §4.3.
    pub fn orientation_ok(&self, prev: f64, next: f64) -> bool {
        match self {
            Hemisphere::North => next > prev,
            Hemisphere::South => next < prev,
        }
    }

    /// `true` if `candidate` lies on the poleward side of `cross_lat`,
    /// per spec.md §4.5 step 2.
    pub fn poleward_of(&self, candidate: f64, cross_lat: f64) -> bool {
        match self {
            Hemisphere::North => candidate >= cross_lat,
            Hemisphere::South => candidate <= cross_lat,
        }
    }

    /// Selects among interior local extrema of `dtheta/dphi`: NH jets
    /// sit at local minima of the slope, SH jets at local maxima
    /// (spec.md §4.5 step 1).
    pub fn is_extremum(&self, prev: f64, here: f64, next: f64) -> bool {
        match self {
            Hemisphere::North => here < prev && here < next,
            Hemisphere::South => here > prev && here > next,
        }
    }

    pub fn both() -> [Hemisphere; 2] {
        [Hemisphere::North, Hemisphere::South]
    }
}

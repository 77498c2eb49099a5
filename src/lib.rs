//! Subtropical jet detection from isentropic potential vorticity (IPV)
//! fields.
//!
//! Given a 4-D IPV field, a zonal wind field, and an externally supplied
//! thermal tropopause, this crate locates the latitude and potential
//! temperature of the dynamic (2 PVU) tropopause break that marks the
//! subtropical jet core, independently for each hemisphere and (time,
//! longitude) cell.
//!
//! The pipeline (see [`driver`]) is:
//! 1. [`interp`] extracts the dynamic tropopause as a (latitude, theta)
//!    curve by scanning a restricted theta domain for the configured PV
//!    isosurface.
//! 2. [`cleaner`] enforces strict latitude monotonicity.
//! 3. [`poly`] fits a polynomial to the cleaned curve and differentiates
//!    it.
//! 4. [`crossing`] locates where the dynamic tropopause crosses the
//!    thermal one.
//! 5. [`selector`] picks the jet-core latitude among the fit's interior
//!    extrema, breaking ties with vertical wind shear.
//!
//! [`driver::Driver`] is the entry point; [`io`] defines the dataset
//! traits a caller implements to supply input and receive output.

pub mod cleaner;
pub mod config;
pub mod crossing;
pub mod driver;
pub mod error;
pub mod fields;
pub mod grid;
pub mod interp;
pub mod io;
pub mod poly;
pub mod result;
pub mod selector;

/// Re-exports of the types most callers need, so `use stj_pv::prelude::*`
/// is enough to drive the detector end to end.
pub mod prelude {
    pub use crate::config::{Config, PolyBasis, ZonalOption};
    pub use crate::driver::Driver;
    pub use crate::error::{ConfigError, Error, GridError};
    pub use crate::fields::{IpvField, ThermalTropopause, WindField};
    pub use crate::grid::{Grid, Hemisphere, TimeAxis};
    pub use crate::io::{DatasetSink, DatasetSource, InputSlice};
    pub use crate::result::JetResult;
}

//! External I/O collaborator contract (spec.md §1, §6).
//!
//! NetCDF parsing/writing is explicitly out of scope for this crate —
//! spec.md frames it as "an external collaborator, referenced only
//! through its interface contract." These traits *are* that contract:
//! a dataset source that hands the driver one time-slice of the inputs
//! spec.md §6 lists, and a sink that accepts one row of detection
//! output per call. Downstream crates implement them against whatever
//! NetCDF/Zarr/in-memory backend they already have (the same pattern
//! the teacher crate uses for its SV-state interpolator: a callback
//! trait injected into the solver rather than a concrete dependency).

use crate::error::GridError;
use crate::fields::{IpvField, ThermalTropopause, WindField};
use crate::grid::Grid;
use crate::result::JetResult;

/// One fully loaded time-slice's worth of inputs, as spec.md §6
/// enumerates them.
pub struct InputSlice {
    pub grid: Grid,
    pub ipv: IpvField,
    pub uwnd: WindField,
    pub tropopause: ThermalTropopause,
}

/// Supplies input slices to the [`crate::driver::Driver`]. Axis
/// monotonicity and shape mismatches must be surfaced as
/// [`GridError`]s at load time (spec.md §7): "fails fast on load."
pub trait DatasetSource {
    /// Number of time steps available.
    fn time_steps(&self) -> usize;

    /// Loads the inputs needed to process time index `t`. A source may
    /// load the whole dataset up front and slice it here, or stream
    /// lazily; either is transparent to the driver.
    fn load(&self, t: usize) -> Result<InputSlice, GridError>;
}

/// Accepts detection output, keyed by (time, hemisphere, [longitude]),
/// per spec.md §6's output dataset contract. A sink implementation
/// decides how `lat_nh`/`lat_sh`/`intens_nh`/... variables are
/// physically written and how the configuration + commit identifier
/// global attributes are serialised.
pub trait DatasetSink {
    fn write_north(&mut self, t: usize, row: &[JetResult]);
    fn write_south(&mut self, t: usize, row: &[JetResult]);

    /// Called once after the full time loop completes, so the sink can
    /// flush buffered output and stamp global attributes.
    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        north: RefCell<Vec<(usize, Vec<JetResult>)>>,
        south: RefCell<Vec<(usize, Vec<JetResult>)>>,
        finalized: RefCell<bool>,
    }

    impl DatasetSink for RecordingSink {
        fn write_north(&mut self, t: usize, row: &[JetResult]) {
            self.north.borrow_mut().push((t, row.to_vec()));
        }
        fn write_south(&mut self, t: usize, row: &[JetResult]) {
            self.south.borrow_mut().push((t, row.to_vec()));
        }
        fn finalize(&mut self) {
            *self.finalized.borrow_mut() = true;
        }
    }

    #[test]
    fn sink_records_rows_per_hemisphere() {
        let mut sink = RecordingSink::default();
        sink.write_north(0, &[JetResult::detected(30.0, 40.0, 350.0, 10.0)]);
        sink.write_south(0, &[JetResult::missing(None)]);
        sink.finalize();
        assert_eq!(sink.north.borrow().len(), 1);
        assert_eq!(sink.south.borrow().len(), 1);
        assert!(*sink.finalized.borrow());
    }
}

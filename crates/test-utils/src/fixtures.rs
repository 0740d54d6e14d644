//! Common test fixtures for QuickView tests.
//!
//! This module provides pre-defined clip windows and session state files
//! that represent common scenarios.

/// Common clip windows as `([lon_min, lon_max], [lat_min, lat_max])`.
pub mod window {
    /// Whole globe
    pub const GLOBAL: ([f64; 2], [f64; 2]) = ([-180.0, 180.0], [-90.0, 90.0]);

    /// Northern hemisphere
    pub const NORTH: ([f64; 2], [f64; 2]) = ([-180.0, 180.0], [0.0, 90.0]);

    /// Tropical Pacific around the date line
    pub const PACIFIC: ([f64; 2], [f64; 2]) = ([120.0, 180.0], [-30.0, 30.0]);

    /// Window whose snapped extent is not a multiple of the interval
    pub const OFFSET: ([f64; 2], [f64; 2]) = ([-95.0, 25.0], [-10.0, 50.0]);

    /// Invalid window (min > max)
    pub const INVALID: ([f64; 2], [f64; 2]) = ([40.0, -40.0], [-90.0, 90.0]);
}

/// A state file saved with two variables where `T` was displayed first.
///
/// `TS` has a pinned color range of `[200, 320]` and an inverted colormap.
pub fn sample_state_json() -> &'static str {
    r#"{
  "data_file": "/data/eam.h0.nc",
  "conn_file": "/data/ne30pg2_scrip.nc",
  "tstamp": 1,
  "midpoint": 2,
  "interface": 3,
  "cliplat": [-60.0, 60.0],
  "cliplong": [-180.0, 180.0],
  "projection": "Robinson",
  "center": 0.0,
  "variables": ["T", "TS"],
  "varcolor": ["Jet", "Cool to Warm"],
  "uselogscale": [false, false],
  "invert": [false, true],
  "varmin": [null, 200.0],
  "varmax": [null, 320.0],
  "override_range": [false, true],
  "varaverage": [251.5, 287.25],
  "use_cvd_colors": false,
  "use_standard_colors": true,
  "layout": [
    {"x": 4, "y": 0, "w": 4, "h": 3, "i": 0},
    {"x": 0, "y": 0, "w": 4, "h": 3, "i": 1}
  ]
}"#
}

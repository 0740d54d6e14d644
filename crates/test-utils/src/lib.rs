//! Shared test utilities for the QuickView workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Layered mesh generators (cell-corner and shared-point layouts)
//! - Test data path helpers and skip macros for optional NetCDF files
//! - Common fixtures (clip windows, state files)
//! - Approximate-equality assertion macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{layered_band_mesh, assert_approx_eq};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_reads_eam_file() {
///     let path = require_test_file!("eam_sample.nc");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f64, 1.0_f64, 0.001_f64);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of 3D points.
///
/// ```ignore
/// use test_utils::assert_points_approx_eq;
///
/// assert_points_approx_eq!([1.0001, 2.0, 0.0], [1.0, 2.0, 0.0], 0.001);
/// ```
#[macro_export]
macro_rules! assert_points_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: [f64; 3] = $left;
        let right: [f64; 3] = $right;
        for axis in 0..3 {
            $crate::assert_approx_eq!(left[axis], right[axis], $epsilon);
        }
    }};
}

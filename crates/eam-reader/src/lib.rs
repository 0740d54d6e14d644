//! Readers for EAM atmosphere output on cubed-sphere physics grids.
//!
//! A reader is bound to a data file and a connectivity file, then produces
//! three meshes per update:
//!
//! - **surface**: one quad per column, carrying 2D variables and `area`
//! - **midpoint**: the surface quads stacked once per `lev` value
//! - **interface**: the surface quads stacked once per `ilev` value
//!
//! Errors never escape `update`; they are reported to attached
//! [`ErrorObserver`]s which the owner polls.
//!
//! # Feature Flags
//!
//! - `native`: [`NetCdfReader`] reading files with libnetcdf
//!   (requires libnetcdf and libhdf5 to be installed)

pub mod error;
pub mod observer;
pub mod reader;
pub mod synthetic;

#[cfg(feature = "native")]
pub mod native;

pub use error::{ReaderError, ReaderResult};
pub use observer::{ErrorObserver, ObserverList};
pub use reader::{classify_dimensions, DataReader, RawDataset, ReaderOutput, ReaderState, AREA_FIELD};
pub use synthetic::{SyntheticDataset, SyntheticReader, SyntheticVariable};

#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NetCdfReader};

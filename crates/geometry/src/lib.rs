//! Mesh reconstruction for layered atmosphere grids.
//!
//! The reader hands out meshes made of `numLayers` stacked copies of the
//! horizontal quad grid, bottom layer first. This crate turns them into the
//! shapes the views need:
//!
//! ```text
//! layered quads ──► extract_layer_range ──► one slice ──► transform_and_extract ──► projector
//!       │
//!       └────────► volumize ──► hexahedral column mesh
//!
//! globe_outline / coastlines ──► clip_polylines ──► projector
//! GridlineGenerator ──────────────────────────────► projector
//! ```
//!
//! All operations return new meshes; inputs are never modified.

pub mod clean;
pub mod clip;
pub mod extract;
pub mod gridlines;
pub mod layers;
pub mod outline;
pub mod stack;
pub mod volumize;

pub use clean::clean;
pub use clip::{clip_polylines, normalize_longitude, transform_and_extract};
pub use extract::extract_layer_range;
pub use gridlines::{
    graticule_labels, GraticuleLabel, GridlineGenerator, LabelAxis, SnappedWindow,
    DEFAULT_INTERVAL,
};
pub use layers::{layer_count, LayerLayout};
pub use outline::{globe_outline, load_coastlines, polylines_from_lonlat, DEFAULT_OUTLINE_SAMPLES};
pub use stack::{stack_layer_mesh, stack_layer_points};
pub use volumize::{volumize, volumize_layers};

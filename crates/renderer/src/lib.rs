//! Rendering for QuickView views.
//!
//! The view manager talks to a [`RenderBackend`]: render targets with
//! orthographic cameras, representations of live [`MeshSource`]s, and one
//! color transfer function per variable name. [`HeadlessBackend`] is a
//! software implementation that rasterizes to RGBA images.
//!
//! Colormaps come from a [`PresetTable`] (built-in presets plus ParaView
//! JSON preset files). Colorbars are encoded as PNG data URIs by the
//! in-tree [`png`] encoder.

pub mod backend;
pub mod camera;
pub mod colorbar;
pub mod colormap;
pub mod error;
pub mod headless;
pub mod png;
pub mod transfer;

pub use backend::{Image, MeshSource, RenderBackend, RepresentationId, RepresentationStyle, TargetId};
pub use camera::{Camera, CAMERA_DISTANCE};
pub use colorbar::{colorbar_png, png_data_uri, ColorbarCache, COLORBAR_SAMPLES};
pub use colormap::{Color, ColorPreset, PresetGroup, PresetPoint, PresetTable, DEFAULT_COLORMAP};
pub use error::{RenderError, RenderResult};
pub use headless::{finite_range, HeadlessBackend};
pub use transfer::ColorTransferFunction;

//! The QuickView data pipeline.
//!
//! ```text
//! reader ──► surface + layer slices ──► transform_and_extract ──► project ──► data port
//! globe outline ──► clip_polylines ──────────────────────────────► project ──► globe port
//! GridlineGenerator (data extents) ──────────────────────────────► project ──► gridlines port
//! ```
//!
//! Ports are shared handles: render representations bind to them once and
//! see each newly published mesh.

pub mod config;
pub mod pipeline;
pub mod port;
pub mod status;

pub use config::PipelineConfig;
pub use pipeline::Pipeline;
pub use port::{OutputPort, OutputPorts, DATA_PORT, GLOBE_PORT, GRIDLINES_PORT};
pub use status::PipelineStatus;

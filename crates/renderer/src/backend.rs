//! The renderer contract consumed by the view manager.

use std::sync::Arc;

use quickview_common::Mesh;

use crate::camera::Camera;
use crate::colormap::PresetTable;
use crate::error::RenderResult;
use crate::transfer::ColorTransferFunction;

pub type TargetId = u64;
pub type RepresentationId = u64;

/// A named mesh whose content may be replaced between renders.
///
/// Representations hold the source, not a copy, so they always draw the
/// current content.
pub trait MeshSource: Send + Sync {
    fn name(&self) -> &str;

    fn current(&self) -> Arc<Mesh>;
}

/// How a representation draws its mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum RepresentationStyle {
    /// Filled cells colored through the transfer function of the
    /// color-by field.
    Surface,
    /// Cell edges and polylines in a constant color.
    Wireframe {
        color: [f64; 3],
        opacity: f64,
        line_width: f64,
    },
}

impl RepresentationStyle {
    /// Gray lines used for the globe outline and graticule.
    pub fn overlay(opacity: f64) -> Self {
        RepresentationStyle::Wireframe {
            color: [0.67, 0.67, 0.67],
            opacity,
            line_width: 1.0,
        }
    }
}

/// An RGBA image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, background: [u8; 4]) -> Self {
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take(width * height * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        crate::png::encode_png(&self.pixels, self.width, self.height)
    }
}

/// Render targets, representations, named transfer functions and cameras.
///
/// Transfer functions are keyed by name (the variable name) and created on
/// first access with the default colormap. Disposing a target is idempotent.
pub trait RenderBackend {
    fn create_target(&mut self) -> TargetId;

    fn has_target(&self, target: TargetId) -> bool;

    /// Dispose a target and its representations. Unknown ids are ignored.
    fn dispose_target(&mut self, target: TargetId);

    fn show(
        &mut self,
        source: Arc<dyn MeshSource>,
        target: TargetId,
        style: RepresentationStyle,
    ) -> RenderResult<RepresentationId>;

    /// Color a representation by a cell field, or clear with `None`.
    fn color_by(&mut self, rep: RepresentationId, field: Option<&str>) -> RenderResult<()>;

    fn presets(&self) -> &PresetTable;

    fn transfer_function(&mut self, name: &str) -> &mut ColorTransferFunction;

    /// Rescale the color-by transfer function to the finite range of the
    /// representation's current field and return that range.
    fn rescale_to_data_range(&mut self, rep: RepresentationId) -> RenderResult<Option<[f64; 2]>>;

    fn camera(&self, target: TargetId) -> RenderResult<&Camera>;

    fn camera_mut(&mut self, target: TargetId) -> RenderResult<&mut Camera>;

    /// Make `target` share `leader`'s camera.
    fn link_camera(&mut self, target: TargetId, leader: TargetId) -> RenderResult<()>;

    /// Viewport size in pixels.
    fn view_size(&self, target: TargetId) -> RenderResult<(usize, usize)>;

    fn set_view_size(&mut self, target: TargetId, width: usize, height: usize) -> RenderResult<()>;

    fn render(&mut self, target: TargetId) -> RenderResult<Image>;
}

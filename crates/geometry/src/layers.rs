//! Layer bookkeeping for meshes stored as stacked 2D blocks.

use quickview_common::mesh::{LEVELS_KEY, NUM_LEVELS_KEY};
use quickview_common::{Mesh, QuickViewError, QvResult};

/// Sizes of a mesh made of `num_layers` contiguous 2D blocks, bottom layer first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerLayout {
    pub num_layers: usize,
    pub points_2d: usize,
    pub cells_2d: usize,
}

impl LayerLayout {
    /// Split `mesh` into `num_layers` equal blocks.
    ///
    /// Fails with a shape error when the layer count is zero or does not
    /// divide the point and cell counts evenly.
    pub fn new(mesh: &Mesh, num_layers: usize) -> QvResult<Self> {
        if num_layers == 0 {
            return Err(QuickViewError::shape("layer count must be at least 1"));
        }
        let n_points = mesh.num_points();
        let n_cells = mesh.num_cells();
        if n_points % num_layers != 0 {
            return Err(QuickViewError::shape(format!(
                "{} points do not split into {} layers",
                n_points, num_layers
            )));
        }
        if n_cells % num_layers != 0 {
            return Err(QuickViewError::shape(format!(
                "{} cells do not split into {} layers",
                n_cells, num_layers
            )));
        }
        Ok(Self {
            num_layers,
            points_2d: n_points / num_layers,
            cells_2d: n_cells / num_layers,
        })
    }

    /// Layout from the layer count recorded in the mesh's field data.
    pub fn discover(mesh: &Mesh) -> QvResult<Self> {
        Self::new(mesh, layer_count(mesh)?)
    }

    /// Half-open point index range of layers `min..=max`.
    pub fn point_range(&self, min: usize, max: usize) -> std::ops::Range<usize> {
        min * self.points_2d..(max + 1) * self.points_2d
    }

    /// Half-open cell index range of layers `min..=max`.
    pub fn cell_range(&self, min: usize, max: usize) -> std::ops::Range<usize> {
        min * self.cells_2d..(max + 1) * self.cells_2d
    }
}

/// Number of stacked layers recorded on `mesh`.
///
/// Reads `numlev`, falling back to the length of `lev`.
pub fn layer_count(mesh: &Mesh) -> QvResult<usize> {
    if let Some(n) = mesh.field_scalar(NUM_LEVELS_KEY) {
        if n.is_finite() && n >= 1.0 && n.fract() == 0.0 {
            return Ok(n as usize);
        }
        return Err(QuickViewError::shape(format!(
            "field '{}' holds {} which is not a layer count",
            NUM_LEVELS_KEY, n
        )));
    }
    match mesh.field_data.get(LEVELS_KEY) {
        Some(levels) if !levels.is_empty() => Ok(levels.len()),
        _ => Err(QuickViewError::shape(format!(
            "mesh has neither '{}' nor '{}' field data",
            NUM_LEVELS_KEY, LEVELS_KEY
        ))),
    }
}

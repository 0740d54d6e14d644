//! Unstructured mesh data model.
//!
//! Meshes hold points, typed cells in a flat connectivity array (offsets into
//! one index buffer, as VTK lays them out), and three families of named
//! scalar arrays: per-point, per-cell and small auxiliary field data such as
//! the vertical level coordinates of a layered grid.
//!
//! Missing values in scalar arrays are represented as `NaN`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{QuickViewError, QvResult};

/// Prefix of renderer-internal bookkeeping arrays. Arrays with this prefix
/// are never treated as scientific data.
pub const RESERVED_PREFIX: &str = "vtk";

/// Field data key holding the number of stacked layers.
pub const NUM_LEVELS_KEY: &str = "numlev";

/// Field data key holding the per-layer vertical coordinate.
pub const LEVELS_KEY: &str = "lev";

/// Named scalar arrays.
pub type FieldMap = BTreeMap<String, Vec<f64>>;

/// Cell kinds produced by the geometry pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Quad,
    Hexahedron,
    PolyLine,
}

impl CellType {
    /// VTK cell type code.
    pub fn vtk_code(&self) -> u8 {
        match self {
            CellType::PolyLine => 4,
            CellType::Quad => 9,
            CellType::Hexahedron => 12,
        }
    }

    /// Number of points per cell, or `None` for variable-length cells.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            CellType::Quad => Some(4),
            CellType::Hexahedron => Some(8),
            CellType::PolyLine => None,
        }
    }

    /// Fewest distinct points a non-degenerate cell of this kind can have.
    pub fn min_distinct_points(&self) -> usize {
        match self {
            CellType::PolyLine => 2,
            CellType::Quad | CellType::Hexahedron => 3,
        }
    }
}

/// Cell connectivity: one type per cell plus offsets into a flat index buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    types: Vec<CellType>,
    offsets: Vec<usize>,
    connectivity: Vec<usize>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    pub fn with_capacity(cells: usize, connectivity: usize) -> Self {
        let mut offsets = Vec::with_capacity(cells + 1);
        offsets.push(0);
        Self {
            types: Vec::with_capacity(cells),
            offsets,
            connectivity: Vec::with_capacity(connectivity),
        }
    }

    /// Build cells of a single fixed-size kind from a flat index buffer.
    pub fn uniform(kind: CellType, connectivity: Vec<usize>) -> QvResult<Self> {
        let per_cell = kind.fixed_size().ok_or_else(|| {
            QuickViewError::shape(format!("{:?} cells have no fixed size", kind))
        })?;
        if connectivity.len() % per_cell != 0 {
            return Err(QuickViewError::shape(format!(
                "connectivity length {} is not a multiple of {} for {:?} cells",
                connectivity.len(),
                per_cell,
                kind
            )));
        }
        let n = connectivity.len() / per_cell;
        Ok(Self {
            types: vec![kind; n],
            offsets: (0..=n).map(|i| i * per_cell).collect(),
            connectivity,
        })
    }

    /// Sequential quads `[4c, 4c+1, 4c+2, 4c+3]` for `n` cells.
    pub fn sequential_quads(n: usize) -> Self {
        Self {
            types: vec![CellType::Quad; n],
            offsets: (0..=n).map(|i| i * 4).collect(),
            connectivity: (0..n * 4).collect(),
        }
    }

    pub fn push(&mut self, kind: CellType, ids: &[usize]) {
        self.types.push(kind);
        self.connectivity.extend_from_slice(ids);
        self.offsets.push(self.connectivity.len());
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn cell_type(&self, cell: usize) -> CellType {
        self.types[cell]
    }

    pub fn point_ids(&self, cell: usize) -> &[usize] {
        &self.connectivity[self.offsets[cell]..self.offsets[cell + 1]]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellType, &[usize])> + '_ {
        (0..self.len()).map(move |c| (self.types[c], self.point_ids(c)))
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    pub fn max_point_id(&self) -> Option<usize> {
        self.connectivity.iter().copied().max()
    }

    /// True when every cell has type `kind`.
    pub fn is_homogeneous(&self, kind: CellType) -> bool {
        self.types.iter().all(|t| *t == kind)
    }
}

/// A mesh with points, cells and attached scalar arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub points: Vec<[f64; 3]>,
    pub cells: CellArray,
    pub point_data: FieldMap,
    pub cell_data: FieldMap,
    pub field_data: FieldMap,
}

impl Mesh {
    pub fn new(points: Vec<[f64; 3]>, cells: CellArray) -> Self {
        Self {
            points,
            cells,
            ..Default::default()
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.cells.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.points)
    }

    /// Whether `name` is renderer-internal bookkeeping.
    pub fn is_reserved(name: &str) -> bool {
        name.starts_with(RESERVED_PREFIX)
    }

    /// First value of a field data entry, if present.
    pub fn field_scalar(&self, name: &str) -> Option<f64> {
        self.field_data.get(name).and_then(|v| v.first().copied())
    }

    /// Cell arrays that carry scientific data (reserved names skipped).
    pub fn scientific_cell_fields(&self) -> impl Iterator<Item = (&String, &Vec<f64>)> {
        self.cell_data.iter().filter(|(name, _)| !Self::is_reserved(name))
    }

    /// Check the structural invariants: every cell array has one value per
    /// cell, every point array one value per point, and all connectivity
    /// indices address existing points.
    pub fn validate(&self) -> QvResult<()> {
        let n_points = self.num_points();
        let n_cells = self.num_cells();

        for (name, values) in &self.cell_data {
            if values.len() != n_cells {
                return Err(QuickViewError::shape(format!(
                    "cell array '{}' has {} values for {} cells",
                    name,
                    values.len(),
                    n_cells
                )));
            }
        }
        for (name, values) in &self.point_data {
            if values.len() != n_points {
                return Err(QuickViewError::shape(format!(
                    "point array '{}' has {} values for {} points",
                    name,
                    values.len(),
                    n_points
                )));
            }
        }
        if let Some(max_id) = self.cells.max_point_id() {
            if max_id >= n_points {
                return Err(QuickViewError::shape(format!(
                    "connectivity references point {} but mesh has {} points",
                    max_id, n_points
                )));
            }
        }
        for (c, (kind, ids)) in self.cells.iter().enumerate() {
            if let Some(size) = kind.fixed_size() {
                if ids.len() != size {
                    return Err(QuickViewError::shape(format!(
                        "cell {} is a {:?} with {} points",
                        c,
                        kind,
                        ids.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

//! Stacking layered quads into hexahedral volumes.

use rayon::prelude::*;
use tracing::{debug, info};

use quickview_common::mesh::CellArray;
use quickview_common::{CellType, Mesh, QuickViewError, QvResult};

use crate::clean::clean;
use crate::layers::LayerLayout;

/// Minimum field length before averaging fans out to the thread pool.
const PARALLEL_THRESHOLD: usize = 65_536;

/// Build `numLayers - 1` layers of hexahedra from a layered quad mesh.
///
/// The layer count is read from the mesh's field data. Each hexahedron of
/// stack `i` takes the quad corners of layer `i` as its lower face and the
/// same corners in layer `i + 1` as its upper face. Cell fields become the
/// mean of the two adjacent layers; points and point fields are kept.
/// The result is cleaned before it is returned.
pub fn volumize(mesh: &Mesh) -> QvResult<Mesh> {
    let layout = LayerLayout::discover(mesh)?;
    volumize_with(mesh, layout)
}

/// [`volumize`] with an explicit layer count.
pub fn volumize_layers(mesh: &Mesh, num_layers: usize) -> QvResult<Mesh> {
    volumize_with(mesh, LayerLayout::new(mesh, num_layers)?)
}

fn volumize_with(mesh: &Mesh, layout: LayerLayout) -> QvResult<Mesh> {
    let LayerLayout {
        num_layers,
        points_2d,
        cells_2d,
    } = layout;

    // Layer 0 cells define the column connectivity for every layer
    let mut base = Vec::with_capacity(cells_2d * 4);
    for c in 0..cells_2d {
        let kind = mesh.cells.cell_type(c);
        if kind != CellType::Quad {
            return Err(QuickViewError::shape(format!(
                "cell {} is a {:?}; only quads can be stacked",
                c, kind
            )));
        }
        let ids = mesh.cells.point_ids(c);
        if let Some(bad) = ids.iter().find(|i| **i >= points_2d) {
            return Err(QuickViewError::shape(format!(
                "bottom-layer cell {} references point {} outside the first {} points",
                c, bad, points_2d
            )));
        }
        base.extend_from_slice(ids);
    }

    let stacks = num_layers - 1;
    let mut connectivity = Vec::with_capacity(stacks * cells_2d * 8);
    for i in 0..stacks {
        let lower = i * points_2d;
        let upper = (i + 1) * points_2d;
        for quad in base.chunks_exact(4) {
            connectivity.extend(quad.iter().map(|p| p + lower));
            connectivity.extend(quad.iter().map(|p| p + upper));
        }
    }
    let cells = CellArray::uniform(CellType::Hexahedron, connectivity)?;

    let mut out = Mesh::new(mesh.points.clone(), cells);
    for (name, values) in &mesh.cell_data {
        if values.len() != mesh.num_cells() {
            return Err(QuickViewError::shape(format!(
                "cell array '{}' has {} values for {} cells",
                name,
                values.len(),
                mesh.num_cells()
            )));
        }
        out.cell_data
            .insert(name.clone(), average_adjacent_layers(values, cells_2d, stacks));
    }
    out.point_data = mesh.point_data.clone();
    out.field_data = mesh.field_data.clone();

    debug!(
        layers = num_layers,
        cells_2d = cells_2d,
        hexahedra = out.num_cells(),
        "Volumized layered mesh"
    );

    let cleaned = clean(&out);
    info!(
        points = cleaned.num_points(),
        cells = cleaned.num_cells(),
        "Built volume mesh"
    );
    Ok(cleaned)
}

/// `(layer[i] + layer[i + 1]) / 2` for each of `stacks` adjacent layer pairs.
fn average_adjacent_layers(values: &[f64], cells_2d: usize, stacks: usize) -> Vec<f64> {
    let n = stacks * cells_2d;
    let mean = |j: usize| (values[j] + values[j + cells_2d]) / 2.0;
    if n >= PARALLEL_THRESHOLD {
        (0..n).into_par_iter().map(mean).collect()
    } else {
        (0..n).map(mean).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{layered_band_mesh, layered_corner_mesh};

    #[test]
    fn test_hex_count() {
        let mesh = layered_band_mesh(4, 10, 10);
        let vol = volumize(&mesh).unwrap();
        assert_eq!(vol.num_cells(), 3 * 90);
        assert!(vol.cells.is_homogeneous(CellType::Hexahedron));
        assert!(vol.num_points() <= 400);
        assert!(vol.validate().is_ok());
    }

    #[test]
    fn test_hex_faces_line_up() {
        let mesh = layered_band_mesh(3, 10, 3);
        let vol = volumize_layers(&mesh, 3).unwrap();
        // shared-point band has no duplicates, so clean keeps numbering
        assert_eq!(vol.num_points(), mesh.num_points());
        let hex = vol.cells.point_ids(0);
        let quad = mesh.cells.point_ids(0);
        assert_eq!(&hex[..4], quad);
        let upper: Vec<usize> = quad.iter().map(|p| p + 30).collect();
        assert_eq!(&hex[4..], upper.as_slice());
    }

    #[test]
    fn test_cell_fields_averaged() {
        let mesh = layered_band_mesh(3, 10, 3);
        let vol = volumize(&mesh).unwrap();
        // T = layer * 1000 + cell
        assert_eq!(vol.cell_data["T"][0], 500.0);
        assert_eq!(vol.cell_data["T"][20 + 5], 1505.0);
    }

    #[test]
    fn test_point_fields_carried() {
        let mesh = layered_band_mesh(2, 10, 3);
        let vol = volumize(&mesh).unwrap();
        assert_eq!(vol.point_data["h"], mesh.point_data["h"]);
    }

    #[test]
    fn test_corner_layout_merges_columns() {
        let mesh = layered_corner_mesh(2, 4, 2);
        let vol = volumize(&mesh).unwrap();
        assert_eq!(vol.num_cells(), 8);
        assert!(vol.num_points() < mesh.num_points());
        assert!(vol.validate().is_ok());
    }

    #[test]
    fn test_single_layer_has_no_hexes() {
        let mesh = layered_band_mesh(1, 10, 3);
        let vol = volumize(&mesh).unwrap();
        assert_eq!(vol.num_cells(), 0);
    }

    #[test]
    fn test_bottom_layer_must_be_local() {
        let mut mesh = layered_band_mesh(2, 4, 3);
        let mut cells = CellArray::new();
        for (c, (kind, ids)) in mesh.cells.iter().enumerate() {
            if c == 0 {
                cells.push(kind, &[ids[0], ids[1], ids[2], 20]);
            } else {
                cells.push(kind, ids);
            }
        }
        mesh.cells = cells;
        let err = volumize(&mesh).unwrap_err();
        assert_eq!(err.kind(), "ShapeError");
    }

    #[test]
    fn test_missing_layer_count() {
        let mut mesh = layered_band_mesh(2, 4, 3);
        mesh.field_data.clear();
        assert_eq!(volumize(&mesh).unwrap_err().kind(), "ShapeError");
    }
}

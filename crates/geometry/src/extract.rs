//! Slicing a layered mesh down to a contiguous range of layers.

use tracing::debug;

use quickview_common::mesh::{CellArray, FieldMap, LEVELS_KEY, NUM_LEVELS_KEY};
use quickview_common::{Mesh, QuickViewError, QvResult};

use crate::layers::LayerLayout;

/// Keep layers `layer_min..=layer_max` of a layered mesh.
///
/// Both bounds are clamped to `[0, numLayers - 1]`; a range that is still
/// inverted after clamping is a range error. Points, point fields and cell
/// fields are sliced to the retained blocks (names with the reserved `vtk`
/// prefix are dropped). Corner-layout meshes (four points per cell) get
/// fresh sequential quads over the sliced points; other meshes have their
/// connectivity renumbered into the sliced point array. The output records `numlev` (retained layer count) and the
/// matching slice of `lev`.
pub fn extract_layer_range(mesh: &Mesh, layer_min: i64, layer_max: i64) -> QvResult<Mesh> {
    let layout = LayerLayout::discover(mesh)?;
    let last = layout.num_layers as i64 - 1;
    let min = layer_min.clamp(0, last);
    let max = layer_max.clamp(0, last);
    if min > max {
        return Err(QuickViewError::range(format!(
            "layer range {}..={} is empty after clamping to 0..={}",
            layer_min, layer_max, last
        )));
    }
    let (min, max) = (min as usize, max as usize);
    let num_planes = max - min + 1;

    let point_range = layout.point_range(min, max);
    let cell_range = layout.cell_range(min, max);

    let cells = if layout.points_2d == 4 * layout.cells_2d {
        CellArray::sequential_quads(cell_range.len())
    } else {
        renumber_cells(mesh, &cell_range, &point_range)?
    };

    let mut out = Mesh::new(mesh.points[point_range.clone()].to_vec(), cells);
    out.point_data = slice_fields(&mesh.point_data, &point_range)?;
    out.cell_data = slice_fields(&mesh.cell_data, &cell_range)?;

    out.field_data
        .insert(NUM_LEVELS_KEY.to_string(), vec![num_planes as f64]);
    if let Some(levels) = mesh.field_data.get(LEVELS_KEY) {
        let end = (max + 1).min(levels.len());
        let start = min.min(end);
        out.field_data
            .insert(LEVELS_KEY.to_string(), levels[start..end].to_vec());
    }

    debug!(
        layer_min = min,
        layer_max = max,
        points = out.num_points(),
        cells = out.num_cells(),
        "Extracted layer range"
    );
    Ok(out)
}

/// Connectivity of `cell_range` shifted to start at `point_range.start`.
fn renumber_cells(
    mesh: &Mesh,
    cell_range: &std::ops::Range<usize>,
    point_range: &std::ops::Range<usize>,
) -> QvResult<CellArray> {
    let mut cells = CellArray::with_capacity(cell_range.len(), cell_range.len() * 4);
    let mut ids = Vec::new();
    for c in cell_range.clone() {
        ids.clear();
        for id in mesh.cells.point_ids(c) {
            if !point_range.contains(id) {
                return Err(QuickViewError::shape(format!(
                    "cell {} references point {} outside its layer block {:?}",
                    c, id, point_range
                )));
            }
            ids.push(id - point_range.start);
        }
        cells.push(mesh.cells.cell_type(c), &ids);
    }
    Ok(cells)
}

fn slice_fields(fields: &FieldMap, range: &std::ops::Range<usize>) -> QvResult<FieldMap> {
    let mut out = FieldMap::new();
    for (name, values) in fields {
        if Mesh::is_reserved(name) {
            continue;
        }
        let slice = values.get(range.clone()).ok_or_else(|| {
            QuickViewError::shape(format!(
                "array '{}' has {} values, cannot slice {:?}",
                name,
                values.len(),
                range
            ))
        })?;
        out.insert(name.clone(), slice.to_vec());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickview_common::CellType;
    use test_utils::{layered_band_mesh, layered_corner_mesh, level_values};

    #[test]
    fn test_clamps_bounds() {
        let mesh = layered_band_mesh(4, 10, 3);
        let out = extract_layer_range(&mesh, -5, 99).unwrap();
        assert_eq!(out.field_data[NUM_LEVELS_KEY], vec![4.0]);
        assert_eq!(out.num_cells(), mesh.num_cells());
    }

    #[test]
    fn test_inverted_range() {
        let mesh = layered_band_mesh(4, 10, 3);
        let err = extract_layer_range(&mesh, 3, 1).unwrap_err();
        assert_eq!(err.kind(), "RangeError");
        // both clamp to the top layer
        assert!(extract_layer_range(&mesh, 7, 9).is_ok());
    }

    #[test]
    fn test_single_layer() {
        let mesh = layered_corner_mesh(3, 4, 2);
        let out = extract_layer_range(&mesh, 2, 2).unwrap();
        assert_eq!(out.num_cells(), 8);
        assert_eq!(out.cells, CellArray::sequential_quads(8));
        assert_eq!(out.cell_data["T"][0], 2000.0);
        assert_eq!(out.field_data[LEVELS_KEY], vec![level_values(3)[2]]);
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_corner_layout_gets_fresh_quads() {
        let mut mesh = layered_corner_mesh(2, 2, 1);
        // Upper block cells pointing back into the lower block
        let mut cells = CellArray::with_capacity(4, 16);
        cells.push(CellType::Quad, &[0, 1, 2, 3]);
        cells.push(CellType::Quad, &[4, 5, 6, 7]);
        cells.push(CellType::Quad, &[0, 1, 2, 3]);
        cells.push(CellType::Quad, &[4, 5, 6, 7]);
        mesh.cells = cells;

        let out = extract_layer_range(&mesh, 1, 1).unwrap();
        assert_eq!(out.cells, CellArray::sequential_quads(2));
        assert_eq!(out.points, mesh.points[8..16].to_vec());
        assert_eq!(out.cell_data["T"], vec![1000.0, 1001.0]);
    }

    #[test]
    fn test_reserved_fields_skipped() {
        let mesh = layered_band_mesh(2, 4, 3);
        let out = extract_layer_range(&mesh, 0, 0).unwrap();
        assert!(!out.cell_data.contains_key("vtkOriginalCellIds"));
        assert!(out.cell_data.contains_key("T"));
    }
}

//! Stacking a 2D horizontal mesh into vertical layers.

use quickview_common::mesh::{CellArray, LEVELS_KEY, NUM_LEVELS_KEY};
use quickview_common::{Mesh, QuickViewError, QvResult};

/// Repeat `points_2d` once per level, replacing z with that level's value.
///
/// Block `k` of the result holds the horizontal points at `z = levels[k]`.
pub fn stack_layer_points(points_2d: &[[f64; 3]], levels: &[f64]) -> Vec<[f64; 3]> {
    let mut out = Vec::with_capacity(points_2d.len() * levels.len());
    for z in levels {
        out.extend(points_2d.iter().map(|p| [p[0], p[1], *z]));
    }
    out
}

/// Build a layered mesh from a horizontal mesh and per-layer cell values.
///
/// Cells of layer `k` address layer `k`'s point block. Each entry of
/// `layered_fields` must hold `levels.len() * mesh_2d.num_cells()` values,
/// bottom layer first. The `numlev`/`lev` field data pair is attached.
pub fn stack_layer_mesh(
    mesh_2d: &Mesh,
    levels: &[f64],
    layered_fields: impl IntoIterator<Item = (String, Vec<f64>)>,
) -> QvResult<Mesh> {
    if levels.is_empty() {
        return Err(QuickViewError::shape("cannot stack a mesh into zero layers"));
    }
    let n_points = mesh_2d.num_points();
    let n_cells = mesh_2d.num_cells();

    let mut cells = CellArray::with_capacity(
        n_cells * levels.len(),
        mesh_2d.cells.connectivity().len() * levels.len(),
    );
    let mut shifted = Vec::new();
    for k in 0..levels.len() {
        for (kind, ids) in mesh_2d.cells.iter() {
            shifted.clear();
            shifted.extend(ids.iter().map(|i| i + k * n_points));
            cells.push(kind, &shifted);
        }
    }

    let mut out = Mesh::new(stack_layer_points(&mesh_2d.points, levels), cells);
    for (name, values) in layered_fields {
        if values.len() != n_cells * levels.len() {
            return Err(QuickViewError::shape(format!(
                "layered field '{}' has {} values, expected {} layers x {} cells",
                name,
                values.len(),
                levels.len(),
                n_cells
            )));
        }
        out.cell_data.insert(name, values);
    }
    out.field_data
        .insert(NUM_LEVELS_KEY.to_string(), vec![levels.len() as f64]);
    out.field_data
        .insert(LEVELS_KEY.to_string(), levels.to_vec());
    Ok(out)
}

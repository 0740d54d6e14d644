//! Coincident point merging and degenerate cell removal.

use std::collections::HashMap;

use tracing::debug;

use quickview_common::mesh::{CellArray, FieldMap};
use quickview_common::Mesh;

/// Merge bit-identical points and drop cells that collapse.
///
/// Points with exactly the same coordinates are merged into the first
/// occurrence, whose point data is kept. Cells with fewer distinct points
/// than their kind needs are removed along with their cell data. Field data
/// is carried over unchanged.
pub fn clean(mesh: &Mesh) -> Mesh {
    let mut first_of: HashMap<[u64; 3], usize> = HashMap::with_capacity(mesh.num_points());
    let mut remap = Vec::with_capacity(mesh.num_points());
    let mut kept_points: Vec<usize> = Vec::new();

    for (i, p) in mesh.points.iter().enumerate() {
        let key = [p[0].to_bits(), p[1].to_bits(), p[2].to_bits()];
        let id = *first_of.entry(key).or_insert_with(|| {
            kept_points.push(i);
            kept_points.len() - 1
        });
        remap.push(id);
    }

    let mut cells = CellArray::with_capacity(mesh.num_cells(), mesh.cells.connectivity().len());
    let mut kept_cells = Vec::with_capacity(mesh.num_cells());
    let mut ids = Vec::new();
    for (c, (kind, old_ids)) in mesh.cells.iter().enumerate() {
        ids.clear();
        ids.extend(old_ids.iter().map(|i| remap[*i]));
        if distinct_count(&ids) < kind.min_distinct_points() {
            continue;
        }
        cells.push(kind, &ids);
        kept_cells.push(c);
    }

    let points = kept_points.iter().map(|i| mesh.points[*i]).collect();
    let mut out = Mesh::new(points, cells);
    out.point_data = gather(&mesh.point_data, &kept_points);
    out.cell_data = gather(&mesh.cell_data, &kept_cells);
    out.field_data = mesh.field_data.clone();

    debug!(
        merged_points = mesh.num_points() - out.num_points(),
        dropped_cells = mesh.num_cells() - out.num_cells(),
        "Cleaned mesh"
    );
    out
}

/// Select `indices` from every array of `fields`.
pub(crate) fn gather(fields: &FieldMap, indices: &[usize]) -> FieldMap {
    fields
        .iter()
        .map(|(name, values)| (name.clone(), indices.iter().map(|i| values[*i]).collect()))
        .collect()
}

fn distinct_count(ids: &[usize]) -> usize {
    // cells are small; quadratic is fine
    ids.iter()
        .enumerate()
        .filter(|(k, id)| !ids[..*k].contains(id))
        .count()
}

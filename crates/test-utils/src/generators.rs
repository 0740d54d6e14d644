//! Mesh generators with predictable, verifiable layouts.
//!
//! Two horizontal layouts are provided:
//! - **cell-corner**: every quad owns its four corner points (the layout the
//!   EAM reader produces, `numPoints2D == 4 * numCells2D`);
//! - **shared-point**: a periodic lon/lat band whose quads share points.
//!
//! Layered meshes stack a 2D mesh bottom layer first.

use quickview_common::mesh::{CellArray, CellType, Mesh, LEVELS_KEY, NUM_LEVELS_KEY};

/// Creates a global lon/lat grid in cell-corner layout.
///
/// Longitudes run from 0 to 360 (the convention of the model output) and
/// cells are ordered row by row from the south pole. Each cell carries
/// an `area` field (steradians) and a `TS` field `250 + 50 * cos(lat)`.
///
/// # Example
///
/// ```
/// use test_utils::corner_quad_grid;
///
/// let mesh = corner_quad_grid(4, 2);
/// assert_eq!(mesh.num_cells(), 8);
/// assert_eq!(mesh.num_points(), 32);
/// ```
pub fn corner_quad_grid(n_lon: usize, n_lat: usize) -> Mesh {
    let dlon = 360.0 / n_lon as f64;
    let dlat = 180.0 / n_lat as f64;
    let n_cells = n_lon * n_lat;

    let mut points = Vec::with_capacity(n_cells * 4);
    let mut area = Vec::with_capacity(n_cells);
    let mut ts = Vec::with_capacity(n_cells);

    for row in 0..n_lat {
        let lat0 = -90.0 + row as f64 * dlat;
        let lat1 = lat0 + dlat;
        for col in 0..n_lon {
            let lon0 = col as f64 * dlon;
            let lon1 = lon0 + dlon;
            points.push([lon0, lat0, 0.0]);
            points.push([lon1, lat0, 0.0]);
            points.push([lon1, lat1, 0.0]);
            points.push([lon0, lat1, 0.0]);

            let a = dlon.to_radians() * (lat1.to_radians().sin() - lat0.to_radians().sin());
            area.push(a);
            let lat_c = (lat0 + lat1) / 2.0;
            ts.push(250.0 + 50.0 * lat_c.to_radians().cos());
        }
    }

    let mut mesh = Mesh::new(points, CellArray::sequential_quads(n_cells));
    mesh.cell_data.insert("area".to_string(), area);
    mesh.cell_data.insert("TS".to_string(), ts);
    mesh
}

/// Creates a periodic lon/lat band in shared-point layout.
///
/// `n_lon * n_rows` points and `n_lon * (n_rows - 1)` quads; the last column
/// of quads wraps around to the first column of points.
///
/// # Example
///
/// ```
/// use test_utils::periodic_band;
///
/// let band = periodic_band(10, 10);
/// assert_eq!(band.num_points(), 100);
/// assert_eq!(band.num_cells(), 90);
/// ```
pub fn periodic_band(n_lon: usize, n_rows: usize) -> Mesh {
    let dlon = 360.0 / n_lon as f64;
    let dlat = if n_rows > 1 { 120.0 / (n_rows - 1) as f64 } else { 0.0 };

    let mut points = Vec::with_capacity(n_lon * n_rows);
    for row in 0..n_rows {
        let lat = -60.0 + row as f64 * dlat;
        for col in 0..n_lon {
            points.push([col as f64 * dlon, lat, 0.0]);
        }
    }

    let id = |row: usize, col: usize| row * n_lon + (col % n_lon);
    let mut cells = CellArray::with_capacity(n_lon * n_rows.saturating_sub(1), 0);
    for row in 0..n_rows.saturating_sub(1) {
        for col in 0..n_lon {
            cells.push(
                CellType::Quad,
                &[id(row, col), id(row, col + 1), id(row + 1, col + 1), id(row + 1, col)],
            );
        }
    }

    Mesh::new(points, cells)
}

/// Vertical coordinate values for `n` layers, bottom layer first.
pub fn level_values(n: usize) -> Vec<f64> {
    (0..n).map(|k| 1000.0 - 100.0 * k as f64).collect()
}

/// Stacks a 2D mesh into `levels.len()` layers.
///
/// Points of layer `k` are the 2D points with `z = levels[k]`; cells of
/// layer `k` reference layer `k`'s point block. 2D cell and point fields are
/// repeated per layer. The `numlev`/`lev` field data pair is attached.
pub fn stack_copies(mesh2d: &Mesh, levels: &[f64]) -> Mesh {
    let n_points = mesh2d.num_points();
    let n_layers = levels.len();

    let mut points = Vec::with_capacity(n_points * n_layers);
    let mut cells = CellArray::new();
    for (k, z) in levels.iter().enumerate() {
        points.extend(mesh2d.points.iter().map(|p| [p[0], p[1], *z]));
        for (kind, ids) in mesh2d.cells.iter() {
            let shifted: Vec<usize> = ids.iter().map(|i| i + k * n_points).collect();
            cells.push(kind, &shifted);
        }
    }

    let mut mesh = Mesh::new(points, cells);
    for (name, values) in &mesh2d.cell_data {
        mesh.cell_data.insert(name.clone(), values.repeat(n_layers));
    }
    for (name, values) in &mesh2d.point_data {
        mesh.point_data.insert(name.clone(), values.repeat(n_layers));
    }
    mesh.field_data
        .insert(NUM_LEVELS_KEY.to_string(), vec![n_layers as f64]);
    mesh.field_data.insert(LEVELS_KEY.to_string(), levels.to_vec());
    mesh
}

/// Creates a layered shared-point band with recognizable field values.
///
/// - cell field `T` = `layer * 1000 + cell_in_layer`
/// - reserved cell field `vtkOriginalCellIds` = global cell index
/// - point field `h` = global point index
///
/// # Example
///
/// ```
/// use test_utils::layered_band_mesh;
///
/// let mesh = layered_band_mesh(4, 10, 10);
/// assert_eq!(mesh.num_points(), 400);
/// assert_eq!(mesh.num_cells(), 360);
/// assert_eq!(mesh.cell_data["T"][90], 1000.0);
/// ```
pub fn layered_band_mesh(num_layers: usize, n_lon: usize, n_rows: usize) -> Mesh {
    let band = periodic_band(n_lon, n_rows);
    let n_cells = band.num_cells();
    let mut mesh = stack_copies(&band, &level_values(num_layers));

    let t: Vec<f64> = (0..num_layers)
        .flat_map(|k| (0..n_cells).map(move |c| (k * 1000 + c) as f64))
        .collect();
    mesh.cell_data.insert("T".to_string(), t);
    mesh.cell_data.insert(
        "vtkOriginalCellIds".to_string(),
        (0..n_cells * num_layers).map(|c| c as f64).collect(),
    );
    mesh.point_data.insert(
        "h".to_string(),
        (0..mesh.num_points()).map(|p| p as f64).collect(),
    );
    mesh
}

/// Creates a layered cell-corner grid with field `T` = `layer * 1000 + cell`.
pub fn layered_corner_mesh(num_layers: usize, n_lon: usize, n_lat: usize) -> Mesh {
    let grid = corner_quad_grid(n_lon, n_lat);
    let n_cells = grid.num_cells();
    let mut mesh = stack_copies(&grid, &level_values(num_layers));
    let t: Vec<f64> = (0..num_layers)
        .flat_map(|k| (0..n_cells).map(move |c| (k * 1000 + c) as f64))
        .collect();
    mesh.cell_data.insert("T".to_string(), t);
    mesh
}

/// Creates a scalar array with NaN at every `stride`-th position.
pub fn values_with_nans(len: usize, stride: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            if stride > 0 && i % stride == 0 {
                f64::NAN
            } else {
                i as f64
            }
        })
        .collect()
}

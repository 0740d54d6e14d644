//! Longitude normalization and lon/lat window extraction.
//!
//! Model output uses longitudes in `[0, 360)`. Everything downstream of this
//! module works in `[-180, 180)`, so the wrap happens here together with the
//! window clip.

use tracing::debug;

use quickview_common::mesh::CellArray;
use quickview_common::{CellType, GeoWindow, Mesh};

use crate::clean::gather;

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Like [`normalize_longitude`] but keeps `+180` so closed outlines stay closed.
fn normalize_longitude_inclusive(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        normalize_longitude(lon)
    }
}

/// Move `lon` onto the same side of the date line as `reference`.
fn unwrap_towards(lon: f64, reference: f64) -> f64 {
    if lon - reference > 180.0 {
        lon - 360.0
    } else if reference - lon > 180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Wrap longitudes and keep the cells whose centroid lies inside `window`.
///
/// Cells that straddle the date line are unwrapped onto the side of their
/// first corner so they are not stretched across the map. The output is in
/// corner layout: each kept cell owns fresh copies of its points. Cell data
/// follows the kept cells, point data follows the copied points and field
/// data is carried over.
pub fn transform_and_extract(mesh: &Mesh, window: &GeoWindow) -> Mesh {
    let mut points = Vec::with_capacity(mesh.num_points());
    let mut source_points = Vec::with_capacity(mesh.num_points());
    let mut kept_cells = Vec::with_capacity(mesh.num_cells());
    let mut cells = CellArray::with_capacity(mesh.num_cells(), mesh.cells.connectivity().len());

    let mut corners: Vec<[f64; 3]> = Vec::with_capacity(8);
    let mut ids = Vec::with_capacity(8);
    for (c, (kind, cell_ids)) in mesh.cells.iter().enumerate() {
        if cell_ids.is_empty() {
            continue;
        }
        corners.clear();
        corners.extend(cell_ids.iter().map(|i| {
            let p = mesh.points[*i];
            [normalize_longitude(p[0]), p[1], p[2]]
        }));

        let first = corners[0][0];
        let (lo, hi) = corners
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[0]), hi.max(p[0]))
            });
        if hi - lo > 180.0 {
            for p in corners.iter_mut() {
                p[0] = unwrap_towards(p[0], first);
            }
        }

        let n = corners.len() as f64;
        let lon_c = corners.iter().map(|p| p[0]).sum::<f64>() / n;
        let lat_c = corners.iter().map(|p| p[1]).sum::<f64>() / n;
        if !window.contains(lon_c, lat_c) {
            continue;
        }

        ids.clear();
        for (p, src) in corners.iter().zip(cell_ids) {
            ids.push(points.len());
            points.push(*p);
            source_points.push(*src);
        }
        cells.push(kind, &ids);
        kept_cells.push(c);
    }

    let mut out = Mesh::new(points, cells);
    out.cell_data = gather(&mesh.cell_data, &kept_cells);
    out.point_data = gather(&mesh.point_data, &source_points);
    out.field_data = mesh.field_data.clone();

    debug!(
        kept = out.num_cells(),
        total = mesh.num_cells(),
        lon_min = window.lon_min,
        lon_max = window.lon_max,
        lat_min = window.lat_min,
        lat_max = window.lat_max,
        "Extracted window"
    );
    out
}

/// Clip polylines to `window`, splitting each line into in-window runs.
///
/// Longitudes outside `[-180, 180]` are wrapped first; a jump of more than 180° between
/// consecutive points also splits the line. Runs shorter than two points
/// are dropped. Non-polyline cells are ignored.
pub fn clip_polylines(mesh: &Mesh, window: &GeoWindow) -> Mesh {
    let mut points = Vec::new();
    let mut cells = CellArray::new();
    let mut run: Vec<[f64; 3]> = Vec::new();

    for (kind, ids) in mesh.cells.iter() {
        if kind != CellType::PolyLine {
            continue;
        }
        for id in ids {
            let p = mesh.points[*id];
            let q = [normalize_longitude_inclusive(p[0]), p[1], p[2]];
            let jumped = run.last().is_some_and(|prev| (q[0] - prev[0]).abs() > 180.0);
            if jumped || !window.contains(q[0], q[1]) {
                flush(&mut run, &mut points, &mut cells);
            }
            if window.contains(q[0], q[1]) {
                run.push(q);
            }
        }
        flush(&mut run, &mut points, &mut cells);
    }

    Mesh::new(points, cells)
}

fn flush(run: &mut Vec<[f64; 3]>, points: &mut Vec<[f64; 3]>, cells: &mut CellArray) {
    if run.len() >= 2 {
        let start = points.len();
        points.extend(run.iter().copied());
        let ids: Vec<usize> = (start..points.len()).collect();
        cells.push(CellType::PolyLine, &ids);
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::corner_quad_grid;

    fn window(lon: [f64; 2], lat: [f64; 2]) -> GeoWindow {
        GeoWindow::new(lon, lat).unwrap()
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(270.0), -90.0);
        assert_eq!(normalize_longitude(359.0), -1.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
    }

    #[test]
    fn test_global_keeps_everything() {
        let mesh = corner_quad_grid(8, 4);
        let out = transform_and_extract(&mesh, &GeoWindow::global());
        assert_eq!(out.num_cells(), mesh.num_cells());
        assert_eq!(out.cell_data["TS"], mesh.cell_data["TS"]);
        let b = out.bounds();
        assert!(b.min(0) >= -180.0 && b.max(0) <= 180.0);
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_seam_cell_not_stretched() {
        // 8 columns of 45°, the column from 135 to 180 wraps to [135, -180]
        let mesh = corner_quad_grid(8, 1);
        let out = transform_and_extract(&mesh, &GeoWindow::global());
        for c in 0..out.num_cells() {
            let ids = out.cells.point_ids(c);
            let lons: Vec<f64> = ids.iter().map(|i| out.points[*i][0]).collect();
            let span = lons.iter().cloned().fold(f64::MIN, f64::max)
                - lons.iter().cloned().fold(f64::MAX, f64::min);
            assert!(span <= 45.0 + 1e-9, "cell {} spans {}", c, span);
        }
    }

    #[test]
    fn test_window_selects_by_centroid() {
        let mesh = corner_quad_grid(36, 18);
        let out = transform_and_extract(&mesh, &window([0.0, 60.0], [0.0, 30.0]));
        // centroids at lon 5..55 and lat 5, 15, 25
        assert_eq!(out.num_cells(), 6 * 3);
        assert_eq!(out.num_points(), 4 * out.num_cells());
        assert_eq!(out.cell_data["area"].len(), out.num_cells());
    }

    #[test]
    fn test_clip_polylines_splits_runs() {
        let mut cells = CellArray::new();
        let points: Vec<[f64; 3]> = (0..7).map(|i| [i as f64 * 10.0, 0.0, 0.0]).collect();
        cells.push(CellType::PolyLine, &(0..7).collect::<Vec<_>>());
        let mesh = Mesh::new(points, cells);

        let out = clip_polylines(&mesh, &window([0.0, 20.0], [-10.0, 10.0]));
        assert_eq!(out.num_cells(), 1);
        assert_eq!(out.cells.point_ids(0).len(), 3);

        let mut points = mesh.points.clone();
        points[1][1] = 50.0;
        let gap = Mesh::new(points, mesh.cells.clone());
        let out = clip_polylines(&gap, &window([-180.0, 180.0], [-10.0, 10.0]));
        // point 0 alone is dropped, points 2..6 form one run
        assert_eq!(out.num_cells(), 1);
        assert_eq!(out.cells.point_ids(0).len(), 5);
    }

    #[test]
    fn test_clip_polylines_splits_at_date_line() {
        let mut cells = CellArray::new();
        cells.push(CellType::PolyLine, &[0, 1, 2, 3]);
        let mesh = Mesh::new(
            vec![[170.0, 0.0, 0.0], [179.0, 0.0, 0.0], [181.0, 0.0, 0.0], [190.0, 0.0, 0.0]],
            cells,
        );
        let out = clip_polylines(&mesh, &GeoWindow::global());
        assert_eq!(out.num_cells(), 2);
    }
}

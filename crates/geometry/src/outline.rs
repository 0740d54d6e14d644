//! Background globe sources: the map outline and optional coastlines.

use std::path::Path;

use tracing::info;

use quickview_common::mesh::CellArray;
use quickview_common::{CellType, Mesh, QuickViewError, QvResult};

/// Default number of samples along each parallel edge of the outline.
pub const DEFAULT_OUTLINE_SAMPLES: usize = 360;

/// The `[-180, 180] x [-90, 90]` boundary as one closed polyline.
///
/// Parallel edges get `samples` segments and meridian edges `samples / 2`,
/// so that after projection the polyline traces the map's curved border.
pub fn globe_outline(samples: usize) -> Mesh {
    let n_lon = samples.max(4);
    let n_lat = (samples / 2).max(2);
    let lerp = |a: f64, b: f64, t: usize, n: usize| a + (b - a) * t as f64 / n as f64;

    let mut points = Vec::with_capacity(2 * (n_lon + n_lat) + 1);
    for i in 0..n_lon {
        points.push([lerp(-180.0, 180.0, i, n_lon), -90.0, 0.0]);
    }
    for i in 0..n_lat {
        points.push([180.0, lerp(-90.0, 90.0, i, n_lat), 0.0]);
    }
    for i in 0..n_lon {
        points.push([lerp(180.0, -180.0, i, n_lon), 90.0, 0.0]);
    }
    for i in 0..=n_lat {
        points.push([-180.0, lerp(90.0, -90.0, i, n_lat), 0.0]);
    }

    let ids: Vec<usize> = (0..points.len()).collect();
    let mut cells = CellArray::new();
    cells.push(CellType::PolyLine, &ids);
    Mesh::new(points, cells)
}

/// Build polylines from `[[[lon, lat], ...], ...]`; lines with fewer than two points are skipped.
pub fn polylines_from_lonlat(lines: &[Vec<[f64; 2]>]) -> Mesh {
    let mut points = Vec::new();
    let mut cells = CellArray::new();
    for line in lines.iter().filter(|l| l.len() >= 2) {
        let start = points.len();
        points.extend(line.iter().map(|[lon, lat]| [*lon, *lat, 0.0]));
        let ids: Vec<usize> = (start..points.len()).collect();
        cells.push(CellType::PolyLine, &ids);
    }
    Mesh::new(points, cells)
}

/// Read coastline polylines from a JSON file of `[[[lon, lat], ...], ...]`.
pub fn load_coastlines(path: impl AsRef<Path>) -> QvResult<Mesh> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        QuickViewError::Io(format!("cannot read coastline file {}: {}", path.display(), e))
    })?;
    let lines: Vec<Vec<[f64; 2]>> = serde_json::from_str(&text)?;
    let mesh = polylines_from_lonlat(&lines);
    info!(
        path = %path.display(),
        lines = mesh.num_cells(),
        points = mesh.num_points(),
        "Loaded coastlines"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::temp_test_dir;

    #[test]
    fn test_outline_is_closed_rectangle() {
        let outline = globe_outline(8);
        assert_eq!(outline.num_cells(), 1);
        let first = outline.points[0];
        let last = *outline.points.last().unwrap();
        assert_eq!(first, last);
        let b = outline.bounds();
        assert_eq!(b.as_array(), [-180.0, 180.0, -90.0, 90.0, 0.0, 0.0]);
        // 8 + 4 + 8 + 4 segments
        assert_eq!(outline.num_points(), 25);
    }

    #[test]
    fn test_load_coastlines() {
        let dir = temp_test_dir();
        let path = dir.path().join("coast.json");
        std::fs::write(&path, "[[[0, 0], [10, 5], [20, 0]], [[50, 50]]]").unwrap();
        let mesh = load_coastlines(&path).unwrap();
        assert_eq!(mesh.num_cells(), 1);
        assert_eq!(mesh.points[1], [10.0, 5.0, 0.0]);
    }

    #[test]
    fn test_load_coastlines_errors() {
        let dir = temp_test_dir();
        assert_eq!(
            load_coastlines(dir.path().join("missing.json")).unwrap_err().kind(),
            "IoError"
        );
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"not\": \"lines\"}").unwrap();
        assert_eq!(load_coastlines(&path).unwrap_err().kind(), "JsonError");
    }
}

//! Graticule lines and their labels.

use quickview_common::mesh::CellArray;
use quickview_common::{CellType, GeoWindow, Mesh, QuickViewError, QvResult};
use projection::{is_boundary_duplicate, wrap_longitude, Projector};

/// Default spacing between graticule lines, in degrees.
pub const DEFAULT_INTERVAL: f64 = 30.0;

/// Samples along each meridian.
pub const MERIDIAN_SAMPLES: usize = 100;

/// Samples along each parallel.
pub const PARALLEL_SAMPLES: usize = 10;

/// Height at which graticule geometry is placed above the data surface.
pub const GRATICULE_Z: f64 = 1.0;

/// Window snapped outward to whole multiples of the interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedWindow {
    pub lon_low: f64,
    pub lon_high: f64,
    pub lat_low: f64,
    pub lat_high: f64,
}

impl SnappedWindow {
    pub fn new(window: &GeoWindow, interval: f64) -> Self {
        Self {
            lon_low: (window.lon_min / interval).floor() * interval,
            lon_high: (window.lon_max / interval).ceil() * interval,
            lat_low: (window.lat_min / interval).floor() * interval,
            lat_high: (window.lat_max / interval).ceil() * interval,
        }
    }

    fn lon_extent(&self) -> f64 {
        self.lon_high - self.lon_low
    }

    fn lat_extent(&self) -> f64 {
        self.lat_high - self.lat_low
    }

    /// Meridian and parallel counts at `interval` spacing.
    fn line_counts(&self, interval: f64) -> (usize, usize) {
        (
            (self.lon_extent() / interval).round() as usize + 1,
            (self.lat_extent() / interval).round() as usize + 1,
        )
    }
}

/// Builds longitude/latitude reference lines over a window.
#[derive(Debug, Clone, Copy)]
pub struct GridlineGenerator {
    interval: f64,
}

impl Default for GridlineGenerator {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl GridlineGenerator {
    pub fn new(interval: f64) -> QvResult<Self> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(QuickViewError::range(format!(
                "gridline interval must be positive, got {}",
                interval
            )));
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Polyline mesh with one line per meridian followed by one per parallel.
    ///
    /// Meridians are sampled at [`MERIDIAN_SAMPLES`] latitudes and parallels
    /// at [`PARALLEL_SAMPLES`] longitudes spanning the snapped window.
    pub fn generate(&self, window: &GeoWindow) -> Mesh {
        let snapped = SnappedWindow::new(window, self.interval);
        let (longs, lats) = snapped.line_counts(self.interval);
        let lat_step = snapped.lat_extent() / (MERIDIAN_SAMPLES - 1) as f64;
        let lon_step = snapped.lon_extent() / (PARALLEL_SAMPLES - 1) as f64;

        let mut points =
            Vec::with_capacity(longs * MERIDIAN_SAMPLES + lats * PARALLEL_SAMPLES);
        let mut cells = CellArray::with_capacity(longs + lats, points.capacity());
        let mut ids = Vec::with_capacity(MERIDIAN_SAMPLES);

        for j in 0..longs {
            let lon = snapped.lon_low + j as f64 * self.interval;
            ids.clear();
            for k in 0..MERIDIAN_SAMPLES {
                ids.push(points.len());
                points.push([lon, snapped.lat_low + k as f64 * lat_step, GRATICULE_Z]);
            }
            cells.push(CellType::PolyLine, &ids);
        }
        for j in 0..lats {
            let lat = snapped.lat_low + j as f64 * self.interval;
            ids.clear();
            for k in 0..PARALLEL_SAMPLES {
                ids.push(points.len());
                points.push([snapped.lon_low + k as f64 * lon_step, lat, GRATICULE_Z]);
            }
            cells.push(CellType::PolyLine, &ids);
        }

        Mesh::new(points, cells)
    }
}

/// Which graticule line a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAxis {
    Longitude,
    Latitude,
}

/// A text annotation placed in projected coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GraticuleLabel {
    pub axis: LabelAxis,
    pub text: String,
    pub position: [f64; 3],
}

/// Labels for the graticule of `window`.
///
/// Longitude labels sit on the top edge at the center-wrapped longitude; a
/// label that wraps to exactly 180 duplicates the -180 one and is skipped.
/// Latitude labels sit on the right edge, pushed out by 7.5% of their
/// projected x so they clear the map border.
pub fn graticule_labels(
    window: &GeoWindow,
    center: f64,
    projector: &Projector,
    interval: f64,
) -> QvResult<Vec<GraticuleLabel>> {
    let generator = GridlineGenerator::new(interval)?;
    let snapped = SnappedWindow::new(window, generator.interval());
    let (longs, lats) = snapped.line_counts(interval);

    let mut labels = Vec::with_capacity(longs + lats);
    for j in 0..longs {
        let x = snapped.lon_low + j as f64 * interval;
        let pos = wrap_longitude(x, center);
        if is_boundary_duplicate(pos) {
            continue;
        }
        labels.push(GraticuleLabel {
            axis: LabelAxis::Longitude,
            text: format_degrees(x),
            position: projector.project([pos, snapped.lat_high, GRATICULE_Z], false),
        });
    }
    for j in 0..lats {
        let y = snapped.lat_low + j as f64 * interval;
        let mut position = projector.project([snapped.lon_high, y, GRATICULE_Z], false);
        position[0] += position[0] * 0.075;
        labels.push(GraticuleLabel {
            axis: LabelAxis::Latitude,
            text: format_degrees(y),
            position,
        });
    }
    Ok(labels)
}

fn format_degrees(value: f64) -> String {
    format!("{}", value.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::ProjectionKind;
    use test_utils::window;

    fn geo(w: ([f64; 2], [f64; 2])) -> GeoWindow {
        GeoWindow::new(w.0, w.1).unwrap()
    }

    #[test]
    fn test_global_graticule_counts() {
        let mesh = GridlineGenerator::default().generate(&GeoWindow::global());
        // 13 meridians and 7 parallels
        assert_eq!(mesh.num_cells(), 20);
        assert_eq!(mesh.num_points(), 13 * 100 + 7 * 10);
        assert!(mesh.cells.is_homogeneous(CellType::PolyLine));
        assert!(mesh.points.iter().all(|p| p[2] == GRATICULE_Z));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_fractional_interval_keeps_last_line() {
        let window = GeoWindow::new([-2.0, -1.9], [-1.9, -1.7]).unwrap();
        let mesh = GridlineGenerator::new(0.1).unwrap().generate(&window);
        // 2 meridians and 3 parallels
        assert_eq!(mesh.num_cells(), 5);
        let top = mesh.points[mesh.cells.point_ids(4)[0]][1];
        assert!((top - -1.7).abs() < 1e-9);

        let projector = Projector::new(ProjectionKind::default());
        let labels = graticule_labels(&window, 0.0, &projector, 0.1).unwrap();
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn test_lines_span_snapped_window() {
        let mesh = GridlineGenerator::default().generate(&geo(window::OFFSET));
        // lon -95..25 snaps to -120..30, lat -10..50 snaps to -30..60
        let b = mesh.bounds();
        assert_eq!(b.min(0), -120.0);
        assert!((b.max(0) - 30.0).abs() < 1e-9);
        assert_eq!(b.min(1), -30.0);
        assert!((b.max(1) - 60.0).abs() < 1e-9);
        assert_eq!(mesh.num_cells(), 6 + 4);
        // first meridian is vertical at the low longitude
        let first = mesh.cells.point_ids(0);
        assert_eq!(first.len(), MERIDIAN_SAMPLES);
        assert!(first.iter().all(|i| mesh.points[*i][0] == -120.0));
        // last parallel has 10 samples at the high latitude
        let last = mesh.cells.point_ids(mesh.num_cells() - 1);
        assert_eq!(last.len(), PARALLEL_SAMPLES);
        assert!(last.iter().all(|i| mesh.points[*i][1] == 60.0));
    }

    #[test]
    fn test_invalid_interval() {
        assert_eq!(GridlineGenerator::new(0.0).unwrap_err().kind(), "RangeError");
        assert!(GridlineGenerator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_labels_drop_boundary_duplicate() {
        let projector = Projector::new(ProjectionKind::CylEquidistant);
        let labels = graticule_labels(&GeoWindow::global(), 0.0, &projector, 30.0).unwrap();
        let lon: Vec<&str> = labels
            .iter()
            .filter(|l| l.axis == LabelAxis::Longitude)
            .map(|l| l.text.as_str())
            .collect();
        // -180 is kept, 180 coincides with it
        assert_eq!(lon.len(), 12);
        assert_eq!(lon.first(), Some(&"-180"));
        assert!(!lon.contains(&"180"));
        let lat = labels.iter().filter(|l| l.axis == LabelAxis::Latitude).count();
        assert_eq!(lat, 7);
    }

    #[test]
    fn test_label_positions() {
        let projector = Projector::new(ProjectionKind::CylEquidistant);
        let labels = graticule_labels(&geo(window::NORTH), 0.0, &projector, 30.0).unwrap();
        let lon0 = labels.iter().find(|l| l.text == "0").unwrap();
        assert_eq!(lon0.position, [0.0, 90.0, 1.0]);
        let lat30 = labels
            .iter()
            .find(|l| l.axis == LabelAxis::Latitude && l.text == "30")
            .unwrap();
        assert!((lat30.position[0] - 180.0 * 1.075).abs() < 1e-9);
        assert_eq!(lat30.position[1], 30.0);
    }

    #[test]
    fn test_centered_labels_wrap() {
        let projector = Projector::new(ProjectionKind::CylEquidistant);
        let labels = graticule_labels(&GeoWindow::global(), 90.0, &projector, 30.0).unwrap();
        let lon180 = labels.iter().find(|l| l.text == "180").unwrap();
        assert_eq!(lon180.position[0], 90.0);
        // -180 - 90 wraps to 90, 180 - 90 stays 90; the label text stays geographic
        assert!(labels.iter().all(|l| l.position[0].abs() <= 180.0 * 1.075));
    }
}

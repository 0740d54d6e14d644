//! Bounding box and geographic window types.

use serde::{Deserialize, Serialize};

use crate::error::{QuickViewError, QvResult};

/// Axis-aligned 3D bounds stored as `[xmin, xmax, ymin, ymax, zmin, zmax]`.
///
/// An empty mesh has inverted bounds (`min > max` on every axis); check
/// [`Bounds::is_valid`] before using the span or center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds(pub [f64; 6]);

impl Bounds {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, zmin: f64, zmax: f64) -> Self {
        Self([xmin, xmax, ymin, ymax, zmin, zmax])
    }

    /// Bounds that contain nothing; extending them with a point yields that point.
    pub fn empty() -> Self {
        Self([
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ])
    }

    /// The full lon/lat plane at z = 0.
    pub fn global() -> Self {
        Self::new(-180.0, 180.0, -90.0, 90.0, 0.0, 0.0)
    }

    /// Compute bounds over a set of points. NaN coordinates are ignored.
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn extend(&mut self, p: &[f64; 3]) {
        for axis in 0..3 {
            let v = p[axis];
            if v.is_nan() {
                continue;
            }
            self.0[axis * 2] = self.0[axis * 2].min(v);
            self.0[axis * 2 + 1] = self.0[axis * 2 + 1].max(v);
        }
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.0[axis * 2] <= self.0[axis * 2 + 1])
    }

    pub fn min(&self, axis: usize) -> f64 {
        self.0[axis * 2]
    }

    pub fn max(&self, axis: usize) -> f64 {
        self.0[axis * 2 + 1]
    }

    /// Extent along `axis` (0 = x, 1 = y, 2 = z).
    pub fn span(&self, axis: usize) -> f64 {
        self.max(axis) - self.min(axis)
    }

    pub fn width(&self) -> f64 {
        self.span(0)
    }

    pub fn height(&self) -> f64 {
        self.span(1)
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.0[0] + self.0[1]) / 2.0,
            (self.0[2] + self.0[3]) / 2.0,
            (self.0[4] + self.0[5]) / 2.0,
        ]
    }

    pub fn as_array(&self) -> [f64; 6] {
        self.0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::global()
    }
}

/// A longitude/latitude clip window in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoWindow {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl GeoWindow {
    /// Create a window, rejecting inverted or non-finite ranges.
    pub fn new(lon: [f64; 2], lat: [f64; 2]) -> QvResult<Self> {
        if lon.iter().chain(lat.iter()).any(|v| !v.is_finite()) {
            return Err(QuickViewError::range(format!(
                "clip window must be finite: lon {:?}, lat {:?}",
                lon, lat
            )));
        }
        if lon[0] > lon[1] {
            return Err(QuickViewError::range(format!(
                "longitude min {} exceeds max {}",
                lon[0], lon[1]
            )));
        }
        if lat[0] > lat[1] {
            return Err(QuickViewError::range(format!(
                "latitude min {} exceeds max {}",
                lat[0], lat[1]
            )));
        }
        Ok(Self {
            lon_min: lon[0],
            lon_max: lon[1],
            lat_min: lat[0],
            lat_max: lat[1],
        })
    }

    pub fn global() -> Self {
        Self {
            lon_min: -180.0,
            lon_max: 180.0,
            lat_min: -90.0,
            lat_max: 90.0,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    pub fn lon_range(&self) -> [f64; 2] {
        [self.lon_min, self.lon_max]
    }

    pub fn lat_range(&self) -> [f64; 2] {
        [self.lat_min, self.lat_max]
    }

    /// Window covering the horizontal extent of `bounds`.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self {
            lon_min: bounds.min(0),
            lon_max: bounds.max(0),
            lat_min: bounds.min(1),
            lat_max: bounds.max(1),
        }
    }
}

impl Default for GeoWindow {
    fn default() -> Self {
        Self::global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let b = Bounds::from_points(&[[1.0, 2.0, 3.0], [-1.0, 5.0, 0.0]]);
        assert_eq!(b.0, [-1.0, 1.0, 2.0, 5.0, 0.0, 3.0]);
        assert_eq!(b.center(), [0.0, 3.5, 1.5]);
    }

    #[test]
    fn test_empty_bounds_invalid() {
        assert!(!Bounds::empty().is_valid());
        assert!(!Bounds::from_points(&[]).is_valid());
    }

    #[test]
    fn test_window_rejects_inverted() {
        assert!(GeoWindow::new([10.0, -10.0], [-90.0, 90.0]).is_err());
        assert!(GeoWindow::new([-10.0, 10.0], [45.0, 0.0]).is_err());
        assert!(GeoWindow::new([-10.0, 10.0], [f64::NAN, 0.0]).is_err());
    }

    #[test]
    fn test_window_contains_inclusive() {
        let w = GeoWindow::new([-30.0, 30.0], [0.0, 60.0]).unwrap();
        assert!(w.contains(-30.0, 0.0));
        assert!(w.contains(30.0, 60.0));
        assert!(!w.contains(30.5, 10.0));
    }
}

//! Robinson pseudo-cylindrical projection.
//!
//! Robinson's projection is defined by a table of parallel lengths and
//! distances from the equator at 5° intervals. Between nodes the table is
//! interpolated with the cubic polynomials published with the PROJ
//! implementation, so outputs match `+proj=robin` on a sphere.
//!
//! Extents on the WGS84 sphere are about ±17 005 833 m in x and
//! ±8 625 155 m in y.

use std::f64::consts::FRAC_PI_2;

use crate::{adjust_lon, EARTH_RADIUS};

/// Parallel-length polynomial coefficients per 5° node.
const X_COEFS: [[f64; 4]; 19] = [
    [1.0, 2.2199e-17, -7.15515e-05, 3.1103e-06],
    [0.9986, -0.000482243, -2.4897e-05, -1.3309e-06],
    [0.9954, -0.00083103, -4.48605e-05, -9.86701e-07],
    [0.99, -0.00135364, -5.9661e-05, 3.6777e-06],
    [0.9822, -0.00167442, -4.49547e-06, -5.72411e-06],
    [0.973, -0.00214868, -9.03571e-05, 1.8736e-08],
    [0.96, -0.00305085, -9.00761e-05, 1.64917e-06],
    [0.9427, -0.00382792, -6.53386e-05, -2.6154e-06],
    [0.9216, -0.00467746, -0.00010457, 4.81243e-06],
    [0.8962, -0.00536223, -3.23831e-05, -5.43432e-06],
    [0.8679, -0.00609363, -0.000113898, 3.32484e-06],
    [0.835, -0.00698325, -6.40253e-05, 9.34959e-07],
    [0.7986, -0.00755338, -5.00009e-05, 9.35324e-07],
    [0.7597, -0.00798324, -3.5971e-05, -2.27626e-06],
    [0.7186, -0.00851367, -7.01149e-05, -8.6303e-06],
    [0.6732, -0.00986209, -0.000199569, 1.91974e-05],
    [0.6213, -0.010418, 8.83923e-05, 6.24051e-06],
    [0.5722, -0.00906601, 0.000182, 6.24051e-06],
    [0.5322, -0.00677797, 0.000275608, 6.24051e-06],
];

/// Distance-from-equator polynomial coefficients per 5° node.
const Y_COEFS: [[f64; 4]; 19] = [
    [-5.20417e-18, 0.0124, 1.21431e-18, -8.45284e-11],
    [0.062, 0.0124, -1.26793e-09, 4.22642e-10],
    [0.124, 0.0124, 5.07171e-09, -1.60604e-09],
    [0.186, 0.0123999, -1.90189e-08, 6.00152e-09],
    [0.248, 0.0124002, 7.10039e-08, -2.24e-08],
    [0.31, 0.0123992, -2.64997e-07, 8.35986e-08],
    [0.372, 0.0124029, 9.88983e-07, -3.11994e-07],
    [0.434, 0.0123893, -3.69093e-06, -4.35621e-07],
    [0.4958, 0.0123198, -1.02252e-05, -3.45523e-07],
    [0.5571, 0.0121916, -1.54081e-05, -5.82288e-07],
    [0.6176, 0.0119938, -2.41424e-05, -5.25327e-07],
    [0.6769, 0.011713, -3.20223e-05, -5.16405e-07],
    [0.7346, 0.0113541, -3.97684e-05, -6.09052e-07],
    [0.7903, 0.0109107, -4.89042e-05, -1.04739e-06],
    [0.8435, 0.0103431, -6.4615e-05, -1.40374e-09],
    [0.8936, 0.00969686, -6.4636e-05, -8.547e-06],
    [0.9394, 0.00840947, -0.000192841, -4.2106e-06],
    [0.9761, 0.00616527, -0.000256, -4.2106e-06],
    [1.0, 0.00328947, -0.000319159, -4.2106e-06],
];

const FXC: f64 = 0.8487;
const FYC: f64 = 1.3523;
/// Radians to node index (1 / 5°).
const C1: f64 = 11.459_155_902_616_464;
/// Node spacing (5°) in radians.
const RC1: f64 = 0.087_266_462_599_716_48;
const NODES: usize = 18;

#[inline]
fn poly(c: &[f64; 4], z: f64) -> f64 {
    c[0] + z * (c[1] + z * (c[2] + z * c[3]))
}

/// Robinson projection on a sphere.
#[derive(Debug, Clone, Copy)]
pub struct Robinson {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Default for Robinson {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
        }
    }
}

impl Robinson {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Project geographic degrees to meters.
    ///
    /// Longitudes outside `[-180, 180]` are wrapped; latitudes are clamped to
    /// the poles. NaN input yields NaN output.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        if lon_deg.is_nan() || lat_deg.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        let lam = adjust_lon(lon_deg.to_radians());
        let phi = lat_deg.to_radians().clamp(-FRAC_PI_2, FRAC_PI_2);

        let dphi = phi.abs();
        let i = ((dphi * C1 + 1e-15).floor() as usize).min(NODES);
        let offset_deg = (dphi - RC1 * i as f64).to_degrees();

        let x = poly(&X_COEFS[i], offset_deg) * FXC * lam * self.radius;
        let mut y = poly(&Y_COEFS[i], offset_deg) * FYC * self.radius;
        if phi < 0.0 {
            y = -y;
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_origin_maps_to_origin() {
        let (x, y) = Robinson::default().forward(0.0, 0.0);
        assert!(x.abs() < 1e-6, "x should be 0, got {}", x);
        assert!(y.abs() < 1e-6, "y should be 0, got {}", y);
    }

    #[test]
    fn test_equator_extent() {
        let (x, _) = Robinson::default().forward(180.0, 0.0);
        let expected = FXC * PI * EARTH_RADIUS;
        assert!((x - expected).abs() < 1.0, "expected {}, got {}", expected, x);
        assert!((x - 17_005_833.33).abs() < 10.0, "got {}", x);
    }

    #[test]
    fn test_pole_height() {
        let (x, y) = Robinson::default().forward(45.0, 90.0);
        assert!((y - FYC * EARTH_RADIUS).abs() < 1.0, "got {}", y);
        // pole line has 0.5322 of the equator length
        let (xe, _) = Robinson::default().forward(45.0, 0.0);
        assert!((x / xe - 0.5322).abs() < 1e-6, "ratio {}", x / xe);
    }

    #[test]
    fn test_table_node_at_45() {
        let r = Robinson::new(1.0);
        let (x, y) = r.forward(180.0, 45.0);
        assert!((x - 0.8962 * FXC * PI).abs() < 1e-4, "x {}", x);
        assert!((y - 0.5571 * FYC).abs() < 1e-4, "y {}", y);
    }

    #[test]
    fn test_symmetry() {
        let r = Robinson::default();
        let (x1, y1) = r.forward(73.0, 38.0);
        let (x2, y2) = r.forward(-73.0, -38.0);
        assert!((x1 + x2).abs() < 1e-6);
        assert!((y1 + y2).abs() < 1e-6);
    }

    #[test]
    fn test_y_monotonic_in_latitude() {
        let r = Robinson::default();
        let mut last = f64::NEG_INFINITY;
        for lat in -90..=90 {
            let (_, y) = r.forward(0.0, lat as f64);
            assert!(y > last, "y not increasing at lat {}", lat);
            last = y;
        }
    }

    #[test]
    fn test_longitude_wraps() {
        let r = Robinson::default();
        let (x1, y1) = r.forward(-170.0, 20.0);
        let (x2, y2) = r.forward(190.0, 20.0);
        assert!((x1 - x2).abs() < 1e-6);
        assert!((y1 - y2).abs() < 1e-6);
    }
}

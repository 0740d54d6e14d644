//! Mollweide equal-area projection.
//!
//! The auxiliary angle θ solves `2θ + sin 2θ = π sin φ`, found with Newton
//! iteration on `2θ`. Extents on the WGS84 sphere are `±2√2 R` in x and
//! `±√2 R` in y.

use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

use crate::{adjust_lon, EARTH_RADIUS};

const MAX_ITER: usize = 30;
const LOOP_TOL: f64 = 1e-7;

/// Mollweide projection on a sphere.
#[derive(Debug, Clone, Copy)]
pub struct Mollweide {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Default for Mollweide {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
        }
    }
}

impl Mollweide {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Solve for the auxiliary angle θ (radians) at latitude `phi`.
    pub fn auxiliary_angle(phi: f64) -> f64 {
        if (phi.abs() - FRAC_PI_2).abs() < 1e-12 {
            return phi.signum() * FRAC_PI_2;
        }
        let k = PI * phi.sin();
        let mut t = phi;
        for _ in 0..MAX_ITER {
            let v = (t + t.sin() - k) / (1.0 + t.cos());
            t -= v;
            if v.abs() < LOOP_TOL {
                return t * 0.5;
            }
        }
        if t < 0.0 {
            -FRAC_PI_2
        } else {
            FRAC_PI_2
        }
    }

    /// Project geographic degrees to meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        if lon_deg.is_nan() || lat_deg.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        let lam = adjust_lon(lon_deg.to_radians());
        let phi = lat_deg.to_radians().clamp(-FRAC_PI_2, FRAC_PI_2);
        let theta = Self::auxiliary_angle(phi);

        let x = (2.0 * SQRT_2 / PI) * lam * theta.cos() * self.radius;
        let y = SQRT_2 * theta.sin() * self.radius;
        (x, y)
    }
}

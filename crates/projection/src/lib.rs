//! Map projections and globe embedding for lon/lat meshes.
//!
//! Implements map projections from scratch without external dependencies.
//! All projected coordinates are in meters on a sphere of radius
//! [`EARTH_RADIUS`], except the equidistant cylindrical projection which
//! keeps degrees.

pub mod kind;
pub mod meridian;
pub mod mollweide;
pub mod projector;
pub mod robinson;
pub mod sphere;

pub use kind::ProjectionKind;
pub use meridian::{is_boundary_duplicate, wrap_longitude};
pub use mollweide::Mollweide;
pub use projector::{project, ProjectOptions, Projector};
pub use robinson::Robinson;
pub use sphere::{to_sphere, to_sphere_mesh, DEFAULT_GLOBE_RADIUS};

/// Radius of the projection sphere (WGS84 semi-major axis, meters).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Wrap a longitude in radians into `[-pi, pi]`.
///
/// Values already inside the interval, including both ends, are kept so
/// that the +180 meridian does not jump to -180.
pub(crate) fn adjust_lon(lam: f64) -> f64 {
    use std::f64::consts::PI;
    if lam.abs() <= PI + 1e-12 {
        return lam;
    }
    lam - 2.0 * PI * ((lam + PI) / (2.0 * PI)).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_adjust_lon_keeps_boundaries() {
        assert_eq!(adjust_lon(PI), PI);
        assert_eq!(adjust_lon(-PI), -PI);
        assert!((adjust_lon(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
        assert!((adjust_lon(-1.5 * PI) - 0.5 * PI).abs() < 1e-12);
    }
}

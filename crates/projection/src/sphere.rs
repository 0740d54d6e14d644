//! Embedding of lon/lat/elevation points on a globe for 3D rendering.

use nalgebra::Vector3;
use rayon::prelude::*;

use quickview_common::Mesh;

/// Radius of the base globe in scene units.
pub const DEFAULT_GLOBE_RADIUS: f64 = 2000.0;

/// Elevation reference: points at elevation `e != 0` sit `1000 - e` above the globe.
const ELEVATION_REFERENCE: f64 = 1000.0;

/// Convert `(lon, lat, elevation)` to Cartesian coordinates on a sphere.
///
/// `theta = lon`, `phi = 90 - lat` and `rho = radius + (1000 - elevation)`
/// unless the elevation is exactly zero, in which case `rho = radius`.
/// Data-layer points use `radius + 1` so they sit just outside the globe.
pub fn to_sphere(point: [f64; 3], radius: f64, is_data_layer: bool) -> [f64; 3] {
    let base = if is_data_layer { radius + 1.0 } else { radius };
    let [lon, lat, elevation] = point;

    let theta = lon.to_radians();
    let phi = (90.0 - lat).to_radians();
    let rho = if elevation == 0.0 {
        base
    } else {
        (ELEVATION_REFERENCE - elevation) + base
    };

    let direction = Vector3::new(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    );
    let p = direction * rho;
    [p.x, p.y, p.z]
}

/// Map every point of `mesh` onto the globe; topology and fields are kept.
pub fn to_sphere_mesh(mesh: &Mesh, radius: f64, is_data_layer: bool) -> Mesh {
    let mut out = mesh.clone();
    out.points
        .par_iter_mut()
        .for_each(|p| *p = to_sphere(*p, radius, is_data_layer));
    out
}

//! Batch projection of points and meshes.

use rayon::prelude::*;
use tracing::debug;

use quickview_common::{Mesh, QvResult};

use crate::kind::ProjectionKind;
use crate::mollweide::Mollweide;
use crate::robinson::Robinson;

/// Minimum point count before batch projection fans out to the thread pool.
const PARALLEL_THRESHOLD: usize = 4096;

/// Per-call options for projecting a point set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectOptions {
    /// Shift input longitudes by -180° before projecting. Used for sources
    /// whose longitudes run from 0 to 360.
    pub translate: bool,
    /// Replace z with this constant (flattens the data surface onto a plane).
    pub flatten_z: Option<f64>,
}

/// Projects lon/lat/z points with one of the supported map projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    kind: ProjectionKind,
    robinson: Robinson,
    mollweide: Mollweide,
}

impl Projector {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            robinson: Robinson::default(),
            mollweide: Mollweide::default(),
        }
    }

    pub fn from_name(name: &str) -> QvResult<Self> {
        Ok(Self::new(ProjectionKind::from_name(name)?))
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Project a single `(lon, lat, z)` point. z passes through unchanged.
    pub fn project(&self, point: [f64; 3], translate: bool) -> [f64; 3] {
        let [lon, lat, z] = point;
        let lon = if translate { lon - 180.0 } else { lon };
        match self.kind {
            ProjectionKind::CylEquidistant => [lon, lat, z],
            ProjectionKind::Robinson => {
                let (x, y) = self.robinson.forward(lon, lat);
                [x, y, z]
            }
            ProjectionKind::Mollweide => {
                let (x, y) = self.mollweide.forward(lon, lat);
                [x, y, z]
            }
        }
    }

    /// Project a point set in place.
    pub fn project_points(&self, points: &mut [[f64; 3]], options: ProjectOptions) {
        let apply = |p: &mut [f64; 3]| {
            let mut q = self.project(*p, options.translate);
            if let Some(z) = options.flatten_z {
                q[2] = z;
            }
            *p = q;
        };
        if points.len() >= PARALLEL_THRESHOLD {
            points.par_iter_mut().for_each(apply);
        } else {
            points.iter_mut().for_each(apply);
        }
    }

    /// Return a copy of `mesh` with projected points; topology and fields are kept.
    pub fn project_mesh(&self, mesh: &Mesh, options: ProjectOptions) -> Mesh {
        let mut out = mesh.clone();
        self.project_points(&mut out.points, options);
        debug!(
            projection = %self.kind,
            points = out.num_points(),
            translate = options.translate,
            "Projected mesh"
        );
        out
    }
}

/// Project one point by projection name.
pub fn project(point: [f64; 3], projection_name: &str, translate: bool) -> QvResult<[f64; 3]> {
    Ok(Projector::from_name(projection_name)?.project(point, translate))
}

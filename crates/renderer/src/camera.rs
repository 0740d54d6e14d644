//! Orthographic camera state shared by linked render targets.

use quickview_common::Bounds;

/// Distance of the camera from the focal point along +z after a fit.
pub const CAMERA_DISTANCE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: [f64; 3],
    pub focal_point: [f64; 3],
    pub view_up: [f64; 3],
    /// Half the height of the view in world units.
    pub parallel_scale: f64,
    pub parallel_projection: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, CAMERA_DISTANCE],
            focal_point: [0.0; 3],
            view_up: [0.0, 1.0, 0.0],
            parallel_scale: 100.0,
            parallel_projection: true,
        }
    }
}

impl Camera {
    /// Multiply the parallel scale; values below 1 zoom in.
    pub fn zoom(&mut self, factor: f64) {
        self.parallel_scale *= factor;
    }

    /// Shift position and focal point together along `axis`.
    pub fn pan(&mut self, axis: usize, offset: f64) {
        if axis < 3 {
            self.position[axis] += offset;
            self.focal_point[axis] += offset;
        }
    }

    /// Center on `bounds`, looking down -z from [`CAMERA_DISTANCE`].
    pub fn look_at_bounds(&mut self, bounds: &Bounds, parallel_scale: f64) {
        let center = bounds.center();
        self.focal_point = center;
        self.position = [center[0], center[1], center[2] + CAMERA_DISTANCE];
        self.view_up = [0.0, 1.0, 0.0];
        self.parallel_scale = parallel_scale;
        self.parallel_projection = true;
    }

    /// World-space `[xmin, xmax, ymin, ymax]` visible in a viewport.
    pub fn visible_window(&self, width: usize, height: usize) -> [f64; 4] {
        let aspect = if height > 0 { width as f64 / height as f64 } else { 1.0 };
        let half_h = self.parallel_scale;
        let half_w = half_h * aspect;
        let [cx, cy, _] = self.focal_point;
        [cx - half_w, cx + half_w, cy - half_h, cy + half_h]
    }
}

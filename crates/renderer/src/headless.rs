//! Software rasterizer implementing [`RenderBackend`] without a display.
//!
//! Cells are flat-shaded by their scalar value, polylines are drawn one
//! pixel wide. The view looks down -z through the target's orthographic
//! camera, so z only matters for draw order (representations are drawn in
//! the order they were shown).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use quickview_common::{CellType, Mesh};

use crate::backend::{
    Image, MeshSource, RenderBackend, RepresentationId, RepresentationStyle, TargetId,
};
use crate::camera::Camera;
use crate::colormap::{Color, ColorPreset, PresetGroup, PresetTable, DEFAULT_COLORMAP};
use crate::error::{RenderError, RenderResult};
use crate::transfer::ColorTransferFunction;

const DEFAULT_VIEW_SIZE: (usize, usize) = (800, 600);
const BACKGROUND: [u8; 4] = [32, 32, 40, 255];

struct Representation {
    target: TargetId,
    source: Arc<dyn MeshSource>,
    style: RepresentationStyle,
    color_by: Option<String>,
}

struct TargetState {
    /// Camera slot, shared between linked targets.
    camera: u64,
    size: (usize, usize),
    representations: Vec<RepresentationId>,
}

pub struct HeadlessBackend {
    presets: Arc<PresetTable>,
    default_colormap: String,
    next_id: u64,
    targets: HashMap<TargetId, TargetState>,
    cameras: HashMap<u64, Camera>,
    representations: HashMap<RepresentationId, Representation>,
    transfer_functions: HashMap<String, ColorTransferFunction>,
}

impl std::fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("targets", &self.targets.len())
            .field("representations", &self.representations.len())
            .field("transfer_functions", &self.transfer_functions.len())
            .finish()
    }
}

impl HeadlessBackend {
    pub fn new(presets: Arc<PresetTable>) -> Self {
        Self {
            presets,
            default_colormap: DEFAULT_COLORMAP.to_string(),
            next_id: 1,
            targets: HashMap::new(),
            cameras: HashMap::new(),
            representations: HashMap::new(),
            transfer_functions: HashMap::new(),
        }
    }

    /// Colormap given to transfer functions on first access.
    pub fn with_default_colormap(mut self, name: impl Into<String>) -> Self {
        self.default_colormap = name.into();
        self
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn representation_count(&self) -> usize {
        self.representations.len()
    }

    /// Distinct camera slots; linked targets share one.
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    pub fn representation_field(&self, rep: RepresentationId) -> Option<&str> {
        self.representations.get(&rep)?.color_by.as_deref()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Drop a camera slot once no target uses it.
    fn release_camera(&mut self, slot: u64) {
        if !self.targets.values().any(|state| state.camera == slot) {
            self.cameras.remove(&slot);
        }
    }

    fn target(&self, target: TargetId) -> RenderResult<&TargetState> {
        self.targets
            .get(&target)
            .ok_or(RenderError::UnknownTarget(target))
    }

    fn draw_representation(&self, rep: &Representation, camera: &Camera, image: &mut Image) {
        let mesh = rep.source.current();
        let raster = Raster::new(camera, image.width, image.height);
        match &rep.style {
            RepresentationStyle::Surface => {
                let field = rep
                    .color_by
                    .as_deref()
                    .and_then(|name| Some((mesh.cell_data.get(name)?, self.transfer_functions.get(name)?)));
                let solid = Color::new(170, 170, 170, 255);
                for (cell, (kind, ids)) in mesh.cells.iter().enumerate() {
                    let color = match field {
                        Some((values, tf)) => tf.map_value(values.get(cell).copied().unwrap_or(f64::NAN)),
                        None => solid,
                    };
                    match kind {
                        CellType::Quad => raster.fill_polygon(&mesh, ids, color, image),
                        CellType::PolyLine => raster.polyline(&mesh, ids, false, color, image),
                        CellType::Hexahedron => {}
                    }
                }
            }
            RepresentationStyle::Wireframe { color, opacity, .. } => {
                let mut c = Color::from_unit_rgb(*color);
                c.a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
                for (kind, ids) in mesh.cells.iter() {
                    match kind {
                        CellType::Quad => raster.polyline(&mesh, ids, true, c, image),
                        CellType::PolyLine => raster.polyline(&mesh, ids, false, c, image),
                        CellType::Hexahedron => {}
                    }
                }
            }
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_target(&mut self) -> TargetId {
        let id = self.alloc_id();
        self.cameras.insert(id, Camera::default());
        self.targets.insert(
            id,
            TargetState {
                camera: id,
                size: DEFAULT_VIEW_SIZE,
                representations: Vec::new(),
            },
        );
        debug!(target = id, "Created render target");
        id
    }

    fn has_target(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    fn dispose_target(&mut self, target: TargetId) {
        if let Some(state) = self.targets.remove(&target) {
            for rep in state.representations {
                self.representations.remove(&rep);
            }
            self.release_camera(state.camera);
            debug!(target, "Disposed render target");
        }
    }

    fn show(
        &mut self,
        source: Arc<dyn MeshSource>,
        target: TargetId,
        style: RepresentationStyle,
    ) -> RenderResult<RepresentationId> {
        self.target(target)?;
        let id = self.alloc_id();
        trace!(target, source = source.name(), "Show");
        self.representations.insert(
            id,
            Representation {
                target,
                source,
                style,
                color_by: None,
            },
        );
        if let Some(state) = self.targets.get_mut(&target) {
            state.representations.push(id);
        }
        Ok(id)
    }

    fn color_by(&mut self, rep: RepresentationId, field: Option<&str>) -> RenderResult<()> {
        let representation = self
            .representations
            .get_mut(&rep)
            .ok_or(RenderError::UnknownRepresentation(rep))?;
        representation.color_by = field.map(str::to_string);
        if let Some(name) = field {
            self.transfer_function(name);
        }
        Ok(())
    }

    fn presets(&self) -> &PresetTable {
        &self.presets
    }

    fn transfer_function(&mut self, name: &str) -> &mut ColorTransferFunction {
        let presets = &self.presets;
        let default = &self.default_colormap;
        self.transfer_functions
            .entry(name.to_string())
            .or_insert_with(|| match presets.get(default).or_else(|_| presets.get(DEFAULT_COLORMAP)) {
                Ok(preset) => ColorTransferFunction::new(preset),
                Err(_) => ColorTransferFunction::new(&gray_ramp()),
            })
    }

    fn rescale_to_data_range(&mut self, rep: RepresentationId) -> RenderResult<Option<[f64; 2]>> {
        let representation = self
            .representations
            .get(&rep)
            .ok_or(RenderError::UnknownRepresentation(rep))?;
        let Some(field) = representation.color_by.clone() else {
            return Ok(None);
        };
        let mesh = representation.source.current();
        let range = mesh.cell_data.get(&field).and_then(|v| finite_range(v));
        if let Some([min, max]) = range {
            self.transfer_function(&field).rescale(min, max);
        }
        Ok(range)
    }

    fn camera(&self, target: TargetId) -> RenderResult<&Camera> {
        let slot = self.target(target)?.camera;
        self.cameras.get(&slot).ok_or(RenderError::UnknownTarget(target))
    }

    fn camera_mut(&mut self, target: TargetId) -> RenderResult<&mut Camera> {
        let slot = self.target(target)?.camera;
        self.cameras.get_mut(&slot).ok_or(RenderError::UnknownTarget(target))
    }

    fn link_camera(&mut self, target: TargetId, leader: TargetId) -> RenderResult<()> {
        let shared = self.target(leader)?.camera;
        let state = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        let previous = std::mem::replace(&mut state.camera, shared);
        if previous != shared {
            self.release_camera(previous);
        }
        Ok(())
    }

    fn view_size(&self, target: TargetId) -> RenderResult<(usize, usize)> {
        Ok(self.target(target)?.size)
    }

    fn set_view_size(&mut self, target: TargetId, width: usize, height: usize) -> RenderResult<()> {
        let state = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        state.size = (width.max(1), height.max(1));
        Ok(())
    }

    fn render(&mut self, target: TargetId) -> RenderResult<Image> {
        let state = self.target(target)?;
        let (width, height) = state.size;
        let camera = self
            .cameras
            .get(&state.camera)
            .ok_or(RenderError::UnknownTarget(target))?;
        let mut image = Image::new(width, height, BACKGROUND);
        for id in &state.representations {
            if let Some(rep) = self.representations.get(id) {
                debug_assert_eq!(rep.target, target);
                self.draw_representation(rep, camera, &mut image);
            }
        }
        Ok(image)
    }
}

/// Minimum and maximum over the finite values.
pub fn finite_range(values: &[f64]) -> Option<[f64; 2]> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some([v, v]),
            Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
        })
}

fn gray_ramp() -> ColorPreset {
    ColorPreset {
        name: "Grayscale".to_string(),
        group: PresetGroup::Standard,
        points: vec![
            crate::colormap::PresetPoint { x: 0.0, rgb: [0.0; 3] },
            crate::colormap::PresetPoint { x: 1.0, rgb: [1.0; 3] },
        ],
    }
}

/// World to pixel mapping for one render.
struct Raster {
    window: [f64; 4],
    width: usize,
    height: usize,
}

impl Raster {
    fn new(camera: &Camera, width: usize, height: usize) -> Self {
        Self {
            window: camera.visible_window(width, height),
            width,
            height,
        }
    }

    fn to_pixel(&self, p: &[f64; 3]) -> (f64, f64) {
        let [x0, x1, y0, y1] = self.window;
        let px = (p[0] - x0) / (x1 - x0) * self.width as f64;
        let py = (y1 - p[1]) / (y1 - y0) * self.height as f64;
        (px, py)
    }

    /// Even-odd scanline fill sampling pixel centers.
    fn fill_polygon(&self, mesh: &Mesh, ids: &[usize], color: Color, image: &mut Image) {
        if color.a == 0 {
            return;
        }
        let verts: Vec<(f64, f64)> = ids
            .iter()
            .filter_map(|&i| mesh.points.get(i))
            .map(|p| self.to_pixel(p))
            .collect();
        if verts.len() < 3 || verts.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return;
        }
        let ymin = verts.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
        let ymax = verts.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
        let row_start = ymin.floor().max(0.0) as usize;
        let row_end = (ymax.ceil().max(0.0) as usize).min(self.height);

        let mut crossings = Vec::with_capacity(verts.len());
        for row in row_start..row_end {
            let yc = row as f64 + 0.5;
            crossings.clear();
            for (i, a) in verts.iter().enumerate() {
                let b = verts[(i + 1) % verts.len()];
                if (a.1 <= yc && b.1 > yc) || (b.1 <= yc && a.1 > yc) {
                    crossings.push(a.0 + (yc - a.1) / (b.1 - a.1) * (b.0 - a.0));
                }
            }
            crossings.sort_by(|x, y| x.total_cmp(y));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as usize;
                let end = ((span[1] - 0.5).floor() + 1.0).clamp(0.0, self.width as f64) as usize;
                for col in start..end {
                    blend(image, col, row, color);
                }
            }
        }
    }

    fn polyline(&self, mesh: &Mesh, ids: &[usize], closed: bool, color: Color, image: &mut Image) {
        if color.a == 0 || ids.len() < 2 {
            return;
        }
        let verts: Vec<(f64, f64)> = ids
            .iter()
            .filter_map(|&i| mesh.points.get(i))
            .map(|p| self.to_pixel(p))
            .collect();
        let segments = if closed { verts.len() } else { verts.len() - 1 };
        for i in 0..segments {
            self.line(verts[i], verts[(i + 1) % verts.len()], color, image);
        }
    }

    fn line(&self, a: (f64, f64), b: (f64, f64), color: Color, image: &mut Image) {
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil();
        if !steps.is_finite() || steps > 1e5 {
            return;
        }
        let n = steps.max(1.0) as usize;
        for s in 0..=n {
            let t = s as f64 / n as f64;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            if x >= 0.0 && y >= 0.0 {
                blend(image, x as usize, y as usize, color);
            }
        }
    }
}

fn blend(image: &mut Image, x: usize, y: usize, color: Color) {
    if x >= image.width || y >= image.height {
        return;
    }
    let i = (y * image.width + x) * 4;
    let a = color.a as f64 / 255.0;
    let px = &mut image.pixels[i..i + 4];
    for (dst, src) in px.iter_mut().zip([color.r, color.g, color.b]) {
        *dst = (src as f64 * a + *dst as f64 * (1.0 - a)).round() as u8;
    }
    px[3] = px[3].max(color.a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickview_common::{Bounds, CellArray};

    struct Fixed(Arc<Mesh>);

    impl MeshSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn current(&self) -> Arc<Mesh> {
            self.0.clone()
        }
    }

    fn square(value: f64) -> Arc<dyn MeshSource> {
        let mut mesh = Mesh::new(
            vec![[-10.0, -10.0, 0.0], [10.0, -10.0, 0.0], [10.0, 10.0, 0.0], [-10.0, 10.0, 0.0]],
            CellArray::sequential_quads(1),
        );
        mesh.cell_data.insert("TS".into(), vec![value]);
        Arc::new(Fixed(Arc::new(mesh)))
    }

    fn backend() -> HeadlessBackend {
        HeadlessBackend::new(Arc::new(PresetTable::builtin()))
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut b = backend();
        let t = b.create_target();
        b.show(square(1.0), t, RepresentationStyle::Surface).unwrap();
        assert_eq!(b.representation_count(), 1);
        b.dispose_target(t);
        b.dispose_target(t);
        assert!(!b.has_target(t));
        assert_eq!(b.representation_count(), 0);
        assert!(matches!(b.render(t), Err(RenderError::UnknownTarget(_))));
    }

    #[test]
    fn test_linked_cameras_move_together() {
        let mut b = backend();
        let a = b.create_target();
        let c = b.create_target();
        b.link_camera(c, a).unwrap();
        b.camera_mut(c).unwrap().zoom(0.5);
        assert_eq!(b.camera(a).unwrap().parallel_scale, 50.0);
    }

    #[test]
    fn test_camera_slots_released_with_targets() {
        let mut b = backend();
        let lead = b.create_target();
        for _ in 0..5 {
            let t = b.create_target();
            b.link_camera(t, lead).unwrap();
            b.dispose_target(t);
        }
        assert_eq!(b.camera_count(), 1);

        // A shared slot outlives its creator while still linked
        let follower = b.create_target();
        b.link_camera(follower, lead).unwrap();
        b.camera_mut(lead).unwrap().parallel_scale = 42.0;
        b.dispose_target(lead);
        assert_eq!(b.camera_count(), 1);
        assert_eq!(b.camera(follower).unwrap().parallel_scale, 42.0);
        b.dispose_target(follower);
        assert_eq!(b.camera_count(), 0);
    }

    #[test]
    fn test_rescale_to_data_range() {
        let mut b = backend();
        let t = b.create_target();
        let rep = b.show(square(273.0), t, RepresentationStyle::Surface).unwrap();
        assert_eq!(b.rescale_to_data_range(rep).unwrap(), None);
        b.color_by(rep, Some("TS")).unwrap();
        assert_eq!(b.rescale_to_data_range(rep).unwrap(), Some([273.0, 273.0]));
        assert_eq!(b.transfer_function("TS").range(), [273.0, 273.0]);
    }

    #[test]
    fn test_render_fills_center() {
        let mut b = backend();
        let t = b.create_target();
        b.set_view_size(t, 40, 40).unwrap();
        b.camera_mut(t)
            .unwrap()
            .look_at_bounds(&Bounds::new(-20.0, 20.0, -20.0, 20.0, 0.0, 0.0), 20.0);
        let rep = b.show(square(1.0), t, RepresentationStyle::Surface).unwrap();
        b.color_by(rep, Some("TS")).unwrap();
        let image = b.render(t).unwrap();
        assert_ne!(image.pixel(20, 20).unwrap(), BACKGROUND);
        assert_eq!(image.pixel(1, 1).unwrap(), BACKGROUND);
        assert!(image.to_png().is_ok());
    }

    #[test]
    fn test_nan_cells_transparent() {
        let mut b = backend();
        let t = b.create_target();
        b.set_view_size(t, 40, 40).unwrap();
        let rep = b.show(square(f64::NAN), t, RepresentationStyle::Surface).unwrap();
        b.color_by(rep, Some("TS")).unwrap();
        b.camera_mut(t).unwrap().parallel_scale = 20.0;
        let image = b.render(t).unwrap();
        assert_eq!(image.pixel(20, 20).unwrap(), BACKGROUND);
    }

    #[test]
    fn test_finite_range() {
        assert_eq!(finite_range(&[f64::NAN, 2.0, -1.0]), Some([-1.0, 2.0]));
        assert_eq!(finite_range(&[f64::NAN]), None);
    }
}

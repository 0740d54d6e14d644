//! The load, slice, clip, project and publish lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use eam_reader::{DataReader, ErrorObserver, ReaderOutput};
use geometry::{
    clip_polylines, extract_layer_range, globe_outline, load_coastlines, transform_and_extract,
    volumize, GridlineGenerator,
};
use projection::{to_sphere_mesh, ProjectOptions, ProjectionKind, Projector};
use quickview_common::{
    Bounds, GeoWindow, Mesh, QuickViewError, QvResult, VariableCategory, VariableLists,
};

use crate::config::PipelineConfig;
use crate::port::OutputPorts;
use crate::status::PipelineStatus;

/// z of the flattened data surface.
const DATA_SURFACE_Z: f64 = 0.0;

/// Owns a reader and publishes the data, globe and gridline outputs.
///
/// Every mutating operation except [`Pipeline::update`] requires a valid
/// pipeline and is skipped, with a debug log, otherwise. Outputs are built
/// off to the side and only published once all three succeeded.
pub struct Pipeline {
    config: PipelineConfig,
    reader: Box<dyn DataReader>,
    observer: Arc<ErrorObserver>,
    status: PipelineStatus,

    data_file: Option<PathBuf>,
    conn_file: Option<PathBuf>,

    midpoint_layer: usize,
    interface_layer: usize,
    lev: Vec<f64>,
    ilev: Vec<f64>,
    available: VariableLists,
    selected: VariableLists,
    timesteps: Vec<f64>,
    time_index: usize,
    reader_stale: bool,

    window: GeoWindow,
    projector: Projector,
    center: f64,
    globe_mode: bool,
    globe_source: Mesh,
    gridlines: GridlineGenerator,

    extents: Bounds,
    move_extents: Bounds,
    ports: OutputPorts,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("status", &self.status)
            .field("data_file", &self.data_file)
            .field("conn_file", &self.conn_file)
            .field("projection", &self.projector.kind())
            .field("window", &self.window)
            .finish()
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig, mut reader: Box<dyn DataReader>) -> QvResult<Self> {
        let projector = Projector::from_name(&config.default_projection)?;
        let gridlines = GridlineGenerator::new(config.gridline_interval)?;
        let globe_source = match &config.coastline_file {
            Some(path) => load_coastlines(path)?,
            None => globe_outline(config.outline_samples),
        };

        let observer = ErrorObserver::new();
        reader.attach_observer(observer.clone());

        Ok(Self {
            config,
            reader,
            observer,
            status: PipelineStatus::Unloaded,
            data_file: None,
            conn_file: None,
            midpoint_layer: 0,
            interface_layer: 0,
            lev: Vec::new(),
            ilev: Vec::new(),
            available: VariableLists::default(),
            selected: VariableLists::default(),
            timesteps: Vec::new(),
            time_index: 0,
            reader_stale: false,
            window: GeoWindow::global(),
            projector,
            center: 0.0,
            globe_mode: false,
            globe_source,
            gridlines,
            extents: Bounds::global(),
            move_extents: Bounds::global(),
            ports: OutputPorts::default(),
        })
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    fn require_valid(&self, operation: &str) -> bool {
        if !self.is_valid() {
            debug!(operation, status = %self.status, "Skipped on invalid pipeline");
            return false;
        }
        true
    }

    /// Bind the reader to a file pair and build all outputs.
    ///
    /// Calling again with the files already bound and loaded does nothing;
    /// a pair that failed to load is read again. On failure the pipeline
    /// becomes invalid and the previously published outputs stay in place.
    pub fn update(&mut self, data_file: &Path, conn_file: &Path) -> QvResult<()> {
        if self.status == PipelineStatus::Valid
            && self.data_file.as_deref() == Some(data_file) && self.conn_file.as_deref() == Some(conn_file) {
            debug!(data_file = %data_file.display(), "Files already bound");
            return Ok(());
        }
        self.data_file = Some(data_file.to_path_buf());
        self.conn_file = Some(conn_file.to_path_buf());
        self.status = PipelineStatus::Loading;
        info!(
            data_file = %data_file.display(),
            conn_file = %conn_file.display(),
            "Loading data"
        );

        match self.load(data_file, conn_file) {
            Ok(()) => {
                self.status = PipelineStatus::Valid;
                info!(
                    surface = self.available.surface.len(),
                    midpoint = self.available.midpoint.len(),
                    interface = self.available.interface.len(),
                    timesteps = self.timesteps.len(),
                    "Pipeline ready"
                );
                Ok(())
            }
            Err(err) => {
                self.status = PipelineStatus::Invalid;
                warn!(error = %err, kind = err.kind(), "Pipeline load failed");
                Err(err)
            }
        }
    }

    fn load(&mut self, data_file: &Path, conn_file: &Path) -> QvResult<()> {
        self.reader.set_files(data_file, conn_file);
        self.reader.set_layers(self.midpoint_layer, self.interface_layer);
        self.reader.set_time_index(0);
        // Variables of a previous file may not exist in this one
        self.reader.set_active_variables(&VariableLists::default());
        self.read()?;

        let available = self.reader.available_variables();
        let selected = self.selected.restricted_to(&available);
        if !selected.is_empty() {
            self.reader.set_active_variables(&selected);
            self.read()?;
        }

        let output = self.reader_output()?;
        let (lev, ilev) = (output.lev.clone(), output.ilev.clone());
        self.lev = lev;
        self.ilev = ilev;
        self.available = available;
        self.selected = selected;
        self.timesteps = self.reader.timesteps();
        self.time_index = 0;
        self.window = GeoWindow::global();
        self.rebuild()
    }

    /// Run the reader and poll its observer.
    fn read(&mut self) -> QvResult<()> {
        self.observer.clear();
        self.reader.update();
        self.reader_stale = false;
        if self.observer.error_occurred() {
            let message = self.observer.message().unwrap_or_default();
            return Err(QuickViewError::pipeline_load(format!(
                "{}. Please check that the data and connectivity files exist and are compatible",
                message
            )));
        }
        Ok(())
    }

    fn reader_output(&self) -> QvResult<&ReaderOutput> {
        self.reader
            .output()
            .ok_or_else(|| QuickViewError::pipeline_load("reader produced no output"))
    }

    /// Set the lon/lat window for the data and globe outputs.
    pub fn apply_clipping(&mut self, lon: [f64; 2], lat: [f64; 2]) -> QvResult<()> {
        if !self.require_valid("apply_clipping") {
            return Ok(());
        }
        self.window = GeoWindow::new(lon, lat)?;
        debug!(lon = ?lon, lat = ?lat, "Clip window set");
        Ok(())
    }

    /// Switch projection; returns whether it changed.
    pub fn update_projection(&mut self, name: &str) -> QvResult<bool> {
        if !self.require_valid("update_projection") {
            return Ok(false);
        }
        let kind = ProjectionKind::from_name(name)?;
        if kind == self.projector.kind() {
            return Ok(false);
        }
        self.projector = Projector::new(kind);
        info!(projection = %kind, "Projection changed");
        Ok(true)
    }

    /// Record the center meridian. Re-centering is not applied to outputs.
    pub fn update_center(&mut self, center: f64) {
        if self.center != center {
            debug!(center, "Center meridian recorded; outputs are not re-centered");
            self.center = center;
        }
    }

    /// Select the vertical slices shown; returns whether either changed.
    pub fn update_lev(&mut self, midpoint: usize, interface: usize) -> bool {
        if !self.require_valid("update_lev") {
            return false;
        }
        if self.midpoint_layer == midpoint && self.interface_layer == interface {
            return false;
        }
        self.midpoint_layer = midpoint;
        self.interface_layer = interface;
        self.reader.set_layers(midpoint, interface);
        debug!(midpoint, interface, "Vertical slices changed");
        true
    }

    /// Move to timestep `t_index`; out-of-range indices are ignored.
    pub fn update_time_step(&mut self, t_index: usize) {
        if !self.require_valid("update_time_step") {
            return;
        }
        if t_index >= self.timesteps.len() {
            warn!(t_index, timesteps = self.timesteps.len(), "Timestep index out of range");
            return;
        }
        if t_index != self.time_index {
            self.time_index = t_index;
            self.reader.set_time_index(t_index);
            self.reader_stale = true;
        }
    }

    /// Set the variables whose arrays the reader materializes.
    pub fn load_variables(&mut self, surface: &[String], midpoint: &[String], interface: &[String]) {
        if !self.require_valid("load_variables") {
            return;
        }
        let selected = VariableLists::new(surface.to_vec(), midpoint.to_vec(), interface.to_vec());
        if selected != self.selected {
            self.reader.set_active_variables(&selected);
            self.selected = selected;
            self.reader_stale = true;
        }
    }

    /// Map outputs onto the globe instead of a flat projection.
    pub fn set_globe_mode(&mut self, enabled: bool) {
        self.globe_mode = enabled;
    }

    /// Recompute and publish all outputs, re-reading if reader settings changed.
    pub fn update_pipeline(&mut self) -> QvResult<()> {
        if !self.require_valid("update_pipeline") {
            return Ok(());
        }
        if self.reader_stale {
            if let Err(err) = self.read() {
                self.status = PipelineStatus::Invalid;
                warn!(error = %err, "Reader update failed");
                return Err(err);
            }
        }
        self.rebuild()
    }

    /// Build all three outputs, then publish them together.
    fn rebuild(&mut self) -> QvResult<()> {
        let slice = compose_slice(self.reader_output()?, self.midpoint_layer, self.interface_layer)?;

        let extracted = transform_and_extract(&slice, &self.window);
        let extents = extracted.bounds();
        let data = self.place(&extracted, true);

        let globe = self.place(&clip_polylines(&self.globe_source, &self.window), false);

        let grid_window = if extents.is_valid() {
            GeoWindow::from_bounds(&extents)
        } else {
            self.window
        };
        let gridlines = self.place(&self.gridlines.generate(&grid_window), false);

        self.move_extents = if data.num_points() > 0 {
            data.bounds()
        } else {
            gridlines.bounds()
        };
        self.extents = extents;
        debug!(
            cells = data.num_cells(),
            globe_lines = globe.num_cells(),
            gridlines = gridlines.num_cells(),
            "Publishing outputs"
        );
        self.ports.data.publish(data);
        self.ports.globe.publish(globe);
        self.ports.gridlines.publish(gridlines);
        Ok(())
    }

    fn place(&self, mesh: &Mesh, is_data: bool) -> Mesh {
        if self.globe_mode {
            return to_sphere_mesh(mesh, self.config.globe_radius, is_data);
        }
        let options = ProjectOptions {
            translate: false,
            flatten_z: is_data.then_some(DATA_SURFACE_Z),
        };
        self.projector.project_mesh(mesh, options)
    }

    /// Hexahedral column mesh of the midpoint or interface stack.
    pub fn build_volume(&self, category: VariableCategory) -> QvResult<Mesh> {
        let output = self.reader_output()?;
        match category {
            VariableCategory::Midpoint => volumize(&output.midpoint),
            VariableCategory::Interface => volumize(&output.interface),
            VariableCategory::Surface => Err(QuickViewError::range(
                "surface variables have no vertical extent",
            )),
        }
    }

    pub fn ports(&self) -> &OutputPorts {
        &self.ports
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Bounds of the clipped data before projection.
    pub fn extents(&self) -> Bounds {
        self.extents
    }

    /// Bounds of the projected data, used to scale camera pans.
    pub fn move_extents(&self) -> Bounds {
        self.move_extents
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn conn_file(&self) -> Option<&Path> {
        self.conn_file.as_deref()
    }

    pub fn lev(&self) -> &[f64] {
        &self.lev
    }

    pub fn ilev(&self) -> &[f64] {
        &self.ilev
    }

    pub fn available_variables(&self) -> &VariableLists {
        &self.available
    }

    pub fn selected_variables(&self) -> &VariableLists {
        &self.selected
    }

    pub fn timesteps(&self) -> &[f64] {
        &self.timesteps
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn midpoint_layer(&self) -> usize {
        self.midpoint_layer
    }

    pub fn interface_layer(&self) -> usize {
        self.interface_layer
    }

    pub fn window(&self) -> GeoWindow {
        self.window
    }

    pub fn projection(&self) -> ProjectionKind {
        self.projector.kind()
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    pub fn is_globe_mode(&self) -> bool {
        self.globe_mode
    }
}

/// The surface mesh with one slice of each active midpoint and interface
/// variable added as cell arrays.
fn compose_slice(output: &ReaderOutput, midpoint: usize, interface: usize) -> QvResult<Mesh> {
    let mut mesh = output.surface.clone();
    for (stack, layer) in [(&output.midpoint, midpoint), (&output.interface, interface)] {
        if stack.scientific_cell_fields().next().is_none() {
            continue;
        }
        let slice = extract_layer_range(stack, layer as i64, layer as i64)?;
        for (name, values) in slice.scientific_cell_fields() {
            if values.len() != mesh.num_cells() {
                return Err(QuickViewError::shape(format!(
                    "slice of '{}' has {} values for {} surface cells",
                    name,
                    values.len(),
                    mesh.num_cells()
                )));
            }
            mesh.cell_data.insert(name.clone(), values.clone());
        }
    }
    Ok(mesh)
}

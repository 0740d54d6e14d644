//! Interface-level flows over a pipeline and its views.
//!
//! A session holds the settings the UI edits (slice, clip window,
//! projection, timestep) and applies them in one [`Session::rebuild`]. It
//! also converts to and from the persisted [`SavedState`].

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use pipeline::Pipeline;
use projection::ProjectionKind;
use quickview_common::layout::rekey_by_name;
use quickview_common::{GeoWindow, GridPlacement, QuickViewError, QvResult, SavedState, VariableLists};
use renderer::RenderBackend;

use crate::manager::ViewManager;

/// Settings applied to the pipeline on rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub tstamp: usize,
    pub midpoint: usize,
    pub interface: usize,
    pub cliplat: [f64; 2],
    pub cliplong: [f64; 2],
    pub projection: String,
    pub center: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tstamp: 0,
            midpoint: 0,
            interface: 0,
            cliplat: [-90.0, 90.0],
            cliplong: [-180.0, 180.0],
            projection: ProjectionKind::default().name().to_string(),
            center: 0.0,
        }
    }
}

pub struct Session<B: RenderBackend> {
    pipeline: Pipeline,
    views: ViewManager<B>,
    settings: SessionSettings,
    /// Placements by variable name, kept across rebuilds.
    layout: HashMap<String, GridPlacement>,
}

impl<B: RenderBackend> Session<B> {
    pub fn new(pipeline: Pipeline, views: ViewManager<B>) -> Self {
        let settings = SessionSettings {
            projection: pipeline.config().default_projection.clone(),
            ..Default::default()
        };
        Self {
            pipeline,
            views,
            settings,
            layout: HashMap::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn views(&self) -> &ViewManager<B> {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewManager<B> {
        &mut self.views
    }

    /// The pipeline and views together, for view operations that read the
    /// pipeline.
    pub fn parts_mut(&mut self) -> (&Pipeline, &mut ViewManager<B>) {
        (&self.pipeline, &mut self.views)
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Bind a data/connectivity file pair.
    pub fn load_data(&mut self, data_file: &Path, conn_file: &Path) -> QvResult<()> {
        self.pipeline.update(data_file, conn_file)?;
        self.settings.tstamp = self.pipeline.time_index();
        info!(
            data_file = %data_file.display(),
            variables = self.pipeline.available_variables().len(),
            timesteps = self.pipeline.timesteps().len(),
            "Data loaded"
        );
        Ok(())
    }

    pub fn select_variables(&mut self, surface: &[String], midpoint: &[String], interface: &[String]) {
        self.pipeline.load_variables(surface, midpoint, interface);
    }

    /// Select by name, sorting each name into its category.
    ///
    /// Returns the names that are not available.
    pub fn select_variables_by_name(&mut self, names: &[String]) -> Vec<String> {
        let available = self.pipeline.available_variables();
        let mut lists = VariableLists::default();
        let mut unknown = Vec::new();
        for name in names {
            match available.category_of(name) {
                Some(category) => lists.get_mut(category).push(name.clone()),
                None => unknown.push(name.clone()),
            }
        }
        if !unknown.is_empty() {
            warn!(variables = ?unknown, "Ignoring unavailable variables");
        }
        self.pipeline
            .load_variables(&lists.surface, &lists.midpoint, &lists.interface);
        unknown
    }

    pub fn set_slice(&mut self, midpoint: usize, interface: usize) {
        self.settings.midpoint = midpoint;
        self.settings.interface = interface;
    }

    /// Set the clip window; an inverted window is rejected and the previous
    /// one kept.
    pub fn set_clip(&mut self, lon: [f64; 2], lat: [f64; 2]) -> QvResult<()> {
        GeoWindow::new(lon, lat)?;
        self.settings.cliplong = lon;
        self.settings.cliplat = lat;
        Ok(())
    }

    pub fn set_projection(&mut self, name: &str) -> QvResult<()> {
        let kind = ProjectionKind::from_name(name)?;
        self.settings.projection = kind.name().to_string();
        Ok(())
    }

    pub fn set_center(&mut self, center: f64) {
        self.settings.center = center;
    }

    /// Move to a timestep and refresh the views in place.
    pub fn set_time(&mut self, t_index: usize) -> QvResult<()> {
        self.pipeline.update_time_step(t_index);
        self.settings.tstamp = self.pipeline.time_index();
        self.pipeline.update_pipeline()?;
        self.views.update_views_for_timestep(&self.pipeline)
    }

    /// Apply all settings, rebuild the outputs and the view layout, then fit
    /// the cameras.
    pub fn rebuild(&mut self) -> QvResult<()> {
        let s = &self.settings;
        self.pipeline.update_lev(s.midpoint, s.interface);
        self.pipeline.apply_clipping(s.cliplong, s.cliplat)?;
        self.pipeline.update_center(s.center);
        self.pipeline.update_projection(&s.projection)?;
        self.pipeline.update_pipeline()?;

        self.views
            .rebuild_visualization_layout(&self.pipeline, Some(&self.layout))?;
        self.views.reset_camera(&self.pipeline)?;

        let state = self.views.state();
        self.layout = rekey_by_name(&state.layout, &state.variables);
        Ok(())
    }

    /// Snapshot of the session for the state file.
    pub fn export_state(&self) -> SavedState {
        let published = self.views.state();
        let (use_cvd_colors, use_standard_colors) = self.views.color_flags();
        SavedState {
            data_file: self.pipeline.data_file().map(|p| p.display().to_string()),
            conn_file: self.pipeline.conn_file().map(|p| p.display().to_string()),
            tstamp: self.settings.tstamp,
            midpoint: self.settings.midpoint,
            interface: self.settings.interface,
            cliplat: self.settings.cliplat,
            cliplong: self.settings.cliplong,
            projection: self.settings.projection.clone(),
            center: self.settings.center,
            variables: published.variables.clone(),
            varcolor: published.varcolor.clone(),
            uselogscale: published.uselogscale.clone(),
            invert: published.invert.clone(),
            varmin: published.varmin.clone(),
            varmax: published.varmax.clone(),
            override_range: published.override_range.clone(),
            varaverage: published.varaverage.clone(),
            use_cvd_colors,
            use_standard_colors,
            layout: published.layout.clone(),
        }
    }

    /// Restore a saved session: files, settings, per-variable colors and
    /// layout (both keyed by variable name), then rebuild.
    pub fn import_state(&mut self, saved: &SavedState) -> QvResult<()> {
        saved.validate()?;
        let projection = ProjectionKind::from_name(&saved.projection)?;

        match (&saved.data_file, &saved.conn_file) {
            (Some(data_file), Some(conn_file)) => {
                self.load_data(Path::new(data_file), Path::new(conn_file))?;
            }
            _ if !self.pipeline.is_valid() => {
                return Err(QuickViewError::StateFile(
                    "no data loaded and the state names no data/connectivity files".to_string(),
                ));
            }
            _ => {}
        }

        self.settings = SessionSettings {
            tstamp: saved.tstamp,
            midpoint: saved.midpoint,
            interface: saved.interface,
            cliplat: saved.cliplat,
            cliplong: saved.cliplong,
            projection: projection.name().to_string(),
            center: saved.center,
        };

        self.views
            .set_color_flags(saved.use_cvd_colors, saved.use_standard_colors);
        self.views.apply_saved_settings(&saved.view_settings_by_name());

        self.select_variables_by_name(&saved.variables);
        self.pipeline.update_time_step(saved.tstamp);
        self.settings.tstamp = self.pipeline.time_index();
        self.layout = saved.layout_by_name();

        info!(
            variables = saved.variables.len(),
            projection = %projection,
            "Session state imported"
        );
        self.rebuild()
    }
}

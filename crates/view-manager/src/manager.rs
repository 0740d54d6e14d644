//! The view refresh protocol.
//!
//! One render target per active variable, each showing the three pipeline
//! outputs (data surface, globe outline, graticule) with linked cameras.
//! UI events address views by their position in the active variable list;
//! the authoritative settings live in the [`ViewRegistry`] keyed by name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use eam_reader::AREA_FIELD;
use pipeline::Pipeline;
use quickview_common::state::SavedViewSettings;
use quickview_common::{GridPlacement, Mesh, QuickViewError, QvResult};
use renderer::{ColorPreset, ColorbarCache, Image, MeshSource, RenderBackend, RepresentationStyle, TargetId};

use crate::config::ViewDefaults;
use crate::context::{ref_name, ViewContext};
use crate::math::{area_weighted_average, data_range, fit_parallel_scale, pan_offset};
use crate::published::{PublishedState, StateField};
use crate::registry::ViewRegistry;

/// Parallel scale given to the lead camera after a layout rebuild.
pub const INITIAL_PARALLEL_SCALE: f64 = 100.0;

const GLOBE_OPACITY: f64 = 1.0;
const GRIDLINE_OPACITY: f64 = 0.4;

pub struct ViewManager<B: RenderBackend> {
    backend: B,
    defaults: ViewDefaults,
    colorbars: ColorbarCache,
    registry: ViewRegistry,
    /// Detached targets awaiting disposal, by render reference name.
    to_delete: Vec<(String, TargetId)>,
    state: PublishedState,
    use_cvd_colors: bool,
    use_standard_colors: bool,
}

impl<B: RenderBackend> ViewManager<B> {
    pub fn new(backend: B, defaults: ViewDefaults) -> QvResult<Self> {
        defaults.validate().map_err(QuickViewError::range)?;
        let colorbars = ColorbarCache::build(backend.presets())?;

        let mut manager = Self {
            backend,
            defaults,
            colorbars,
            registry: ViewRegistry::new(),
            to_delete: Vec::new(),
            state: PublishedState::new(),
            use_cvd_colors: false,
            use_standard_colors: true,
        };
        manager.set_color_flags(false, true);
        Ok(manager)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn defaults(&self) -> &ViewDefaults {
        &self.defaults
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn state(&self) -> &PublishedState {
        &self.state
    }

    /// Mutable access for subscribing to changes.
    pub fn state_mut(&mut self) -> &mut PublishedState {
        &mut self.state
    }

    pub fn color_flags(&self) -> (bool, bool) {
        (self.use_cvd_colors, self.use_standard_colors)
    }

    /// Reference names of detached targets not yet disposed.
    pub fn pending_deletions(&self) -> Vec<&str> {
        self.to_delete.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Context of the view at `index` in the active list.
    pub fn context_at(&self, index: usize) -> QvResult<&ViewContext> {
        let variable = self.variable_at(index)?;
        self.registry
            .get(&variable)
            .ok_or_else(|| QuickViewError::reference_not_found(variable))
    }

    fn variable_at(&self, index: usize) -> QvResult<String> {
        self.state
            .variables
            .get(index)
            .cloned()
            .ok_or_else(|| QuickViewError::reference_not_found(format!("view index {}", index)))
    }

    fn target_at(&self, index: usize) -> QvResult<(String, TargetId)> {
        let variable = self.variable_at(index)?;
        let target = self
            .registry
            .get(&variable)
            .and_then(|ctx| ctx.target)
            .ok_or_else(|| QuickViewError::reference_not_found(variable.clone()))?;
        Ok((variable, target))
    }

    fn schedule_delete(&mut self, target: TargetId) {
        let name = ref_name(target);
        debug!(view = %name, "Render view scheduled for deletion");
        self.to_delete.push((name, target));
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Recreate the active view list from the pipeline's selected variables.
    ///
    /// Deselected variables keep their context; only their render target is
    /// detached and scheduled for deletion. Contexts are dropped when their
    /// variable is no longer available at all.
    pub fn rebuild_visualization_layout(
        &mut self,
        pipeline: &Pipeline,
        cached_layout: Option<&HashMap<String, GridPlacement>>,
    ) -> QvResult<()> {
        if !pipeline.is_valid() {
            debug!(operation = "rebuild_visualization_layout", status = %pipeline.status(), "Skipped on invalid pipeline");
            return Ok(());
        }

        let to_render = pipeline.selected_variables().ordered();

        for ctx in self.registry.evict_unavailable(pipeline.available_variables()) {
            debug!(variable = %ctx.variable, "Evicting view of unavailable variable");
            if let Some(target) = ctx.target {
                self.schedule_delete(target);
            }
        }
        for variable in self.registry.ordered().to_vec() {
            if to_render.contains(&variable) {
                continue;
            }
            let detached = self.registry.get_mut(&variable).and_then(|ctx| ctx.detach());
            if let Some(target) = detached {
                self.schedule_delete(target);
            }
        }

        let data = pipeline.ports().data.current();
        let areas = data.cell_data.get(AREA_FIELD).map(|a| a.as_slice());

        self.state.reset_variables(to_render.clone());
        let mut layout = Vec::with_capacity(to_render.len());
        let mut lead: Option<TargetId> = None;

        for (index, variable) in to_render.iter().enumerate() {
            let placement = cached_layout
                .and_then(|cached| cached.get(variable))
                .copied()
                .unwrap_or_else(|| GridPlacement::default_for(index));
            let values = field_values(&data, variable);
            let range = data_range(values);
            let average = area_weighted_average(values, areas);

            if !self.registry.contains(variable) {
                self.registry.register(ViewContext::new(
                    variable.clone(),
                    index,
                    self.defaults.default_colormap.clone(),
                ));
            }
            let ctx = self.registry.require_mut(variable)?;
            ctx.index = index;
            if !ctx.override_range {
                ctx.min_value = range[0];
                ctx.max_value = range[1];
            }
            let existing = ctx.target.zip(ctx.data_rep);
            let override_range = ctx.override_range;

            let target = match existing {
                Some((target, rep)) => {
                    if !override_range {
                        self.backend.rescale_to_data_range(rep)?;
                    }
                    target
                }
                None => self.attach_view(variable, pipeline)?,
            };

            match lead {
                None => lead = Some(target),
                Some(leader) => self.backend.link_camera(target, leader)?,
            }

            self.publish_context(index, variable);
            self.state.varaverage[index] = average;
            layout.push(placement.with_index(index));
        }

        if let Some(leader) = lead {
            self.backend.camera_mut(leader)?.parallel_scale = INITIAL_PARALLEL_SCALE;
        }

        self.state.layout = layout;
        self.state.mark_all();
        self.state.flush();

        info!(
            views = to_render.len(),
            registered = self.registry.len(),
            pending_deletions = self.to_delete.len(),
            "Visualization layout rebuilt"
        );
        Ok(())
    }

    /// Create a target for `variable` and bind the three pipeline outputs.
    fn attach_view(&mut self, variable: &str, pipeline: &Pipeline) -> QvResult<TargetId> {
        let ports = pipeline.ports();
        let target = self.backend.create_target();
        self.backend
            .set_view_size(target, self.defaults.viewport_width, self.defaults.viewport_height)?;

        let data: Arc<dyn MeshSource> = ports.data.clone();
        let rep = self.backend.show(data, target, RepresentationStyle::Surface)?;
        self.backend.color_by(rep, Some(variable))?;

        let ctx = self.registry.require_mut(variable)?;
        ctx.target = Some(target);
        ctx.data_rep = Some(rep);
        self.configure_transfer_function(variable)?;

        self.backend
            .show(ports.globe.clone(), target, RepresentationStyle::overlay(GLOBE_OPACITY))?;
        self.backend
            .show(ports.gridlines.clone(), target, RepresentationStyle::overlay(GRIDLINE_OPACITY))?;
        self.backend.camera_mut(target)?.parallel_projection = true;

        debug!(variable = %variable, view = %ref_name(target), "Render view created");
        Ok(target)
    }

    /// Apply a context's colormap, log scale, inversion and range to its
    /// transfer function.
    fn configure_transfer_function(&mut self, variable: &str) -> QvResult<()> {
        let ctx = self
            .registry
            .get(variable)
            .cloned()
            .ok_or_else(|| QuickViewError::reference_not_found(variable))?;
        let preset = self.preset_or_default(variable, &ctx.colormap)?;

        let tf = self.backend.transfer_function(variable);
        tf.apply_preset(&preset);
        tf.nan_opacity = 0.0;
        if ctx.use_log_scale {
            tf.map_to_log_space();
        } else {
            tf.map_to_linear_space();
        }
        if ctx.invert_colors {
            tf.invert();
        }

        let mut range = None;
        if ctx.override_range {
            tf.rescale(ctx.min_value, ctx.max_value);
        } else if let Some(rep) = ctx.data_rep {
            range = self.backend.rescale_to_data_range(rep)?;
        }

        let ctx = self.registry.require_mut(variable)?;
        ctx.colormap = preset.name;
        if let Some([min, max]) = range {
            ctx.min_value = min;
            ctx.max_value = max;
        }
        Ok(())
    }

    fn preset_or_default(&self, variable: &str, colormap: &str) -> QvResult<ColorPreset> {
        let presets = self.backend.presets();
        match presets.get(colormap) {
            Ok(preset) => Ok(preset.clone()),
            Err(err) => {
                warn!(variable = %variable, colormap = %colormap, error = %err, "Falling back to default colormap");
                Ok(presets.get(&self.defaults.default_colormap)?.clone())
            }
        }
    }

    /// Copy a context's settings into the published arrays at `index`.
    fn publish_context(&mut self, index: usize, variable: &str) {
        if index >= self.state.len() {
            return;
        }
        let inverted = self.backend.transfer_function(variable).is_inverted();
        let Some(ctx) = self.registry.get(variable) else {
            return;
        };

        self.state.views[index] = ctx.ref_name().unwrap_or_default();
        self.state.varcolor[index] = ctx.colormap.clone();
        self.state.uselogscale[index] = ctx.use_log_scale;
        self.state.invert[index] = ctx.invert_colors;
        self.state.varmin[index] = ctx.min_value;
        self.state.varmax[index] = ctx.max_value;
        self.state.override_range[index] = ctx.override_range;
        self.state.colorbar_images[index] = self
            .colorbars
            .get(&ctx.colormap, inverted)
            .unwrap_or_default()
            .to_string();
    }

    // ========================================================================
    // Per-view color settings
    // ========================================================================

    pub fn update_colormap(&mut self, index: usize, colormap: &str) -> QvResult<()> {
        let variable = self.variable_at(index)?;
        let preset = self.backend.presets().get(colormap)?.clone();

        let ctx = self.registry.require_mut(&variable)?;
        ctx.colormap = preset.name.clone();
        ctx.has_been_configured = true;
        let invert = ctx.invert_colors;

        let tf = self.backend.transfer_function(&variable);
        tf.apply_preset(&preset);
        if invert {
            tf.invert();
        }

        debug!(variable = %variable, colormap = %colormap, "Colormap updated");
        self.publish_context(index, &variable);
        self.state.mark(StateField::Colormap);
        self.state.mark(StateField::Colorbar);
        self.state.flush();
        Ok(())
    }

    pub fn update_log_scale(&mut self, index: usize, use_log_scale: bool) -> QvResult<()> {
        let variable = self.variable_at(index)?;
        let ctx = self.registry.require_mut(&variable)?;
        ctx.use_log_scale = use_log_scale;
        ctx.has_been_configured = true;

        let tf = self.backend.transfer_function(&variable);
        if use_log_scale {
            tf.map_to_log_space();
        } else {
            tf.map_to_linear_space();
        }

        self.publish_context(index, &variable);
        self.state.mark(StateField::LogScale);
        self.state.flush();
        Ok(())
    }

    /// Record the invert flag and toggle the transfer function's color order.
    ///
    /// The transfer function is toggled on every call regardless of the
    /// value, so two calls with `true` restore the original order.
    pub fn update_invert_colors(&mut self, index: usize, invert: bool) -> QvResult<()> {
        let variable = self.variable_at(index)?;
        let ctx = self.registry.require_mut(&variable)?;
        ctx.invert_colors = invert;
        ctx.has_been_configured = true;

        self.backend.transfer_function(&variable).invert();

        self.publish_context(index, &variable);
        self.state.mark(StateField::Invert);
        self.state.mark(StateField::Colorbar);
        self.state.flush();
        Ok(())
    }

    /// Pin the color range of a view. The camera is left alone.
    pub fn set_manual_color_range(&mut self, index: usize, min: f64, max: f64) -> QvResult<()> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(QuickViewError::range(format!("color range [{}, {}]", min, max)));
        }
        let variable = self.variable_at(index)?;
        let ctx = self.registry.require_mut(&variable)?;
        ctx.pin_range(min, max);
        ctx.has_been_configured = true;

        self.backend.transfer_function(&variable).rescale(min, max);

        debug!(variable = %variable, min, max, "Color range pinned");
        self.publish_context(index, &variable);
        self.state.mark(StateField::ColorRange);
        self.state.mark(StateField::OverrideRange);
        self.state.flush();
        Ok(())
    }

    /// Drop the pinned range and track the data range again.
    pub fn revert_to_auto_color_range(&mut self, index: usize, pipeline: &Pipeline) -> QvResult<()> {
        let variable = self.variable_at(index)?;
        let data = pipeline.ports().data.current();
        let range = data_range(field_values(&data, &variable));

        let ctx = self.registry.require_mut(&variable)?;
        ctx.override_range = false;
        ctx.min_value = range[0];
        ctx.max_value = range[1];
        ctx.has_been_configured = true;
        let rep = ctx.data_rep;

        if let Some(rep) = rep {
            self.backend.rescale_to_data_range(rep)?;
        }

        self.publish_context(index, &variable);
        self.state.mark(StateField::ColorRange);
        self.state.mark(StateField::OverrideRange);
        self.state.flush();
        Ok(())
    }

    /// Apply the palette toggles and publish the colormaps they offer.
    pub fn set_color_flags(&mut self, use_cvd_colors: bool, use_standard_colors: bool) {
        self.use_cvd_colors = use_cvd_colors;
        self.use_standard_colors = use_standard_colors;
        self.state.colormaps = self
            .backend
            .presets()
            .available(use_cvd_colors, use_standard_colors)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.state.mark(StateField::AvailableColormaps);
        self.state.flush();
    }

    /// Replace contexts with settings restored from a state file.
    ///
    /// Existing targets are detached so the next layout rebuild recreates
    /// and reconfigures them from the restored settings.
    pub fn apply_saved_settings(&mut self, settings: &HashMap<String, SavedViewSettings>) {
        for (variable, saved) in settings {
            let detached = self.registry.get_mut(variable).and_then(|ctx| ctx.detach());
            if let Some(target) = detached {
                self.schedule_delete(target);
            }
            let mut ctx = ViewContext::from_saved(variable.clone(), saved, &self.defaults.default_colormap);
            ctx.has_been_configured = saved.colormap.is_some()
                || saved.use_log_scale
                || saved.invert_colors
                || saved.override_range;
            self.registry.register(ctx);
        }
        debug!(views = settings.len(), "Saved view settings applied");
    }

    // ========================================================================
    // Timestep refresh
    // ========================================================================

    /// Refresh averages, automatic ranges and camera fit of every active
    /// view after the data changed in place.
    pub fn update_views_for_timestep(&mut self, pipeline: &Pipeline) -> QvResult<()> {
        if !pipeline.is_valid() {
            debug!(operation = "update_views_for_timestep", status = %pipeline.status(), "Skipped on invalid pipeline");
            return Ok(());
        }
        if self.state.is_empty() {
            return Ok(());
        }

        let data = pipeline.ports().data.current();
        let areas = data.cell_data.get(AREA_FIELD).map(|a| a.as_slice());

        for (index, variable) in self.state.variables.clone().iter().enumerate() {
            let values = field_values(&data, variable);
            self.state.varaverage[index] = area_weighted_average(values, areas);

            let Some(ctx) = self.registry.get_mut(variable) else {
                continue;
            };
            let (target, rep) = (ctx.target, ctx.data_rep);
            if !ctx.override_range {
                let range = data_range(values);
                ctx.min_value = range[0];
                ctx.max_value = range[1];
                if let Some(rep) = rep {
                    self.backend.rescale_to_data_range(rep)?;
                }
            }

            self.publish_context(index, variable);
            if let Some(target) = target {
                self.fit_to_viewport(target, pipeline)?;
            }
        }

        self.state.mark(StateField::Average);
        self.state.mark(StateField::ColorRange);
        self.state.mark(StateField::Colorbar);
        self.state.flush();
        Ok(())
    }

    // ========================================================================
    // Camera
    // ========================================================================

    pub fn zoom_in(&mut self, index: usize) -> QvResult<()> {
        let factor = self.defaults.zoom_in_factor;
        self.zoom(index, factor)
    }

    pub fn zoom_out(&mut self, index: usize) -> QvResult<()> {
        let factor = self.defaults.zoom_out_factor;
        self.zoom(index, factor)
    }

    fn zoom(&mut self, index: usize, factor: f64) -> QvResult<()> {
        let (_, target) = self.target_at(index)?;
        self.backend.camera_mut(target)?.zoom(factor);
        Ok(())
    }

    /// Move the camera along `axis` by a fraction of the projected extent.
    pub fn pan_camera(&mut self, axis: usize, factor: f64, index: usize, pipeline: &Pipeline) -> QvResult<()> {
        if axis > 2 {
            return Err(QuickViewError::range(format!("pan axis {}", axis)));
        }
        let (_, target) = self.target_at(index)?;
        let offset = pan_offset(&pipeline.move_extents(), axis, factor, self.defaults.pan_ratio);
        self.backend.camera_mut(target)?.pan(axis, offset);
        Ok(())
    }

    /// Fit a target's camera to the graticule bounds; returns false when
    /// there is nothing to fit.
    pub fn fit_to_viewport(&mut self, target: TargetId, pipeline: &Pipeline) -> QvResult<bool> {
        let bounds = pipeline.ports().gridlines.current().bounds();
        let size = self.backend.view_size(target)?;
        let Some(scale) = fit_parallel_scale(&bounds, size, self.defaults.fit_margin) else {
            debug!(view = %ref_name(target), "Nothing to fit");
            return Ok(false);
        };
        self.backend.camera_mut(target)?.look_at_bounds(&bounds, scale);
        Ok(true)
    }

    /// Fit every active view.
    pub fn reset_camera(&mut self, pipeline: &Pipeline) -> QvResult<()> {
        let targets: Vec<TargetId> = self
            .state
            .variables
            .iter()
            .filter_map(|v| self.registry.get(v).and_then(|ctx| ctx.target))
            .collect();
        for target in targets {
            self.fit_to_viewport(target, pipeline)?;
        }
        Ok(())
    }

    // ========================================================================
    // Disposal
    // ========================================================================

    /// Dispose the detached target whose reference name is `name`.
    ///
    /// Only targets on the deletion list are disposed; names of active views
    /// and unknown names are ignored. Returns whether a target was disposed.
    pub fn delete_render_view(&mut self, name: &str) -> bool {
        let Some(pos) = self.to_delete.iter().position(|(n, _)| n == name) else {
            debug!(view = %name, "No pending deletion for view");
            return false;
        };
        let (_, target) = self.to_delete.remove(pos);
        self.backend.dispose_target(target);
        debug!(view = %name, "Render view disposed");
        true
    }

    /// Dispose every detached target. For callers without UI widgets.
    pub fn dispose_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.to_delete);
        for (_, target) in &pending {
            self.backend.dispose_target(*target);
        }
        pending.len()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub fn render_view(&mut self, index: usize) -> QvResult<Image> {
        let (_, target) = self.target_at(index)?;
        Ok(self.backend.render(target)?)
    }

    /// Render every active view, in display order.
    pub fn render_all(&mut self) -> QvResult<Vec<(String, Image)>> {
        let mut images = Vec::with_capacity(self.state.len());
        for index in 0..self.state.len() {
            let (variable, target) = self.target_at(index)?;
            images.push((variable, self.backend.render(target)?));
        }
        Ok(images)
    }
}

fn field_values<'a>(mesh: &'a Mesh, variable: &str) -> &'a [f64] {
    mesh.cell_data.get(variable).map(|v| v.as_slice()).unwrap_or(&[])
}

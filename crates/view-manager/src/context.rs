//! Per-variable view configuration.

use quickview_common::state::SavedViewSettings;
use renderer::{RepresentationId, TargetId};

/// Render reference name of a target, as seen by UI widgets.
pub fn ref_name(target: TargetId) -> String {
    format!("view{}", target)
}

/// Display settings and render bindings of one variable.
///
/// Contexts outlive deselection: the render target is detached and
/// recreated on reselection while the color settings are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext {
    pub variable: String,
    /// Position in the active variable list of the last rebuild.
    pub index: usize,
    pub target: Option<TargetId>,
    pub data_rep: Option<RepresentationId>,
    pub colormap: String,
    pub use_log_scale: bool,
    pub invert_colors: bool,
    pub min_value: f64,
    pub max_value: f64,
    pub override_range: bool,
    /// Whether the color settings were applied at least once.
    pub has_been_configured: bool,
}

impl ViewContext {
    pub fn new(variable: impl Into<String>, index: usize, colormap: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            index,
            target: None,
            data_rep: None,
            colormap: colormap.into(),
            use_log_scale: false,
            invert_colors: false,
            min_value: f64::NAN,
            max_value: f64::NAN,
            override_range: false,
            has_been_configured: false,
        }
    }

    /// Context restored from a state file; it has no target yet.
    pub fn from_saved(variable: impl Into<String>, saved: &SavedViewSettings, default_colormap: &str) -> Self {
        let mut ctx = Self::new(variable, 0, saved.colormap.as_deref().unwrap_or(default_colormap));
        ctx.use_log_scale = saved.use_log_scale;
        ctx.invert_colors = saved.invert_colors;
        ctx.override_range = saved.override_range;
        if saved.override_range {
            ctx.min_value = saved.min_value;
            ctx.max_value = saved.max_value;
        }
        ctx
    }

    pub fn ref_name(&self) -> Option<String> {
        self.target.map(ref_name)
    }

    /// Take the render bindings, leaving the settings in place.
    pub fn detach(&mut self) -> Option<TargetId> {
        self.data_rep = None;
        self.target.take()
    }

    /// Pin the color range.
    pub fn pin_range(&mut self, min: f64, max: f64) {
        self.min_value = min;
        self.max_value = max;
        self.override_range = true;
    }

    /// Range the transfer function should use given the data range.
    pub fn color_range(&self, data_range: [f64; 2]) -> [f64; 2] {
        if self.override_range {
            [self.min_value, self.max_value]
        } else {
            data_range
        }
    }
}

//! Defaults applied to newly created views.

use serde::{Deserialize, Serialize};

use renderer::DEFAULT_COLORMAP;

/// Defaults applied to newly created views and camera controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    /// Colormap of a variable with no saved setting.
    pub default_colormap: String,

    /// Render target size in pixels.
    pub viewport_width: usize,
    pub viewport_height: usize,

    /// Parallel scale factor of one zoom-in step.
    pub zoom_in_factor: f64,

    /// Parallel scale factor of one zoom-out step.
    pub zoom_out_factor: f64,

    /// Fraction of the projected extent moved by one pan step.
    pub pan_ratio: f64,

    /// Margin around the data when fitting a view (1.05 = 5%).
    pub fit_margin: f64,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            default_colormap: DEFAULT_COLORMAP.to_string(),
            viewport_width: 800,
            viewport_height: 600,
            zoom_in_factor: 0.95,
            zoom_out_factor: 1.05,
            pan_ratio: 0.05,
            fit_margin: 1.05,
        }
    }
}

impl ViewDefaults {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("QUICKVIEW_DEFAULT_COLORMAP") {
            config.default_colormap = val;
        }

        if let Ok(val) = std::env::var("QUICKVIEW_VIEWPORT_WIDTH") {
            if let Ok(width) = val.parse() {
                config.viewport_width = width;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_VIEWPORT_HEIGHT") {
            if let Ok(height) = val.parse() {
                config.viewport_height = height;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_ZOOM_IN_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.zoom_in_factor = factor;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_ZOOM_OUT_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.zoom_out_factor = factor;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_PAN_RATIO") {
            if let Ok(ratio) = val.parse() {
                config.pan_ratio = ratio;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_FIT_MARGIN") {
            if let Ok(margin) = val.parse() {
                config.fit_margin = margin;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err("viewport size must be > 0".to_string());
        }

        if !(self.zoom_in_factor > 0.0 && self.zoom_in_factor < 1.0) {
            return Err("zoom_in_factor must be in (0, 1)".to_string());
        }

        if self.zoom_out_factor <= 1.0 {
            return Err("zoom_out_factor must be > 1".to_string());
        }

        if !(self.pan_ratio > 0.0 && self.pan_ratio <= 1.0) {
            return Err("pan_ratio must be in (0, 1]".to_string());
        }

        if self.fit_margin < 1.0 {
            return Err("fit_margin must be >= 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = ViewDefaults::default();
        assert_eq!(defaults.default_colormap, "Cool to Warm");
        assert_eq!(defaults.zoom_in_factor, 0.95);
        assert_eq!(defaults.zoom_out_factor, 1.05);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_validate_zoom_factors() {
        let defaults = ViewDefaults {
            zoom_in_factor: 1.2,
            ..Default::default()
        };
        assert!(defaults.validate().is_err());
    }
}

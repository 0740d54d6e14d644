//! Configuration for the data pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use geometry::{DEFAULT_INTERVAL, DEFAULT_OUTLINE_SAMPLES};
use projection::{ProjectionKind, DEFAULT_GLOBE_RADIUS};

/// Configuration for the data pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Spacing of graticule lines in degrees.
    pub gridline_interval: f64,

    /// Globe radius used when outputs are mapped onto the sphere.
    pub globe_radius: f64,

    /// Samples along each parallel edge of the map outline.
    pub outline_samples: usize,

    /// Projection applied until the first `update_projection`.
    pub default_projection: String,

    /// Coastline polylines drawn instead of the map outline.
    pub coastline_file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gridline_interval: DEFAULT_INTERVAL,
            globe_radius: DEFAULT_GLOBE_RADIUS,
            outline_samples: DEFAULT_OUTLINE_SAMPLES,
            default_projection: ProjectionKind::default().name().to_string(),
            coastline_file: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("QUICKVIEW_GRIDLINE_INTERVAL") {
            if let Ok(interval) = val.parse() {
                config.gridline_interval = interval;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_GLOBE_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.globe_radius = radius;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_OUTLINE_SAMPLES") {
            if let Ok(samples) = val.parse() {
                config.outline_samples = samples;
            }
        }

        if let Ok(val) = std::env::var("QUICKVIEW_DEFAULT_PROJECTION") {
            config.default_projection = val;
        }

        if let Ok(val) = std::env::var("QUICKVIEW_COASTLINE_FILE") {
            if !val.is_empty() {
                config.coastline_file = Some(PathBuf::from(val));
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.gridline_interval > 0.0 && self.gridline_interval <= 180.0) {
            return Err("gridline_interval must be in (0, 180]".to_string());
        }

        if !(self.globe_radius.is_finite() && self.globe_radius > 0.0) {
            return Err("globe_radius must be > 0".to_string());
        }

        if self.outline_samples < 4 {
            return Err("outline_samples must be >= 4".to_string());
        }

        ProjectionKind::from_name(&self.default_projection).map_err(|e| e.to_string())?;

        Ok(())
    }
}

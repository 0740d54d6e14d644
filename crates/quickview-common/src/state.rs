//! Persisted session state.
//!
//! The state file is a flat JSON object. Per-variable arrays (`varcolor`,
//! `varmin`, ...) are parallel to `variables` as it was at save time, and
//! `layout[].i` indexes into that same list. Consumers re-key both by
//! variable name on load because the active variable set may differ.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QuickViewError, QvResult};
use crate::layout::{rekey_by_name, GridPlacement, LayoutItem};

/// Flat session state as written to and read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    pub data_file: Option<String>,
    pub conn_file: Option<String>,
    pub tstamp: usize,
    pub midpoint: usize,
    pub interface: usize,
    pub cliplat: [f64; 2],
    pub cliplong: [f64; 2],
    pub projection: String,
    pub center: f64,
    pub variables: Vec<String>,
    pub varcolor: Vec<String>,
    pub uselogscale: Vec<bool>,
    pub invert: Vec<bool>,
    #[serde(with = "nan_as_null")]
    pub varmin: Vec<f64>,
    #[serde(with = "nan_as_null")]
    pub varmax: Vec<f64>,
    pub override_range: Vec<bool>,
    #[serde(with = "nan_as_null")]
    pub varaverage: Vec<f64>,
    pub use_cvd_colors: bool,
    pub use_standard_colors: bool,
    pub layout: Vec<LayoutItem>,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            data_file: None,
            conn_file: None,
            tstamp: 0,
            midpoint: 0,
            interface: 0,
            cliplat: [-90.0, 90.0],
            cliplong: [-180.0, 180.0],
            projection: "Cyl. Equidistant".to_string(),
            center: 0.0,
            variables: Vec::new(),
            varcolor: Vec::new(),
            uselogscale: Vec::new(),
            invert: Vec::new(),
            varmin: Vec::new(),
            varmax: Vec::new(),
            override_range: Vec::new(),
            varaverage: Vec::new(),
            use_cvd_colors: false,
            use_standard_colors: true,
            layout: Vec::new(),
        }
    }
}

/// Color settings of one variable recovered from a state file.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedViewSettings {
    pub colormap: Option<String>,
    pub use_log_scale: bool,
    pub invert_colors: bool,
    pub min_value: f64,
    pub max_value: f64,
    pub override_range: bool,
}

impl SavedState {
    pub fn from_json(json: &str) -> QvResult<Self> {
        let state: SavedState = serde_json::from_str(json)
            .map_err(|e| QuickViewError::StateFile(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_json_pretty(&self) -> QvResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read_from(path: impl AsRef<Path>) -> QvResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> QvResult<()> {
        std::fs::write(path.as_ref(), self.to_json_pretty()?)?;
        Ok(())
    }

    /// Reject windows that cannot be applied.
    pub fn validate(&self) -> QvResult<()> {
        if self.cliplat[0] > self.cliplat[1] || self.cliplong[0] > self.cliplong[1] {
            return Err(QuickViewError::StateFile(format!(
                "inverted clip window: cliplong {:?}, cliplat {:?}",
                self.cliplong, self.cliplat
            )));
        }
        Ok(())
    }

    /// Saved grid placements keyed by variable name.
    pub fn layout_by_name(&self) -> HashMap<String, GridPlacement> {
        rekey_by_name(&self.layout, &self.variables)
    }

    /// Saved color settings keyed by variable name.
    ///
    /// Missing trailing entries in the per-variable arrays fall back to
    /// defaults; an override is only honored when both bounds are numbers.
    pub fn view_settings_by_name(&self) -> HashMap<String, SavedViewSettings> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let min_value = self.varmin.get(i).copied().unwrap_or(f64::NAN);
                let max_value = self.varmax.get(i).copied().unwrap_or(f64::NAN);
                let override_range = self.override_range.get(i).copied().unwrap_or(false)
                    && !min_value.is_nan()
                    && !max_value.is_nan();
                let settings = SavedViewSettings {
                    colormap: self.varcolor.get(i).cloned(),
                    use_log_scale: self.uselogscale.get(i).copied().unwrap_or(false),
                    invert_colors: self.invert.get(i).copied().unwrap_or(false),
                    min_value,
                    max_value,
                    override_range,
                };
                (name.clone(), settings)
            })
            .collect()
    }
}

/// Serialize `Vec<f64>` with NaN written as JSON `null`.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) }),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

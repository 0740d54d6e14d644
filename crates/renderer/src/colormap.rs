//! Colormap presets.
//!
//! A [`PresetTable`] is built once at startup and shared read-only. Presets
//! are stored as ParaView-style `RGBPoints` normalized to `[0, 1]`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};

pub const DEFAULT_COLORMAP: &str = "Cool to Warm";

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// From unit-interval RGB components.
    pub fn from_unit_rgb(rgb: [f64; 3]) -> Self {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(c(rgb[0]), c(rgb[1]), c(rgb[2]), 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear interpolation between two unit-interval RGB triples.
pub fn interpolate_rgb(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// One control point: normalized position and unit-interval RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetPoint {
    pub x: f64,
    pub rgb: [f64; 3],
}

/// Whether a preset belongs to the color-vision-deficiency friendly set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetGroup {
    Standard,
    ColorVisionFriendly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorPreset {
    pub name: String,
    pub group: PresetGroup,
    pub points: Vec<PresetPoint>,
}

impl ColorPreset {
    /// Build from a flat `[x, r, g, b, ...]` array, rescaling x to `[0, 1]`.
    pub fn from_rgb_points(name: &str, group: PresetGroup, flat: &[f64]) -> RenderResult<Self> {
        if flat.len() < 8 || flat.len() % 4 != 0 {
            return Err(RenderError::InvalidPreset(format!(
                "'{}' needs at least two [x, r, g, b] points, got {} values",
                name,
                flat.len()
            )));
        }
        let lo = flat[0];
        let hi = flat[flat.len() - 4];
        let span = if hi > lo { hi - lo } else { 1.0 };
        let points = flat
            .chunks_exact(4)
            .map(|c| PresetPoint {
                x: (c[0] - lo) / span,
                rgb: [c[1], c[2], c[3]],
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            group,
            points,
        })
    }

    /// Color at normalized position `t`.
    pub fn sample(&self, t: f64) -> [f64; 3] {
        sample_points(&self.points, t)
    }
}

/// Piecewise-linear lookup over sorted control points.
pub(crate) fn sample_points(points: &[PresetPoint], t: f64) -> [f64; 3] {
    match points {
        [] => [0.0; 3],
        [only] => only.rgb,
        _ => {
            let first = points[0];
            let last = points[points.len() - 1];
            if t <= first.x {
                return first.rgb;
            }
            if t >= last.x {
                return last.rgb;
            }
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if t <= b.x {
                    let span = b.x - a.x;
                    let f = if span > 0.0 { (t - a.x) / span } else { 1.0 };
                    return interpolate_rgb(a.rgb, b.rgb, f);
                }
            }
            last.rgb
        }
    }
}

/// Entry of a ParaView JSON preset file.
#[derive(Debug, Deserialize)]
struct ParaViewPreset {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "RGBPoints", default)]
    rgb_points: Vec<f64>,
}

/// Immutable lookup table of named presets.
#[derive(Debug, Clone)]
pub struct PresetTable {
    presets: HashMap<String, ColorPreset>,
    order: Vec<String>,
}

impl PresetTable {
    pub fn empty() -> Self {
        Self {
            presets: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The standard and color-vision friendly presets.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (name, group, points) in BUILTIN_PRESETS {
            // Builtin tables are well-formed; a malformed one is skipped.
            if let Ok(preset) = ColorPreset::from_rgb_points(name, *group, points) {
                table.insert(preset);
            }
        }
        debug!(presets = table.len(), "Built colormap preset table");
        table
    }

    /// Builtin presets plus those in the given ParaView JSON preset files.
    pub fn with_files<P: AsRef<Path>>(paths: &[P]) -> RenderResult<Self> {
        let mut table = Self::builtin();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)?;
            let added = table.load_paraview_json(&content)?;
            info!(path = %path.display(), presets = added, "Loaded colormap presets");
        }
        Ok(table)
    }

    /// Add presets from a ParaView JSON export; returns how many were added.
    /// Imported presets join the color-vision friendly group.
    pub fn load_paraview_json(&mut self, json: &str) -> RenderResult<usize> {
        let entries: Vec<ParaViewPreset> = serde_json::from_str(json)?;
        let mut added = 0;
        for entry in entries {
            if entry.rgb_points.is_empty() {
                debug!(preset = %entry.name, "Skipping preset without RGBPoints");
                continue;
            }
            let preset = ColorPreset::from_rgb_points(
                &entry.name,
                PresetGroup::ColorVisionFriendly,
                &entry.rgb_points,
            )?;
            self.insert(preset);
            added += 1;
        }
        Ok(added)
    }

    fn insert(&mut self, preset: ColorPreset) {
        if !self.presets.contains_key(&preset.name) {
            self.order.push(preset.name.clone());
        }
        self.presets.insert(preset.name.clone(), preset);
    }

    pub fn get(&self, name: &str) -> RenderResult<&ColorPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| RenderError::UnknownPreset(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names offered to the user for the two palette toggles.
    ///
    /// With neither toggle set the standard list is offered. With both set
    /// the friendly presets come first.
    pub fn available(&self, use_cvd: bool, use_standard: bool) -> Vec<&str> {
        let group = |g: PresetGroup| -> Vec<&str> {
            self.order
                .iter()
                .filter(|n| self.presets[n.as_str()].group == g)
                .map(|n| n.as_str())
                .collect()
        };
        match (use_cvd, use_standard) {
            (true, true) => {
                let mut all = group(PresetGroup::ColorVisionFriendly);
                all.extend(group(PresetGroup::Standard));
                all
            }
            (true, false) => group(PresetGroup::ColorVisionFriendly),
            _ => group(PresetGroup::Standard),
        }
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::builtin()
    }
}

use self::PresetGroup::{ColorVisionFriendly as Cvd, Standard as Std};

const BUILTIN_PRESETS: &[(&str, PresetGroup, &[f64])] = &[
    (
        "Rainbow Desaturated",
        Std,
        &[
            0.0, 0.278431, 0.278431, 0.858824, //
            0.143, 0.0, 0.0, 0.360784, //
            0.285, 0.0, 1.0, 1.0, //
            0.429, 0.0, 0.501961, 0.0, //
            0.571, 1.0, 1.0, 0.0, //
            0.714, 1.0, 0.380392, 0.0, //
            0.857, 0.419608, 0.0, 0.0, //
            1.0, 0.878431, 0.301961, 0.301961,
        ],
    ),
    (
        "Cool to Warm",
        Std,
        &[
            0.0, 0.231373, 0.298039, 0.752941, //
            0.5, 0.865003, 0.865003, 0.865003, //
            1.0, 0.705882, 0.015686, 0.149020,
        ],
    ),
    (
        "Jet",
        Std,
        &[
            -1.0, 0.0, 0.0, 0.5625, //
            -0.777778, 0.0, 0.0, 1.0, //
            -0.269841, 0.0, 1.0, 1.0, //
            -0.015873, 0.5, 1.0, 0.5, //
            0.238095, 1.0, 1.0, 0.0, //
            0.746032, 1.0, 0.0, 0.0, //
            1.0, 0.5, 0.0, 0.0,
        ],
    ),
    (
        "Yellow - Gray - Blue",
        Std,
        &[
            0.0, 0.988235, 0.854902, 0.301961, //
            0.25, 0.858824, 0.776471, 0.509804, //
            0.5, 0.639216, 0.639216, 0.639216, //
            0.75, 0.364706, 0.486275, 0.682353, //
            1.0, 0.117647, 0.270588, 0.639216,
        ],
    ),
    (
        "Viridis (matplotlib)",
        Cvd,
        &[
            0.0, 0.267004, 0.004874, 0.329415, //
            0.1, 0.282623, 0.140926, 0.457517, //
            0.2, 0.253935, 0.265254, 0.529983, //
            0.3, 0.206756, 0.371758, 0.553117, //
            0.4, 0.163625, 0.471133, 0.558148, //
            0.5, 0.127568, 0.566949, 0.550556, //
            0.6, 0.134692, 0.658636, 0.517649, //
            0.7, 0.266941, 0.748751, 0.440573, //
            0.8, 0.477504, 0.821444, 0.318195, //
            0.9, 0.741388, 0.873449, 0.149561, //
            1.0, 0.993248, 0.906157, 0.143936,
        ],
    ),
    (
        "Cividis",
        Cvd,
        &[
            0.0, 0.0, 0.126200, 0.301500, //
            0.1, 0.108700, 0.196400, 0.423200, //
            0.2, 0.254600, 0.270400, 0.429000, //
            0.3, 0.345400, 0.337400, 0.444100, //
            0.4, 0.423900, 0.403500, 0.460400, //
            0.5, 0.495300, 0.472200, 0.477600, //
            0.6, 0.583200, 0.541400, 0.473500, //
            0.7, 0.677000, 0.613800, 0.456600, //
            0.8, 0.776300, 0.690600, 0.429000, //
            0.9, 0.882100, 0.771400, 0.386100, //
            1.0, 0.995600, 0.905200, 0.214700,
        ],
    ),
    (
        "Inferno (matplotlib)",
        Cvd,
        &[
            0.0, 0.001462, 0.000466, 0.013866, //
            0.1, 0.087411, 0.044556, 0.224813, //
            0.2, 0.258234, 0.038571, 0.406485, //
            0.3, 0.416331, 0.090203, 0.432943, //
            0.4, 0.578304, 0.148039, 0.404411, //
            0.5, 0.735683, 0.215906, 0.330245, //
            0.6, 0.865006, 0.316822, 0.226055, //
            0.7, 0.954506, 0.468744, 0.099874, //
            0.8, 0.987622, 0.645320, 0.039886, //
            0.9, 0.964394, 0.843848, 0.273391, //
            1.0, 0.988362, 0.998364, 0.644924,
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let table = PresetTable::builtin();
        assert_eq!(table.len(), 7);
        assert!(table.contains(DEFAULT_COLORMAP));
        assert!(matches!(table.get("Nope"), Err(RenderError::UnknownPreset(_))));
    }

    #[test]
    fn test_jet_normalized() {
        let table = PresetTable::builtin();
        let jet = table.get("Jet").unwrap();
        assert_eq!(jet.points[0].x, 0.0);
        assert_eq!(jet.points.last().unwrap().x, 1.0);
    }

    #[test]
    fn test_available_lists() {
        let table = PresetTable::builtin();
        assert_eq!(
            table.available(false, false),
            vec!["Rainbow Desaturated", "Cool to Warm", "Jet", "Yellow - Gray - Blue"]
        );
        assert_eq!(table.available(true, false).len(), 3);
        let both = table.available(true, true);
        assert_eq!(both.len(), 7);
        assert_eq!(both[0], "Viridis (matplotlib)");
        assert_eq!(table.available(false, true), table.available(false, false));
    }

    #[test]
    fn test_sample_midpoint() {
        let table = PresetTable::builtin();
        let c2w = table.get("Cool to Warm").unwrap();
        assert_eq!(c2w.sample(0.5), [0.865003, 0.865003, 0.865003]);
        assert_eq!(c2w.sample(-1.0), c2w.points[0].rgb);
    }

    #[test]
    fn test_load_paraview_json() {
        let mut table = PresetTable::builtin();
        let json = r#"[{"Name": "Gray Ramp", "RGBPoints": [10, 0, 0, 0, 20, 1, 1, 1]},
                       {"Name": "Indexed", "Annotations": []}]"#;
        assert_eq!(table.load_paraview_json(json).unwrap(), 1);
        let gray = table.get("Gray Ramp").unwrap();
        assert_eq!(gray.points[1].x, 1.0);
        assert!(table.available(true, false).contains(&"Gray Ramp"));
    }

    #[test]
    fn test_rejects_short_points() {
        let err = ColorPreset::from_rgb_points("x", PresetGroup::Standard, &[0.0, 1.0, 1.0, 1.0]);
        assert!(matches!(err, Err(RenderError::InvalidPreset(_))));
    }
}

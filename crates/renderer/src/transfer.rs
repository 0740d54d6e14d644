//! Color transfer functions: scalar value to color.

use tracing::warn;

use crate::colormap::{interpolate_rgb, Color, ColorPreset, PresetPoint};

/// Control points in data space plus the log-scale and inversion state.
///
/// `invert` is a toggle: it reverses the color order of the current control
/// points, so two calls restore the original order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTransferFunction {
    preset: String,
    points: Vec<PresetPoint>,
    log_scale: bool,
    inverted: bool,
    /// Alpha used for NaN values.
    pub nan_opacity: f64,
}

impl ColorTransferFunction {
    /// A transfer function spanning `[0, 1]` with `preset`'s colors.
    pub fn new(preset: &ColorPreset) -> Self {
        Self {
            preset: preset.name.clone(),
            points: preset.points.clone(),
            log_scale: false,
            inverted: false,
            nan_opacity: 0.0,
        }
    }

    pub fn preset_name(&self) -> &str {
        &self.preset
    }

    pub fn points(&self) -> &[PresetPoint] {
        &self.points
    }

    pub fn is_log_scale(&self) -> bool {
        self.log_scale
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Current `[min, max]` of the control points.
    pub fn range(&self) -> [f64; 2] {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => [a.x, b.x],
            _ => [0.0, 1.0],
        }
    }

    /// Replace the colors with `preset`, keeping the current range.
    ///
    /// Resets the inversion state; callers that track inversion reapply it.
    pub fn apply_preset(&mut self, preset: &ColorPreset) {
        let [lo, hi] = self.range();
        self.preset = preset.name.clone();
        self.inverted = false;
        self.points = preset
            .points
            .iter()
            .map(|p| PresetPoint {
                x: lo + p.x * (hi - lo),
                rgb: p.rgb,
            })
            .collect();
        if self.log_scale {
            self.log_scale = false;
            self.map_to_log_space();
        }
    }

    /// Reverse the color order.
    pub fn invert(&mut self) {
        let colors: Vec<[f64; 3]> = self.points.iter().rev().map(|p| p.rgb).collect();
        for (p, rgb) in self.points.iter_mut().zip(colors) {
            p.rgb = rgb;
        }
        self.inverted = !self.inverted;
    }

    /// Respace control points logarithmically over the current range.
    ///
    /// Needs a strictly positive range; otherwise the points stay linear and
    /// values are still mapped in log space where positive.
    pub fn map_to_log_space(&mut self) {
        if self.log_scale {
            return;
        }
        self.log_scale = true;
        let [lo, hi] = self.range();
        if lo <= 0.0 || hi <= lo {
            warn!(min = lo, max = hi, preset = %self.preset, "Range not positive, log mapping limited");
            return;
        }
        let (llo, lhi) = (lo.ln(), hi.ln());
        for p in &mut self.points {
            let t = (p.x - lo) / (hi - lo);
            p.x = (llo + t * (lhi - llo)).exp();
        }
    }

    /// Inverse of [`map_to_log_space`](Self::map_to_log_space).
    pub fn map_to_linear_space(&mut self) {
        if !self.log_scale {
            return;
        }
        self.log_scale = false;
        let [lo, hi] = self.range();
        if lo <= 0.0 || hi <= lo {
            return;
        }
        let (llo, lhi) = (lo.ln(), hi.ln());
        for p in &mut self.points {
            let t = (p.x.ln() - llo) / (lhi - llo);
            p.x = lo + t * (hi - lo);
        }
    }

    /// Move the control points onto `[min, max]`, preserving their relative
    /// placement (in log space when log scale is on).
    ///
    /// Returns false and leaves the function untouched for a non-finite or
    /// reversed range.
    pub fn rescale(&mut self, min: f64, max: f64) -> bool {
        if !min.is_finite() || !max.is_finite() || min > max {
            warn!(min, max, preset = %self.preset, "Ignoring invalid transfer function range");
            return false;
        }
        let [lo, hi] = self.range();
        let log = self.log_scale && lo > 0.0 && hi > lo && min > 0.0;
        let rel = |x: f64| -> f64 {
            if hi <= lo {
                0.0
            } else if log {
                (x.ln() - lo.ln()) / (hi.ln() - lo.ln())
            } else {
                (x - lo) / (hi - lo)
            }
        };
        let last = self.points.len().saturating_sub(1);
        let n = self.points.len();
        for (i, p) in self.points.iter_mut().enumerate() {
            // Degenerate current range: spread evenly.
            let t = if hi <= lo {
                if last == 0 {
                    0.0
                } else {
                    i as f64 / last as f64
                }
            } else {
                rel(p.x)
            };
            p.x = if log && max > min {
                (min.ln() + t * (max.ln() - min.ln())).exp()
            } else {
                min + t * (max - min)
            };
        }
        if n > 0 {
            self.points[0].x = min;
            self.points[last].x = max;
        }
        true
    }

    /// Color for `value`; NaN maps to the NaN color, values outside the
    /// range clamp to the end colors.
    pub fn map_value(&self, value: f64) -> Color {
        if value.is_nan() {
            return Color::new(128, 128, 128, (self.nan_opacity.clamp(0.0, 1.0) * 255.0) as u8);
        }
        let use_log = self.log_scale && value > 0.0 && self.points.first().is_some_and(|p| p.x > 0.0);
        let key = |x: f64| if use_log { x.ln() } else { x };
        let v = key(value);
        let rgb = match self.points.as_slice() {
            [] => [0.0; 3],
            [only] => only.rgb,
            points => {
                let first = points[0];
                let last = points[points.len() - 1];
                if v <= key(first.x) {
                    first.rgb
                } else if v >= key(last.x) {
                    last.rgb
                } else {
                    points
                        .windows(2)
                        .find(|w| v <= key(w[1].x))
                        .map(|w| {
                            let (a, b) = (key(w[0].x), key(w[1].x));
                            let f = if b > a { (v - a) / (b - a) } else { 1.0 };
                            interpolate_rgb(w[0].rgb, w[1].rgb, f)
                        })
                        .unwrap_or(last.rgb)
                }
            }
        };
        Color::from_unit_rgb(rgb)
    }

    /// `samples` colors evenly spaced along the control points, in order.
    pub fn sample_colors(&self, samples: usize) -> Vec<Color> {
        let n = self.points.len();
        if n == 0 || samples == 0 {
            return Vec::new();
        }
        // Sampled by normalized point position so log spacing does not skew
        // the bar.
        let [lo, hi] = self.range();
        let normalized: Vec<PresetPoint> = self
            .points
            .iter()
            .map(|p| PresetPoint {
                x: if hi > lo { (p.x - lo) / (hi - lo) } else { 0.0 },
                rgb: p.rgb,
            })
            .collect();
        (0..samples)
            .map(|i| {
                let t = i as f64 / samples as f64;
                Color::from_unit_rgb(crate::colormap::sample_points(&normalized, t))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::PresetTable;

    fn cool_to_warm() -> ColorTransferFunction {
        let table = PresetTable::builtin();
        ColorTransferFunction::new(table.get("Cool to Warm").unwrap())
    }

    #[test]
    fn test_invert_is_toggle() {
        let mut tf = cool_to_warm();
        let original = tf.points().to_vec();
        tf.invert();
        assert!(tf.is_inverted());
        assert_eq!(tf.points()[0].rgb, original[2].rgb);
        tf.invert();
        assert!(!tf.is_inverted());
        assert_eq!(tf.points(), original.as_slice());
    }

    #[test]
    fn test_rescale() {
        let mut tf = cool_to_warm();
        assert!(tf.rescale(200.0, 320.0));
        assert_eq!(tf.range(), [200.0, 320.0]);
        assert_eq!(tf.points()[1].x, 260.0);
        assert!(!tf.rescale(5.0, 1.0));
        assert_eq!(tf.range(), [200.0, 320.0]);
    }

    #[test]
    fn test_rescale_from_degenerate_range() {
        let mut tf = cool_to_warm();
        tf.rescale(3.0, 3.0);
        assert!(tf.rescale(0.0, 10.0));
        assert_eq!(tf.points()[1].x, 5.0);
    }

    #[test]
    fn test_log_space_round_trip() {
        let mut tf = cool_to_warm();
        tf.rescale(1.0, 100.0);
        tf.map_to_log_space();
        assert!((tf.points()[1].x - 10.0).abs() < 1e-9);
        tf.map_to_linear_space();
        assert!((tf.points()[1].x - 50.5).abs() < 1e-9);
    }

    #[test]
    fn test_log_space_rescale_keeps_spacing() {
        let mut tf = cool_to_warm();
        tf.rescale(1.0, 100.0);
        tf.map_to_log_space();
        tf.rescale(10.0, 1000.0);
        assert!((tf.points()[1].x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_value() {
        let mut tf = cool_to_warm();
        tf.rescale(0.0, 10.0);
        assert_eq!(tf.map_value(-5.0), Color::from_unit_rgb(tf.points()[0].rgb));
        assert_eq!(tf.map_value(5.0), Color::from_unit_rgb(tf.points()[1].rgb));
        assert_eq!(tf.map_value(f64::NAN).a, 0);
    }

    #[test]
    fn test_apply_preset_keeps_range() {
        let table = PresetTable::builtin();
        let mut tf = cool_to_warm();
        tf.rescale(-2.0, 2.0);
        tf.invert();
        tf.apply_preset(table.get("Jet").unwrap());
        assert_eq!(tf.preset_name(), "Jet");
        assert_eq!(tf.range(), [-2.0, 2.0]);
        assert!(!tf.is_inverted());
    }

    #[test]
    fn test_sample_colors_follow_inversion() {
        let mut tf = cool_to_warm();
        let normal = tf.sample_colors(255);
        tf.invert();
        let inverted = tf.sample_colors(255);
        assert_eq!(normal.len(), 255);
        assert_eq!(normal[0], Color::from_unit_rgb(tf.points()[2].rgb));
        assert_eq!(inverted[0], Color::from_unit_rgb(tf.points()[0].rgb));
    }
}

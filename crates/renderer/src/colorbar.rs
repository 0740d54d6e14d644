//! Colorbar images as PNG data URIs, cached per `(colormap, inverted)`.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::colormap::PresetTable;
use crate::error::RenderResult;
use crate::png::encode_png;
use crate::transfer::ColorTransferFunction;

/// Horizontal samples in a colorbar strip.
pub const COLORBAR_SAMPLES: usize = 255;

/// Wrap PNG bytes in a `data:` URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// A `COLORBAR_SAMPLES` x 1 strip of the transfer function's colors.
pub fn colorbar_png(tf: &ColorTransferFunction) -> RenderResult<Vec<u8>> {
    let pixels: Vec<u8> = tf
        .sample_colors(COLORBAR_SAMPLES)
        .into_iter()
        .flat_map(|c| c.to_array())
        .collect();
    encode_png(&pixels, COLORBAR_SAMPLES, 1)
}

/// Pre-rendered colorbars for every preset, normal and inverted.
#[derive(Debug, Clone, Default)]
pub struct ColorbarCache {
    images: HashMap<(String, bool), String>,
}

impl ColorbarCache {
    pub fn build(presets: &PresetTable) -> RenderResult<Self> {
        let mut images = HashMap::new();
        for name in presets.names() {
            let mut tf = ColorTransferFunction::new(presets.get(name)?);
            images.insert((name.to_string(), false), png_data_uri(&colorbar_png(&tf)?));
            tf.invert();
            images.insert((name.to_string(), true), png_data_uri(&colorbar_png(&tf)?));
        }
        debug!(images = images.len(), "Built colorbar cache");
        Ok(Self { images })
    }

    /// Data URI for the colormap, or `None` for an unknown name.
    pub fn get(&self, colormap: &str, inverted: bool) -> Option<&str> {
        self.images
            .get(&(colormap.to_string(), inverted))
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_has_both_variants() {
        let table = PresetTable::builtin();
        let cache = ColorbarCache::build(&table).unwrap();
        assert_eq!(cache.len(), table.len() * 2);
        let normal = cache.get("Jet", false).unwrap();
        let inverted = cache.get("Jet", true).unwrap();
        assert!(normal.starts_with("data:image/png;base64,"));
        assert_ne!(normal, inverted);
        assert!(cache.get("Unknown", false).is_none());
    }

    #[test]
    fn test_colorbar_png_header() {
        let table = PresetTable::builtin();
        let tf = ColorTransferFunction::new(table.get("Viridis (matplotlib)").unwrap());
        let png = colorbar_png(&tf).unwrap();
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR width
        assert_eq!(&png[16..20], &(COLORBAR_SAMPLES as u32).to_be_bytes());
    }
}

//! Tuning constants for page classification and region detection

use serde::{Deserialize, Serialize};

use crate::error::CloudPrintError;

/// Thresholds used by the adaptive inverter
///
/// The defaults are the values the tool has always shipped with. They were
/// tuned by eye against slide decks rendered at 2x, so `blur_radius` in
/// particular should be scaled together with `render_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvertConfig {
    /// Classify every Nth pixel of the flattened raster (default: 16)
    pub sample_stride: usize,
    /// Samples below this luminance count as dark (default: 80)
    pub dark_luminance: f64,
    /// Samples above this luminance count as light (default: 180)
    pub light_luminance: f64,
    /// Pages whose dark share exceeds this are dark slides (default: 0.35)
    pub dark_ratio: f64,
    /// Box blur radius in pixels for region detection (default: 10)
    pub blur_radius: usize,
    /// Pixels whose blurred neighbourhood is below this get inverted (default: 100)
    pub region_luminance: f32,
    /// Render scale relative to the page size in points (default: 2.0)
    pub render_scale: f32,
}

impl Default for InvertConfig {
    fn default() -> Self {
        Self {
            sample_stride: 16,
            dark_luminance: 80.0,
            light_luminance: 180.0,
            dark_ratio: 0.35,
            blur_radius: 10,
            region_luminance: 100.0,
            render_scale: 2.0,
        }
    }
}

impl InvertConfig {
    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<(), CloudPrintError> {
        if self.sample_stride == 0 {
            return Err(CloudPrintError::Config(
                "sample_stride must be at least 1".into(),
            ));
        }
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(CloudPrintError::Config(format!(
                "render_scale must be positive, got {}",
                self.render_scale
            )));
        }
        if self.dark_luminance > self.light_luminance {
            return Err(CloudPrintError::Config(format!(
                "dark_luminance {} is above light_luminance {}",
                self.dark_luminance, self.light_luminance
            )));
        }
        if !(0.0..=1.0).contains(&self.dark_ratio) {
            return Err(CloudPrintError::Config(format!(
                "dark_ratio must be within 0..=1, got {}",
                self.dark_ratio
            )));
        }
        Ok(())
    }
}

//! Pixel transforms for classified pages
//!
//! Alpha is never touched.

use super::classify::PageClassification;
use super::config::InvertConfig;
use super::luminance::LuminanceMap;
use super::raster::{Raster, CHANNELS};

/// Replace R, G and B with their complement
#[inline]
fn invert_pixel(px: &mut [u8]) {
    px[0] = 255 - px[0];
    px[1] = 255 - px[1];
    px[2] = 255 - px[2];
}

/// Full photographic negative; returns the number of pixels inverted
pub fn invert_dark_page(raster: &mut Raster) -> usize {
    let mut inverted = 0;
    for px in raster.as_bytes_mut().chunks_exact_mut(CHANNELS) {
        invert_pixel(px);
        inverted += 1;
    }
    inverted
}

/// Invert only pixels that sit inside large dark regions
///
/// The region test uses the box-blurred luminance, so thin dark strokes on a
/// light background (ordinary text) never qualify. Qualifying pixels are
/// inverted from their own original colour; the blurred value is only a mask.
/// Returns the number of pixels inverted.
pub fn invert_light_page(raster: &mut Raster, config: &InvertConfig) -> usize {
    let blurred = LuminanceMap::from_raster(raster).box_blur(config.blur_radius);

    let mut inverted = 0;
    for (px, &local) in raster
        .as_bytes_mut()
        .chunks_exact_mut(CHANNELS)
        .zip(blurred.values())
    {
        if local < config.region_luminance {
            invert_pixel(px);
            inverted += 1;
        }
    }
    inverted
}

/// Dispatch to the transform for `classification`
pub fn apply_classification(
    raster: &mut Raster,
    classification: PageClassification,
    config: &InvertConfig,
) -> usize {
    match classification {
        PageClassification::Dark => invert_dark_page(raster),
        PageClassification::Light => invert_light_page(raster, config),
    }
}

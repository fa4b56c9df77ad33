//! Per-pixel luminance and the box-blurred neighbourhood map

use super::blur::{blur_horizontal, blur_vertical};
use super::raster::{Raster, CHANNELS};

/// Perceptual luminance (ITU-R BT.601 weights)
///
/// Computed in `f64` so greys land exactly on integer thresholds.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

/// One luminance sample per pixel, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl LuminanceMap {
    pub fn from_raster(raster: &Raster) -> Self {
        let values = raster
            .as_bytes()
            .chunks_exact(CHANNELS)
            .map(|px| luminance(px[0], px[1], px[2]) as f32)
            .collect();

        Self {
            width: raster.width() as usize,
            height: raster.height() as usize,
            values,
        }
    }

    /// Wrap precomputed values; `None` if the length does not match
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if values.len() != width.checked_mul(height)? {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y * self.width + x).copied()
    }

    /// Separable box blur: a horizontal pass, then a vertical pass over its output
    pub fn box_blur(&self, radius: usize) -> LuminanceMap {
        let horizontal = blur_horizontal(&self.values, self.width, self.height, radius);
        let values = blur_vertical(&horizontal, self.width, self.height, radius);

        LuminanceMap {
            width: self.width,
            height: self.height,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(0, 0, 0), 0.0);
        assert!((luminance(255, 255, 255) - 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_luminance_weights_green_highest() {
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn test_grey_luminance_is_exact() {
        for v in [80u8, 100, 180] {
            assert_eq!(luminance(v, v, v), f64::from(v));
        }
    }

    #[test]
    fn test_map_from_raster_matches_pixels() {
        let mut raster = Raster::filled(3, 2, [255, 255, 255, 255]).unwrap();
        raster.set_pixel(1, 1, [0, 0, 0, 255]);
        let map = LuminanceMap::from_raster(&raster);

        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.values().len(), 6);
        assert_eq!(map.get(1, 1), Some(0.0));
        assert!(map.get(0, 0).unwrap() > 254.0);
        assert_eq!(map.get(3, 0), None);
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(LuminanceMap::from_values(2, 2, vec![0.0; 3]).is_none());
        assert!(LuminanceMap::from_values(2, 2, vec![0.0; 4]).is_some());
    }

    #[test]
    fn test_box_blur_keeps_dimensions() {
        let map = LuminanceMap::from_values(7, 5, vec![42.0; 35]).unwrap();
        let blurred = map.box_blur(3);
        assert_eq!(blurred.width(), 7);
        assert_eq!(blurred.height(), 5);
        assert_eq!(blurred.values(), map.values());
    }
}

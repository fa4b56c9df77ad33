//! Dark-slide vs light-document classification
//!
//! A sparse luminance histogram is enough to tell a mostly-dark slide from a
//! mostly-white document, so only every `sample_stride`-th pixel is looked at.

use serde::{Deserialize, Serialize};

use super::config::InvertConfig;
use super::luminance::luminance;
use super::raster::{Raster, CHANNELS};

/// Which transform a page gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageClassification {
    /// Predominantly dark background: full negative
    Dark,
    /// Predominantly light background: invert large dark regions only
    Light,
}

impl PageClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageClassification::Dark => "dark",
            PageClassification::Light => "light",
        }
    }
}

impl std::fmt::Display for PageClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample counts behind a classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub dark_samples: usize,
    pub light_samples: usize,
    /// Midtone samples, excluded from the ratio
    pub ignored_samples: usize,
}

impl SampleStats {
    /// Share of dark samples among the dark and light ones; 0 when there are none
    pub fn dark_ratio(&self) -> f64 {
        let decisive = self.dark_samples + self.light_samples;
        if decisive == 0 {
            return 0.0;
        }
        self.dark_samples as f64 / decisive as f64
    }

    pub fn classification(&self, config: &InvertConfig) -> PageClassification {
        if self.dark_ratio() > config.dark_ratio {
            PageClassification::Dark
        } else {
            PageClassification::Light
        }
    }
}

/// Count dark, light and midtone samples over every Nth pixel
pub fn sample_page(raster: &Raster, config: &InvertConfig) -> SampleStats {
    let mut stats = SampleStats {
        dark_samples: 0,
        light_samples: 0,
        ignored_samples: 0,
    };

    for px in raster
        .as_bytes()
        .chunks_exact(CHANNELS)
        .step_by(config.sample_stride.max(1))
    {
        let lum = luminance(px[0], px[1], px[2]);
        if lum < config.dark_luminance {
            stats.dark_samples += 1;
        } else if lum > config.light_luminance {
            stats.light_samples += 1;
        } else {
            stats.ignored_samples += 1;
        }
    }

    stats
}

/// Decide whether a page is a dark slide or a light document
pub fn classify_page(raster: &Raster, config: &InvertConfig) -> PageClassification {
    sample_page(raster, config).classification(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const GREY: [u8; 4] = [128, 128, 128, 255];

    #[test]
    fn test_uniform_dark_is_dark() {
        let raster = Raster::filled(64, 48, [20, 30, 40, 255]).unwrap();
        assert_eq!(
            classify_page(&raster, &InvertConfig::default()),
            PageClassification::Dark
        );
    }

    #[test]
    fn test_uniform_light_is_light() {
        let raster = Raster::filled(64, 48, [240, 240, 230, 255]).unwrap();
        assert_eq!(
            classify_page(&raster, &InvertConfig::default()),
            PageClassification::Light
        );
    }

    #[test]
    fn test_all_midtone_defaults_to_light() {
        let raster = Raster::filled(32, 32, GREY).unwrap();
        let stats = sample_page(&raster, &InvertConfig::default());
        assert_eq!(stats.dark_samples + stats.light_samples, 0);
        assert_eq!(stats.dark_ratio(), 0.0);
        assert_eq!(
            stats.classification(&InvertConfig::default()),
            PageClassification::Light
        );
    }

    #[test]
    fn test_zero_sized_raster_is_light() {
        let raster = Raster::new(0, 0, Vec::new()).unwrap();
        assert_eq!(
            classify_page(&raster, &InvertConfig::default()),
            PageClassification::Light
        );
    }

    #[test]
    fn test_samples_every_nth_pixel() {
        // 32 pixels, stride 16: samples pixel 0 and pixel 16
        let mut raster = Raster::filled(32, 1, WHITE).unwrap();
        raster.set_pixel(0, 0, BLACK);
        raster.set_pixel(16, 0, BLACK);
        raster.set_pixel(5, 0, GREY);
        let stats = sample_page(&raster, &InvertConfig::default());

        assert_eq!(stats.dark_samples, 2);
        assert_eq!(stats.light_samples, 0);
        assert_eq!(stats.ignored_samples, 0);
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        // Exactly 35% dark stays light
        let config = InvertConfig {
            sample_stride: 1,
            ..Default::default()
        };
        let mut raster = Raster::filled(20, 1, WHITE).unwrap();
        for x in 0..7 {
            raster.set_pixel(x, 0, BLACK);
        }
        let stats = sample_page(&raster, &config);
        assert!((stats.dark_ratio() - 0.35).abs() < 1e-12);
        assert_eq!(stats.classification(&config), PageClassification::Light);

        raster.set_pixel(7, 0, BLACK);
        assert_eq!(classify_page(&raster, &config), PageClassification::Dark);
    }

    #[test]
    fn test_midtones_do_not_dilute_ratio() {
        // 2 dark, 2 light, lots of grey: ratio is 0.5
        let config = InvertConfig {
            sample_stride: 1,
            ..Default::default()
        };
        let mut raster = Raster::filled(50, 1, GREY).unwrap();
        raster.set_pixel(0, 0, BLACK);
        raster.set_pixel(1, 0, BLACK);
        raster.set_pixel(2, 0, WHITE);
        raster.set_pixel(3, 0, WHITE);
        let stats = sample_page(&raster, &config);
        assert_eq!(stats.dark_ratio(), 0.5);
        assert_eq!(stats.classification(&config), PageClassification::Dark);
    }

    #[test]
    fn test_band_edges_are_midtones() {
        let config = InvertConfig {
            sample_stride: 1,
            ..Default::default()
        };
        let mut raster = Raster::filled(4, 1, [80, 80, 80, 255]).unwrap();
        raster.set_pixel(1, 0, [180, 180, 180, 255]);
        raster.set_pixel(2, 0, [79, 79, 79, 255]);
        raster.set_pixel(3, 0, [181, 181, 181, 255]);
        let stats = sample_page(&raster, &config);

        assert_eq!(stats.dark_samples, 1);
        assert_eq!(stats.light_samples, 1);
        assert_eq!(stats.ignored_samples, 2);
    }

    #[test]
    fn test_grey_180_does_not_dilute_dark_ratio() {
        let config = InvertConfig {
            sample_stride: 1,
            ..Default::default()
        };
        let mut raster = Raster::filled(10, 1, [180, 180, 180, 255]).unwrap();
        raster.set_pixel(0, 0, BLACK);
        raster.set_pixel(1, 0, BLACK);
        let stats = sample_page(&raster, &config);

        assert_eq!(stats.light_samples, 0);
        assert_eq!(stats.dark_ratio(), 1.0);
        assert_eq!(classify_page(&raster, &config), PageClassification::Dark);
    }

    #[test]
    fn test_classification_serializes_lowercase() {
        let json = serde_json::to_string(&PageClassification::Dark).unwrap();
        assert_eq!(json, r#""dark""#);
        assert_eq!(PageClassification::Light.to_string(), "light");
    }
}

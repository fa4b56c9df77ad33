//! TOML configuration for the `cloudprint` binary
//!
//! Every table is optional; missing keys fall back to the built-in defaults.
//!
//! ```toml
//! [invert]
//! mode = "smart"
//! render_scale = 2.0
//! blur_radius = 10
//!
//! [render]
//! library_dir = "/opt/pdfium/lib"
//!
//! [pricing]
//! black_white_per_sheet = 1.3
//! color_per_sheet = 2.6
//! ```

use anyhow::Context;
use cloudprint_core::{InvertConfig, InvertMode, PricingConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub invert: InvertSection,
    pub render: RenderSection,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvertSection {
    pub mode: InvertMode,
    #[serde(flatten)]
    pub tuning: InvertConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    /// Directory holding the libpdfium shared library
    pub library_dir: Option<PathBuf>,
}

impl Config {
    /// Load and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// The file at `path`, or the defaults when no path was given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML")?;
        config.invert.tuning.validate()?;
        config.pricing.validate()?;
        Ok(config)
    }
}

//! Adaptive colour inversion for print
//!
//! Turns dark-background pages (slide decks exported with a dark theme) into
//! light pages, while leaving ordinary black-on-white documents as they are:
//!
//! 1. `classify_page` samples the raster's luminance and calls the page
//!    [`PageClassification::Dark`] or [`PageClassification::Light`].
//! 2. Dark pages get a full negative (`invert_dark_page`).
//! 3. Light pages get a box-blurred luminance mask and only pixels inside
//!    large dark regions are inverted (`invert_light_page`).
//!
//! Everything here is synchronous and works on a single in-memory [`Raster`].

pub mod blur;
pub mod classify;
pub mod config;
pub mod luminance;
pub mod raster;
pub mod transform;

pub use blur::{blur_horizontal, blur_vertical};
pub use classify::{classify_page, sample_page, PageClassification, SampleStats};
pub use config::InvertConfig;
pub use luminance::{luminance, LuminanceMap};
pub use raster::{Raster, CHANNELS};
pub use transform::{apply_classification, invert_dark_page, invert_light_page};

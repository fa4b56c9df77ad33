//! Whole-document inversion
//!
//! Pages are handled strictly in order, one at a time: report progress,
//! render, classify, transform, PNG-encode, then append a page sized to the
//! original (scale 1) page. Any failure aborts the whole document and no
//! partial output is returned.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CloudPrintError;
use crate::invert::{
    apply_classification, invert_dark_page, sample_page, InvertConfig, PageClassification, Raster,
};
use crate::render::{PageSource, Rasterizer};
use crate::writer::{encode_png, ImagePdfWriter, ImagePlacement};

/// How pages are inverted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvertMode {
    /// Classify each page and pick the matching transform
    #[default]
    Smart,
    /// Full negative on every page
    Full,
}

impl FromStr for InvertMode {
    type Err = CloudPrintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smart" => Ok(InvertMode::Smart),
            "full" => Ok(InvertMode::Full),
            other => Err(CloudPrintError::Config(format!(
                "Unknown invert mode '{}' (expected smart or full)",
                other
            ))),
        }
    }
}

/// Shared flag checked between pages
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvertOptions {
    pub mode: InvertMode,
    pub config: InvertConfig,
    pub cancel: Option<CancelFlag>,
}

/// What happened to one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    /// 1-based page number
    pub page: u32,
    /// `None` in full mode, where pages are not classified
    pub classification: Option<PageClassification>,
    pub inverted_pixels: usize,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub struct InvertOutcome {
    /// The serialized output PDF
    pub bytes: Vec<u8>,
    /// One report per page, in page order
    pub pages: Vec<PageReport>,
}

/// Classify (in smart mode) and transform one raster in place
///
/// Returns the classification used, if any, and the number of inverted pixels.
pub fn transform_page(
    raster: &mut Raster,
    mode: InvertMode,
    config: &InvertConfig,
) -> (Option<PageClassification>, usize) {
    match mode {
        InvertMode::Full => (None, invert_dark_page(raster)),
        InvertMode::Smart => {
            let stats = sample_page(raster, config);
            let classification = stats.classification(config);
            tracing::debug!(
                "Page classified {} (dark ratio {:.3}, {} dark / {} light samples)",
                classification,
                stats.dark_ratio(),
                stats.dark_samples,
                stats.light_samples
            );
            let inverted = apply_classification(raster, classification, config);
            (Some(classification), inverted)
        }
    }
}

/// Run one page: progress, render, transform
///
/// `on_progress(page_number, total_pages)` fires before `render` is called.
/// Render failures are reported against `page_number`.
pub fn process_page<F>(
    render: F,
    page_number: u32,
    total_pages: u32,
    options: &InvertOptions,
    on_progress: &mut dyn FnMut(u32, u32),
) -> Result<(Raster, PageReport), CloudPrintError>
where
    F: FnOnce() -> Result<Raster, CloudPrintError>,
{
    if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
        return Err(CloudPrintError::Cancelled { page: page_number });
    }

    on_progress(page_number, total_pages);

    let mut raster = render().map_err(|e| in_page(e, page_number))?;
    let (classification, inverted_pixels) =
        transform_page(&mut raster, options.mode, &options.config);

    let report = PageReport {
        page: page_number,
        classification,
        inverted_pixels,
        width_px: raster.width(),
        height_px: raster.height(),
    };
    tracing::debug!(
        "Page {}/{}: inverted {} of {} pixels",
        page_number,
        total_pages,
        inverted_pixels,
        raster.pixel_count()
    );

    Ok((raster, report))
}

/// Invert every page of `bytes` and return a new image-only PDF
///
/// `on_progress(current, total)` is called once per page, 1-based, before the
/// page is rendered. Unparseable input fails before any progress is reported.
pub fn invert_document<R, P>(
    rasterizer: &R,
    bytes: &[u8],
    options: &InvertOptions,
    mut on_progress: P,
) -> Result<InvertOutcome, CloudPrintError>
where
    R: Rasterizer + ?Sized,
    P: FnMut(u32, u32),
{
    options.config.validate()?;

    let mut source = rasterizer.open(bytes)?;
    let total_pages = source.page_count();
    if total_pages == 0 {
        return Err(CloudPrintError::OperationError("PDF has no pages".into()));
    }

    tracing::info!(
        "Inverting {} page(s) in {:?} mode at {}x",
        total_pages,
        options.mode,
        options.config.render_scale
    );

    let scale = options.config.render_scale;
    let mut writer = ImagePdfWriter::new();
    let mut reports = Vec::with_capacity(total_pages as usize);

    for page_index in 0..total_pages {
        let page_number = page_index + 1;
        let size = source
            .page_size(page_index)
            .map_err(|e| in_page(e, page_number))?;

        let (raster, report) = process_page(
            || source.render(page_index, scale),
            page_number,
            total_pages,
            options,
            &mut on_progress,
        )?;

        let encode_error = |e: CloudPrintError| CloudPrintError::Encode {
            page: page_number,
            message: e.to_string(),
        };
        let png = encode_png(&raster).map_err(encode_error)?;
        let page = writer.add_page(size.width, size.height);
        writer
            .draw_png(page, &png, ImagePlacement::full_page(size))
            .map_err(encode_error)?;

        reports.push(report);
    }

    let bytes = writer.save()?;
    tracing::info!("Inverted document is {} bytes", bytes.len());

    Ok(InvertOutcome {
        bytes,
        pages: reports,
    })
}

/// Invert with default settings and no progress reporting
pub fn smart_invert<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    bytes: &[u8],
) -> Result<Vec<u8>, CloudPrintError> {
    invert_document(rasterizer, bytes, &InvertOptions::default(), |_, _| {})
        .map(|outcome| outcome.bytes)
}

/// Attach a page number to errors that do not already carry one
fn in_page(error: CloudPrintError, page: u32) -> CloudPrintError {
    match error {
        CloudPrintError::Render { .. }
        | CloudPrintError::Encode { .. }
        | CloudPrintError::Cancelled { .. } => error,
        other => CloudPrintError::Render {
            page,
            message: other.to_string(),
        },
    }
}

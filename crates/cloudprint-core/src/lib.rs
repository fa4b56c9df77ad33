//! Print preparation for PDF documents
//!
//! The centrepiece is [`invert_document`]: every page is rasterized, dark
//! slides are turned into a negative and large dark blocks on light pages are
//! flipped, so a lecture deck prints on white paper without wasting toner.
//! Around it sit the page tools a print shop needs (merge, split, compress)
//! and the sheet/price arithmetic for quoting a job.
//!
//! Rendering is pluggable through [`Rasterizer`]; build with the `pdfium`
//! feature for a libpdfium-backed implementation.

pub mod command;
pub mod compress;
pub mod error;
pub mod invert;
pub mod merge;
pub mod pipeline;
pub mod pricing;
pub mod render;
pub mod split;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{PdfCommand, ProcessMetrics, ProcessResult};
pub use compress::{compress_document, CompressOutcome};
pub use error::CloudPrintError;
pub use invert::{InvertConfig, PageClassification, Raster};
pub use merge::merge_documents;
pub use pipeline::{
    invert_document, process_page, smart_invert, transform_page, CancelFlag, InvertMode,
    InvertOptions, InvertOutcome, PageReport,
};
pub use pricing::{
    calculate_pdf_price, calculate_sheets, calculate_total_price, format_price, OrderQuote,
    PriceQuote, PricingConfig, PrintJob, PrintType,
};
pub use render::{PageSize, PageSource, Rasterizer};
pub use split::{split_document, split_ranges};
pub use writer::{encode_png, ImagePdfWriter, ImagePlacement};

#[cfg(feature = "pdfium")]
pub use render::{PdfiumPages, PdfiumRasterizer};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, CloudPrintError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| CloudPrintError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse a range string like "1-3, 5" into inclusive `(start, end)` pairs, in input order
pub fn parse_range_pairs(input: &str) -> Result<Vec<(u32, u32)>, CloudPrintError> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_page(start)?, parse_page(end)?),
            None => {
                let page = parse_page(part)?;
                (page, page)
            }
        };

        if start == 0 {
            return Err(CloudPrintError::InvalidRange(
                "Page numbers must be >= 1".into(),
            ));
        }
        if start > end {
            return Err(CloudPrintError::InvalidRange(format!(
                "Start {} > end {}",
                start, end
            )));
        }
        ranges.push((start, end));
    }

    if ranges.is_empty() {
        return Err(CloudPrintError::InvalidRange("No pages specified".into()));
    }
    Ok(ranges)
}

/// Parse a range string like "1-3, 5, 8-10" into sorted unique page numbers
pub fn parse_ranges(input: &str) -> Result<Vec<u32>, CloudPrintError> {
    use std::collections::BTreeSet;

    let pages: BTreeSet<u32> = parse_range_pairs(input)?
        .into_iter()
        .flat_map(|(start, end)| start..=end)
        .collect();
    Ok(pages.into_iter().collect())
}

fn parse_page(text: &str) -> Result<u32, CloudPrintError> {
    let text = text.trim();
    text.parse()
        .map_err(|_| CloudPrintError::InvalidRange(format!("Invalid page: {}", text)))
}

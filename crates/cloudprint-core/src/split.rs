//! PDF split
//!
//! Pages are selected by deleting everything else from a copy of the
//! document and pruning whatever became unreachable.

use crate::error::CloudPrintError;
use lopdf::Document;
use std::collections::BTreeSet;

/// Keep only the listed pages (1-indexed); every number must exist
pub fn split_document(bytes: &[u8], pages: Vec<u32>) -> Result<Vec<u8>, CloudPrintError> {
    if pages.is_empty() {
        return Err(CloudPrintError::InvalidRange("No pages specified".into()));
    }
    if pages.contains(&0) {
        return Err(CloudPrintError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }

    let doc = load(bytes)?;
    let page_count = doc.get_pages().len() as u32;

    if let Some(&missing) = pages.iter().find(|&&page| page > page_count) {
        return Err(CloudPrintError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            missing, page_count
        )));
    }

    extract(doc, &pages.into_iter().collect(), page_count)
}

/// One output document per inclusive `(start, end)` range
///
/// `end` is clamped to the page count, so `(3, 99)` on a 5-page document
/// yields pages 3 to 5. A range that selects nothing is an error.
pub fn split_ranges(bytes: &[u8], ranges: &[(u32, u32)]) -> Result<Vec<Vec<u8>>, CloudPrintError> {
    if ranges.is_empty() {
        return Err(CloudPrintError::InvalidRange("No ranges specified".into()));
    }

    let doc = load(bytes)?;
    let page_count = doc.get_pages().len() as u32;

    let mut outputs = Vec::with_capacity(ranges.len());
    for &(start, end) in ranges {
        let end = end.min(page_count);
        if start == 0 || start > end {
            return Err(CloudPrintError::InvalidRange(format!(
                "Range {}-{} selects no pages (document has {} pages)",
                start, end, page_count
            )));
        }

        tracing::debug!("Extracting pages {}-{}", start, end);
        outputs.push(extract(doc.clone(), &(start..=end).collect(), page_count)?);
    }

    Ok(outputs)
}

fn load(bytes: &[u8]) -> Result<Document, CloudPrintError> {
    Document::load_mem(bytes).map_err(|e| CloudPrintError::ParseError(e.to_string()))
}

fn extract(
    mut doc: Document,
    keep: &BTreeSet<u32>,
    page_count: u32,
) -> Result<Vec<u8>, CloudPrintError> {
    let to_delete: Vec<u32> = (1..=page_count).filter(|p| !keep.contains(p)).collect();
    if !to_delete.is_empty() {
        doc.delete_pages(&to_delete);
    }

    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| CloudPrintError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}

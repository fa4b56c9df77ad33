//! Upload checks and file summary
//!
//! Runs before anything is queued for printing, so failures are reported as
//! plain messages the page can show next to the file.

use cloudprint_core::calculate_sheets;
use lopdf::Document;
use serde::Serialize;

/// What the upload form shows about a file
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub page_count: u32,
    /// Header version, e.g. "1.7"
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    /// Double-sided sheets at one slide per page
    pub sheets: u32,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Parse the document and summarise it; documents without pages are rejected
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    check_header(bytes)?;

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;

    let page_count = document.get_pages().len() as u32;
    if page_count == 0 {
        return Err("PDF has no pages".to_string());
    }

    Ok(PdfInfo {
        page_count,
        version: header_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        sheets: calculate_sheets(page_count, 1),
        title: info_text(&document, b"Title"),
        author: info_text(&document, b"Author"),
    })
}

/// Header and trailer sniffing only, for large files
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }
    Ok(())
}

/// `%PDF-1.7` -> `1.7`
fn header_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

/// A non-empty string from the trailer's Info dictionary
fn info_text(document: &Document, key: &[u8]) -> Option<String> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let value = document.get_dictionary(info_id).ok()?.get(key).ok()?;
    let text = String::from_utf8_lossy(value.as_str().ok()?).into_owned();
    (!text.is_empty()).then_some(text)
}

//! WASM bindings for CloudPrint
//!
//! The upload page validates and prices files, runs the page tools and
//! inverts slide decks entirely in the browser. Rendering pages to pixels is
//! left to the browser's PDF renderer; everything after that happens here.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { SmartInvertSession, getPdfInfo, processCommand } from './pkg/cloudprint_wasm.js';
//!
//! await init();
//!
//! const info = getPdfInfo(bytes);
//! const session = new SmartInvertSession(info.pageCount, "smart");
//! session.setProgressCallback((current, total) => updateUI(current, total));
//! for (const page of renderedPages) {
//!     session.addRenderedPage(page.rgba, page.width, page.height, page.widthPts, page.heightPts);
//! }
//! downloadBlob(session.finish(), "print-ready.pdf");
//!
//! const result = processCommand(JSON.stringify({ type: "Compress", file: Array.from(bytes) }));
//! ```

pub mod session;
pub mod validation;

use cloudprint_core::{
    calculate_total_price, OrderQuote, PdfCommand, PricingConfig, PrintJob, ProcessResult,
};
use wasm_bindgen::prelude::*;

pub use session::SmartInvertSession;
pub use validation::PdfInfo;

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Header and EOF check without a full parse
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Page count, sheets and metadata for the upload list
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;
    Ok(info.page_count)
}

/// Format bytes as human-readable string
#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Run a merge/split/compress command given as JSON
///
/// Always resolves to a result object; failures set `success: false`.
#[wasm_bindgen(js_name = processCommand)]
pub fn process_command(json: &str) -> Result<JsValue, JsValue> {
    let result = process_command_internal(json);
    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Price an order: `jobs` is a JSON array of print jobs, `pricing` an
/// optional JSON object of per-sheet prices (`blackWhitePerSheet`, `colorPerSheet`)
#[wasm_bindgen(js_name = quotePrice)]
pub fn quote_price(jobs: &str, pricing: Option<String>) -> Result<JsValue, JsValue> {
    let quote =
        quote_price_internal(jobs, pricing.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    serde_wasm_bindgen::to_value(&quote)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn process_command_internal(json: &str) -> ProcessResult {
    match serde_json::from_str::<PdfCommand>(json) {
        Ok(command) => command.process(),
        Err(e) => ProcessResult {
            success: false,
            data: None,
            error: Some(format!("Invalid command: {}", e)),
            metrics: None,
        },
    }
}

fn quote_price_internal(jobs: &str, pricing: Option<&str>) -> Result<OrderQuote, String> {
    let jobs: Vec<PrintJob> =
        serde_json::from_str(jobs).map_err(|e| format!("Invalid jobs: {}", e))?;
    let pricing: PricingConfig = match pricing {
        Some(json) => serde_json::from_str(json).map_err(|e| format!("Invalid pricing: {}", e))?,
        None => PricingConfig::default(),
    };
    pricing.validate().map_err(|e| e.to_string())?;
    Ok(calculate_total_price(&jobs, &pricing))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cloudprint_core::ImagePdfWriter;

    /// A PDF of blank US Letter pages
    pub(crate) fn blank_pdf(pages: u32) -> Vec<u8> {
        let mut writer = ImagePdfWriter::new();
        for _ in 0..pages {
            writer.add_page(612.0, 792.0);
        }
        writer.save().unwrap()
    }

    #[test]
    fn test_get_version() {
        assert!(!get_version().is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(2621440), "2.5 MB");
    }

    #[test]
    fn test_process_command_merges() {
        let json = serde_json::json!({
            "type": "Merge",
            "files": [blank_pdf(1), blank_pdf(2)],
        })
        .to_string();

        let result = process_command_internal(&json);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.metrics.unwrap().page_count, 3);
    }

    #[test]
    fn test_process_command_reports_bad_json() {
        let result = process_command_internal(r#"{"type":"Rotate"}"#);
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid command"));
    }

    #[test]
    fn test_quote_price_defaults() {
        let jobs = r#"[{"pageCount": 10}, {"pageCount": 3, "printType": "color"}]"#;
        let quote = quote_price_internal(jobs, None).unwrap();
        assert_eq!(quote.items[0].quote.total_price, 6.5);
        assert_eq!(quote.items[1].quote.total_price, 5.2);
        assert_eq!(quote.grand_total, 11.7);
    }

    #[test]
    fn test_quote_price_custom_pricing() {
        let quote = quote_price_internal(
            r#"[{"pageCount": 4, "copies": 2}]"#,
            Some(r#"{"black_white_per_sheet": 2.0}"#),
        )
        .unwrap();
        assert_eq!(quote.grand_total, 8.0);
    }

    #[test]
    fn test_quote_price_accepts_camel_case_pricing() {
        let quote = quote_price_internal(
            r#"[{"pageCount": 4, "printType": "color"}]"#,
            Some(r#"{"blackWhitePerSheet": 1.0, "colorPerSheet": 5.0}"#),
        )
        .unwrap();
        assert_eq!(quote.items[0].quote.price_per_sheet, 5.0);
        assert_eq!(quote.grand_total, 10.0);
    }

    #[test]
    fn test_quote_price_rejects_bad_input() {
        assert!(quote_price_internal("not json", None).is_err());
        assert!(quote_price_internal("[]", Some(r#"{"color_per_sheet": -1}"#)).is_err());
    }
}

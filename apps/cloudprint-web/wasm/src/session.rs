//! Browser-side inversion session
//!
//! The browser's PDF renderer rasterizes each page onto a canvas and hands
//! the RGBA pixels over one page at a time. The session inverts them and
//! collects the pages, then `finish` produces the print-ready PDF.

use cloudprint_core::{
    encode_png, process_page, ImagePdfWriter, ImagePlacement, InvertConfig, InvertMode,
    InvertOptions, PageReport, PageSize, Raster,
};
use wasm_bindgen::prelude::*;

/// Stateful inverter fed with pages rendered in JavaScript
#[wasm_bindgen]
pub struct SmartInvertSession {
    total_pages: u32,
    options: InvertOptions,
    writer: ImagePdfWriter,
    reports: Vec<PageReport>,
    progress_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl SmartInvertSession {
    /// `mode` is "smart" or "full"
    #[wasm_bindgen(constructor)]
    pub fn new(total_pages: u32, mode: &str) -> Result<SmartInvertSession, JsValue> {
        Self::new_internal(total_pages, mode).map_err(|e| JsValue::from_str(&e))
    }

    /// Callback signature: (current: number, total: number) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Override tuning with a JSON object; omitted keys keep their defaults
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, json: &str) -> Result<(), JsValue> {
        self.set_config_internal(json).map_err(|e| JsValue::from_str(&e))
    }

    /// Scale the canvas should be rendered at, in pixels per point
    #[wasm_bindgen(getter = renderScale)]
    pub fn render_scale(&self) -> f32 {
        self.options.config.render_scale
    }

    #[wasm_bindgen(getter = pagesAdded)]
    pub fn pages_added(&self) -> u32 {
        self.reports.len() as u32
    }

    #[wasm_bindgen(js_name = isComplete)]
    pub fn is_complete(&self) -> bool {
        self.pages_added() == self.total_pages
    }

    /// Invert the next page and return its classification
    /// ("dark", "light", or "full" when every page is negated)
    #[wasm_bindgen(js_name = addRenderedPage)]
    pub fn add_rendered_page(
        &mut self,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
        page_width_pts: f32,
        page_height_pts: f32,
    ) -> Result<String, JsValue> {
        let callback = self.progress_callback.clone();
        let mut on_progress = |current: u32, total: u32| {
            if let Some(ref callback) = callback {
                let _ = callback.call2(
                    &JsValue::null(),
                    &JsValue::from(current),
                    &JsValue::from(total),
                );
            }
        };

        let report = self
            .add_rendered_page_internal(
                rgba,
                width,
                height,
                PageSize::new(page_width_pts, page_height_pts),
                &mut on_progress,
            )
            .map_err(|e| JsValue::from_str(&e))?;

        Ok(report
            .classification
            .map(|c| c.as_str())
            .unwrap_or("full")
            .to_string())
    }

    /// Per-page results so far
    #[wasm_bindgen(js_name = getReports)]
    pub fn get_reports(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.reports)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Build the output PDF; every page must have been added
    pub fn finish(self) -> Result<js_sys::Uint8Array, JsValue> {
        let result = self.finish_internal().map_err(|e| JsValue::from_str(&e))?;

        let array = js_sys::Uint8Array::new_with_length(result.len() as u32);
        array.copy_from(&result);
        Ok(array)
    }
}

impl SmartInvertSession {
    fn new_internal(total_pages: u32, mode: &str) -> Result<Self, String> {
        if total_pages == 0 {
            return Err("PDF has no pages".to_string());
        }
        let mode: InvertMode = mode.parse().map_err(|e| format!("{}", e))?;

        Ok(Self {
            total_pages,
            options: InvertOptions {
                mode,
                ..Default::default()
            },
            writer: ImagePdfWriter::new(),
            reports: Vec::new(),
            progress_callback: None,
        })
    }

    fn set_config_internal(&mut self, json: &str) -> Result<(), String> {
        if !self.reports.is_empty() {
            return Err("Configuration must be set before the first page".to_string());
        }
        let config: InvertConfig =
            serde_json::from_str(json).map_err(|e| format!("Invalid config: {}", e))?;
        config.validate().map_err(|e| e.to_string())?;
        self.options.config = config;
        Ok(())
    }

    /// Testable core of `addRenderedPage`
    fn add_rendered_page_internal(
        &mut self,
        rgba: Vec<u8>,
        width: u32,
        height: u32,
        page_size: PageSize,
        on_progress: &mut dyn FnMut(u32, u32),
    ) -> Result<PageReport, String> {
        if self.is_complete() {
            return Err(format!("All {} pages already added", self.total_pages));
        }
        let page_number = self.pages_added() + 1;

        let (raster, report) = process_page(
            || Raster::new(width, height, rgba),
            page_number,
            self.total_pages,
            &self.options,
            on_progress,
        )
        .map_err(|e| e.to_string())?;

        let png = encode_png(&raster).map_err(|e| format!("Page {}: {}", page_number, e))?;
        let page = self.writer.add_page(page_size.width, page_size.height);
        self.writer
            .draw_png(page, &png, ImagePlacement::full_page(page_size))
            .map_err(|e| format!("Page {}: {}", page_number, e))?;

        self.reports.push(report.clone());
        Ok(report)
    }

    fn finish_internal(self) -> Result<Vec<u8>, String> {
        if !self.is_complete() {
            return Err(format!(
                "Only {} of {} pages were added",
                self.pages_added(),
                self.total_pages
            ));
        }
        self.writer.save().map_err(|e| e.to_string())
    }
}

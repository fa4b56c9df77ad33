//! Page rasterization
//!
//! Turning PDF pages into pixels is delegated to a [`Rasterizer`]. The
//! inverter only needs three things from it: how many pages there are, each
//! page's size in points, and an RGBA raster of a page at a given scale.
//!
//! With the `pdfium` feature, [`PdfiumRasterizer`] provides this on top of a
//! dynamically loaded libpdfium.

use serde::Serialize;

use crate::error::CloudPrintError;
use crate::invert::Raster;

/// Page dimensions in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter, used when a page carries no usable MediaBox
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions of this page rendered at `scale`, never below 1x1
    pub fn scaled_pixels(&self, scale: f32) -> (u32, u32) {
        let width = (self.width * scale).round().max(1.0) as u32;
        let height = (self.height * scale).round().max(1.0) as u32;
        (width, height)
    }
}

/// An opened document that can render its pages
///
/// Page indices are 0-based; errors should name the 1-based page.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Size of a page at scale 1
    fn page_size(&self, page_index: u32) -> Result<PageSize, CloudPrintError>;

    /// Render a page to RGBA at `scale` pixels per point
    fn render(&mut self, page_index: u32, scale: f32) -> Result<Raster, CloudPrintError>;
}

/// Opens PDF bytes for rendering
pub trait Rasterizer {
    type Pages<'a>: PageSource
    where
        Self: 'a;

    /// Parse `bytes`; fails with `ParseError` when they are not a usable PDF
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Pages<'a>, CloudPrintError>;
}

#[cfg(feature = "pdfium")]
pub use self::pdfium::{PdfiumPages, PdfiumRasterizer};

#[cfg(feature = "pdfium")]
mod pdfium {
    use std::path::Path;

    use pdfium_render::prelude::*;

    use super::{PageSize, PageSource, Rasterizer};
    use crate::error::CloudPrintError;
    use crate::invert::Raster;

    /// Renders pages through libpdfium
    pub struct PdfiumRasterizer {
        pdfium: Pdfium,
    }

    impl PdfiumRasterizer {
        /// Bind libpdfium
        ///
        /// Looks in `library_dir` (or the current directory when `None`),
        /// then falls back to the system library paths.
        pub fn bind(library_dir: Option<&Path>) -> Result<Self, CloudPrintError> {
            let dir = library_dir
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_else(|| "./".to_string());

            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| {
                        CloudPrintError::OperationError(format!(
                            "Failed to load PDFium library from {} or system paths: {:?}",
                            dir, e
                        ))
                    })?;

            tracing::debug!("Bound libpdfium");
            Ok(Self {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl Rasterizer for PdfiumRasterizer {
        type Pages<'a> = PdfiumPages<'a>;

        fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<PdfiumPages<'a>, CloudPrintError> {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| CloudPrintError::ParseError(format!("{:?}", e)))?;
            Ok(PdfiumPages { document })
        }
    }

    /// A document loaded into libpdfium
    pub struct PdfiumPages<'a> {
        document: PdfDocument<'a>,
    }

    impl PdfiumPages<'_> {
        fn page(&self, page_index: u32) -> Result<PdfPage<'_>, CloudPrintError> {
            let render_error = |message: String| CloudPrintError::Render {
                page: page_index + 1,
                message,
            };
            let index = PdfPageIndex::try_from(page_index)
                .map_err(|_| render_error("page index out of range".to_string()))?;
            self.document
                .pages()
                .get(index)
                .map_err(|e| render_error(format!("{:?}", e)))
        }
    }

    fn usable_size(page: &PdfPage<'_>, page_index: u32) -> PageSize {
        let size = PageSize::new(page.width().value, page.height().value);
        if size.width > 0.0 && size.height > 0.0 {
            size
        } else {
            tracing::warn!(
                "Page {} has no usable MediaBox ({}x{}), assuming Letter",
                page_index + 1,
                size.width,
                size.height
            );
            PageSize::LETTER
        }
    }

    impl PageSource for PdfiumPages<'_> {
        fn page_count(&self) -> u32 {
            u32::try_from(self.document.pages().len()).unwrap_or(0)
        }

        fn page_size(&self, page_index: u32) -> Result<PageSize, CloudPrintError> {
            let page = self.page(page_index)?;
            Ok(usable_size(&page, page_index))
        }

        fn render(&mut self, page_index: u32, scale: f32) -> Result<Raster, CloudPrintError> {
            let page = self.page(page_index)?;
            let size = usable_size(&page, page_index);
            let (target_width, target_height) = size.scaled_pixels(scale);

            let render_config = PdfRenderConfig::new()
                .set_target_width(target_width as i32)
                .set_maximum_height(target_height as i32)
                .set_reverse_byte_order(false)
                .set_format(PdfBitmapFormat::BGRA);

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| CloudPrintError::Render {
                    page: page_index + 1,
                    message: format!("{:?}", e),
                })?;

            let width = bitmap.width().max(0) as u32;
            let height = bitmap.height().max(0) as u32;
            let bytes = bitmap.as_raw_bytes();
            let stride = if height == 0 {
                0
            } else {
                bytes.len() / height as usize
            };

            Raster::from_bgra(width, height, stride, &bytes).map_err(|e| CloudPrintError::Render {
                page: page_index + 1,
                message: e.to_string(),
            })
        }
    }
}

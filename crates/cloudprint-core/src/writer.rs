//! Image-page PDF construction
//!
//! Builds a fresh document whose pages each carry full-page PNG images.
//! PNGs are decoded, normalised to 8 bits per channel and embedded as
//! Flate-compressed image XObjects; a non-opaque alpha channel becomes an
//! `/SMask`.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::CloudPrintError;
use crate::invert::Raster;
use crate::render::PageSize;

/// Encode a raster as an 8-bit RGBA PNG
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, CloudPrintError> {
    let encode_error = |e: png::EncodingError| CloudPrintError::SerializationError(e.to_string());

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, raster.width(), raster.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer
        .write_image_data(raster.as_bytes())
        .map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;

    Ok(out)
}

/// Where an image is drawn on its page, in points from the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ImagePlacement {
    /// Cover the whole page
    pub fn full_page(size: PageSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }
}

/// Handle to a page added with [`ImagePdfWriter::add_page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(usize);

struct PendingPage {
    size: PageSize,
    images: Vec<(String, ObjectId)>,
    operations: Vec<Operation>,
}

/// Builds a PDF out of image pages
pub struct ImagePdfWriter {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<PendingPage>,
}

impl Default for ImagePdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            pages: Vec::new(),
        }
    }

    /// Append an empty page of the given size in points
    pub fn add_page(&mut self, width: f32, height: f32) -> PageHandle {
        self.pages.push(PendingPage {
            size: PageSize::new(width, height),
            images: Vec::new(),
            operations: Vec::new(),
        });
        PageHandle(self.pages.len() - 1)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Embed a PNG and draw it on `page` at `placement`
    pub fn draw_png(
        &mut self,
        page: PageHandle,
        png_bytes: &[u8],
        placement: ImagePlacement,
    ) -> Result<(), CloudPrintError> {
        if page.0 >= self.pages.len() {
            return Err(CloudPrintError::OperationError(format!(
                "Page handle {} does not exist",
                page.0
            )));
        }

        let image = decode_png(png_bytes)?;
        let image_id = self.embed_image(&image)?;

        let entry = &mut self.pages[page.0];
        let name = format!("Im{}", entry.images.len());
        entry.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(placement.height),
                    Object::Real(placement.x),
                    Object::Real(placement.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        entry.images.push((name, image_id));

        Ok(())
    }

    /// Assemble the page tree and serialize the document
    pub fn save(mut self) -> Result<Vec<u8>, CloudPrintError> {
        let mut kids = Vec::with_capacity(self.pages.len());

        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let encoded = content
                .encode()
                .map_err(|e| CloudPrintError::SerializationError(e.to_string()))?;
            let content_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), encoded));

            let xobjects: Dictionary = page
                .images
                .into_iter()
                .map(|(name, id)| (name, Object::Reference(id)))
                .collect();
            let resources = Dictionary::from_iter(vec![("XObject", Object::Dictionary(xobjects))]);

            let page_dict = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(self.pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page.size.width),
                        Object::Real(page.size.height),
                    ]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]);
            kids.push(Object::Reference(self.doc.add_object(page_dict)));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| CloudPrintError::OperationError(format!("Save failed: {}", e)))?;

        Ok(buffer)
    }

    fn embed_image(&mut self, image: &DecodedImage) -> Result<ObjectId, CloudPrintError> {
        let smask = match &image.alpha {
            Some(alpha) => {
                let stream = image_stream(image.width, image.height, b"DeviceGray", alpha, None)?;
                Some(self.doc.add_object(stream))
            }
            None => None,
        };

        let color_space: &[u8] = if image.components == 1 {
            b"DeviceGray"
        } else {
            b"DeviceRGB"
        };
        let stream = image_stream(image.width, image.height, color_space, &image.color, smask)?;
        Ok(self.doc.add_object(stream))
    }
}

/// 8-bit image split into colour samples and an optional alpha plane
struct DecodedImage {
    width: u32,
    height: u32,
    /// 1 (gray) or 3 (RGB)
    components: usize,
    color: Vec<u8>,
    /// Present only when some pixel is not fully opaque
    alpha: Option<Vec<u8>>,
}

fn decode_png(png_bytes: &[u8]) -> Result<DecodedImage, CloudPrintError> {
    let decode_error = |e: png::DecodingError| CloudPrintError::ParseError(format!("PNG: {}", e));

    let mut decoder = png::Decoder::new(png_bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_error)?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(decode_error)?;
    buf.truncate(info.buffer_size());

    let (components, color, alpha) = match info.color_type {
        png::ColorType::Grayscale => (1, buf, None),
        png::ColorType::Rgb => (3, buf, None),
        png::ColorType::GrayscaleAlpha => {
            let (color, alpha) = split_alpha(&buf, 1);
            (1, color, Some(alpha))
        }
        png::ColorType::Rgba => {
            let (color, alpha) = split_alpha(&buf, 3);
            (3, color, Some(alpha))
        }
        png::ColorType::Indexed => {
            return Err(CloudPrintError::ParseError(
                "PNG: palette was not expanded".into(),
            ))
        }
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        components,
        color,
        alpha: alpha.filter(|a| a.iter().any(|&v| v != 255)),
    })
}

fn split_alpha(samples: &[u8], color_components: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_components + 1;
    let pixels = samples.len() / stride;
    let mut color = Vec::with_capacity(pixels * color_components);
    let mut alpha = Vec::with_capacity(pixels);
    for px in samples.chunks_exact(stride) {
        color.extend_from_slice(&px[..color_components]);
        alpha.push(px[color_components]);
    }
    (color, alpha)
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &[u8],
    samples: &[u8],
    smask: Option<ObjectId>,
) -> Result<Stream, CloudPrintError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(samples)
        .map_err(|e| CloudPrintError::SerializationError(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CloudPrintError::SerializationError(e.to_string()))?;

    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    if let Some(smask) = smask {
        dict.set("SMask", Object::Reference(smask));
    }

    // Already deflated
    Ok(Stream::new(dict, compressed).with_compression(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
        let page = doc.get_dictionary(page_id).unwrap();
        page.get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    fn first_image(doc: &Document, page_id: ObjectId) -> &Stream {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
        doc.get_object(image_id).unwrap().as_stream().unwrap()
    }

    #[test]
    fn test_encode_png_has_signature() {
        let png = encode_png(&Raster::filled(3, 2, [1, 2, 3, 255]).unwrap()).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_decode_roundtrips_rgba_without_alpha() {
        let raster = Raster::filled(4, 3, [10, 20, 30, 255]).unwrap();
        let image = decode_png(&encode_png(&raster).unwrap()).unwrap();
        assert_eq!((image.width, image.height, image.components), (4, 3, 3));
        assert_eq!(&image.color[..3], &[10, 20, 30]);
        assert!(image.alpha.is_none(), "opaque alpha should be dropped");
    }

    #[test]
    fn test_decode_keeps_translucent_alpha() {
        let mut raster = Raster::filled(2, 2, [0, 0, 0, 255]).unwrap();
        raster.set_pixel(1, 1, [0, 0, 0, 64]);
        let image = decode_png(&encode_png(&raster).unwrap()).unwrap();
        assert_eq!(image.alpha, Some(vec![255, 255, 255, 64]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_png(b"definitely not a png").is_err());
    }

    #[test]
    fn test_empty_writer_saves_valid_pdf() {
        let bytes = ImagePdfWriter::new().save().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn test_pages_keep_their_sizes_and_order() {
        let mut writer = ImagePdfWriter::new();
        let png = encode_png(&Raster::filled(8, 8, [255, 255, 255, 255]).unwrap()).unwrap();

        for (w, h) in [(612.0, 792.0), (960.0, 540.0)] {
            let page = writer.add_page(w, h);
            writer
                .draw_png(page, &png, ImagePlacement::full_page(PageSize::new(w, h)))
                .unwrap();
        }
        assert_eq!(writer.page_count(), 2);

        let doc = Document::load_mem(&writer.save().unwrap()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 612.0, 792.0]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 960.0, 540.0]);
    }

    #[test]
    fn test_image_xobject_is_flate_rgb() {
        let mut writer = ImagePdfWriter::new();
        let page = writer.add_page(100.0, 50.0);
        let png = encode_png(&Raster::filled(6, 3, [200, 100, 50, 255]).unwrap()).unwrap();
        writer
            .draw_png(page, &png, ImagePlacement::full_page(PageSize::new(100.0, 50.0)))
            .unwrap();

        let doc = Document::load_mem(&writer.save().unwrap()).unwrap();
        let page_id = doc.get_pages()[&1];
        let image = first_image(&doc, page_id);

        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 6);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 3);
        assert_eq!(
            image.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceRGB"
        );
        assert!(image.dict.get(b"SMask").is_err());

        let mut samples = Vec::new();
        flate2::read::ZlibDecoder::new(image.content.as_slice())
            .read_to_end(&mut samples)
            .unwrap();
        assert_eq!(samples.len(), 6 * 3 * 3);
        assert_eq!(&samples[..3], &[200, 100, 50]);
    }

    #[test]
    fn test_translucent_image_gets_smask() {
        let mut writer = ImagePdfWriter::new();
        let page = writer.add_page(10.0, 10.0);
        let png = encode_png(&Raster::filled(2, 2, [0, 0, 0, 10]).unwrap()).unwrap();
        writer
            .draw_png(page, &png, ImagePlacement::full_page(PageSize::new(10.0, 10.0)))
            .unwrap();

        let doc = Document::load_mem(&writer.save().unwrap()).unwrap();
        let image = first_image(&doc, doc.get_pages()[&1]);
        assert!(image.dict.get(b"SMask").is_ok());
    }

    #[test]
    fn test_draw_on_unknown_page_fails() {
        let mut writer = ImagePdfWriter::new();
        let png = encode_png(&Raster::filled(1, 1, [0, 0, 0, 255]).unwrap()).unwrap();
        let placement = ImagePlacement::full_page(PageSize::LETTER);
        assert!(writer.draw_png(PageHandle(3), &png, placement).is_err());
    }
}

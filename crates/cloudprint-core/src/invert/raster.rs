//! Platform-neutral RGBA raster
//!
//! A page rendered at some scale, stored row-major with 4 bytes per pixel
//! (red, green, blue, alpha). Renderers produce it, the inverter mutates it
//! in place, and the writer encodes it.

use crate::error::CloudPrintError;

/// Bytes per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Owned RGBA pixel grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wrap an RGBA buffer, checking that its length matches the dimensions
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CloudPrintError> {
        let expected = byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(CloudPrintError::InvalidRaster(format!(
                "{}x{} raster needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster with every pixel set to `rgba`
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, CloudPrintError> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: rgba.repeat(len / CHANNELS),
        })
    }

    /// Build from a BGRA buffer whose rows may be padded to `stride` bytes
    ///
    /// This is the layout native PDF renderers hand back.
    pub fn from_bgra(
        width: u32,
        height: u32,
        stride: usize,
        bytes: &[u8],
    ) -> Result<Self, CloudPrintError> {
        let row_len = width as usize * CHANNELS;
        if stride < row_len {
            return Err(CloudPrintError::InvalidRaster(format!(
                "stride {} is shorter than a {}px row",
                stride, width
            )));
        }
        if height > 0 && bytes.len() < stride * (height as usize - 1) + row_len {
            return Err(CloudPrintError::InvalidRaster(format!(
                "BGRA buffer of {} bytes is too short for {}x{} with stride {}",
                bytes.len(),
                width,
                height,
                stride
            )));
        }

        let mut pixels = Vec::with_capacity(byte_len(width, height)?);
        for y in 0..height as usize {
            let row = &bytes[y * stride..y * stride + row_len];
            for bgra in row.chunks_exact(CHANNELS) {
                pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
            }
        }

        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (width × height)
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Raw RGBA bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Read one pixel, or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.offset(x, y)?;
        let px = &self.pixels[offset..offset + CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Overwrite one pixel; out-of-bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(offset) = self.offset(x, y) {
            self.pixels[offset..offset + CHANNELS].copy_from_slice(&rgba);
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }
}

fn byte_len(width: u32, height: u32) -> Result<usize, CloudPrintError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| {
            CloudPrintError::InvalidRaster(format!("{}x{} raster is too large", width, height))
        })
}

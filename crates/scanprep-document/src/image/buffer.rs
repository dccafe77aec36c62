// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel buffer — the RGBA raster every pipeline stage reads and writes.
// Decoding and encoding go through the `image` crate.

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
use scanprep_core::error::{Result, ScanError};
use tracing::{debug, info, instrument};

/// Weighted grayscale intensity of an RGB triple.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Round and clamp a float sample into a byte.
#[inline]
pub(crate) fn to_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// An owned interleaved RGBA raster.
///
/// The backing store always holds exactly `width * height * 4` bytes. Stages
/// take buffers by value and hand back the same or a new buffer, so there is
/// never more than one writer.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    // -- Construction ---------------------------------------------------------

    /// A fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// A buffer filled with one RGBA colour.
    pub fn from_pixel(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    /// Wrap raw interleaved RGBA bytes, checking the length invariant.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        if actual != expected {
            return Err(ScanError::BufferSize { expected, actual });
        }
        RgbaImage::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or(ScanError::BufferSize { expected, actual })
    }

    /// Wrap an already-decoded RGBA image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Convert any decoded image to RGBA.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.into_rgba8(),
        }
    }

    /// Decode compressed image bytes (JPEG, PNG, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data)
            .map_err(|err| ScanError::Decode(err.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ScanError::EmptyImage);
        }
        info!(
            width = decoded.width(),
            height = decoded.height(),
            "Image decoded"
        );
        Ok(Self::from_dynamic(decoded))
    }

    /// Decode an image file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let decoded = image::open(path.as_ref()).map_err(|err| {
            ScanError::Decode(format!("{}: {}", path.as_ref().display(), err))
        })?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ScanError::EmptyImage);
        }
        Ok(Self::from_dynamic(decoded))
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interleaved RGBA bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// RGBA at `(x, y)`. Panics when out of bounds, like `RgbaImage`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Luma at `(x, y)`.
    pub fn luma_at(&self, x: u32, y: u32) -> f64 {
        let [r, g, b, _] = self.pixel(x, y);
        luma(r, g, b)
    }

    /// Per-pixel luma, row-major.
    pub fn luma_plane(&self) -> Vec<f64> {
        self.as_raw()
            .chunks_exact(4)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect()
    }

    /// Rounded luma as an 8-bit grayscale image.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([to_byte(self.luma_at(x, y))])
        })
    }

    // -- Resampling -----------------------------------------------------------

    /// Downscale so neither side exceeds `max_width` x `max_height`,
    /// preserving aspect ratio. Smaller images are returned unchanged.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (width, height) = self.dimensions();
        if width <= max_width && height <= max_height {
            return self;
        }
        let resized = DynamicImage::ImageRgba8(self.image).resize(
            max_width,
            max_height,
            image::imageops::FilterType::Lanczos3,
        );
        debug!(
            from_w = width,
            from_h = height,
            new_w = resized.width(),
            new_h = resized.height(),
            "Downscaled to fit"
        );
        Self::from_dynamic(resized)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ScanError::Encode(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as JPEG bytes with the given quality (1-100). Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        if !(1..=100).contains(&quality) {
            return Err(ScanError::InvalidParameter(format!(
                "JPEG quality must be within 1..=100, got {}",
                quality
            )));
        }
        let mut buffer = Vec::new();
        let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ScanError::Encode(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write to a file. `.png` is written losslessly; anything else is
    /// written as JPEG at `jpeg_quality`.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<std::path::Path>, jpeg_quality: u8) -> Result<()> {
        let path = path.as_ref();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        let bytes = if is_png {
            self.to_png_bytes()?
        } else {
            self.to_jpeg_bytes(jpeg_quality)?
        };
        std::fs::write(path, &bytes)?;
        debug!(bytes = bytes.len(), "Raster written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_short_data() {
        let err = PixelBuffer::from_raw(4, 4, vec![0; 63]).unwrap_err();
        assert!(matches!(
            err,
            ScanError::BufferSize {
                expected: 64,
                actual: 63
            }
        ));
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let err = PixelBuffer::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ScanError::Decode(_)));
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let buf = PixelBuffer::from_pixel(12, 7, [10, 200, 30, 255]);
        let png = buf.to_png_bytes().expect("encode");
        let decoded = PixelBuffer::from_bytes(&png).expect("decode");
        assert_eq!(decoded, buf);
    }

    #[test]
    fn jpeg_export_rejects_zero_quality() {
        let buf = PixelBuffer::from_pixel(4, 4, [0, 0, 0, 255]);
        assert!(buf.to_jpeg_bytes(0).is_err());
        assert!(!buf.to_jpeg_bytes(90).expect("encode").is_empty());
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let buf = PixelBuffer::from_pixel(6, 4, [255, 255, 255, 255]);

        let png = dir.path().join("page.png");
        buf.save(&png, 90).expect("save png");
        let bytes = std::fs::read(&png).expect("read png");
        assert_eq!(&bytes[..4], b"\x89PNG");
        assert_eq!(PixelBuffer::open(&png).expect("open"), buf);

        let jpeg = dir.path().join("page.JPG");
        buf.save(&jpeg, 80).expect("save jpeg");
        let bytes = std::fs::read(&jpeg).expect("read jpeg");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        assert!(buf.save(dir.path().join("page.jpg"), 0).is_err());
    }

    #[test]
    fn fit_within_preserves_aspect() {
        let buf = PixelBuffer::from_pixel(400, 200, [1, 2, 3, 255]);
        let fitted = buf.fit_within(100, 100);
        assert_eq!(fitted.dimensions(), (100, 50));
    }

    #[test]
    fn fit_within_leaves_small_images() {
        let buf = PixelBuffer::from_pixel(40, 20, [1, 2, 3, 255]);
        assert_eq!(buf.clone().fit_within(100, 100), buf);
    }

    #[test]
    fn luma_weights_sum_to_one() {
        assert!((luma(255, 255, 255) - 255.0).abs() < 1e-9);
        assert!((luma(100, 0, 0) - 29.9).abs() < 1e-9);
    }
}

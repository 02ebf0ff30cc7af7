// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Bridges an arbitrary uploaded image into the fixed-size byte
// vector the classifier consumes.
//
// Steps (applied in order):
//   1. Decode any container format the image crate supports
//   2. Convert to a single 8-bit luma channel
//   3. Resize to exactly 28×28 (bilinear / Triangle filter)
//   4. Emit intensities row-major: top row first, left→right
//
// The output is raw bytes in [0, 255]. Scaling to [0, 1]
// happens inside the engine, same as for training data.
//
// Reference: image crate documentation (imageops::resize)

use image::imageops::{self, FilterType};

use crate::domain::digit::IMAGE_SIDE;
use crate::domain::error::{DigitError, DigitResult};

pub struct ImagePreprocessor {
    side:   u32,
    filter: FilterType,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self {
            side:   IMAGE_SIDE as u32,
            filter: FilterType::Triangle,
        }
    }

    /// Decode, grayscale, resize and flatten `bytes`.
    /// Always returns exactly 28 * 28 bytes on success.
    pub fn prepare(&self, bytes: &[u8]) -> DigitResult<Vec<u8>> {
        let decoded = image::load_from_memory(bytes).map_err(DigitError::Decode)?;
        tracing::debug!(
            "Decoded {}x{} image ({:?})",
            decoded.width(),
            decoded.height(),
            decoded.color(),
        );

        let gray    = decoded.to_luma8();
        let resized = imageops::resize(&gray, self.side, self.side, self.filter);

        // GrayImage storage is already row-major with one byte per pixel
        Ok(resized.into_raw())
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digit::IMAGE_PIXELS;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 7 + y * 3) % 256) as u8])
        }))
    }

    #[test]
    fn test_any_size_yields_784_bytes() {
        let p = ImagePreprocessor::new();
        for (w, h) in [(1, 1), (28, 28), (100, 37), (13, 200), (512, 512)] {
            let bytes = encode(gradient(w, h), ImageFormat::Png);
            assert_eq!(p.prepare(&bytes).unwrap().len(), IMAGE_PIXELS, "{w}x{h}");
        }
    }

    #[test]
    fn test_color_and_jpeg_inputs() {
        let p   = ImagePreprocessor::new();
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_fn(40, 60, |x, y| {
            Rgb([x as u8, y as u8, 128])
        }));
        assert_eq!(p.prepare(&encode(rgb.clone(), ImageFormat::Png)).unwrap().len(), IMAGE_PIXELS);
        assert_eq!(p.prepare(&encode(rgb, ImageFormat::Jpeg)).unwrap().len(), IMAGE_PIXELS);
    }

    #[test]
    fn test_deterministic() {
        let p     = ImagePreprocessor::new();
        let bytes = encode(gradient(64, 48), ImageFormat::Png);
        assert_eq!(p.prepare(&bytes).unwrap(), p.prepare(&bytes).unwrap());
    }

    #[test]
    fn test_native_size_passes_through_row_major() {
        let p   = ImagePreprocessor::new();
        let img = GrayImage::from_fn(28, 28, |x, y| Luma([(y * 28 + x) as u8]));
        let out = p.prepare(&encode(DynamicImage::ImageLuma8(img), ImageFormat::Png)).unwrap();
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 1);
        assert_eq!(out[28], 28);
    }

    #[test]
    fn test_black_image_stays_black() {
        let p     = ImagePreprocessor::new();
        let bytes = encode(DynamicImage::ImageLuma8(GrayImage::new(90, 90)), ImageFormat::Png);
        assert!(p.prepare(&bytes).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_rejects_garbage() {
        let p = ImagePreprocessor::new();
        assert!(matches!(p.prepare(b"definitely not an image"), Err(DigitError::Decode(_))));
        assert!(matches!(p.prepare(&[]), Err(DigitError::Decode(_))));
    }
}

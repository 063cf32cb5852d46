use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

use crate::recognizer::{OcrBackend, OcrError};

/// Longest edge kept before downscaling. Tesseract does best around 300 DPI.
pub const DEFAULT_MAX_DIMENSION: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode in-memory JPEG / PNG / WEBP bytes, normalize them and return PNG
/// bytes ready for OCR.
pub fn prepare_for_ocr_from_bytes(
    data: &[u8],
    max_dimension: u32,
) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_png(normalize(img, max_dimension))
}

/// Downscale, grayscale, then stretch contrast over the full 0..=255 range.
fn normalize(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();
    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if hi == lo {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = u32::from(hi - lo);
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([(u32::from(p - lo) * 255 / range) as u8])
    });
    DynamicImage::ImageLuma8(stretched)
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

// ── Backend adapter ──────────────────────────────────────────────────────────

/// Decodes and normalizes the image before handing it to a local engine.
/// Remote services get the original bytes and should not be wrapped.
pub struct Preprocessed<B> {
    inner: B,
    max_dimension: u32,
}

impl<B: OcrBackend> Preprocessed<B> {
    pub fn new(inner: B) -> Self {
        Self { inner, max_dimension: DEFAULT_MAX_DIMENSION }
    }
}

#[async_trait]
impl<B: OcrBackend> OcrBackend for Preprocessed<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let png = prepare_for_ocr_from_bytes(image_bytes, self.max_dimension)?;
        self.inner.recognize(&png).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn solid_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |_, _| Luma([value])))
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
        buf
    }

    /// Records what it was given.
    struct Capture {
        seen: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl OcrBackend for Capture {
        fn name(&self) -> &'static str {
            "capture"
        }

        async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            *self.seen.lock().unwrap() = image_bytes.to_vec();
            Ok("ok".into())
        }
    }

    #[test]
    fn uniform_image_is_left_alone() {
        let result = normalize(solid_gray(10, 10, 128), DEFAULT_MAX_DIMENSION);
        assert_eq!((result.width(), result.height()), (10, 10));
        assert!(result.to_luma8().pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn narrow_range_is_stretched() {
        let img: GrayImage = ImageBuffer::from_fn(100, 1, |x, _| Luma([100 + (x / 2) as u8]));
        let gray = normalize(DynamicImage::ImageLuma8(img), DEFAULT_MAX_DIMENSION).to_luma8();
        let min = gray.pixels().map(|p| p[0]).min().unwrap();
        let max = gray.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!((min, max), (0, 255));
    }

    #[test]
    fn oversized_image_is_downscaled() {
        let result = normalize(solid_gray(400, 100, 50), 200);
        assert!(result.width() <= 200 && result.height() <= 200);
    }

    #[test]
    fn bytes_come_back_as_png() {
        let result = prepare_for_ocr_from_bytes(&png_bytes(&solid_gray(4, 4, 100)), 2800).unwrap();
        assert_eq!(&result[..4], b"\x89PNG");
    }

    #[test]
    fn undecodable_bytes_fail() {
        assert!(matches!(
            prepare_for_ocr_from_bytes(b"not an image", 2800),
            Err(PreprocessError::Load(_))
        ));
    }

    #[tokio::test]
    async fn adapter_forwards_normalized_png() {
        let backend = Preprocessed::new(Capture { seen: Mutex::new(vec![]) });
        let text = backend.recognize(&png_bytes(&solid_gray(4, 4, 10))).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(backend.name(), "capture");
        assert_eq!(&backend.inner.seen.lock().unwrap()[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn adapter_reports_decode_failure() {
        let backend = Preprocessed::new(Capture { seen: Mutex::new(vec![]) });
        let err = backend.recognize(b"garbage").await.unwrap_err();
        assert!(matches!(err, OcrError::Preprocess(_)));
    }
}

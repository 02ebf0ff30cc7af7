// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Single-image classification:
//   1. Decode, grayscale and resize the upload to 28×28 bytes
//   2. Hand the 784 bytes to the engine's predict()
//
// Also owns the engine for the lifetime of a serving process,
// so /LeNet/Train and /LeNet/Predict share one set of weights.

use std::path::Path;

use anyhow::{Context, Result};

use crate::data::image_prep::ImagePreprocessor;
use crate::ml::backend::Engine;

pub struct PredictUseCase {
    preprocessor: ImagePreprocessor,
    engine:       Engine,
}

impl PredictUseCase {
    pub fn new(engine: Engine) -> Self {
        Self { preprocessor: ImagePreprocessor::new(), engine }
    }

    /// Retrain the owned engine from scratch.
    pub fn train(&mut self) -> Result<()> {
        self.engine.train().context("Training failed")
    }

    /// Fresh untrained weights; enough to serve (poor) predictions.
    pub fn build_model(&mut self) {
        self.engine.build_model();
    }

    /// Classify an encoded image (PNG, JPEG, ...).
    pub fn predict_image(&mut self, bytes: &[u8]) -> Result<usize> {
        let pixels = self
            .preprocessor
            .prepare(bytes)
            .context("Could not decode the uploaded image")?;
        let digit = self.engine.predict(&pixels).context("Prediction failed")?;
        tracing::info!("Predicted digit {}", digit);
        Ok(digit)
    }

    pub fn predict_file(&mut self, path: &Path) -> Result<usize> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image '{}'", path.display()))?;
        self.predict_image(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::synthetic::SyntheticDigits;
    use crate::domain::error::DigitError;
    use crate::ml::backend::default_device;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn use_case() -> PredictUseCase {
        let engine = Engine::new(
            Box::new(SyntheticDigits::new(20, 4)),
            TrainConfig::default(),
            default_device(),
        );
        PredictUseCase::new(engine)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_fn(width, height, |x, _| Luma([if x % 7 == 0 { 255 } else { 0 }]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_predict_requires_model() {
        let mut uc  = use_case();
        let err     = uc.predict_image(&png(40, 40)).unwrap_err();
        assert!(matches!(err.downcast_ref::<DigitError>(), Some(DigitError::ModelNotBuilt)));
    }

    #[test]
    fn test_predict_any_size_image() {
        let mut uc = use_case();
        uc.build_model();
        for (w, h) in [(28, 28), (100, 60), (5, 9)] {
            assert!(uc.predict_image(&png(w, h)).unwrap() < 10);
        }
    }

    #[test]
    fn test_garbage_bytes_are_decode_errors() {
        let mut uc = use_case();
        uc.build_model();
        let err = uc.predict_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err.downcast_ref::<DigitError>(), Some(DigitError::Decode(_))));
    }

    #[test]
    fn test_predict_file_reads_from_disk() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("digit.png");
        std::fs::write(&path, png(28, 28)).unwrap();

        let mut uc = use_case();
        uc.build_model();
        assert!(uc.predict_file(&path).unwrap() < 10);
        assert!(uc.predict_file(&dir.path().join("missing.png")).is_err());
    }
}

// ============================================================
// Layer 5 — Inferencer
// ============================================================
// The derived inference model: the trained LeNet plus a
// trailing softmax over the class axis, running on the inner
// (non-autodiff) backend.
//
// Each instance remembers the weight version it was cut from
// so the engine can tell when it has gone stale.
use std::borrow::Cow;

use burn::{prelude::*, tensor::activation::softmax};

use crate::data::batcher::image_tensor;
use crate::domain::digit::IMAGE_PIXELS;
use crate::domain::error::{DigitError, DigitResult};
use crate::ml::model::LeNet;

pub struct InferenceModel<B: Backend> {
    base:            LeNet<B>,
    weights_version: u64,
}

impl<B: Backend> InferenceModel<B> {
    pub fn new(base: LeNet<B>, weights_version: u64) -> Self {
        Self { base, weights_version }
    }

    pub fn weights_version(&self) -> u64 {
        self.weights_version
    }

    /// images: [batch, 28, 28, 1] → probabilities: [batch, 10]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.base.forward(images), 1)
    }

    /// Class probabilities for one 784-byte image in [0, 255].
    pub fn probabilities(&self, pixels: &[u8], device: &B::Device) -> DigitResult<Vec<f32>> {
        let values: Vec<f32> = pixels.iter().map(|&p| p as f32).collect();
        let input = image_tensor::<B>(values, 1, device) / 255.0;

        self.forward(input)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| DigitError::Backend(format!("{e:?}")))
    }

    /// Index of the most probable class for one image.
    pub fn classify(&self, pixels: &[u8], device: &B::Device) -> DigitResult<usize> {
        let probs = self.probabilities(pixels, device)?;
        tracing::debug!("Class probabilities: {:?}", probs);
        Ok(argmax_first(&probs))
    }
}

/// Zero-pad or truncate at the tail so the input is exactly 784 bytes.
pub fn fit_to_input(bytes: &[u8]) -> Cow<'_, [u8]> {
    if bytes.len() == IMAGE_PIXELS {
        return Cow::Borrowed(bytes);
    }

    tracing::warn!(
        "Data must be exactly 28x28 ({}) bytes, got {}. Truncating or padding to match.",
        IMAGE_PIXELS,
        bytes.len(),
    );
    let mut fitted = bytes[..bytes.len().min(IMAGE_PIXELS)].to_vec();
    fitted.resize(IMAGE_PIXELS, 0);
    Cow::Owned(fitted)
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax_first(values: &[f32]) -> usize {
    let mut best_idx   = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best_idx   = i;
            best_value = v;
        }
    }
    best_idx
}

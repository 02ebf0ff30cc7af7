use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::domain::digit::{RawDigit, IMAGE_PIXELS, IMAGE_SIDE};

/// Per-sample layout: height, width, trailing singleton channel.
pub const SAMPLE_SHAPE: [usize; 3] = [IMAGE_SIDE, IMAGE_SIDE, 1];

/// One normalised digit: intensities in [0.0, 1.0], laid out
/// row-major as SAMPLE_SHAPE (the channel axis has length 1).
#[derive(Debug, Clone)]
pub struct DigitSample {
    pub image: Vec<f32>,
    pub label: u8,
}

impl DigitSample {
    /// Rescale a raw digit from [0, 255] to [0.0, 1.0].
    pub fn from_raw(raw: &RawDigit) -> Self {
        let image = raw.pixels.iter().map(|&p| p as f32 / 255.0).collect();
        Self { image, label: raw.label }
    }

    /// Map the normalised image back into byte range, the form
    /// the predict path expects.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.image
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

/// Indexed, normalised collection of digit samples.
///
/// Samples sit behind an `Arc` so the data loader can own a
/// handle without copying 60k images.
#[derive(Debug, Clone, Default)]
pub struct SampleBatch {
    samples: Arc<Vec<DigitSample>>,
}

impl SampleBatch {
    /// Build a batch from raw bytes. Always starts from the raw
    /// source, so calling this twice never compounds the scaling.
    pub fn normalize(raw: &[RawDigit]) -> Self {
        let samples = raw.iter().map(DigitSample::from_raw).collect();
        Self { samples: Arc::new(samples) }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    /// Full batch shape: [samples, height, width, channels].
    pub fn shape(&self) -> [usize; 4] {
        [self.samples.len(), SAMPLE_SHAPE[0], SAMPLE_SHAPE[1], SAMPLE_SHAPE[2]]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DigitSample> {
        self.samples.iter()
    }

    /// Smallest and largest intensity across every sample.
    #[cfg(test)]
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.samples
            .iter()
            .flat_map(|s| s.image.iter().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl Dataset<DigitSample> for SampleBatch {
    fn get(&self, index: usize) -> Option<DigitSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ============================================================
// Layer 4 — Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to stack DigitSamples into
// one image tensor and one label tensor.
//
//   Input:  Vec of N DigitSamples, each 28×28×1 floats
//   Output: DigitBatch with images [N, 28, 28, 1]
//                         targets [N]
//
// Images stay channels-last here; LeNet::forward permutes
// them into the NCHW layout burn's Conv2d expects.
//
// Reference: Burn Book §4 (Batcher)

use std::marker::PhantomData;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{DigitSample, SAMPLE_SHAPE};

/// A batch of digits ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Normalised intensities — shape: [batch_size, 28, 28, 1]
    pub images: Tensor<B, 4>,

    /// Ground-truth labels — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stateless batcher; the backend parameter pins the tensor type
/// the data loader produces.
#[derive(Clone, Debug, Default)]
pub struct DigitBatcher<B: Backend> {
    _backend: PhantomData<B>,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<B: Backend> Batcher<B, DigitSample, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<DigitSample>, device: &B::Device) -> DigitBatch<B> {
        let batch_size = items.len();

        // Flatten every image into one Vec in sample order
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image.iter().copied())
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|s| s.label as i64)
            .collect();

        let images  = image_tensor::<B>(pixels, batch_size, device);
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]).convert::<B::IntElem>(),
            device,
        );

        DigitBatch { images, targets }
    }
}

/// Build a [count, 28, 28, 1] float tensor from flattened values.
pub fn image_tensor<B: Backend>(
    values: Vec<f32>,
    count:  usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    let shape = [count, SAMPLE_SHAPE[0], SAMPLE_SHAPE[1], SAMPLE_SHAPE[2]];
    Tensor::<B, 4>::from_data(
        TensorData::new(values, shape).convert::<B::FloatElem>(),
        device,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digit::IMAGE_PIXELS;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes() {
        let items = vec![
            DigitSample { image: vec![0.5; IMAGE_PIXELS], label: 4 },
            DigitSample { image: vec![0.1; IMAGE_PIXELS], label: 9 },
            DigitSample { image: vec![0.0; IMAGE_PIXELS], label: 0 },
        ];
        let device = Default::default();
        let batch: DigitBatch<TestBackend> = DigitBatcher::new().batch(items, &device);

        assert_eq!(batch.images.dims(), [3, 28, 28, 1]);
        assert_eq!(batch.targets.dims(), [3]);

        let labels = batch.targets.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![4, 9, 0]);
    }
}

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::digit::{IMAGE_SIDE, NUM_CLASSES};

const KERNEL: usize = 5;
const POOL:   usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LeNetConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 1)]
    pub channels:    usize,
    #[config(default = 6)]
    pub conv1_filters: usize,
    #[config(default = 16)]
    pub conv2_filters: usize,
    #[config(default = 120)]
    pub fc1_units:   usize,
    #[config(default = 84)]
    pub fc2_units:   usize,
}

impl LeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeNet<B> {
        let conv1 = Conv2dConfig::new([self.channels, self.conv1_filters], [KERNEL, KERNEL])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);
        let conv2 = Conv2dConfig::new([self.conv1_filters, self.conv2_filters], [KERNEL, KERNEL])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);

        let side      = self.flattened_side();
        let flattened = self.conv2_filters * side * side;

        let fc1 = LinearConfig::new(flattened, self.fc1_units).init(device);
        let fc2 = LinearConfig::new(self.fc1_units, self.fc2_units).init(device);
        let fc3 = LinearConfig::new(self.fc2_units, self.num_classes).init(device);

        LeNet {
            conv1,
            pool1: pool(),
            conv2,
            pool2: pool(),
            fc1,
            fc2,
            fc3,
        }
    }

    /// Spatial side length after both conv/pool stages: 28 → 24 → 12 → 8 → 4.
    pub fn flattened_side(&self) -> usize {
        let after_conv1 = IMAGE_SIDE - KERNEL + 1;
        let after_pool1 = same_pool_output(after_conv1);
        let after_conv2 = after_pool1 - KERNEL + 1;
        same_pool_output(after_conv2)
    }
}

/// Output length of a 2-wide, stride-2 pool with "same" padding.
fn same_pool_output(input: usize) -> usize {
    input.div_ceil(POOL)
}

/// Total padding "same" adds on one axis for a 2-wide, stride-2 pool.
fn same_pool_padding(input: usize) -> usize {
    ((same_pool_output(input) - 1) * POOL + POOL).saturating_sub(input)
}

fn pool() -> MaxPool2d {
    // Both pooled feature maps (24×24 and 8×8) are even, where "same"
    // padding is zero, so the valid pool produces the same output.
    debug_assert_eq!(same_pool_padding(IMAGE_SIDE - KERNEL + 1), 0);
    MaxPool2dConfig::new([POOL, POOL])
        .with_strides([POOL, POOL])
        .with_padding(PaddingConfig2d::Valid)
        .init()
}

/// LeNet-5 style digit classifier. Produces raw logits.
#[derive(Module, Debug)]
pub struct LeNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub pool1: MaxPool2d,
    pub conv2: Conv2d<B>,
    pub pool2: MaxPool2d,
    pub fc1:   Linear<B>,
    pub fc2:   Linear<B>,
    pub fc3:   Linear<B>,
}

impl<B: Backend> LeNet<B> {
    /// images: [batch, 28, 28, 1] → logits: [batch, 10]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        // Channels-last → channels-first: [N, H, W, C] → [N, C, W, H] → [N, C, H, W]
        let x = images.swap_dims(1, 3).swap_dims(2, 3);

        let x = self.pool1.forward(relu(self.conv1.forward(x))); // [N, 6, 12, 12]
        let x = self.pool2.forward(relu(self.conv2.forward(x))); // [N, 16, 4, 4]

        let x = x.flatten::<2>(1, 3);
        let x = relu(self.fc1.forward(x));
        let x = relu(self.fc2.forward(x));
        self.fc3.forward(x)
    }

    /// Sparse categorical cross-entropy on logits.
    /// CrossEntropyLoss applies log-softmax internally.
    pub fn forward_classification(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}

/// Number of rows whose highest logit matches the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns [batch, 1] — flatten before comparing with [batch]
    let correct: i64 = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_topology_output_shape() {
        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let images = Tensor::<TestBackend, 4>::zeros([3, 28, 28, 1], &device);
        assert_eq!(model.forward(images).dims(), [3, NUM_CLASSES]);
    }

    #[test]
    fn test_flattened_side() {
        assert_eq!(LeNetConfig::new().flattened_side(), 4);
    }

    #[test]
    fn test_same_padding_is_zero_for_even_maps() {
        assert_eq!(same_pool_padding(24), 0);
        assert_eq!(same_pool_padding(8), 0);
        assert_eq!(same_pool_padding(7), 1);
        assert_eq!(same_pool_output(7), 4);
    }

    #[test]
    fn test_parameter_count() {
        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        // conv1 156 + conv2 2416 + fc1 30840 + fc2 10164 + fc3 850
        assert_eq!(model.num_params(), 44_426);
    }

    #[test]
    fn test_count_correct() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::from_floats([[0.1, 2.0, 0.3], [5.0, 0.0, 1.0]], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([1, 2], &device);
        assert_eq!(count_correct(logits, targets), 1);
    }
}

// Concrete backend selection.
//   - default:         Autodiff<NdArray> (CPU)
//   - feature "wgpu":  Autodiff<Wgpu>    (GPU)
// Training runs on TrainBackend; model.valid() hands inference
// the inner backend without gradient tracking.

use burn::tensor::backend::Backend;

use crate::ml::engine::DigitClassifier;

#[cfg(not(feature = "wgpu"))]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

#[cfg(feature = "wgpu")]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// The classifier engine on the configured backend.
pub type Engine = DigitClassifier<TrainBackend>;

pub fn default_device() -> <TrainBackend as Backend>::Device {
    Default::default()
}

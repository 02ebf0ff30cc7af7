// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor and model code lives here.
//
//   model.rs      — LeNet: two conv/pool stages and three
//                   dense layers, producing raw logits
//
//   trainer.rs    — Mini-batch fit with Adam and the batched
//                   holdout evaluation
//
//   inferencer.rs — Softmax-wrapped copy of the model used for
//                   single-image prediction
//
//   engine.rs     — DigitClassifier: owns data, weights and the
//                   cached inference model
//
//   backend.rs    — NdArray / Wgpu backend selection
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            LeCun et al. (1998) Gradient-Based Learning Applied
//            to Document Recognition

/// Backend aliases and default device
pub mod backend;

/// LeNet convolutional classifier
pub mod model;

/// Training loop and batched evaluation
pub mod trainer;

/// Softmax inference model and input fitting
pub mod inferencer;

/// Stateful classifier engine
pub mod engine;

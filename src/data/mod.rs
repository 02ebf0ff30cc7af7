// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw bytes to tensor batches.
//
// Training path:
//
//   MnistSource / SyntheticDigits   → DigitSplits (raw bytes)
//       │
//       ▼
//   SampleBatch::normalize          → [0,1] floats, (28,28,1)
//       │
//       ▼
//   DigitBatcher                    → DigitBatch tensors
//       │
//       ▼
//   DataLoader                      → mini-batches of 128
//
// Prediction path:
//
//   uploaded bytes → ImagePreprocessor → 784 bytes → engine
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// IDX file reader and downloader for MNIST
pub mod mnist;

/// Seeded seven-segment digit generator
pub mod synthetic;

/// Normalised samples; implements Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Decodes uploaded images into 28×28 byte vectors
pub mod image_prep;

/// Shuffles and splits data into train/holdout sets
pub mod splitter;

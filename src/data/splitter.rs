// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Shuffles samples and splits them into two disjoint sets:
//   - Training set:   used to update model weights
//   - Holdout set:    used only to measure accuracy
//
// MNIST ships pre-split, so only generated datasets go
// through here. The caller supplies the RNG so a seeded
// source produces the same split every run.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` with `rng` and split into (train, holdout).
///
/// `train_fraction` is the share kept for training, e.g. 0.8.
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let holdout = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} holdout",
        samples.len(),
        holdout.len(),
    );

    (samples, holdout)
}

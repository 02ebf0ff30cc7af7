// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Mini-batch fit with Burn's DataLoader and Adam, plus a
// batched evaluation pass (loss + accuracy) over the holdout.
//
//   - fit() runs on the autodiff backend B
//   - evaluate() takes any backend; the engine hands it
//     model.valid(), which lives on B::InnerBackend
//   - argmax(1) returns [batch,1] so count_correct flattens
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::DigitBatcher, dataset::SampleBatch};
use crate::domain::error::DigitResult;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{count_correct, LeNet};

/// Outcome of one batched pass over the holdout batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalReport {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

/// Fit `model` on `train` for `cfg.epochs` passes and return the updated weights.
pub fn fit<B: AutodiffBackend>(
    mut model: LeNet<B>,
    train:     &SampleBatch,
    cfg:       &TrainConfig,
    device:    &B::Device,
    metrics:   Option<&MetricsLogger>,
) -> DigitResult<LeNet<B>> {
    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(cfg.adam_epsilon).init();

    // ── Training data loader (reshuffled every epoch) ─────────────────────────
    let loader = DataLoaderBuilder::new(DigitBatcher::<B>::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(loader_workers(cfg.num_workers))
        .set_device(device.clone())
        .build(train.clone());

    tracing::info!(
        "Fitting on {} samples: {} epochs, batch size {}, lr {}",
        train.sample_count(),
        cfg.epochs,
        cfg.batch_size,
        cfg.learning_rate,
    );

    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in loader.iter() {
            let batch_len = batch.targets.dims()[0];
            let (loss, logits) = model.forward_classification(batch.images, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;
            correct  += count_correct(logits, batch.targets);
            seen     += batch_len;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let record = EpochMetrics::new(
            epoch,
            if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
            if seen    > 0 { correct as f64 / seen as f64 } else { 0.0 },
        );

        tracing::info!(
            "Epoch {:>3}/{} | loss={:.4} | accuracy={:.2}%",
            epoch,
            cfg.epochs,
            record.train_loss,
            record.train_accuracy * 100.0,
        );

        if let Some(logger) = metrics {
            logger.log(&record)?;
        }
    }

    Ok(model)
}

/// Batched loss and accuracy of `model` over `eval`.
pub fn evaluate<B: Backend>(
    model:       &LeNet<B>,
    eval:        &SampleBatch,
    batch_size:  usize,
    num_workers: usize,
    device:      &B::Device,
) -> EvalReport {
    let loader = DataLoaderBuilder::new(DigitBatcher::<B>::new())
        .batch_size(batch_size)
        .num_workers(loader_workers(num_workers))
        .set_device(device.clone())
        .build(eval.clone());

    let mut weighted_loss = 0.0f64;
    let mut correct       = 0usize;
    let mut total         = 0usize;

    for batch in loader.iter() {
        let batch_len = batch.targets.dims()[0];
        let (loss, logits) = model.forward_classification(batch.images, batch.targets.clone());

        // Loss is a per-batch mean; weight by batch size for a per-sample mean
        weighted_loss += loss.into_scalar().elem::<f64>() * batch_len as f64;
        correct       += count_correct(logits, batch.targets);
        total         += batch_len;
    }

    EvalReport {
        loss:     if total > 0 { weighted_loss / total as f64 } else { f64::NAN },
        accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
        samples:  total,
    }
}

/// The loader splits the dataset across workers; zero workers is not a valid split.
fn loader_workers(requested: usize) -> usize {
    requested.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticDigits;
    use crate::domain::traits::DigitSource;
    use crate::ml::model::LeNetConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;
    use burn::module::AutodiffModule;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn small_config() -> TrainConfig {
        TrainConfig {
            epochs:     2,
            batch_size: 16,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_fit_updates_weights_and_logs_metrics() {
        let splits = SyntheticDigits::new(64, 5).load().unwrap();
        let train  = SampleBatch::normalize(&splits.train);
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let before = model.fc3.weight.val().into_data().to_vec::<f32>().unwrap();

        let model = fit(model, &train, &small_config(), &device, Some(&logger)).unwrap();
        assert_ne!(model.fc3.weight.val().into_data().to_vec::<f32>().unwrap(), before);

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3); // header + 2 epochs
    }

    #[test]
    fn test_evaluate_covers_every_sample() {
        let splits = SyntheticDigits::new(50, 2).load().unwrap();
        let eval   = SampleBatch::normalize(&splits.test);

        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let report = evaluate(&model.valid(), &eval, 4, 1, &device);

        assert_eq!(report.samples, 10);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!(report.loss.is_finite());
    }

    #[test]
    fn test_zero_workers_falls_back_to_one() {
        let splits = SyntheticDigits::new(30, 6).load().unwrap();
        let eval   = SampleBatch::normalize(&splits.train);

        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let report = evaluate(&model.valid(), &eval, 8, 0, &device);

        assert_eq!(report.samples, 24);
    }

    #[test]
    fn test_fitted_and_inference_copies_agree() {
        let splits = SyntheticDigits::new(80, 12).load().unwrap();
        let train  = SampleBatch::normalize(&splits.train);

        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let model = fit(model, &train, &small_config(), &device, None).unwrap();

        let items: Vec<_> = train.iter().take(16).cloned().collect();
        let tracked = DigitBatcher::<TestBackend>::new().batch(items.clone(), &device);
        let plain   = DigitBatcher::<NdArray<f32>>::new().batch(items, &device);

        let tracked = model.forward(tracked.images).into_data().to_vec::<f32>().unwrap();
        let plain   = model.valid().forward(plain.images).into_data().to_vec::<f32>().unwrap();

        assert_eq!(tracked.len(), plain.len());
        for (a, b) in tracked.iter().zip(&plain) {
            assert!((a - b).abs() < 1e-4, "autodiff {a} vs inner {b}");
        }
    }
}

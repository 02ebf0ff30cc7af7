// ============================================================
// Layer 5 — Digit Classifier Engine
// ============================================================
// Owns the datasets, the base model and the derived inference
// model, and walks them through:
//
//   Unconfigured → DataLoaded → ModelReady → Trained → InferenceReady
//
// Every build_model() and every completed fit bumps a weight
// version. The cached inference model is stamped with the
// version it was derived from and rebuilt when they differ,
// so predictions never run against stale weights.
//
// The engine has no internal locking; callers serialise
// access (the HTTP layer wraps it in a Mutex).

use std::time::Instant;

use burn::{
    module::{AutodiffModule, Module},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::dataset::SampleBatch;
use crate::domain::error::{DigitError, DigitResult};
use crate::domain::traits::DigitSource;
use crate::infra::metrics::MetricsLogger;
use crate::ml::inferencer::{fit_to_input, InferenceModel};
use crate::ml::model::{LeNet, LeNetConfig};
use crate::ml::trainer::{self, EvalReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unconfigured,
    DataLoaded,
    ModelReady,
    Trained,
    InferenceReady,
}

pub struct DigitClassifier<B: AutodiffBackend> {
    source:          Box<dyn DigitSource>,
    config:          TrainConfig,
    model_config:    LeNetConfig,
    device:          B::Device,
    train_batch:     Option<SampleBatch>,
    eval_batch:      Option<SampleBatch>,
    model:           Option<LeNet<B>>,
    trained:         bool,
    weights_version: u64,
    inference:       Option<InferenceModel<B::InnerBackend>>,
}

impl<B: AutodiffBackend> DigitClassifier<B> {
    pub fn new(source: Box<dyn DigitSource>, config: TrainConfig, device: B::Device) -> Self {
        Self {
            source,
            config,
            model_config:    LeNetConfig::new(),
            device,
            train_batch:     None,
            eval_batch:      None,
            model:           None,
            trained:         false,
            weights_version: 0,
            inference:       None,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.model {
            None if self.train_batch.is_some() => EngineState::DataLoaded,
            None => EngineState::Unconfigured,
            Some(_) if self.inference_is_current() => EngineState::InferenceReady,
            Some(_) if self.trained => EngineState::Trained,
            Some(_) => EngineState::ModelReady,
        }
    }

    pub fn weights_version(&self) -> u64 {
        self.weights_version
    }

    pub fn train_batch(&self) -> Option<&SampleBatch> {
        self.train_batch.as_ref()
    }

    /// Fetch both splits from the source and normalise them to [0, 1].
    /// Always starts from raw bytes, so repeated calls are safe.
    pub fn load_data(&mut self) -> DigitResult<()> {
        tracing::info!("Loading reference dataset from '{}'", self.source.name());
        let splits = self.source.load()?;

        let train = SampleBatch::normalize(&splits.train);
        let eval  = SampleBatch::normalize(&splits.test);
        tracing::info!(
            "Dataset ready: train {:?}, holdout {:?}",
            train.shape(),
            eval.shape(),
        );

        self.train_batch = Some(train);
        self.eval_batch  = Some(eval);
        Ok(())
    }

    /// Construct fresh, untrained LeNet weights.
    pub fn build_model(&mut self) {
        let model = self.model_config.init::<B>(&self.device);
        tracing::info!("Model ready: LeNet with {} parameters", model.num_params());
        self.install(model, false);
    }

    /// load_data → build_model → fit → holdout evaluation (logged).
    ///
    /// If fitting fails the freshly built weights stay installed.
    pub fn train(&mut self) -> DigitResult<()> {
        self.load_data()?;
        self.build_model();

        let train_batch = self.train_batch.clone().ok_or(DigitError::DataNotLoaded)?;
        let metrics     = self
            .config
            .metrics_dir
            .as_deref()
            .map(MetricsLogger::new)
            .transpose()?;
        let model       = self.model.clone().ok_or(DigitError::ModelNotBuilt)?;

        tracing::info!("Starting training...");
        let started = Instant::now();

        let model = trainer::fit(model, &train_batch, &self.config, &self.device, metrics.as_ref())?;
        self.install(model, true);

        tracing::info!("Took {} seconds", started.elapsed().as_secs());

        let report = self.evaluate()?;
        tracing::info!(
            "Holdout: loss={:.4} accuracy={:.2}% over {} samples",
            report.loss,
            report.accuracy * 100.0,
            report.samples,
        );
        Ok(())
    }

    /// Batched loss and accuracy of the base model on the holdout batch.
    pub fn evaluate(&self) -> DigitResult<EvalReport> {
        let model = self.model.as_ref().ok_or(DigitError::ModelNotBuilt)?;
        let eval  = self.eval_batch.as_ref().ok_or(DigitError::DataNotLoaded)?;
        Ok(trainer::evaluate(
            &model.valid(),
            eval,
            self.config.batch_size,
            self.config.num_workers,
            &self.device,
        ))
    }

    /// Accuracy of the public predict path over every holdout sample.
    ///
    /// Each normalised sample is mapped back to bytes first, since
    /// predict expects raw 0–255 input.
    pub fn evaluate_holdout(&mut self) -> DigitResult<f64> {
        if self.model.is_none() {
            return Err(DigitError::ModelNotBuilt);
        }
        let eval = self.eval_batch.clone().ok_or(DigitError::DataNotLoaded)?;
        if eval.is_empty() {
            return Ok(0.0);
        }

        let mut correct = 0usize;
        for sample in eval.iter() {
            if self.predict(&sample.to_bytes())? == sample.label as usize {
                correct += 1;
            }
        }

        let accuracy = correct as f64 / eval.sample_count() as f64;
        tracing::info!("Accuracy: {:.2}%", accuracy * 100.0);
        Ok(accuracy)
    }

    /// Classify one image given as raw bytes. Inputs that are not
    /// exactly 784 bytes are zero-padded or truncated at the tail.
    pub fn predict(&mut self, bytes: &[u8]) -> DigitResult<usize> {
        let pixels = fit_to_input(bytes);
        let device = self.device.clone();
        self.inference_model()?.classify(&pixels, &device)
    }

    /// The softmax model for the current weights, built on first use.
    fn inference_model(&mut self) -> DigitResult<&InferenceModel<B::InnerBackend>> {
        let base = self.model.as_ref().ok_or(DigitError::ModelNotBuilt)?;

        if !self.inference_is_current() {
            tracing::debug!("Deriving inference model for weights v{}", self.weights_version);
            self.inference = None;
        }

        let version = self.weights_version;
        Ok(self
            .inference
            .get_or_insert_with(|| InferenceModel::new(base.valid(), version)))
    }

    fn inference_is_current(&self) -> bool {
        self.inference
            .as_ref()
            .is_some_and(|m| m.weights_version() == self.weights_version)
    }

    fn install(&mut self, model: LeNet<B>, trained: bool) {
        self.model            = Some(model);
        self.trained          = trained;
        self.weights_version += 1;
        self.inference        = None;
    }
}

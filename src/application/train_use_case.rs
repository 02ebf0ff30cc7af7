// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run:
//
//   Step 1: Pick the reference dataset source   (Layer 4 - data)
//   Step 2: Build the classifier engine          (Layer 5 - ml)
//   Step 3: load → build → fit → evaluate        (Layer 5 - ml)
//   Step 4: Optionally score the predict path    (Layer 5 - ml)
//
// The trained engine is handed back to the caller so it can
// keep serving predictions in the same process.
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{mnist::MnistSource, synthetic::SyntheticDigits};
use crate::domain::traits::DigitSource;
use crate::ml::backend::{default_device, Engine};

// ─── Training Configuration ──────────────────────────────────────────────────
// Hyperparameters for a training run. Defaults reproduce the
// reference recipe: 20 epochs, batch 128, Adam at lr 0.01.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub adam_epsilon:  f32,
    pub seed:          u64,
    pub num_workers:   usize,
    pub metrics_dir:   Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs:        20,
            batch_size:    128,
            learning_rate: 0.01,
            adam_epsilon:  1e-7,
            seed:          42,
            num_workers:   1,
            metrics_dir:   None,
        }
    }
}

// ─── Dataset Selection ───────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub enum DatasetConfig {
    Mnist {
        cache_dir: Option<PathBuf>,
        mirror:    Option<String>,
        offline:   bool,
    },
    Synthetic {
        count: usize,
        seed:  u64,
    },
}

impl DatasetConfig {
    pub fn into_source(self) -> Result<Box<dyn DigitSource>> {
        match self {
            DatasetConfig::Mnist { cache_dir, mirror, offline } => {
                let cache_dir = match cache_dir {
                    Some(dir) => dir,
                    None      => MnistSource::default_cache_dir()
                        .context("Failed to resolve the MNIST cache directory")?,
                };

                let mut source = MnistSource::new(cache_dir);
                if let Some(mirror) = mirror {
                    source = source.with_mirror(mirror);
                }
                if offline {
                    source = source.offline();
                }
                Ok(Box::new(source))
            }
            DatasetConfig::Synthetic { count, seed } => {
                Ok(Box::new(SyntheticDigits::new(count, seed)))
            }
        }
    }
}

/// What a finished run produced.
pub struct TrainOutcome {
    pub engine:           Engine,
    pub holdout_accuracy: Option<f64>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:  TrainConfig,
    dataset: DatasetConfig,
    holdout: bool,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, dataset: DatasetConfig) -> Self {
        Self { config, dataset, holdout: false }
    }

    /// Also score the single-image predict path on every holdout sample.
    pub fn with_holdout(mut self, holdout: bool) -> Self {
        self.holdout = holdout;
        self
    }

    pub fn execute(self) -> Result<TrainOutcome> {
        // ── Step 1: Dataset source ────────────────────────────────────────────
        let source = self.dataset.into_source()?;
        tracing::info!("Training with dataset source '{}'", source.name());

        // ── Step 2: Engine ────────────────────────────────────────────────────
        let mut engine = Engine::new(source, self.config, default_device());

        // ── Step 3: Train (logs duration and holdout loss/accuracy) ───────────
        engine.train().context("Training failed")?;

        // ── Step 4: Optional per-sample holdout pass ──────────────────────────
        let holdout_accuracy = if self.holdout {
            Some(engine.evaluate_holdout().context("Holdout evaluation failed")?)
        } else {
            None
        };

        Ok(TrainOutcome { engine, holdout_accuracy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_recipe() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 20);
        assert_eq!(cfg.batch_size, 128);
        assert!((cfg.learning_rate - 0.01).abs() < f64::EPSILON);
        assert!(cfg.metrics_dir.is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg  = TrainConfig { epochs: 3, metrics_dir: Some("runs".into()), ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.epochs, 3);
        assert_eq!(back.metrics_dir.as_deref(), Some("runs"));
    }

    #[test]
    fn test_dataset_config_builds_named_source() {
        let synthetic = DatasetConfig::Synthetic { count: 10, seed: 1 }.into_source().unwrap();
        assert_eq!(synthetic.name(), "synthetic");

        let dir  = tempfile::tempdir().unwrap();
        let mnist = DatasetConfig::Mnist {
            cache_dir: Some(dir.path().to_path_buf()),
            mirror:    None,
            offline:   true,
        }
        .into_source()
        .unwrap();
        assert_eq!(mnist.name(), "mnist");
        // Offline with an empty cache: nothing to read
        assert!(mnist.load().is_err());
    }

    #[test]
    fn test_execute_on_synthetic_reports_holdout() {
        let config = TrainConfig { epochs: 1, batch_size: 16, ..TrainConfig::default() };
        let outcome = TrainUseCase::new(config, DatasetConfig::Synthetic { count: 50, seed: 3 })
            .with_holdout(true)
            .execute()
            .unwrap();

        let accuracy = outcome.holdout_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
        assert!(outcome.engine.weights_version() > 0);
    }
}

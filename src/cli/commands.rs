// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `predict` and `serve`.
//
// clap's derive macros generate --help text, errors for
// missing args and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{DatasetConfig, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train LeNet on the reference dataset and report holdout accuracy
    Train(TrainArgs),

    /// Train (or build untrained weights), then classify one image file
    Predict(PredictArgs),

    /// Serve POST /LeNet/Train and POST /LeNet/Predict over HTTP
    Serve(ServeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    /// The four MNIST IDX files, downloaded on first use
    Mnist,
    /// Seeded seven-segment glyphs; no network needed
    Synthetic,
}

/// Dataset and hyperparameter flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Reference dataset to train on
    #[arg(long, value_enum, default_value_t = DatasetKind::Mnist)]
    pub dataset: DatasetKind,

    /// Where the MNIST IDX files are cached (default: user cache dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Base URL the MNIST .gz files are fetched from
    #[arg(long)]
    pub mirror: Option<String>,

    /// Fail instead of downloading missing MNIST files
    #[arg(long)]
    pub offline: bool,

    /// Number of images the synthetic source generates
    #[arg(long, default_value_t = 2_000)]
    pub synthetic_count: usize,

    /// Seed for data shuffling and the synthetic source
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Number of samples per optimiser step
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Append per-epoch loss/accuracy to <DIR>/metrics.csv
    #[arg(long)]
    pub metrics_dir: Option<String>,

    /// After training, also score the predict path on every holdout image
    #[arg(long)]
    pub holdout: bool,
}

impl TrainArgs {
    pub fn dataset_config(&self) -> DatasetConfig {
        match self.dataset {
            DatasetKind::Mnist => DatasetConfig::Mnist {
                cache_dir: self.data_dir.clone(),
                mirror:    self.mirror.clone(),
                offline:   self.offline,
            },
            DatasetKind::Synthetic => DatasetConfig::Synthetic {
                count: self.synthetic_count,
                seed:  self.seed,
            },
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            epochs:        a.epochs,
            batch_size:    a.batch_size,
            learning_rate: a.lr,
            seed:          a.seed,
            num_workers:   a.num_workers,
            metrics_dir:   a.metrics_dir,
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image file to classify (any format the image crate decodes)
    #[arg(long)]
    pub image: PathBuf,

    /// Skip training and predict with freshly initialised weights
    #[arg(long)]
    pub untrained: bool,

    #[command(flatten)]
    pub train: TrainArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket address to listen on
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub addr: String,

    /// Train before accepting requests instead of waiting for /LeNet/Train
    #[arg(long)]
    pub train_on_start: bool,

    #[command(flatten)]
    pub train: TrainArgs,
}

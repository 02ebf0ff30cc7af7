// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch when a metrics
// directory is configured.
//
//   epoch,train_loss,train_accuracy
//   1,0.412300,0.871200
//   2,0.118400,0.964500
//   ...
//
// Rows are appended across runs; the header is only written
// when the file is first created.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::error::DigitResult;

const CSV_HEADER: &str = "epoch,train_loss,train_accuracy";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean cross-entropy over the epoch's mini-batches.
    /// An untrained 10-way classifier sits near ln(10) ≈ 2.30
    pub train_loss: f64,

    /// Fraction of training samples classified correctly, in [0.0, 1.0]
    pub train_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_accuracy: f64) -> Self {
        Self { epoch, train_loss, train_accuracy }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory if needed and open `<dir>/metrics.csv`.
    pub fn new(dir: impl AsRef<Path>) -> DigitResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> DigitResult<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.train_accuracy)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, train_accuracy={:.4}",
            m.epoch,
            m.train_loss,
            m.train_accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

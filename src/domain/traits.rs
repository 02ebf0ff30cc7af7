// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The engine never names a concrete dataset. It holds a
// DigitSource and asks it for the canonical train/test split:
//
//   - MnistSource     → IDX files from the CVDF mirror
//   - SyntheticDigits → seeded generator for offline runs
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::digit::DigitSplits;
use crate::domain::error::DigitResult;

// ─── DigitSource ──────────────────────────────────────────────────────────────
/// Anything that can deliver the reference dataset as raw bytes.
///
/// Called once per `load_data`; implementations must return
/// un-normalised intensities so repeated loads never compound.
pub trait DigitSource: Send {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Load both splits in one bulk read.
    fn load(&self) -> DigitResult<DigitSplits>;
}

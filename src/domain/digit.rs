// ============================================================
// Layer 3 — Digit Domain Types
// ============================================================
// A handwritten digit as delivered by a dataset source:
// 784 raw intensity bytes (28 rows × 28 columns, row-major)
// plus its integer label 0–9.
//
// Nothing here knows about tensors or normalisation — that
// happens in Layer 4 when a SampleBatch is built.
//
// Reference: Rust Book §5 (Structs and Methods)

/// Side length of every digit image, in pixels.
pub const IMAGE_SIDE: usize = 28;

/// Number of intensity values in one flattened digit image.
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Number of output classes (the digits 0 through 9).
pub const NUM_CLASSES: usize = 10;

/// One un-normalised labelled digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDigit {
    /// Row-major intensities in [0, 255], exactly IMAGE_PIXELS long
    pub pixels: Vec<u8>,

    /// The digit drawn in the image, 0–9
    pub label: u8,
}

impl RawDigit {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        Self { pixels, label }
    }
}

/// The canonical pre-split reference dataset, loaded in one shot.
#[derive(Debug, Clone, Default)]
pub struct DigitSplits {
    pub train: Vec<RawDigit>,
    pub test:  Vec<RawDigit>,
}

impl DigitSplits {
    pub fn new(train: Vec<RawDigit>, test: Vec<RawDigit>) -> Self {
        Self { train, test }
    }
}

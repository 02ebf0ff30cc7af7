//! Error taxonomy shared by the data and ml layers.

use thiserror::Error;

/// Errors raised by the preprocessor and the classifier engine.
///
/// Size mismatches in prediction input are deliberately absent:
/// the engine pads or truncates instead of failing.
#[derive(Debug, Error)]
pub enum DigitError {
    /// The uploaded bytes are not an image the decoder understands.
    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The reference dataset could not be fetched or parsed.
    #[error("reference dataset unavailable: {reason}")]
    DatasetUnavailable {
        /// What went wrong.
        reason: String,
    },

    /// Predict or evaluate was invoked before `build_model`.
    #[error("model has not been built; call build_model or train first")]
    ModelNotBuilt,

    /// Evaluation was invoked before `load_data`.
    #[error("dataset has not been loaded; call load_data or train first")]
    DataNotLoaded,

    /// A tensor could not be read back from the backend.
    #[error("backend failure: {0}")]
    Backend(String),

    /// Filesystem failure outside dataset loading (metrics output).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DigitError {
    pub fn dataset(reason: impl Into<String>) -> Self {
        Self::DatasetUnavailable { reason: reason.into() }
    }
}

/// Result alias for the engine and preprocessor.
pub type DigitResult<T> = std::result::Result<T, DigitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DigitError::ModelNotBuilt;
        assert!(format!("{err}").contains("build_model"));

        let err = DigitError::dataset("connection refused");
        assert_eq!(
            format!("{err}"),
            "reference dataset unavailable: connection refused"
        );
    }
}

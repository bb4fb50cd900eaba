//! Custom error types for deepfake-detector.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the deepfake-detector library.
#[derive(Error, Debug)]
pub enum Error {
    /// Uploaded bytes could not be decoded as an image.
    #[error("cannot identify image file: {source}")]
    ImageDecode {
        #[source]
        source: image::ImageError,
    },

    /// The checkpoint file does not exist.
    #[error("Model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {}: {source}", path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// Inference was requested before the model handle was filled.
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// The model handle is write-once.
    #[error("Model already loaded")]
    ModelAlreadyLoaded,

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// A previous forward pass panicked while holding the session.
    #[error("inference session is poisoned")]
    SessionPoisoned,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for deepfake-detector operations.
pub type Result<T> = std::result::Result<T, Error>;

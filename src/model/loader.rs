//! ONNX checkpoint loading and execution.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

use super::{Classifier, DEVICE, NUM_CLASSES};

/// Directory holding the checkpoint, relative to the executable.
pub const MODELS_DIR: &str = "models";

/// Filename of the exported EfficientNet-B0 checkpoint.
pub const CHECKPOINT_FILENAME: &str = "best_effnetb0.onnx";

/// Identifier reported for the ONNX checkpoint.
pub const MODEL_NAME: &str = "EfficientNet-B0 (ONNX)";

/// Resolve the checkpoint path beside the running executable.
///
/// Falls back to the working directory if the executable location is unknown.
#[must_use]
pub fn default_checkpoint_path() -> PathBuf {
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(MODELS_DIR).join(CHECKPOINT_FILENAME)
}

/// Two-class EfficientNet-B0 running on ONNX Runtime's CPU provider.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    /// Load the checkpoint at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be deserialized, or the
    /// graph has no inputs or outputs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        tracing::info!("Loading model from: {}", path.display());
        tracing::info!("Using device: {DEVICE}");

        if !path.exists() {
            return Err(Error::ModelNotFound {
                path: path.to_path_buf(),
            });
        }

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        if session.inputs.is_empty() || session.outputs.is_empty() {
            return Err(Error::ShapeMismatch {
                expected: "graph with one input and one output".to_string(),
                actual: format!(
                    "{} inputs, {} outputs",
                    session.inputs.len(),
                    session.outputs.len()
                ),
            });
        }

        tracing::info!("Model loaded successfully!");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn logits(&self, input: &ImageTensor) -> Result<[f32; NUM_CLASSES]> {
        let input_value =
            Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

        let mut session = self.session.lock().map_err(|_| Error::SessionPoisoned)?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        // Get first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "logits output".to_string(),
                actual: "no output".to_string(),
            })?;

        let (shape_info, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|source| Error::Inference { source })?;

        let Some(logits) = logits_from_slice(data) else {
            // Safe: tensor dimensions are always non-negative
            let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();
            return Err(Error::ShapeMismatch {
                expected: format!("[1, {NUM_CLASSES}]"),
                actual: format!("{dims:?}"),
            });
        };

        Ok(logits)
    }
}

/// Interpret a flat output buffer as exactly two logits.
fn logits_from_slice(data: &[f32]) -> Option<[f32; NUM_CLASSES]> {
    <[f32; NUM_CLASSES]>::try_from(data).ok()
}

//! Classifier loading and the process-wide model handle.

mod loader;

pub use loader::{
    default_checkpoint_path, OnnxClassifier, CHECKPOINT_FILENAME, MODELS_DIR, MODEL_NAME,
};

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

/// Number of output classes of the network.
pub const NUM_CLASSES: usize = 2;

/// Device every forward pass runs on.
pub const DEVICE: &str = "cpu";

/// A binary image classifier mapping a standardized tensor to two logits.
pub trait Classifier: Send + Sync {
    /// Human-readable model identifier.
    fn name(&self) -> &str;

    /// Run a forward pass over a `(1, 3, 224, 224)` tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the forward pass fails or the output is not two logits.
    fn logits(&self, input: &ImageTensor) -> Result<[f32; NUM_CLASSES]>;
}

/// Write-once handle to the loaded classifier.
///
/// Created empty, filled once during startup, read-only afterwards.
#[derive(Default)]
pub struct ModelHandle {
    inner: OnceLock<Box<dyn Classifier>>,
}

impl ModelHandle {
    /// Create an empty handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that already holds `classifier`.
    #[must_use]
    pub fn loaded(classifier: impl Classifier + 'static) -> Self {
        let classifier: Box<dyn Classifier> = Box::new(classifier);
        Self {
            inner: OnceLock::from(classifier),
        }
    }

    /// Store the classifier. The handle cannot be refilled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelAlreadyLoaded`] on a second call.
    pub fn install(&self, classifier: impl Classifier + 'static) -> Result<()> {
        self.inner
            .set(Box::new(classifier))
            .map_err(|_| Error::ModelAlreadyLoaded)
    }

    /// Borrow the loaded classifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotLoaded`] if nothing was installed.
    pub fn get(&self) -> Result<&dyn Classifier> {
        self.inner
            .get()
            .map(|model| &**model)
            .ok_or(Error::ModelNotLoaded)
    }

    /// Whether a classifier has been installed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.inner.get().map(|m| m.name()))
            .finish()
    }
}

//! # deepfake-detector
//!
//! An HTTP microservice that classifies uploaded images as `REAL` or `FAKE`.
//!
//! Images are converted to RGB, resized to 224x224 and standardized with
//! ImageNet statistics, then passed through a two-class EfficientNet-B0
//! exported to ONNX and executed on the CPU with ONNX Runtime.
//!
//! ## Example
//!
//! ```no_run
//! use deepfake_detector::{image, pipeline, ModelHandle, OnnxClassifier};
//!
//! # fn main() -> deepfake_detector::Result<()> {
//! let model = ModelHandle::new();
//! model.install(OnnxClassifier::load("models/best_effnetb0.onnx")?)?;
//!
//! let bytes = std::fs::read("face.jpg")?;
//! let prediction = pipeline::predict(&model, &image::decode_image(&bytes)?)?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use model::{Classifier, ModelHandle, OnnxClassifier};
pub use pipeline::{predict, Label, Prediction};

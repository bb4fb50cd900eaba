//! Deepfake classification pipeline.

mod classify;

pub use classify::{
    predict, softmax, ClassIndex, Label, Prediction, Probabilities, FAKE_THRESHOLD,
};

//! Image classification: preprocessing, forward pass and decision rule.

use image::DynamicImage;
use serde::Serialize;

use crate::error::Result;
use crate::image::image_to_tensor;
use crate::model::{ModelHandle, NUM_CLASSES};

/// Fake probabilities strictly above this value are labelled `FAKE`.
pub const FAKE_THRESHOLD: f32 = 0.5;

/// Decimal places kept in reported probabilities.
const REPORT_DECIMALS: i32 = 4;

/// Output positions of the classifier, fixed when the checkpoint was trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassIndex {
    Real = 0,
    Fake = 1,
}

impl ClassIndex {
    /// Position of this class in the logit vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Real,
    Fake,
}

impl Label {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Real => "REAL",
            Self::Fake => "FAKE",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounded per-class probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub real: f64,
    pub fake: f64,
}

/// Classification result for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub is_fake: bool,
    /// Probability of the class named by `label`.
    pub confidence: f64,
    pub label: Label,
    pub probabilities: Probabilities,
}

impl Prediction {
    /// Apply the decision rule to unrounded class probabilities.
    ///
    /// Rounding happens after the threshold comparison.
    #[must_use]
    pub fn from_probabilities(probs: [f32; NUM_CLASSES]) -> Self {
        let real = probs[ClassIndex::Real.index()];
        let fake = probs[ClassIndex::Fake.index()];

        let is_fake = fake > FAKE_THRESHOLD;
        let (label, confidence) = if is_fake {
            (Label::Fake, fake)
        } else {
            (Label::Real, real)
        };

        Self {
            is_fake,
            confidence: round_probability(confidence),
            label,
            probabilities: Probabilities {
                real: round_probability(real),
                fake: round_probability(fake),
            },
        }
    }
}

/// Classify an image with the loaded model.
///
/// # Errors
///
/// Returns [`crate::Error::ModelNotLoaded`] before touching the image if the
/// handle is empty, or any error raised by the forward pass.
pub fn predict(model: &ModelHandle, image: &DynamicImage) -> Result<Prediction> {
    let classifier = model.get()?;

    let tensor = image_to_tensor(image);
    let logits = classifier.logits(&tensor)?;
    let prediction = Prediction::from_probabilities(softmax(logits));

    tracing::debug!(
        label = %prediction.label,
        confidence = prediction.confidence,
        "classified image"
    );

    Ok(prediction)
}

/// Numerically stable softmax over the class logits.
#[must_use]
pub fn softmax(logits: [f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.map(|x| (x - max).exp());
    let sum: f32 = exps.iter().sum();

    exps.map(|e| e / sum)
}

/// Round to the reported number of decimals.
fn round_probability(p: f32) -> f64 {
    let scale = 10f64.powi(REPORT_DECIMALS);
    (f64::from(p) * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::testing::{FixedLogits, MeanLogits};
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_softmax_sums_to_one() {
        for logits in [[0.0, 0.0], [3.0, -2.0], [-50.0, 50.0], [1000.0, 999.0]] {
            let [a, b] = softmax(logits);
            assert!((a + b - 1.0).abs() < 1e-6, "{logits:?}");
            assert!(a.is_finite() && b.is_finite());
        }
    }

    #[test]
    fn test_equal_logits_are_real() {
        let prediction = Prediction::from_probabilities(softmax([0.7, 0.7]));

        assert!(!prediction.is_fake);
        assert_eq!(prediction.label, Label::Real);
        assert!((prediction.confidence - 0.5).abs() < EPS);
    }

    #[test]
    fn test_exact_half_is_not_fake() {
        let prediction = Prediction::from_probabilities([0.5, 0.5]);

        assert!(!prediction.is_fake);
        assert_eq!(prediction.label, Label::Real);
    }

    #[test]
    fn test_threshold_uses_unrounded_value() {
        // Rounds to 0.5 but is strictly above the threshold.
        let prediction = Prediction::from_probabilities([0.499_99, 0.500_01]);

        assert!(prediction.is_fake);
        assert_eq!(prediction.label, Label::Fake);
        assert!((prediction.probabilities.fake - 0.5).abs() < EPS);
    }

    #[test]
    fn test_confidence_tracks_chosen_label() {
        let real = Prediction::from_probabilities([0.9, 0.1]);
        assert_eq!(real.label, Label::Real);
        assert!((real.confidence - real.probabilities.real).abs() < EPS);

        let fake = Prediction::from_probabilities([0.2, 0.8]);
        assert_eq!(fake.label, Label::Fake);
        assert!((fake.confidence - fake.probabilities.fake).abs() < EPS);
    }

    #[test]
    fn test_probabilities_rounded_to_four_decimals() {
        let prediction = Prediction::from_probabilities([0.123_456, 0.876_544]);

        assert!((prediction.probabilities.real - 0.1235).abs() < EPS);
        assert!((prediction.probabilities.fake - 0.8765).abs() < EPS);
        assert!((prediction.confidence - 0.8765).abs() < EPS);
    }

    #[test]
    fn test_predict_before_load_fails() {
        let handle = ModelHandle::new();
        let err = predict(&handle, &DynamicImage::new_rgb8(4, 4)).unwrap_err();

        assert!(matches!(err, Error::ModelNotLoaded));
        assert_eq!(err.to_string(), "Model not loaded");
    }

    #[test]
    fn test_predict_after_load() {
        let handle = ModelHandle::loaded(FixedLogits::new([-1.0, 2.0]));
        let prediction = predict(&handle, &DynamicImage::new_rgb8(300, 200)).unwrap();

        assert!(prediction.is_fake);
        assert_eq!(prediction.label, Label::Fake);
        let sum = prediction.probabilities.real + prediction.probabilities.fake;
        assert!((sum - 1.0).abs() <= 1e-4);
    }

    #[test]
    fn test_non_rgb_inputs_are_accepted() {
        let handle = ModelHandle::loaded(MeanLogits);
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 48, Luma([200])));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 90, Rgba([1, 2, 3, 128])));

        assert!(predict(&handle, &gray).is_ok());
        assert!(predict(&handle, &rgba).is_ok());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let handle = ModelHandle::loaded(MeanLogits);
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(57, 31, |x, y| {
            Luma([u8::try_from((x * 7 + y * 3) % 256).unwrap()])
        }));

        let first = predict(&handle, &img).unwrap();
        let second = predict(&handle, &img).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_label_serializes_upper_case() {
        let json = serde_json::to_value(Prediction::from_probabilities([0.25, 0.75])).unwrap();

        assert_eq!(json["label"], "FAKE");
        assert_eq!(json["is_fake"], true);
        assert_eq!(json["probabilities"]["real"], 0.25);
        assert_eq!(json["probabilities"]["fake"], 0.75);
    }
}

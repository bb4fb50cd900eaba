//! Image decoding and preprocessing utilities.

mod load;

pub use load::{decode_image, image_to_tensor};

use ndarray::Array4;

/// Image tensor in NCHW format (batch, channels, height, width).
/// Values are standardized per channel with ImageNet statistics.
pub type ImageTensor = Array4<f32>;

/// EfficientNet-B0 input resolution (height and width).
pub const INPUT_SIZE: u32 = 224;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Per-channel mean of the ImageNet training set.
///
/// Must match the statistics the checkpoint was trained with.
pub const IMAGENET_MEAN: [f32; RGB_CHANNELS] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of the ImageNet training set.
pub const IMAGENET_STD: [f32; RGB_CHANNELS] = [0.229, 0.224, 0.225];

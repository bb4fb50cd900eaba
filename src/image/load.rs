//! Image decoding and tensor conversion.

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, IMAGENET_MEAN, IMAGENET_STD, INPUT_SIZE, RGB_CHANNELS};

/// Decode uploaded bytes into an image, guessing the format from its header.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| Error::ImageDecode { source })
}

/// Convert a `DynamicImage` to a standardized NCHW tensor.
///
/// The image is:
/// 1. Converted to 8-bit RGB (grayscale, alpha and 16-bit modes are flattened)
/// 2. Resized to 224x224 with a bilinear filter
/// 3. Scaled to [0, 1] and standardized with ImageNet mean/std
/// 4. Returned as NCHW tensor (1, 3, 224, 224)
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn image_to_tensor(img: &DynamicImage) -> ImageTensor {
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let (width, height) = (INPUT_SIZE as usize, INPUT_SIZE as usize);

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, height, width));

    for (x, y, pixel) in resized.enumerate_pixels() {
        // Safe: x and y are bounded by INPUT_SIZE (224)
        let (x, y) = (x as usize, y as usize);
        for c in 0..RGB_CHANNELS {
            tensor[[0, c, y, x]] = standardize(pixel[c], c);
        }
    }

    tensor
}

/// Scale an 8-bit channel value to [0, 1] and standardize it.
#[inline]
fn standardize(value: u8, channel: usize) -> f32 {
    (f32::from(value) / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_tensor_shape() {
        let img = DynamicImage::new_rgb8(100, 60);
        let tensor = image_to_tensor(&img);

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_black_image_standardization() {
        let img = DynamicImage::new_rgb8(32, 32);
        let tensor = image_to_tensor(&img);

        for c in 0..RGB_CHANNELS {
            let expected = -IMAGENET_MEAN[c] / IMAGENET_STD[c];
            let value = tensor[[0, c, 10, 10]];
            assert!((value - expected).abs() < 1e-5, "channel {c}: {value}");
        }
    }

    #[test]
    fn test_white_image_standardization() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            50,
            50,
            image::Rgb([255, 255, 255]),
        ));
        let tensor = image_to_tensor(&img);

        for c in 0..RGB_CHANNELS {
            let expected = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            let value = tensor[[0, c, 200, 3]];
            assert!((value - expected).abs() < 1e-5, "channel {c}: {value}");
        }
    }

    #[test]
    fn test_grayscale_is_replicated_across_channels() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([128])));
        let tensor = image_to_tensor(&img);

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        for c in 0..RGB_CHANNELS {
            let expected = standardize(128, c);
            assert!((tensor[[0, c, 100, 100]] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rgba_alpha_is_dropped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 0])));
        let tensor = image_to_tensor(&img);

        assert!((tensor[[0, 0, 0, 0]] - standardize(10, 0)).abs() < 1e-5);
        assert!((tensor[[0, 1, 0, 0]] - standardize(20, 1)).abs() < 1e-5);
        assert!((tensor[[0, 2, 0, 0]] - standardize(30, 2)).abs() < 1e-5);
    }

    #[test]
    fn test_decode_png_bytes() {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }
}

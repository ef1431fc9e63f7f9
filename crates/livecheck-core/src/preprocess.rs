//! Image → tensor preprocessing for the liveness model.
//!
//! Any RGB image is stretched (not cropped, not letterboxed) to 128×128 with a
//! triangle (bilinear) filter, then each channel byte is divided by 255 and laid out
//! row-major as `R, G, B` triples.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

use crate::tensor::{InputTensor, INPUT_LEN, INPUT_SHAPE, INPUT_SIZE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("invalid image: {width}x{height} has no pixels")]
    ZeroSized { width: u32, height: u32 },
    #[error("invalid image: expected {expected} bytes of RGB data, got {actual}")]
    UnreadableChannels { expected: usize, actual: usize },
}

/// Convert an RGB image into a `[1, 128, 128, 3]` tensor with values in `[0, 1]`.
pub fn preprocess(image: &RgbImage) -> Result<InputTensor, PreprocessError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::ZeroSized { width, height });
    }

    // Triangle is the image crate's bilinear filter.
    let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let mut values = Vec::with_capacity(INPUT_LEN);
    for pixel in resized.pixels() {
        let [r, g, b] = pixel.0;
        values.push(f32::from(r) / 255.0);
        values.push(f32::from(g) / 255.0);
        values.push(f32::from(b) / 255.0);
    }

    InputTensor::from_shape_vec(INPUT_SHAPE, values).map_err(|_| {
        PreprocessError::UnreadableChannels {
            expected: INPUT_LEN,
            actual: resized.as_raw().len(),
        }
    })
}

/// Preprocess a decoded image of any color type. Alpha is discarded.
pub fn preprocess_dynamic(image: &DynamicImage) -> Result<InputTensor, PreprocessError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::ZeroSized {
            width: image.width(),
            height: image.height(),
        });
    }
    preprocess(&image.to_rgb8())
}

/// Preprocess a packed RGB8 buffer of `width * height * 3` bytes.
pub fn preprocess_raw(
    width: u32,
    height: u32,
    data: Vec<u8>,
) -> Result<InputTensor, PreprocessError> {
    if width == 0 || height == 0 {
        return Err(PreprocessError::ZeroSized { width, height });
    }
    let expected = width as usize * height as usize * 3;
    let actual = data.len();
    let image = RgbImage::from_raw(width, height, data)
        .ok_or(PreprocessError::UnreadableChannels { expected, actual })?;
    preprocess(&image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    /// Deterministic noisy image so resizing has something to interpolate.
    fn patterned(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(31) ^ y.wrapping_mul(17);
            Rgb([(v % 256) as u8, ((v / 3) % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn assert_valid_tensor(tensor: &InputTensor) {
        assert_eq!(tensor.shape(), &INPUT_SHAPE);
        assert_eq!(tensor.len(), INPUT_LEN);
        let values = tensor.as_slice().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn any_resolution_yields_full_tensor() {
        for (w, h) in [(1, 1), (3, 7), (128, 128), (300, 200), (17, 640)] {
            let tensor = preprocess(&patterned(w, h)).unwrap();
            assert_valid_tensor(&tensor);
        }
    }

    #[test]
    fn white_image_is_all_ones() {
        let img = RgbImage::from_pixel(128, 128, Rgb([255, 255, 255]));
        let tensor = preprocess(&img).unwrap();
        assert!(tensor.as_slice().unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn black_image_is_all_zeros() {
        let img = RgbImage::from_pixel(40, 90, Rgb([0, 0, 0]));
        let tensor = preprocess(&img).unwrap();
        assert!(tensor.as_slice().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn channels_are_emitted_red_green_blue() {
        let img = RgbImage::from_pixel(128, 128, Rgb([255, 0, 51]));
        let tensor = preprocess(&img).unwrap();
        let values = tensor.as_slice().unwrap();
        assert_eq!(values[0], 1.0);
        assert_eq!(values[1], 0.0);
        assert!((values[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn layout_is_row_major() {
        // Distinct value per pixel at native size: no resampling happens.
        let img = RgbImage::from_fn(128, 128, |x, y| Rgb([x as u8, y as u8, 0]));
        let tensor = preprocess(&img).unwrap();
        let values = tensor.as_slice().unwrap();

        let (row, col) = (5usize, 9usize);
        let base = (row * 128 + col) * 3;
        assert!((values[base] - col as f32 / 255.0).abs() < 1e-6);
        assert!((values[base + 1] - row as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn stretches_instead_of_cropping() {
        // Left half red, right half blue on a wide image: both must survive.
        let img = RgbImage::from_fn(512, 64, |x, _| {
            if x < 256 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let tensor = preprocess(&img).unwrap();
        let values = tensor.as_slice().unwrap();

        let first = &values[0..3];
        let last = &values[(INPUT_LEN - 3)..];
        assert_eq!(first, &[1.0, 0.0, 0.0]);
        assert_eq!(last, &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn downscaled_content_matches_native_size() {
        // Same horizontal ramp at 128 and 256 pixels wide.
        let native = RgbImage::from_fn(128, 128, |x, _| Rgb([(x * 2) as u8, 0, 0]));
        let large = RgbImage::from_fn(256, 256, |x, _| Rgb([x as u8, 0, 0]));

        let a = preprocess(&native).unwrap();
        let b = preprocess(&large).unwrap();

        let max_diff = a
            .as_slice()
            .unwrap()
            .iter()
            .zip(b.as_slice().unwrap())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0f32, f32::max);
        assert!(max_diff <= 2.0 / 255.0 + 1e-6, "max diff {max_diff}");
    }

    #[test]
    fn alpha_is_ignored() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0])));
        let tensor = preprocess_dynamic(&img).unwrap();
        assert!(tensor.as_slice().unwrap().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn zero_sized_image_rejected() {
        let err = preprocess(&RgbImage::new(0, 10)).unwrap_err();
        assert_eq!(err, PreprocessError::ZeroSized { width: 0, height: 10 });

        let err = preprocess_dynamic(&DynamicImage::new_rgb8(10, 0)).unwrap_err();
        assert!(matches!(err, PreprocessError::ZeroSized { .. }));
    }

    #[test]
    fn short_raw_buffer_rejected() {
        let err = preprocess_raw(4, 4, vec![0u8; 20]).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::UnreadableChannels {
                expected: 48,
                actual: 20
            }
        );
    }

    #[test]
    fn raw_buffer_accepted() {
        let tensor = preprocess_raw(2, 2, vec![255u8; 12]).unwrap();
        assert_valid_tensor(&tensor);
    }
}

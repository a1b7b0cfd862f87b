//! The image contract shared by training and serving.
//!
//! Both the dataset loader and the prediction endpoint go through
//! [`decode_grayscale`], so a model only ever sees pixels produced by the
//! same decode → grayscale → resize → normalize sequence.

use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};

use crate::error::Result;
use crate::math::tensor::Tensor;

/// Side length, in pixels, of every image the model sees.
pub const IMAGE_SIZE: u32 = 150;

/// Resampling filter for the resize step (bicubic).
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Decodes `bytes` (any supported format), converts to 8-bit grayscale,
/// resizes to `size × size` and scales pixels to [0, 1].
///
/// Returns a `(size, size, 1)` tensor.
///
/// Colour inputs are reduced with Rec.709 luma weights, so their gray levels
/// differ slightly from a 299/587/114 conversion. Gray inputs are unaffected.
pub fn decode_grayscale(bytes: &[u8], size: u32) -> Result<Tensor> {
    let img = image::load_from_memory(bytes)?;
    let gray = img.to_luma8();
    let resized = imageops::resize(&gray, size, size, RESAMPLE_FILTER);
    let data = resized.pixels().map(|p| p.0[0] as f64 / 255.0).collect();
    Tensor::from_vec(&[size as usize, size as usize, 1], data)
}

/// [`decode_grayscale`] on the contents of a file.
pub fn load_grayscale(path: &Path, size: u32) -> Result<Tensor> {
    let bytes = fs::read(path)?;
    decode_grayscale(&bytes, size)
}

/// Turns uploaded image bytes into the model input: shape
/// `(1, 150, 150, 1)`, values in [0, 1].
pub fn preprocess_image(bytes: &[u8]) -> Result<Tensor> {
    let sample = decode_grayscale(bytes, IMAGE_SIZE)?;
    let mut shape = vec![1];
    shape.extend_from_slice(&sample.shape);
    sample.reshape(&shape)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{gradient_png, solid_png};
    use super::*;
    use crate::error::XrayError;

    #[test]
    fn output_is_batched_150_square_single_channel() {
        let t = preprocess_image(&gradient_png(320, 200)).unwrap();
        assert_eq!(t.shape, vec![1, 150, 150, 1]);
        assert_eq!(t.len(), 150 * 150);
        assert!(t.min() >= 0.0 && t.max() <= 1.0);
    }

    #[test]
    fn same_bytes_give_identical_tensors() {
        let bytes = gradient_png(97, 131);
        assert_eq!(preprocess_image(&bytes).unwrap(), preprocess_image(&bytes).unwrap());
    }

    #[test]
    fn white_and_black_map_to_range_ends() {
        let white = preprocess_image(&solid_png(40, 40, [255, 255, 255])).unwrap();
        let black = preprocess_image(&solid_png(40, 40, [0, 0, 0])).unwrap();
        assert!(white.data.iter().all(|&v| (v - 1.0).abs() < 1e-2));
        assert!(black.data.iter().all(|&v| v.abs() < 1e-2));
    }

    #[test]
    fn colour_collapses_to_a_single_gray_level() {
        let red = preprocess_image(&solid_png(30, 30, [255, 0, 0])).unwrap();
        let first = red.data[0];
        assert!(first > 0.05 && first < 0.95, "red became {first}");
        assert!(red.data.iter().all(|&v| (v - first).abs() < 1e-2));
    }

    #[test]
    fn colour_uses_rec709_luma_weights() {
        // 0.2126 * 255 rounds to 54; a 299/587/114 conversion would give 76.
        let red = preprocess_image(&solid_png(30, 30, [255, 0, 0])).unwrap();
        assert!((red.data[0] - 54.0 / 255.0).abs() < 1e-2, "red became {}", red.data[0]);
    }

    #[test]
    fn training_and_serving_paths_agree() {
        let bytes = gradient_png(64, 48);
        let served = preprocess_image(&bytes).unwrap();
        let trained = decode_grayscale(&bytes, IMAGE_SIZE).unwrap();
        assert_eq!(served.data, trained.data);
        assert_eq!(trained.shape, vec![150, 150, 1]);
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        let err = preprocess_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, XrayError::Image(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn tiff_exports_are_accepted() {
        let img = image::GrayImage::from_fn(60, 40, |x, _| image::Luma([(x * 4) as u8]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut out, image::ImageOutputFormat::Tiff)
            .unwrap();
        let t = preprocess_image(&out.into_inner()).unwrap();
        assert_eq!(t.shape, vec![1, 150, 150, 1]);
        assert!(t.max() > t.min());
    }
}

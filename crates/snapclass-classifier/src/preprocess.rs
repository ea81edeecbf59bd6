//! Image to input-tensor conversion

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Pixel, RgbImage};
use snapclass_core::{Error, InputTensor, Result};
use std::path::Path;

/// Copy the top-left `input_size × input_size` pixels into an NHWC tensor.
///
/// Pixels are scanned row by row; each contributes its red, green and blue
/// channels as raw 0-255 floats. Alpha is dropped and nothing is normalized.
/// Pixels outside the square are ignored.
pub fn image_to_tensor<I>(image: &I, input_size: u32) -> Result<InputTensor>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    if width < input_size || height < input_size {
        return Err(Error::invalid_image(format!(
            "image is {}x{}, model input needs at least {}x{}",
            width, height, input_size, input_size
        )));
    }

    let size = input_size as usize;
    let capacity = InputTensor::element_count(size)
        .ok_or_else(|| Error::invalid_image(format!("input size {} is too large", input_size)))?;
    let mut data = Vec::with_capacity(capacity);
    for y in 0..input_size {
        for x in 0..input_size {
            let [r, g, b] = image.get_pixel(x, y).to_rgb().0;
            data.extend_from_slice(&[r as f32, g as f32, b as f32]);
        }
    }

    InputTensor::from_vec(size, data)
        .ok_or_else(|| Error::invalid_image("preprocessed tensor has the wrong length"))
}

/// Decode an image file; the format is guessed from the extension
pub fn open_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Resize to the model's square input, for callers holding arbitrary images
pub fn resize_to_input(image: &DynamicImage, input_size: u32) -> RgbImage {
    image
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn test_solid_red_is_unnormalized_rgb_triples() {
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let tensor = image_to_tensor(&image, 4).unwrap();

        assert_eq!(tensor.shape(), [1, 4, 4, 3]);
        assert_eq!(tensor.byte_len(), 4 * 4 * 4 * 3);
        for chunk in tensor.as_slice().chunks(3) {
            assert_eq!(chunk, &[255.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_row_major_scan_and_alpha_dropped() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([1, 2, 3, 0]));
        image.put_pixel(1, 0, Rgba([4, 5, 6, 10]));
        image.put_pixel(0, 1, Rgba([7, 8, 9, 20]));
        image.put_pixel(1, 1, Rgba([10, 11, 12, 255]));

        let tensor = image_to_tensor(&image, 2).unwrap();
        let expected: Vec<f32> = (1..=12).map(|v| v as f32).collect();
        assert_eq!(tensor.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_extra_pixels_ignored() {
        let mut image = RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]));
        image.put_pixel(0, 0, Rgb([1, 1, 1]));

        let tensor = image_to_tensor(&image, 2).unwrap();
        assert_eq!(tensor.as_slice().len(), 12);
        assert_eq!(&tensor.as_slice()[..3], &[1.0, 1.0, 1.0]);
        assert!(tensor.as_slice()[3..].iter().all(|&v| v == 9.0));
    }

    #[test]
    fn test_small_image_rejected() {
        let image = RgbImage::new(3, 4);
        assert!(matches!(
            image_to_tensor(&image, 4),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_open_image_decodes_png() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])).save(&path).unwrap();

        let image = open_image(&path).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn test_open_image_corrupt_file_is_image_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(matches!(open_image(&path), Err(Error::Image(_))));
    }

    #[test]
    fn test_resize_to_input() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 6));
        let resized = resize_to_input(&image, 4);
        assert_eq!(resized.dimensions(), (4, 4));
    }
}

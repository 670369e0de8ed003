//! Screenshot functionality for capturing rendered frames.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgba, RgbaImage};

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Failed to save image: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image data")]
    InvalidImageData,
}

/// Builds an image from tightly packed 4-byte pixels.
///
/// `bgra` swaps the red and blue channels, for surfaces in a `Bgra8*` format.
pub fn image_from_pixels(
    mut data: Vec<u8>,
    width: u32,
    height: u32,
    bgra: bool,
) -> Result<RgbaImage, ScreenshotError> {
    if bgra {
        for chunk in data.chunks_exact_mut(4) {
            chunk.swap(0, 2);
        }
    }
    // wgpu uses a top-left origin, so no vertical flip is needed
    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, data)
        .ok_or(ScreenshotError::InvalidImageData)
}

/// Saves an image; the format follows the extension (`.png`, `.jpg`, `.jpeg`).
pub fn save_image(path: &Path, image: &RgbaImage) -> Result<(), ScreenshotError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => image.save_with_format(path, image::ImageFormat::Png)?,
        "jpg" | "jpeg" => {
            let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
        _ => return Err(ScreenshotError::UnsupportedFormat(extension)),
    }
    Ok(())
}

/// Hands out `screenshot_000000.png`, `screenshot_000001.png`, ...
#[derive(Debug, Default)]
pub struct ScreenshotCounter {
    next: usize,
}

impl ScreenshotCounter {
    /// Returns the next default file name and advances the counter.
    pub fn next_path(&mut self) -> PathBuf {
        let path = PathBuf::from(format!("screenshot_{:06}.png", self.next));
        self.next += 1;
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_names() {
        let mut counter = ScreenshotCounter::default();
        assert_eq!(counter.next_path(), PathBuf::from("screenshot_000000.png"));
        assert_eq!(counter.next_path(), PathBuf::from("screenshot_000001.png"));
    }

    #[test]
    fn test_bgra_is_swapped() {
        let img = image_from_pixels(vec![1, 2, 3, 4], 1, 1, true).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [3, 2, 1, 4]);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        assert!(matches!(
            image_from_pixels(vec![0; 4], 2, 2, false),
            Err(ScreenshotError::InvalidImageData)
        ));
    }

    #[test]
    fn test_unknown_extension() {
        let img = image_from_pixels(vec![0; 4], 1, 1, false).unwrap();
        let err = save_image(Path::new("shot.bmp"), &img).unwrap_err();
        assert!(matches!(err, ScreenshotError::UnsupportedFormat(ext) if ext == "bmp"));
    }
}

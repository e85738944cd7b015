use crate::error::ExtractError;
use crate::storage::Storage;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use std::path::Path;

/// A page at native resolution plus its working-size copy
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub full: DynamicImage,
    pub rescaled: DynamicImage,
}

/// Read an image and derive a copy exactly `target_width` wide
pub fn load<S: Storage + ?Sized>(
    storage: &S,
    path: &Path,
    target_width: u32,
) -> Result<LoadedImage, ExtractError> {
    let full = storage.read(path)?;
    let rescaled = rescale_to_width(&full, target_width);
    tracing::debug!(
        "Loaded {} at {}x{}, rescaled to {}x{}",
        path.display(),
        full.width(),
        full.height(),
        rescaled.width(),
        rescaled.height()
    );
    Ok(LoadedImage { full, rescaled })
}

/// Resize to `target_width`, height scaled to keep the aspect ratio
///
/// The triangle filter widens its support with the scale factor, so a
/// downscale averages the source area under each output pixel.
pub fn rescale_to_width(image: &DynamicImage, target_width: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width == target_width {
        return image.clone();
    }
    let new_height = ((height as u64 * target_width as u64) / width.max(1) as u64).max(1) as u32;
    image.resize_exact(target_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use image::{GrayImage, RgbImage};

    #[test]
    fn test_rescale_hits_target_width_and_keeps_ratio() {
        for (w, h) in [(2000u32, 3000u32), (1100, 700), (300, 451), (551, 1)] {
            let img = DynamicImage::ImageRgb8(RgbImage::new(w, h));
            let result = rescale_to_width(&img, 550);
            assert_eq!(result.width(), 550);
            let expected = h as f64 * 550.0 / w as f64;
            assert!(
                (result.height() as f64 - expected).abs() <= 1.0,
                "{w}x{h} -> {}",
                result.height()
            );
        }
    }

    #[test]
    fn test_rescale_is_identity_at_target_width() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(550, 80));
        let result = rescale_to_width(&img, 550);
        assert_eq!(result.dimensions(), (550, 80));
    }

    #[test]
    fn test_load_returns_both_copies() {
        let storage = MemoryStorage::new();
        storage.insert("/in/page.jpg", DynamicImage::ImageRgb8(RgbImage::new(1100, 1600)));

        let loaded = load(&storage, Path::new("/in/page.jpg"), 550).unwrap();
        assert_eq!(loaded.full.dimensions(), (1100, 1600));
        assert_eq!(loaded.rescaled.dimensions(), (550, 800));
    }

    #[test]
    fn test_load_missing_image_fails() {
        let storage = MemoryStorage::new();
        let result = load(&storage, Path::new("/in/absent.jpg"), 550);
        assert!(matches!(result, Err(ExtractError::InputNotFound(_))));
    }
}

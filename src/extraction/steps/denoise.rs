use image::GrayImage;
use imageproc::filter::{median_filter, separable_filter_equal};

/// Median filter with a square `kernel_size` window
/// Median filter preserves edges better than Gaussian blur, and removes
/// salt-and-pepper specks before thresholding
pub fn median(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    let radius = kernel_size / 2;
    median_filter(gray, radius, radius)
}

/// Gaussian smoothing over a `kernel_size` square window, edges replicated
pub fn gaussian(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    separable_filter_equal(gray, &gaussian_kernel(kernel_size))
}

/// Normalized 1-D Gaussian of `size` taps with the sigma implied by the size
///
/// Sizes up to 7 use OpenCV's fixed binomial-like tables; larger sizes use
/// sigma = 0.3 * ((size - 1) / 2 - 1) + 0.8.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![
            0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
        ],
        _ => {
            let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let center = (size / 2) as f32;
            let raw: Vec<f32> = (0..size)
                .map(|i| {
                    let d = i as f32 - center;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f32 = raw.iter().sum();
            raw.into_iter().map(|w| w / sum).collect()
        }
    }
}

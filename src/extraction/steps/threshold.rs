use super::denoise;
use image::{GrayImage, Luma};

/// Which side of the local threshold becomes foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels brighter than the local threshold become 255
    Binary,
    /// Pixels brighter than the local threshold become 0 (dark ink -> 255)
    Inverted,
}

/// Adaptive threshold against a Gaussian-weighted local mean
///
/// threshold(x, y) = gaussian_mean(x, y) - bias, over a `block_size` window
/// with edge pixels replicated.
pub fn adaptive_gaussian(
    img: &GrayImage,
    block_size: u32,
    bias: f32,
    polarity: Polarity,
) -> GrayImage {
    let local_mean = denoise::gaussian(img, block_size);
    binarize(img, &local_mean, bias, polarity)
}

/// Adaptive threshold against the plain box mean of a `block_size` window
pub fn adaptive_mean(img: &GrayImage, block_size: u32, bias: f32, polarity: Polarity) -> GrayImage {
    let (width, height) = img.dimensions();
    let half_window = block_size as i32 / 2;
    let integral = compute_integral_image(img);

    let local_mean = GrayImage::from_fn(width, height, |x, y| {
        let x1 = (x as i32 - half_window).max(0) as u32;
        let y1 = (y as i32 - half_window).max(0) as u32;
        let x2 = (x as i32 + half_window).min(width as i32 - 1) as u32;
        let y2 = (y as i32 + half_window).min(height as i32 - 1) as u32;
        Luma([window_mean(&integral, x1, y1, x2, y2).round() as u8])
    });

    binarize(img, &local_mean, bias, polarity)
}

fn binarize(img: &GrayImage, local_mean: &GrayImage, bias: f32, polarity: Polarity) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let mean = local_mean.get_pixel(x, y).0[0] as f32;
        let brighter = img.get_pixel(x, y).0[0] as f32 > mean - bias;
        let on = match polarity {
            Polarity::Binary => brighter,
            Polarity::Inverted => !brighter,
        };
        if on {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Integral image with a zero row and column prepended
fn compute_integral_image(img: &GrayImage) -> Vec<Vec<f64>> {
    let (width, height) = img.dimensions();
    let mut integral = vec![vec![0.0f64; width as usize + 1]; height as usize + 1];

    for y in 0..height as usize {
        for x in 0..width as usize {
            let val = img.get_pixel(x as u32, y as u32).0[0] as f64;
            integral[y + 1][x + 1] = val + integral[y][x + 1] + integral[y + 1][x] - integral[y][x];
        }
    }

    integral
}

fn window_mean(integral: &[Vec<f64>], x1: u32, y1: u32, x2: u32, y2: u32) -> f32 {
    let (x1, y1, x2, y2) = (x1 as usize, y1 as usize, x2 as usize + 1, y2 as usize + 1);
    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = integral[y2][x2] - integral[y1][x2] - integral[y2][x1] + integral[y1][x1];
    (sum / area) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_pattern() -> GrayImage {
        // Dark stroke on a light background
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }
        img
    }

    #[test]
    fn test_inverted_gaussian_marks_ink_as_foreground() {
        let result = adaptive_gaussian(&text_pattern(), 5, 5.0, Polarity::Inverted);
        assert_eq!(result.get_pixel(25, 10).0[0], 255);
        assert_eq!(result.get_pixel(25, 3).0[0], 0);
    }

    #[test]
    fn test_binary_gaussian_marks_ink_as_background() {
        let result = adaptive_gaussian(&text_pattern(), 7, 4.0, Polarity::Binary);
        assert_eq!(result.get_pixel(25, 10).0[0], 0);
        assert_eq!(result.get_pixel(25, 3).0[0], 255);
    }

    #[test]
    fn test_uniform_image_has_no_foreground_when_inverted() {
        let img = GrayImage::from_pixel(30, 30, Luma([255]));
        let result = adaptive_gaussian(&img, 5, 5.0, Polarity::Inverted);
        assert!(result.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_adaptive_mean_binarizes() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));
        let result = adaptive_mean(&img, 7, 11.0, Polarity::Inverted);
        for pixel in result.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn test_adaptive_mean_detects_stroke() {
        let result = adaptive_mean(&text_pattern(), 7, 11.0, Polarity::Inverted);
        assert_eq!(result.get_pixel(25, 10).0[0], 255);
        assert_eq!(result.get_pixel(25, 2).0[0], 0);
    }
}

//! Synthetic pages shared by the extraction tests

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// White page with one row of dark "words" starting at each `rows` offset
pub fn handwritten_page(width: u32, height: u32, rows: &[i32]) -> DynamicImage {
    let mut page = RgbImage::from_pixel(width, height, Rgb([250, 250, 250]));
    for &y in rows {
        let mut x = 60;
        while x + 40 < width as i32 - 60 {
            draw_filled_rect_mut(
                &mut page,
                Rect::at(x, y).of_size(40, 10),
                Rgb([30, 30, 40]),
            );
            x += 50;
        }
    }
    DynamicImage::ImageRgb8(page)
}

pub fn blank_page(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([250, 250, 250])))
}

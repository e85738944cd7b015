use super::regions::{self, BoundingBox};
use super::{denoise, dilate, threshold};
use crate::config::{CharParams, LineOrder};
use crate::error::ExtractError;
use crate::storage::Storage;
use image::{DynamicImage, RgbImage};
use std::path::Path;

pub const CHARS_DIR: &str = "chars";

/// Boxes around individual characters of a full-resolution page
pub fn find_chars(page: &DynamicImage, params: &CharParams) -> Vec<BoundingBox> {
    let gray = page.to_luma8();
    let blurred = denoise::median(&gray, params.median_kernel);
    let thresh = threshold::adaptive_mean(
        &blurred,
        params.block_size,
        params.bias,
        threshold::Polarity::Inverted,
    );
    // Tall ellipse joins the pieces of one letter without bridging neighbours
    let element = dilate::Element::Ellipse {
        width: params.dilate_width,
        height: params.dilate_height,
    };
    let dilated = dilate::apply(&thresh, element, 1);

    let mut boxes = regions::external_boxes(&dilated);
    regions::order_boxes(&mut boxes, LineOrder::Spatial);
    boxes
}

/// Crop every character of `page` into `<out_dir>/chars/char<N>.jpg`
pub fn extract_chars<S: Storage + ?Sized>(
    storage: &S,
    page: &DynamicImage,
    out_dir: &Path,
    params: &CharParams,
) -> Result<usize, ExtractError> {
    let boxes = find_chars(page, params);
    let chars_dir = out_dir.join(CHARS_DIR);
    storage.clear(&chars_dir)?;

    let rgb: RgbImage = page.to_rgb8();
    for (idx, bbox) in boxes.iter().enumerate() {
        let piece = regions::crop(&rgb, bbox);
        storage.write(
            &chars_dir.join(format!("char{}.jpg", idx + 1)),
            &DynamicImage::ImageRgb8(piece),
        )?;
    }
    tracing::debug!("Extracted {} characters", boxes.len());
    Ok(boxes.len())
}

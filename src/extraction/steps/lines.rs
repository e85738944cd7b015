use super::regions::{self, BoundingBox};
use super::{deskew, denoise, dilate, threshold};
use crate::config::{DeskewParams, SegmentParams};
use crate::error::ExtractError;
use crate::storage::Storage;
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

pub const THRESHOLDED_FILE: &str = "thresholded.jpg";
pub const LINES_DIR: &str = "lines";

pub fn line_file_name(number: usize) -> String {
    format!("line{number}.jpg")
}

/// Text lines found on one page
#[derive(Debug, Clone)]
pub struct PageLines {
    /// Inverted adaptive threshold, before dilation
    pub threshold: GrayImage,
    /// Rotation applied, `None` when no skew signal was found
    pub skew_degrees: Option<f32>,
    pub boxes: Vec<BoundingBox>,
    /// Crops of the rotated page, one per box, in numbering order
    pub lines: Vec<RgbImage>,
}

/// What was persisted for a page
#[derive(Debug, Clone)]
pub struct LineSummary {
    pub count: usize,
    pub skew_degrees: Option<f32>,
}

/// Threshold, fuse, deskew and crop the text lines of `page`
pub fn find_lines(
    page: &DynamicImage,
    params: &SegmentParams,
    deskew_params: &DeskewParams,
) -> Result<PageLines, ExtractError> {
    let gray = page.to_luma8();
    let blurred = denoise::median(&gray, params.median_kernel);
    let thresh = threshold::adaptive_gaussian(
        &blurred,
        params.block_size,
        params.bias,
        threshold::Polarity::Inverted,
    );

    // Wide, short element: joins strokes along a line, keeps lines apart
    let element = dilate::Element::Rect {
        width: params.dilate_width,
        height: params.dilate_height,
    };
    let dilated = dilate::apply(&thresh, element, params.dilate_iterations);

    let color = page.to_rgb8();
    let (mask, rotated, skew_degrees) = match deskew::apply(&dilated, &color, deskew_params) {
        Ok(deskewed) => (deskewed.mask, deskewed.image, Some(deskewed.angle_degrees)),
        Err(ExtractError::NoSkewSignal) => {
            tracing::warn!("No skew signal found, leaving page unrotated");
            (dilated, color, None)
        }
        Err(e) => return Err(e),
    };

    let mut boxes = regions::external_boxes(&mask);
    regions::order_boxes(&mut boxes, params.order);
    let lines = boxes.iter().map(|b| regions::crop(&rotated, b)).collect();

    Ok(PageLines {
        threshold: thresh,
        skew_degrees,
        boxes,
        lines,
    })
}

/// Segment `page` and persist the threshold mask and every line crop under `out_dir`
pub fn extract_lines<S: Storage + ?Sized>(
    storage: &S,
    page: &DynamicImage,
    out_dir: &Path,
    params: &SegmentParams,
    deskew_params: &DeskewParams,
) -> Result<LineSummary, ExtractError> {
    let found = find_lines(page, params, deskew_params)?;

    storage.ensure(out_dir)?;
    storage.write(
        &out_dir.join(THRESHOLDED_FILE),
        &DynamicImage::ImageLuma8(found.threshold),
    )?;

    let lines_dir = out_dir.join(LINES_DIR);
    storage.clear(&lines_dir)?;

    let count = found.lines.len();
    if count == 0 {
        tracing::warn!("No text lines detected in {}", out_dir.display());
    }
    for (idx, (line, bbox)) in found.lines.into_iter().zip(&found.boxes).enumerate() {
        let name = line_file_name(idx + 1);
        tracing::trace!("{} <- {:?}", name, bbox);
        storage.write(&lines_dir.join(name), &DynamicImage::ImageRgb8(line))?;
    }

    Ok(LineSummary {
        count,
        skew_degrees: found.skew_degrees,
    })
}

use crate::config::DeskewParams;
use crate::error::ExtractError;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// A straight run of ink found along a Hough line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl LineSegment {
    /// `atan2(dy, dx)` in degrees; positive when the segment falls to the right
    pub fn angle_degrees(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        dy.atan2(dx).to_degrees()
    }

    pub fn length(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Mask and page after rotation, with the angle that was applied
#[derive(Debug, Clone)]
pub struct Deskewed {
    pub mask: GrayImage,
    pub image: RgbImage,
    pub angle_degrees: f32,
}

/// Estimate skew from `mask`, apply the calibration offset, rotate both rasters
pub fn apply(
    mask: &GrayImage,
    image: &RgbImage,
    params: &DeskewParams,
) -> Result<Deskewed, ExtractError> {
    let measured = estimate_skew(mask, params)?;
    let angle = measured + params.correction_degrees;
    tracing::debug!(
        "Measured skew {:.3}°, rotating by {:.3}° after correction",
        measured,
        angle
    );

    Ok(Deskewed {
        mask: rotate_mask(mask, angle),
        image: rotate_image(image, angle),
        angle_degrees: angle,
    })
}

/// Mean angle, in degrees, of all near-horizontal segments in `mask`
pub fn estimate_skew(mask: &GrayImage, params: &DeskewParams) -> Result<f32, ExtractError> {
    let segments = detect_segments(mask, params);
    if segments.is_empty() {
        return Err(ExtractError::NoSkewSignal);
    }

    let total: f32 = segments.iter().map(LineSegment::angle_degrees).sum();
    tracing::trace!("Averaging {} segments", segments.len());
    Ok(total / segments.len() as f32)
}

/// Probabilistic Hough segments: accumulate lines, then split each line into
/// ink runs separated by gaps longer than `max_line_gap`
pub fn detect_segments(mask: &GrayImage, params: &DeskewParams) -> Vec<LineSegment> {
    let options = LineDetectionOptions {
        vote_threshold: params.vote_threshold,
        suppression_radius: params.suppression_radius,
    };

    detect_lines(mask, options)
        .iter()
        // angle_in_degrees is the normal's angle: 90 means a horizontal line
        .filter(|line| (line.angle_in_degrees as f32 - 90.0).abs() <= params.max_skew_degrees)
        .flat_map(|line| walk_line(mask, line, params))
        .collect()
}

fn walk_line(mask: &GrayImage, line: &PolarLine, params: &DeskewParams) -> Vec<LineSegment> {
    let (sin, cos) = (line.angle_in_degrees as f32).to_radians().sin_cos();
    let origin = (line.r * cos, line.r * sin);

    // Walk left to right
    let mut dir = (-sin, cos);
    if dir.0 < 0.0 || (dir.0 == 0.0 && dir.1 < 0.0) {
        dir = (-dir.0, -dir.1);
    }

    let (w, h) = (mask.width() as f32, mask.height() as f32);
    let projections = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
        .map(|(x, y): (f32, f32)| (x - origin.0) * dir.0 + (y - origin.1) * dir.1);
    let t_min = projections.iter().copied().fold(f32::INFINITY, f32::min).floor() as i32;
    let t_max = projections.iter().copied().fold(f32::NEG_INFINITY, f32::max).ceil() as i32;

    let mut segments = Vec::new();
    let mut run: Option<((f32, f32), (f32, f32))> = None;
    let mut gap = 0u32;

    let close = |run: ((f32, f32), (f32, f32)), segments: &mut Vec<LineSegment>| {
        let segment = LineSegment {
            start: run.0,
            end: run.1,
        };
        if segment.length() >= params.min_line_length {
            segments.push(segment);
        }
    };

    for t in t_min..=t_max {
        let p = (origin.0 + t as f32 * dir.0, origin.1 + t as f32 * dir.1);
        if is_ink_near(mask, p, (cos, sin)) {
            run = Some(match run {
                Some((start, _)) => (start, p),
                None => (p, p),
            });
            gap = 0;
        } else if let Some(open) = run {
            gap += 1;
            if gap > params.max_line_gap {
                close(open, &mut segments);
                run = None;
                gap = 0;
            }
        }
    }
    if let Some(open) = run {
        close(open, &mut segments);
    }

    segments
}

/// Accumulator bins truncate `r`, so look one pixel either side along the normal
fn is_ink_near(mask: &GrayImage, p: (f32, f32), normal: (f32, f32)) -> bool {
    [-1.0f32, 0.0, 1.0].iter().any(|k| {
        let x = (p.0 + k * normal.0).round();
        let y = (p.1 + k * normal.1).round();
        x >= 0.0
            && y >= 0.0
            && (x as u32) < mask.width()
            && (y as u32) < mask.height()
            && mask.get_pixel(x as u32, y as u32).0[0] > 0
    })
}

/// Rotate a binary mask counter-clockwise by `angle_degrees`, keeping it binary
pub fn rotate_mask(mask: &GrayImage, angle_degrees: f32) -> GrayImage {
    if angle_degrees.abs() < f32::EPSILON {
        return mask.clone();
    }
    rotate_about_center(
        mask,
        -angle_degrees.to_radians(),
        Interpolation::Nearest,
        Luma([0u8]),
    )
}

/// Rotate a page counter-clockwise by `angle_degrees`, filling exposed corners white
pub fn rotate_image(image: &RgbImage, angle_degrees: f32) -> RgbImage {
    if angle_degrees.abs() < f32::EPSILON {
        return image.clone();
    }
    rotate_about_center(
        image,
        -angle_degrees.to_radians(),
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
    )
}

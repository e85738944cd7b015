use crate::config::LineOrder;
use image::{imageops, GrayImage, ImageBuffer, Pixel};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Axis-aligned crop rectangle over a source raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box containing every point; `None` for an empty contour
    pub fn from_points(points: &[Point<u32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// Bounding boxes of the outermost foreground regions of `mask`
///
/// Holes and anything nested inside a hole are skipped.
pub fn external_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<u32>(mask)
        .iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| BoundingBox::from_points(&contour.points))
        .collect()
}

/// Put boxes in numbering order
pub fn order_boxes(boxes: &mut [BoundingBox], order: LineOrder) {
    if order == LineOrder::Spatial {
        boxes.sort_by_key(|b| (b.y, b.x));
    }
}

/// Copy the region under `bbox` into a new buffer
pub fn crop<P: Pixel + 'static>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    bbox: &BoundingBox,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
}

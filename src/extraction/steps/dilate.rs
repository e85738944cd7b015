use image::{GrayImage, Luma};

/// Structuring element shapes used for fusing ink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Rect { width: u32, height: u32 },
    Ellipse { width: u32, height: u32 },
}

impl Element {
    /// Offsets relative to the anchor (element centre) that belong to the element
    fn offsets(&self) -> Vec<(i32, i32)> {
        let (width, height) = match *self {
            Element::Rect { width, height } | Element::Ellipse { width, height } => (width, height),
        };
        let anchor_x = (width / 2) as i32;
        let anchor_y = (height / 2) as i32;

        let mut offsets = Vec::new();
        for j in 0..height as i32 {
            for i in 0..width as i32 {
                let inside = match self {
                    Element::Rect { .. } => true,
                    Element::Ellipse { .. } => {
                        let rx = (width as f32 / 2.0).max(0.5);
                        let ry = (height as f32 / 2.0).max(0.5);
                        let nx = (i - anchor_x) as f32 / rx;
                        let ny = (j - anchor_y) as f32 / ry;
                        nx * nx + ny * ny <= 1.0
                    }
                };
                if inside {
                    offsets.push((i - anchor_x, j - anchor_y));
                }
            }
        }
        offsets
    }
}

/// Grey-level dilation (local max over the element), repeated `iterations` times
///
/// Pixels outside the image never contribute, so borders do not grow ink.
pub fn apply(img: &GrayImage, element: Element, iterations: u32) -> GrayImage {
    let offsets = element.offsets();
    let mut current = img.clone();
    for _ in 0..iterations {
        current = dilate_once(&current, &offsets);
    }
    current
}

fn dilate_once(img: &GrayImage, offsets: &[(i32, i32)]) -> GrayImage {
    let (width, height) = (img.width() as i32, img.height() as i32);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let max = offsets
            .iter()
            .filter_map(|&(dx, dy)| {
                let sx = x as i32 + dx;
                let sy = y as i32 + dy;
                (sx >= 0 && sy >= 0 && sx < width && sy < height)
                    .then(|| img.get_pixel(sx as u32, sy as u32).0[0])
            })
            .max()
            .unwrap_or(0);
        Luma([max])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_element_fuses_horizontal_gaps() {
        let mut img = GrayImage::new(60, 10);
        img.put_pixel(10, 5, Luma([255]));
        img.put_pixel(24, 5, Luma([255]));

        let result = apply(&img, Element::Rect { width: 16, height: 2 }, 1);

        // Gap of 13 pixels closes in a single pass
        for x in 10..=24 {
            assert_eq!(result.get_pixel(x, 5).0[0], 255, "gap at x={x}");
        }
        // Height 2 only grows one row, downward from the anchor
        assert_eq!(result.get_pixel(10, 6).0[0], 255);
        assert_eq!(result.get_pixel(10, 7).0[0], 0);
        assert_eq!(result.get_pixel(10, 4).0[0], 0);
    }

    #[test]
    fn test_iterations_accumulate() {
        let mut img = GrayImage::new(20, 20);
        img.put_pixel(10, 10, Luma([255]));
        let once = apply(&img, Element::Rect { width: 3, height: 3 }, 1);
        let twice = apply(&img, Element::Rect { width: 3, height: 3 }, 2);
        assert_eq!(once.get_pixel(12, 10).0[0], 0);
        assert_eq!(twice.get_pixel(12, 10).0[0], 255);
    }

    #[test]
    fn test_ellipse_is_narrower_at_its_ends() {
        let offsets = Element::Ellipse { width: 3, height: 7 }.offsets();
        assert!(offsets.contains(&(0, -3)));
        assert!(offsets.contains(&(1, 0)));
        assert!(!offsets.contains(&(1, -3)));
    }

    #[test]
    fn test_empty_mask_stays_empty() {
        let img = GrayImage::new(30, 30);
        let result = apply(&img, Element::Rect { width: 16, height: 2 }, 2);
        assert!(result.pixels().all(|p| p.0[0] == 0));
    }
}

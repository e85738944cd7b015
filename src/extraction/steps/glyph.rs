use super::lines::LINES_DIR;
use super::{denoise, threshold};
use crate::config::GlyphParams;
use crate::error::ExtractError;
use crate::storage::Storage;
use image::{imageops, DynamicImage, GrayImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

pub const GLYPHS_DIR: &str = "handwriting_png";
pub const CONCATENATED_FILE: &str = "concatenated_handwriting.png";

/// What the glyph stage produced for one page
#[derive(Debug, Clone, Default)]
pub struct GlyphSummary {
    pub glyphs: usize,
    /// Size of the concatenated strip, if one was written
    pub concatenated: Option<(u32, u32)>,
}

/// Number `N` of a `line<N>.jpg` file
pub fn parse_line_number(path: &Path) -> Result<u32, ExtractError> {
    let malformed = || ExtractError::MalformedLineFilename(path.display().to_string());
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(malformed)?;
    let digits = stem.strip_prefix("line").ok_or_else(malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(malformed()),
    }
}

/// Non-inverted adaptive threshold of a line: ink 0, paper 255
pub fn line_threshold(line: &DynamicImage, params: &GlyphParams) -> GrayImage {
    let gray = line.to_luma8();
    let smoothed = denoise::gaussian(&gray, params.blur_kernel);
    threshold::adaptive_gaussian(
        &smoothed,
        params.block_size,
        params.bias,
        threshold::Polarity::Binary,
    )
}

/// White RGB everywhere; alpha is the complement of the mask, so ink is opaque
pub fn glyph_from_mask(mask: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let value = mask.get_pixel(x, y).0[0];
        Rgba([255, 255, 255, 255 - value])
    })
}

/// Lay glyphs left to right, bottom-padding shorter ones with transparent rows
pub fn concatenate(glyphs: &[RgbaImage]) -> Option<RgbaImage> {
    if glyphs.is_empty() {
        return None;
    }
    let height = glyphs.iter().map(|g| g.height()).max().unwrap_or(0);
    let width = glyphs.iter().map(|g| g.width()).sum();

    let mut strip = RgbaImage::new(width, height);
    let mut x = 0i64;
    for glyph in glyphs {
        imageops::replace(&mut strip, glyph, x, 0);
        x += glyph.width() as i64;
    }
    Some(strip)
}

/// Line images under `<out_dir>/lines`, ordered by line number
fn numbered_lines<S: Storage + ?Sized>(
    storage: &S,
    lines_dir: &Path,
) -> Result<Vec<(u32, PathBuf)>, ExtractError> {
    let mut numbered = Vec::new();
    for path in storage.list_sorted(lines_dir)? {
        let is_jpg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg"));
        if is_jpg {
            numbered.push((parse_line_number(&path)?, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered)
}

/// Turn every persisted line of a page into a transparent glyph and build the strip
pub fn extract_glyphs<S: Storage + ?Sized>(
    storage: &S,
    out_dir: &Path,
    params: &GlyphParams,
) -> Result<GlyphSummary, ExtractError> {
    let lines_dir = out_dir.join(LINES_DIR);
    let glyphs_dir = out_dir.join(GLYPHS_DIR);

    let lines = numbered_lines(storage, &lines_dir)?;
    storage.clear(&glyphs_dir)?;
    let strip_path = out_dir.join(CONCATENATED_FILE);
    storage.remove(&strip_path)?;

    let mut summary = GlyphSummary::default();
    let mut collected = Vec::new();

    for (number, path) in lines {
        let line = storage.read(&path)?;
        let mask = line_threshold(&line, params);
        let glyph = glyph_from_mask(&mask);

        storage.write(
            &glyphs_dir.join(format!("line{number}_thresh.jpg")),
            &DynamicImage::ImageLuma8(mask),
        )?;
        storage.write(
            &glyphs_dir.join(format!("line{number}.png")),
            &DynamicImage::ImageRgba8(glyph.clone()),
        )?;
        summary.glyphs += 1;
        tracing::debug!("Processed line{}.jpg -> line{}.png", number, number);

        if number != params.header_line {
            collected.push(glyph);
        }
    }

    if let Some(strip) = concatenate(&collected) {
        summary.concatenated = Some(strip.dimensions());
        tracing::debug!(
            "Concatenated {} glyphs into {}x{}",
            collected.len(),
            strip.width(),
            strip.height()
        );
        storage.write(&strip_path, &DynamicImage::ImageRgba8(strip))?;
    }

    Ok(summary)
}

use crate::error::ExtractError;
use crate::Args;
use std::path::PathBuf;

/// Width every page is rescaled to before line segmentation
pub const DEFAULT_TARGET_WIDTH: u32 = 550;
/// Empirical offset added to the measured skew, tuned for one scan source
pub const DEFAULT_SKEW_CORRECTION_DEGREES: f32 = -1.0;

/// Order in which detected line boxes are numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LineOrder {
    /// Top-to-bottom, then left-to-right
    #[default]
    Spatial,
    /// Whatever order contour tracing produced them in
    Detection,
}

impl LineOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spatial => "spatial",
            Self::Detection => "detection",
        }
    }
}

/// Hough-based skew estimation parameters
#[derive(Debug, Clone)]
pub struct DeskewParams {
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_line_length: f32,
    pub max_line_gap: u32,
    /// Lines tilted further than this from horizontal are ignored
    pub max_skew_degrees: f32,
    pub correction_degrees: f32,
}

impl Default for DeskewParams {
    fn default() -> Self {
        Self {
            vote_threshold: 30,
            suppression_radius: 8,
            min_line_length: 5.0,
            max_line_gap: 20,
            max_skew_degrees: 15.0,
            correction_degrees: DEFAULT_SKEW_CORRECTION_DEGREES,
        }
    }
}

/// Page-level line segmentation parameters
#[derive(Debug, Clone)]
pub struct SegmentParams {
    pub median_kernel: u32,
    pub block_size: u32,
    pub bias: f32,
    pub dilate_width: u32,
    pub dilate_height: u32,
    pub dilate_iterations: u32,
    pub order: LineOrder,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            median_kernel: 5,
            block_size: 5,
            bias: 5.0,
            dilate_width: 16,
            dilate_height: 2,
            dilate_iterations: 2,
            order: LineOrder::Spatial,
        }
    }
}

/// Per-line glyph conversion parameters
#[derive(Debug, Clone)]
pub struct GlyphParams {
    /// Side of the Gaussian smoothing window
    pub blur_kernel: u32,
    pub block_size: u32,
    pub bias: f32,
    /// Line number left out of the concatenated strip
    pub header_line: u32,
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self {
            blur_kernel: 3,
            block_size: 7,
            bias: 4.0,
            header_line: 1,
        }
    }
}

/// Character segmentation parameters, applied at full resolution
#[derive(Debug, Clone)]
pub struct CharParams {
    pub median_kernel: u32,
    pub block_size: u32,
    pub bias: f32,
    pub dilate_width: u32,
    pub dilate_height: u32,
}

impl Default for CharParams {
    fn default() -> Self {
        Self {
            median_kernel: 7,
            block_size: 7,
            bias: 11.0,
            dilate_width: 3,
            dilate_height: 7,
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target_width: u32,
    pub deskew: DeskewParams,
    pub segment: SegmentParams,
    pub glyph: GlyphParams,
    pub chars: Option<CharParams>,
    pub resume: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("images"),
            output_dir: PathBuf::from("output"),
            target_width: DEFAULT_TARGET_WIDTH,
            deskew: DeskewParams::default(),
            segment: SegmentParams::default(),
            glyph: GlyphParams::default(),
            chars: None,
            resume: false,
        }
    }
}

impl Config {
    /// Reject parameter combinations the filters cannot run with
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.target_width == 0 {
            return Err(invalid("target width must be positive"));
        }
        check_odd("segment median kernel", self.segment.median_kernel)?;
        check_odd("segment block size", self.segment.block_size)?;
        check_odd("glyph blur kernel", self.glyph.blur_kernel)?;
        check_odd("glyph block size", self.glyph.block_size)?;
        if self.segment.dilate_width == 0 || self.segment.dilate_height == 0 {
            return Err(invalid("dilation element must be at least 1x1"));
        }
        if !(0.0..90.0).contains(&self.deskew.max_skew_degrees) {
            return Err(invalid("max skew must lie in [0, 90) degrees"));
        }
        if let Some(chars) = &self.chars {
            check_odd("char median kernel", chars.median_kernel)?;
            check_odd("char block size", chars.block_size)?;
        }
        Ok(())
    }
}

fn check_odd(name: &str, value: u32) -> Result<(), ExtractError> {
    if value < 3 || value % 2 == 0 {
        return Err(invalid(&format!(
            "{name} must be an odd number >= 3, got {value}"
        )));
    }
    Ok(())
}

fn invalid(msg: &str) -> ExtractError {
    ExtractError::InvalidConfig(msg.to_string())
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input_dir: args.input_dir,
            output_dir: args.output_dir,
            target_width: args.target_width,
            deskew: DeskewParams {
                vote_threshold: args.hough_threshold,
                min_line_length: args.min_line_length,
                max_line_gap: args.max_line_gap,
                max_skew_degrees: args.max_skew,
                correction_degrees: args.skew_correction,
                ..DeskewParams::default()
            },
            segment: SegmentParams {
                median_kernel: args.segment_median_kernel,
                block_size: args.segment_block_size,
                bias: args.segment_bias,
                dilate_width: args.dilate_width,
                dilate_height: args.dilate_height,
                dilate_iterations: args.dilate_iterations,
                order: args.line_order,
            },
            glyph: GlyphParams {
                blur_kernel: args.glyph_blur_kernel,
                block_size: args.glyph_block_size,
                bias: args.glyph_bias,
                header_line: args.header_line,
            },
            chars: args.extract_chars.then(CharParams::default),
            resume: args.resume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_even_block_size_is_rejected() {
        let mut config = Config::default();
        config.glyph.block_size = 6;
        assert!(matches!(
            config.validate(),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_target_width_is_rejected() {
        let config = Config {
            target_width: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_even_blur_kernel_is_rejected() {
        let mut config = Config::default();
        config.glyph.blur_kernel = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_char_params_validated_when_enabled() {
        let config = Config {
            chars: Some(CharParams {
                median_kernel: 4,
                ..CharParams::default()
            }),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;
mod config;
mod error;
mod extraction;
mod storage;

#[derive(Parser, Debug)]
#[command(name = "handwriting-extract")]
#[command(about = "Extract handwritten text lines from scanned pages as transparent PNG glyphs")]
#[command(version)]
pub struct Args {
    /// Directory of scanned pages; every file directly inside is processed
    #[arg(long, env = "HWX_INPUT_DIR", default_value = "images")]
    pub input_dir: PathBuf,

    /// Root directory for per-image outputs
    #[arg(long, env = "HWX_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Width pages are rescaled to before line segmentation
    #[arg(long, env = "HWX_TARGET_WIDTH", default_value_t = config::DEFAULT_TARGET_WIDTH)]
    pub target_width: u32,

    /// Degrees added to the measured skew before rotating
    #[arg(
        long,
        env = "HWX_SKEW_CORRECTION",
        default_value_t = config::DEFAULT_SKEW_CORRECTION_DEGREES,
        allow_hyphen_values = true
    )]
    pub skew_correction: f32,

    /// Hough accumulator votes needed for a line
    #[arg(long, default_value = "30")]
    pub hough_threshold: u32,

    /// Shortest ink run kept as a line segment, in pixels
    #[arg(long, default_value = "5")]
    pub min_line_length: f32,

    /// Longest gap bridged inside one line segment, in pixels
    #[arg(long, default_value = "20")]
    pub max_line_gap: u32,

    /// Segments tilted more than this many degrees are ignored
    #[arg(long, default_value = "15")]
    pub max_skew: f32,

    /// Median blur kernel before line thresholding (odd)
    #[arg(long, default_value = "5")]
    pub segment_median_kernel: u32,

    /// Adaptive threshold block size for line segmentation (odd)
    #[arg(long, default_value = "5")]
    pub segment_block_size: u32,

    /// Constant subtracted from the local mean during line segmentation
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    pub segment_bias: f32,

    /// Width of the dilation element that fuses a line
    #[arg(long, default_value = "16")]
    pub dilate_width: u32,

    /// Height of the dilation element that fuses a line
    #[arg(long, default_value = "2")]
    pub dilate_height: u32,

    #[arg(long, default_value = "2")]
    pub dilate_iterations: u32,

    /// Gaussian smoothing window applied to each line before thresholding (odd)
    #[arg(long, default_value = "3")]
    pub glyph_blur_kernel: u32,

    /// Adaptive threshold block size for glyphs (odd)
    #[arg(long, default_value = "7")]
    pub glyph_block_size: u32,

    /// Constant subtracted from the local mean for glyphs
    #[arg(long, default_value = "4", allow_hyphen_values = true)]
    pub glyph_bias: f32,

    /// Line number left out of the concatenated strip
    #[arg(long, default_value = "1")]
    pub header_line: u32,

    /// How detected lines are numbered
    #[arg(long, value_enum, default_value_t = config::LineOrder::Spatial)]
    pub line_order: config::LineOrder,

    /// Also crop individual characters from the full-resolution page
    #[arg(long)]
    pub extract_chars: bool,

    /// Skip images already completed according to the output manifest
    #[arg(long)]
    pub resume: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);
    config.validate()?;

    tracing::info!(
        "Starting handwriting-extract v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        "Reading {} -> writing {} (line order: {})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.segment.order.as_str()
    );

    let summary = batch::run(&config)?;

    tracing::info!(
        "Done: {} processed, {} failed, {} skipped",
        summary.processed,
        summary.failed,
        summary.skipped
    );

    Ok(())
}

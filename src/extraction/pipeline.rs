use crate::config::Config;
use crate::error::ExtractError;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use super::steps;

/// Timing information for a single extraction step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Outcome of running every stage over one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
    pub lines: usize,
    pub glyphs: usize,
    /// Rotation applied during segmentation, absent when no skew signal was found
    pub skew_degrees: Option<f32>,
    /// Width and height of the concatenated strip
    pub concatenated: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chars: Option<usize>,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Runs load -> lines -> glyphs (-> chars) for one image at a time
pub struct Pipeline<'a, S: Storage + ?Sized> {
    storage: &'a S,
    config: &'a Config,
}

impl<'a, S: Storage + ?Sized> Pipeline<'a, S> {
    pub fn new(storage: &'a S, config: &'a Config) -> Self {
        Self { storage, config }
    }

    /// Process `input`, writing everything under `out_dir`
    pub fn process(&self, input: &Path, out_dir: &Path) -> Result<ImageReport, ExtractError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();
        let config = self.config;

        let loaded = self.run_step("load", &mut steps_timing, || {
            steps::load::load(self.storage, input, config.target_width)
        })?;

        let lines = self.run_step("lines", &mut steps_timing, || {
            steps::lines::extract_lines(
                self.storage,
                &loaded.rescaled,
                out_dir,
                &config.segment,
                &config.deskew,
            )
        })?;

        let glyphs = self.run_step("glyphs", &mut steps_timing, || {
            steps::glyph::extract_glyphs(self.storage, out_dir, &config.glyph)
        })?;

        let chars = match &config.chars {
            Some(params) => Some(self.run_step("chars", &mut steps_timing, || {
                steps::chars::extract_chars(self.storage, &loaded.full, out_dir, params)
            })?),
            None => None,
        };

        Ok(ImageReport {
            lines: lines.count,
            glyphs: glyphs.glyphs,
            skew_degrees: lines.skew_degrees,
            concatenated: glyphs.concatenated,
            chars,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<T, F>(
        &self,
        name: &str,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<T, ExtractError>
    where
        F: FnOnce() -> Result<T, ExtractError>,
    {
        let step_start = Instant::now();
        let result = step_fn()?;
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!("Step {} finished in {}ms", name, time_ms);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CharParams;
    use crate::extraction::testing::{blank_page, handwritten_page};
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_three_line_page_end_to_end() {
        let storage = MemoryStorage::new();
        storage.insert("/in/page.jpg", handwritten_page(550, 300, &[60, 140, 220]));
        let config = Config::default();

        let report = Pipeline::new(&storage, &config)
            .process(Path::new("/in/page.jpg"), Path::new("/out/page"))
            .unwrap();

        assert_eq!(report.lines, 3);
        assert_eq!(report.glyphs, 3);
        let step_names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(step_names, vec!["load", "lines", "glyphs"]);

        let lines = storage.list_sorted(Path::new("/out/page/lines")).unwrap();
        assert_eq!(lines.len(), 3);
        let glyph_pngs = storage
            .list_sorted(Path::new("/out/page/handwriting_png"))
            .unwrap()
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "png"))
            .count();
        assert_eq!(glyph_pngs, 3);

        // Strip holds lines 2 and 3 only
        let width_of = |n: u32| {
            storage
                .get(format!("/out/page/handwriting_png/line{n}.png"))
                .unwrap()
                .width()
        };
        let (strip_width, _) = report.concatenated.unwrap();
        assert_eq!(strip_width, width_of(2) + width_of(3));
    }

    #[test]
    fn test_rerun_ignores_lines_left_from_an_earlier_run() {
        let storage = MemoryStorage::new();
        storage.insert("/in/page.jpg", handwritten_page(550, 300, &[60, 140, 220]));
        for n in [4, 5] {
            storage.insert(
                format!("/out/page/lines/line{n}.jpg"),
                handwritten_page(200, 30, &[10]),
            );
        }
        let config = Config::default();

        let report = Pipeline::new(&storage, &config)
            .process(Path::new("/in/page.jpg"), Path::new("/out/page"))
            .unwrap();

        assert_eq!(report.lines, 3);
        assert_eq!(report.glyphs, report.lines);
        assert!(!storage.contains("/out/page/handwriting_png/line4.png"));
        let width_of = |n: u32| {
            storage
                .get(format!("/out/page/handwriting_png/line{n}.png"))
                .unwrap()
                .width()
        };
        let (strip_width, _) = report.concatenated.unwrap();
        assert_eq!(strip_width, width_of(2) + width_of(3));
    }

    #[test]
    fn test_blank_page_produces_no_glyphs() {
        let storage = MemoryStorage::new();
        storage.insert("/in/blank.png", blank_page(800, 600));
        let config = Config::default();

        let report = Pipeline::new(&storage, &config)
            .process(Path::new("/in/blank.png"), Path::new("/out/blank"))
            .unwrap();

        assert_eq!(report.lines, 0);
        assert_eq!(report.glyphs, 0);
        assert_eq!(report.skew_degrees, None);
        assert!(report.concatenated.is_none());
        assert!(!storage.contains("/out/blank/concatenated_handwriting.png"));
    }

    #[test]
    fn test_char_stage_runs_when_enabled() {
        let storage = MemoryStorage::new();
        storage.insert("/in/page.jpg", handwritten_page(550, 300, &[60, 140, 220]));
        let config = Config {
            chars: Some(CharParams::default()),
            ..Config::default()
        };

        let report = Pipeline::new(&storage, &config)
            .process(Path::new("/in/page.jpg"), Path::new("/out/page"))
            .unwrap();

        assert!(report.chars.is_some_and(|n| n > 0));
        assert!(storage.contains("/out/page/chars/char1.jpg"));
    }

    #[test]
    fn test_missing_input_aborts_only_this_image() {
        let storage = MemoryStorage::new();
        let config = Config::default();
        let result = Pipeline::new(&storage, &config)
            .process(Path::new("/in/absent.jpg"), Path::new("/out/absent"));
        assert!(matches!(result, Err(ExtractError::InputNotFound(_))));
    }
}

//! Directory loop: every file directly under the input directory is run
//! through the pipeline on its own; one bad image never stops the batch.

use crate::config::Config;
use crate::error::ExtractError;
use crate::extraction::{ImageReport, Pipeline};
use crate::storage::{FsStorage, Storage};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-image result recorded in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Completed(ImageReport),
    Failed { code: String, error: String },
}

/// Outcomes keyed by input file name, rewritten after every image
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub images: BTreeMap<String, ImageOutcome>,
}

impl Manifest {
    /// Read a manifest; a missing file is an empty manifest
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = fs::File::open(path).map_err(|e| ExtractError::storage(path, e))?;
        serde_json::from_reader(file).map_err(|source| ExtractError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ExtractError> {
        let file = fs::File::create(path).map_err(|e| ExtractError::storage(path, e))?;
        serde_json::to_writer_pretty(file, self).map_err(|source| ExtractError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_completed(&self, name: &str) -> bool {
        matches!(self.images.get(name), Some(ImageOutcome::Completed(_)))
    }
}

/// Counts for the whole run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Process every file under `config.input_dir`
///
/// Fails only when the input directory cannot be listed or the output root
/// cannot be written; per-image failures are logged and recorded.
pub fn run(config: &Config) -> Result<BatchSummary, ExtractError> {
    let storage = FsStorage;
    let inputs = storage.list_sorted(&config.input_dir)?;
    storage.ensure(&config.output_dir)?;

    let manifest_path = config.output_dir.join(MANIFEST_FILE);
    let mut manifest = if config.resume {
        Manifest::load(&manifest_path)?
    } else {
        Manifest::default()
    };

    tracing::info!(
        "Found {} files in {}",
        inputs.len(),
        config.input_dir.display()
    );

    let pipeline = Pipeline::new(&storage, config);
    let mut summary = BatchSummary::default();
    // Output directory -> input file that owns it; first in sorted order wins
    let mut owners: BTreeMap<PathBuf, String> = BTreeMap::new();

    for input in inputs {
        let Some(name) = input.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping file with non UTF-8 name: {}", input.display());
            summary.skipped += 1;
            continue;
        };
        let name = name.to_string();

        let out_dir = output_dir_for(&config.output_dir, &input);
        let claimed = match owners.entry(out_dir.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(name.clone());
                Ok(())
            }
            Entry::Occupied(owner) => Err(ExtractError::OutputCollision {
                dir: out_dir.clone(),
                owner: owner.get().clone(),
            }),
        };

        if claimed.is_ok() && config.resume && manifest.is_completed(&name) {
            tracing::info!("Skipping {} (already completed)", name);
            summary.skipped += 1;
            continue;
        }

        let span = tracing::info_span!("image", file = %name);
        let _guard = span.enter();

        let outcome = match claimed.and_then(|()| pipeline.process(&input, &out_dir)) {
            Ok(report) => {
                tracing::info!(
                    lines = report.lines,
                    glyphs = report.glyphs,
                    time_ms = report.total_time_ms,
                    "Processed {}",
                    name
                );
                summary.processed += 1;
                ImageOutcome::Completed(report)
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "Skipping {}: {}", name, e);
                summary.failed += 1;
                ImageOutcome::Failed {
                    code: e.code().to_string(),
                    error: e.to_string(),
                }
            }
        };

        manifest.images.insert(name, outcome);
        manifest.save(&manifest_path)?;
    }

    Ok(summary)
}

/// `<output_root>/<file stem>`
pub fn output_dir_for(output_root: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_root.join(stem)
}

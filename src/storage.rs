//! Image persistence behind a small trait, so the pipeline can run against
//! the filesystem or an in-memory map.

use crate::error::ExtractError;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Where pipeline stages read and write rasters
pub trait Storage {
    /// Make sure a directory exists
    fn ensure(&self, dir: &Path) -> Result<(), ExtractError>;

    /// Persist an image; the encoding follows the file extension
    fn write(&self, path: &Path, image: &DynamicImage) -> Result<(), ExtractError>;

    /// Load a previously persisted (or input) image
    fn read(&self, path: &Path) -> Result<DynamicImage, ExtractError>;

    /// Files directly under `dir`, sorted by path
    fn list_sorted(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractError>;

    /// Delete a file; a missing file is not an error
    fn remove(&self, path: &Path) -> Result<(), ExtractError>;

    /// Create `dir` if needed and delete every file directly under it
    fn clear(&self, dir: &Path) -> Result<(), ExtractError> {
        self.ensure(dir)?;
        for path in self.list_sorted(dir)? {
            self.remove(&path)?;
        }
        Ok(())
    }
}

/// Filesystem-backed storage used by the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn ensure(&self, dir: &Path) -> Result<(), ExtractError> {
        fs::create_dir_all(dir).map_err(|e| ExtractError::storage(dir, e))
    }

    fn write(&self, path: &Path, image: &DynamicImage) -> Result<(), ExtractError> {
        image.save(path).map_err(|source| ExtractError::Encode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read(&self, path: &Path) -> Result<DynamicImage, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::InputNotFound(path.to_path_buf()));
        }
        image::open(path).map_err(|source| ExtractError::DecodeFailure {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_sorted(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
        if !dir.is_dir() {
            return Err(ExtractError::InputNotFound(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ExtractError::storage(dir, e))? {
            let entry = entry.map_err(|e| ExtractError::storage(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn remove(&self, path: &Path) -> Result<(), ExtractError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExtractError::storage(path, e)),
        }
    }
}

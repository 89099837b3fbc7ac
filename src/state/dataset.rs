//! Ordered datasets of RGB/depth image pairs.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::ImagePair;

/// Supported image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Check if a path has a supported image extension
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Errors raised while building a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// No usable image pairs
    #[error("Dataset contains no valid image pairs")]
    Empty,

    /// RGB image whose depth partner is missing; the pair is skipped
    #[error("Depth image {depth:?} for {rgb:?} not found")]
    PairNotFound {
        /// RGB image that was skipped
        rgb: PathBuf,
        /// Depth image that was expected
        depth: PathBuf,
    },

    /// Folder could not be listed
    #[error("Failed to read folder {path:?}: {source}")]
    Io {
        /// Folder being listed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Non-empty ordered list of image pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pairs: Vec<ImagePair>,
}

/// A dataset plus the pairs that were left out while building it.
#[derive(Debug)]
pub struct DatasetBuild {
    pub dataset: Dataset,
    /// One [`DatasetError::PairNotFound`] per skipped pair
    pub skipped: Vec<DatasetError>,
}

impl Dataset {
    /// Wrap an already validated list of pairs.
    pub fn new(pairs: Vec<ImagePair>) -> Result<Self, DatasetError> {
        if pairs.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { pairs })
    }

    /// Build a dataset from candidate pairs, skipping those whose depth image
    /// does not exist.
    pub fn from_pairs(candidates: Vec<ImagePair>) -> Result<DatasetBuild, DatasetError> {
        let mut pairs = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();

        for pair in candidates {
            if pair.depth.is_file() {
                pairs.push(pair);
            } else {
                log::warn!("Skipping {:?}: depth image {:?} not found", pair.rgb, pair.depth);
                skipped.push(DatasetError::PairNotFound {
                    rgb: pair.rgb,
                    depth: pair.depth,
                });
            }
        }

        Ok(DatasetBuild {
            dataset: Self::new(pairs)?,
            skipped,
        })
    }

    /// Pair every image in `rgb_dir` with the image in `depth_dir` that has the
    /// same file stem.
    ///
    /// RGB images are taken in path order. Images without a depth partner are
    /// skipped and reported in [`DatasetBuild::skipped`]. When several depth
    /// images share a stem the first in path order is used and the others are
    /// logged as ignored.
    pub fn from_folders(rgb_dir: &Path, depth_dir: &Path) -> Result<DatasetBuild, DatasetError> {
        let rgb_images = list_images(rgb_dir)?;

        let mut depth_by_stem: HashMap<OsString, PathBuf> = HashMap::new();
        for path in list_images(depth_dir)? {
            let Some(stem) = path.file_stem() else {
                continue;
            };
            match depth_by_stem.entry(stem.to_os_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(path);
                }
                Entry::Occupied(kept) => {
                    log::warn!(
                        "Ignoring depth image {:?}: {:?} has the same stem",
                        path,
                        kept.get()
                    );
                }
            }
        }

        let mut pairs = Vec::with_capacity(rgb_images.len());
        let mut skipped = Vec::new();

        for rgb in rgb_images {
            let depth = rgb.file_stem().and_then(|stem| depth_by_stem.get(stem));
            match depth {
                Some(depth) => pairs.push(ImagePair::new(rgb, depth.clone())),
                None => {
                    let expected = depth_dir.join(rgb.file_name().unwrap_or_default());
                    log::warn!("Skipping {:?}: no depth image in {:?}", rgb, depth_dir);
                    skipped.push(DatasetError::PairNotFound {
                        rgb,
                        depth: expected,
                    });
                }
            }
        }

        log::info!(
            "Paired {} images from {:?} and {:?} ({} skipped)",
            pairs.len(),
            rgb_dir,
            depth_dir,
            skipped.len()
        );

        Ok(DatasetBuild {
            dataset: Self::new(pairs)?,
            skipped,
        })
    }

    pub fn get(&self, index: usize) -> Option<&ImagePair> {
        self.pairs.get(index)
    }

    pub fn pairs(&self) -> &[ImagePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Image files directly inside `folder`, sorted by path.
fn list_images(folder: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let entries = std::fs::read_dir(folder).map_err(|source| DatasetError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    images.sort();
    Ok(images)
}

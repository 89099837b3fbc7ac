//! Image pair records and their persistence identity.

use std::fmt;
use std::path::{Path, PathBuf};

/// One RGB image together with its depth map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePair {
    /// Path to the color image
    pub rgb: PathBuf,
    /// Path to the depth map
    pub depth: PathBuf,
}

impl ImagePair {
    pub fn new(rgb: impl Into<PathBuf>, depth: impl Into<PathBuf>) -> Self {
        Self {
            rgb: rgb.into(),
            depth: depth.into(),
        }
    }

    /// Stable key under which this pair's annotations are stored.
    pub fn identity(&self) -> PairIdentity {
        PairIdentity::from_paths(&self.rgb, &self.depth)
    }
}

/// Persistence key for one image pair.
///
/// Built from the full paths of both images as given, so the same pair maps to
/// the same key regardless of its position in the dataset. Inside each part `\`
/// and `|` are escaped with a backslash, so two different pairs never share a
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairIdentity(String);

impl PairIdentity {
    /// Separator between the RGB and depth parts of a key.
    pub const SEPARATOR: char = '|';

    /// Escape prefix for separators and backslashes inside a part.
    pub const ESCAPE: char = '\\';

    /// Derive the identity of an (rgb, depth) pair.
    pub fn from_paths(rgb: &Path, depth: &Path) -> Self {
        Self(format!(
            "{}{}{}",
            key_part(rgb),
            Self::SEPARATOR,
            key_part(depth)
        ))
    }

    /// Wrap an existing key, e.g. one read back from the store.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as stored on disk.
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn key_part(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut part = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == PairIdentity::SEPARATOR || c == PairIdentity::ESCAPE {
            part.push(PairIdentity::ESCAPE);
        }
        part.push(c);
    }
    part
}

//! Serialized shape of one image pair's annotations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ImagePair;

/// Full store contents, keyed by pair identity.
///
/// A `BTreeMap` keeps the file ordering stable between saves.
pub type StoreMapping = BTreeMap<String, PairRecord>;

/// Source image paths recorded alongside the points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePaths {
    pub rgb: String,
    pub depth: String,
}

impl From<&ImagePair> for ImagePaths {
    fn from(pair: &ImagePair) -> Self {
        Self {
            rgb: pair.rgb.to_string_lossy().into_owned(),
            depth: pair.depth.to_string_lossy().into_owned(),
        }
    }
}

/// Stored annotations for one image pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    /// RGB coordinates as `[x, y]`, in ordinal order
    pub rgb_points: Vec<[i32; 2]>,
    /// Depth coordinates as `[x, y]`, positionally paired with `rgb_points`
    pub depth_points: Vec<[i32; 2]>,
    /// Where the images came from
    pub image_paths: ImagePaths,
}

/// A record whose two point lists cannot be paired.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record has {rgb} RGB points but {depth} depth points")]
pub struct RecordError {
    pub rgb: usize,
    pub depth: usize,
}

impl PairRecord {
    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.rgb_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rgb_points.is_empty()
    }

    /// Check that every RGB point has a depth partner.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.rgb_points.len() != self.depth_points.len() {
            return Err(RecordError {
                rgb: self.rgb_points.len(),
                depth: self.depth_points.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let record = PairRecord {
            rgb_points: vec![[100, 100]],
            depth_points: vec![[136, 92]],
            image_paths: ImagePaths {
                rgb: "rgb/a.png".to_string(),
                depth: "depth/a.png".to_string(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "rgb_points": [[100, 100]],
                "depth_points": [[136, 92]],
                "image_paths": {"rgb": "rgb/a.png", "depth": "depth/a.png"}
            })
        );
    }

    #[test]
    fn test_paths_from_pair() {
        let pair = ImagePair::new("data/rgb/1.png", "data/depth/1.png");
        let paths = ImagePaths::from(&pair);
        assert_eq!(paths.rgb, "data/rgb/1.png");
        assert_eq!(paths.depth, "data/depth/1.png");
    }

    #[test]
    fn test_validate() {
        let mut record = PairRecord {
            rgb_points: vec![[1, 2], [3, 4]],
            depth_points: vec![[1, 2], [3, 4]],
            image_paths: ImagePaths {
                rgb: String::new(),
                depth: String::new(),
            },
        };
        assert!(record.validate().is_ok());

        record.depth_points.pop();
        assert_eq!(record.validate(), Err(RecordError { rgb: 2, depth: 1 }));
    }
}

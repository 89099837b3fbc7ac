//! Point correspondences between an RGB image and its depth map.
//!
//! Every point stores its RGB coordinate and a depth coordinate derived from
//! it by the current offset. Ordinals are 1-based and follow insertion order;
//! consecutive points form the polyline drawn by the renderer.

use crate::format::{ImagePaths, PairRecord, RecordError};
use crate::model::OffsetVector;

/// A pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelCoord {
    pub x: i32,
    pub y: i32,
}

impl PixelCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This coordinate translated by `offset`.
    pub fn offset_by(self, offset: OffsetVector) -> Self {
        Self {
            x: self.x.saturating_add(offset.dx()),
            y: self.y.saturating_add(offset.dy()),
        }
    }

    fn to_array(self) -> [i32; 2] {
        [self.x, self.y]
    }

    fn from_array([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// One matched pair of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrespondencePoint {
    ordinal: u32,
    rgb: PixelCoord,
    depth: PixelCoord,
}

impl CorrespondencePoint {
    /// 1-based position in the set.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Coordinate in the RGB image.
    pub fn rgb(&self) -> PixelCoord {
        self.rgb
    }

    /// Coordinate in the depth map.
    pub fn depth(&self) -> PixelCoord {
        self.depth
    }
}

/// Ordered correspondence points for one image pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrespondenceSet {
    points: Vec<CorrespondencePoint>,
}

impl CorrespondenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point tapped on the RGB image.
    ///
    /// The depth coordinate is `rgb + offset`. Callers are responsible for
    /// refusing taps while the depth image is not loaded.
    pub fn append_from_rgb_tap(
        &mut self,
        rgb: PixelCoord,
        offset: OffsetVector,
    ) -> CorrespondencePoint {
        let point = CorrespondencePoint {
            ordinal: self.next_ordinal(),
            rgb,
            depth: rgb.offset_by(offset),
        };
        self.points.push(point);
        log::debug!(
            "Point {} at rgb ({}, {}) -> depth ({}, {})",
            point.ordinal,
            rgb.x,
            rgb.y,
            point.depth.x,
            point.depth.y
        );
        point
    }

    /// Recompute every depth coordinate from its RGB coordinate.
    pub fn rederive_all(&mut self, offset: OffsetVector) {
        for point in &mut self.points {
            point.depth = point.rgb.offset_by(offset);
        }
    }

    /// Remove all points. The next append starts again at ordinal 1.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[CorrespondencePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorrespondencePoint> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&CorrespondencePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, i.e. the segments of the drawn polyline.
    pub fn segments(
        &self,
    ) -> impl Iterator<Item = (&CorrespondencePoint, &CorrespondencePoint)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Snapshot in the on-disk record shape.
    pub fn to_persistable(&self, image_paths: ImagePaths) -> PairRecord {
        PairRecord {
            rgb_points: self.points.iter().map(|p| p.rgb.to_array()).collect(),
            depth_points: self.points.iter().map(|p| p.depth.to_array()).collect(),
            image_paths,
        }
    }

    /// Rebuild a set from a stored record.
    ///
    /// Depth coordinates are taken as stored, not re-derived from any offset.
    pub fn from_persistable(record: &PairRecord) -> Result<Self, RecordError> {
        record.validate()?;
        let points = record
            .rgb_points
            .iter()
            .zip(&record.depth_points)
            .zip(1u32..)
            .map(|((rgb, depth), ordinal)| CorrespondencePoint {
                ordinal,
                rgb: PixelCoord::from_array(*rgb),
                depth: PixelCoord::from_array(*depth),
            })
            .collect();
        Ok(Self { points })
    }

    fn next_ordinal(&self) -> u32 {
        self.points.last().map_or(1, |p| p.ordinal + 1)
    }
}

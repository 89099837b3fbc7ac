//! Annotation session: the entry point for UI events.
//!
//! The UI layer holds no annotation state of its own. It forwards taps,
//! offset edits and navigation requests here and redraws from the snapshots
//! the session exposes.

use std::fmt;

use thiserror::Error;

use crate::config::AppConfig;
use crate::error::Result;
use crate::format::{AnnotationStore, LoadOutcome};
use crate::model::{
    CorrespondencePoint, CorrespondenceSet, ImagePair, OffsetChange, OffsetModel, OffsetVector,
    PixelCoord,
};
use crate::overlay::{OverlayRequest, clamp_alpha};
use crate::state::{CursorState, Dataset, DatasetCursor, Navigation, Position};

/// Which image of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSide {
    Rgb,
    Depth,
}

impl fmt::Display for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSide::Rgb => write!(f, "RGB"),
            ImageSide::Depth => write!(f, "depth"),
        }
    }
}

/// Decode status of one image, as reported by the image loader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Not decoded yet
    #[default]
    Pending,
    /// Decoded and displayed
    Loaded { width: u32, height: u32 },
    /// Decoding failed
    Failed { reason: String },
}

impl ImageStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageStatus::Loaded { .. })
    }
}

/// Action refused because its inputs are not ready.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// A tap needs both images, since the depth image defines the frame the
    /// derived coordinate lives in.
    #[error("The {side} image is not loaded")]
    ImageNotLoaded {
        /// The missing image
        side: ImageSide,
    },

    /// Tap outside the RGB image
    #[error("Tap at ({x}, {y}) is outside the {width}x{height} RGB image")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

/// Annotation session combining offset, cursor and image status.
#[derive(Debug)]
pub struct AnnotationSession {
    offset: OffsetModel,
    cursor: DatasetCursor,
    rgb_status: ImageStatus,
    depth_status: ImageStatus,
    overlay_alpha: f32,
}

impl AnnotationSession {
    /// Create a session over `store` starting at `offset`.
    pub fn new(store: AnnotationStore, offset: OffsetVector) -> Self {
        Self {
            offset: OffsetModel::new(offset),
            cursor: DatasetCursor::new(store),
            rgb_status: ImageStatus::Pending,
            depth_status: ImageStatus::Pending,
            overlay_alpha: crate::constants::DEFAULT_OVERLAY_ALPHA,
        }
    }

    /// Create a session from configuration, loading the configured store.
    ///
    /// A corrupt store is not an error here: the session starts empty and the
    /// returned outcome carries the problem so the caller can warn the user.
    pub fn from_config(config: &AppConfig) -> Result<(Self, LoadOutcome)> {
        let (store, outcome) = AnnotationStore::open(&config.preferences.store_path)?;
        let mut session = Self::new(store, config.default_offset()?);
        session.set_overlay_alpha(config.preferences.overlay_alpha);
        Ok((session, outcome))
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    /// Record decode status for one image of the active pair.
    ///
    /// A failed decode only blocks tapping; navigation is unaffected.
    pub fn report_image(&mut self, side: ImageSide, status: ImageStatus) {
        if let ImageStatus::Failed { reason } = &status {
            log::warn!("Failed to load {} image: {}", side, reason);
        }
        match side {
            ImageSide::Rgb => self.rgb_status = status,
            ImageSide::Depth => self.depth_status = status,
        }
    }

    /// Add a correspondence for a tap on the RGB image.
    pub fn on_rgb_tap(&mut self, x: i32, y: i32) -> Result<CorrespondencePoint> {
        let ImageStatus::Loaded { width, height } = self.rgb_status else {
            return Err(PreconditionError::ImageNotLoaded {
                side: ImageSide::Rgb,
            }
            .into());
        };
        if !self.depth_status.is_loaded() {
            return Err(PreconditionError::ImageNotLoaded {
                side: ImageSide::Depth,
            }
            .into());
        }
        let inside = u32::try_from(x).is_ok_and(|x| x < width)
            && u32::try_from(y).is_ok_and(|y| y < height);
        if !inside {
            return Err(PreconditionError::OutOfBounds {
                x,
                y,
                width,
                height,
            }
            .into());
        }

        self.cursor.append(PixelCoord::new(x, y), self.offset.get())
    }

    /// Set the offset from integer input.
    pub fn on_offset_input(&mut self, dx: i32, dy: i32) -> Result<OffsetVector> {
        let change = self.offset.set(dx, dy)?;
        self.apply_offset_change(change)
    }

    /// Set the offset from text fields. Bad text leaves the offset unchanged.
    pub fn on_offset_text(&mut self, dx: &str, dy: &str) -> Result<OffsetVector> {
        let change = self.offset.set_from_text(dx, dy)?;
        self.apply_offset_change(change)
    }

    /// Set the offset from slider positions, clamped into range.
    pub fn on_offset_slider(&mut self, dx: f64, dy: f64) -> Result<OffsetVector> {
        let change = self.offset.set_from_slider(dx, dy);
        self.apply_offset_change(change)
    }

    /// Remove all points of the active pair.
    pub fn on_clear(&mut self) -> Result<()> {
        self.cursor.clear()
    }

    /// Load a dataset and activate its first pair.
    pub fn on_load_dataset(&mut self, pairs: Vec<ImagePair>) -> Result<Position> {
        let dataset = Dataset::new(pairs)?;
        let position = self.cursor.load_dataset(dataset)?;
        self.reset_images();
        Ok(position)
    }

    pub fn on_next(&mut self) -> Result<Navigation> {
        let navigation = self.cursor.next()?;
        if navigation.moved() {
            self.reset_images();
        }
        Ok(navigation)
    }

    pub fn on_previous(&mut self) -> Result<Navigation> {
        let navigation = self.cursor.previous()?;
        if navigation.moved() {
            self.reset_images();
        }
        Ok(navigation)
    }

    /// Set the overlay blending weight, clamped to `[0, 1]`.
    pub fn set_overlay_alpha(&mut self, alpha: f32) {
        self.overlay_alpha = clamp_alpha(alpha);
    }

    // ------------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------------

    /// Points of the active pair, for redraw.
    pub fn points(&self) -> &CorrespondenceSet {
        self.cursor.points()
    }

    /// Navigation position, or `None` without a dataset.
    pub fn position(&self) -> Option<Position> {
        self.cursor.position()
    }

    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn current_pair(&self) -> Option<&ImagePair> {
        self.cursor.current_pair()
    }

    pub fn offset(&self) -> OffsetVector {
        self.offset.get()
    }

    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    pub fn image_status(&self, side: ImageSide) -> &ImageStatus {
        match side {
            ImageSide::Rgb => &self.rgb_status,
            ImageSide::Depth => &self.depth_status,
        }
    }

    pub fn cursor(&self) -> &DatasetCursor {
        &self.cursor
    }

    /// Overlay parameters for the current offset and alpha.
    pub fn overlay_request<'a, I>(
        &self,
        base: &'a I,
        secondary: Option<&'a I>,
    ) -> OverlayRequest<'a, I> {
        OverlayRequest::new(base, secondary, self.offset.get(), self.overlay_alpha)
    }

    fn apply_offset_change(&mut self, change: OffsetChange) -> Result<OffsetVector> {
        if !change.is_change() {
            return Ok(change.current);
        }
        if let Err(e) = self.cursor.rederive(change.current) {
            self.offset.restore(change.previous);
            return Err(e);
        }
        Ok(change.current)
    }

    fn reset_images(&mut self) {
        self.rgb_status = ImageStatus::Pending;
        self.depth_status = ImageStatus::Pending;
    }
}

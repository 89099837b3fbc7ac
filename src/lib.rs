//! rgbd-annotate - RGB/Depth Correspondence Annotation Engine
//!
//! Core of a tool for marking matching landmark points between a color image
//! and its depth map across a dataset of image pairs. The UI layer feeds pixel
//! coordinates and offset edits into an [`AnnotationSession`] and redraws from
//! the snapshots it exposes; all persistence goes through the
//! [`AnnotationStore`](format::AnnotationStore).

pub mod color_utils;
pub mod config;
pub mod constants;
mod error;
pub mod format;
pub mod model;
pub mod overlay;
pub mod state;

pub use error::{Error, Result};
pub use format::{AnnotationStore, LoadOutcome};
pub use model::{
    CorrespondencePoint, CorrespondenceSet, ImagePair, OffsetModel, OffsetVector, PairIdentity,
    PixelCoord,
};
pub use state::{AnnotationSession, Dataset, DatasetCursor, Position};

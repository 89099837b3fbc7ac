//! Data models for RGB/depth correspondence annotation.

mod correspondence;
mod offset;
mod pair;

pub use correspondence::{CorrespondencePoint, CorrespondenceSet, PixelCoord};
pub use offset::{Axis, OffsetChange, OffsetModel, OffsetVector, ValidationError};
pub use pair::{ImagePair, PairIdentity};

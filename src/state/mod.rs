//! Dataset navigation and annotation session state.

mod cursor;
mod dataset;
mod session;

#[cfg(test)]
mod tests;

pub use cursor::{CursorState, DatasetCursor, Navigation, Position};
pub use dataset::{Dataset, DatasetBuild, DatasetError, IMAGE_EXTENSIONS, is_image_file};
pub use session::{AnnotationSession, ImageSide, ImageStatus, PreconditionError};

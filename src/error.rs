//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::format::{RecordError, StoreError};
use crate::model::ValidationError;
use crate::state::{DatasetError, PreconditionError};

/// Any error surfaced by the annotation engine to its caller.
///
/// Every variant is recoverable from the caller's point of view: the operation
/// that produced it left the prior in-memory state unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected offset input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Action refused because its inputs are not ready
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored record that cannot be turned back into points
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Dataset construction failure
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Image decoding or encoding failure
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Navigation requested while no dataset is loaded
    #[error("No dataset is loaded")]
    NoDataset,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

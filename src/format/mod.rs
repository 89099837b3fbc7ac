//! On-disk annotation store.
//!
//! Annotations for every image pair live in a single pretty-printed JSON
//! object keyed by [`PairIdentity`](crate::model::PairIdentity):
//!
//! ```json
//! {
//!   "rgb/0001.png|depth/0001.png": {
//!     "rgb_points": [[100, 100], [150, 120]],
//!     "depth_points": [[136, 92], [186, 112]],
//!     "image_paths": { "rgb": "rgb/0001.png", "depth": "depth/0001.png" }
//!   }
//! }
//! ```
//!
//! `rgb_points[i]` and `depth_points[i]` belong to the same point. Depth
//! coordinates are absolute; the offset that produced them is not stored.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rgbd_annotate::format::{AnnotationStore, LoadOutcome};
//!
//! let (store, outcome) = AnnotationStore::open("annotations.json")?;
//! if let LoadOutcome::Recovered(err) = outcome {
//!     log::warn!("{}", err);
//! }
//! ```

mod error;
mod record;
mod store;

pub use error::{CorruptStoreError, StoreError};
pub use record::{ImagePaths, PairRecord, RecordError, StoreMapping};
pub use store::{AnnotationStore, LoadOutcome};

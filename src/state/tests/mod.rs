//! Scenario tests for dataset navigation and the annotation session.
//!
//! These drive the cursor and session the way a UI would and check what ends
//! up in the store file on disk.

mod session_tests;

use std::path::Path;

use crate::format::AnnotationStore;
use crate::model::ImagePair;

/// `count` pairs named `0000.jpg`/`0000.png`, `0001.jpg`/`0001.png`, ...
fn pairs(count: usize) -> Vec<ImagePair> {
    (0..count)
        .map(|i| ImagePair::new(format!("rgb/{i:04}.jpg"), format!("depth/{i:04}.png")))
        .collect()
}

/// Fresh store instance reading the file at `path`.
fn reopen(path: &Path) -> AnnotationStore {
    let (store, _) = AnnotationStore::open(path).unwrap();
    store
}

//! Sequential navigation over a dataset with save-before-advance.
//!
//! The cursor owns the correspondence set of the active pair. Every edit is
//! written through to the [`AnnotationStore`] before it returns, and moving to
//! another pair flushes the outgoing set before the incoming one is built from
//! the store.

use crate::error::{Error, Result};
use crate::format::{AnnotationStore, ImagePaths};
use crate::model::{
    CorrespondencePoint, CorrespondenceSet, ImagePair, OffsetVector, PairIdentity, PixelCoord,
};
use crate::state::{Dataset, DatasetError};

/// Cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No dataset loaded; edits are kept in memory only
    Empty,
    /// Active pair index within the loaded dataset
    Positioned(usize),
}

/// Navigation position for display and control enabling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based index of the active pair
    pub index: usize,
    /// Number of pairs in the dataset
    pub total: usize,
}

impl Position {
    /// Whether `previous()` would move.
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Whether `next()` would move.
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }

    /// Get progress string like "3/15".
    pub fn progress(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Already at the boundary; nothing changed
    Stayed,
    /// Active pair changed
    Moved {
        /// Index before the move
        from: usize,
        /// Index after the move
        to: usize,
    },
}

impl Navigation {
    pub fn moved(&self) -> bool {
        matches!(self, Navigation::Moved { .. })
    }
}

#[derive(Debug)]
struct ActiveDataset {
    dataset: Dataset,
    index: usize,
}

/// Dataset cursor owning the active correspondence set.
///
/// Outside the crate the cursor is read-only apart from navigation. Edits go
/// through [`AnnotationSession`](crate::state::AnnotationSession), which
/// checks that both images are loaded before a tap reaches the set.
#[derive(Debug)]
pub struct DatasetCursor {
    store: AnnotationStore,
    active: Option<ActiveDataset>,
    points: CorrespondenceSet,
}

impl DatasetCursor {
    /// Create a cursor in the `Empty` state.
    pub fn new(store: AnnotationStore) -> Self {
        Self {
            store,
            active: None,
            points: CorrespondenceSet::new(),
        }
    }

    pub fn state(&self) -> CursorState {
        match &self.active {
            Some(active) => CursorState::Positioned(active.index),
            None => CursorState::Empty,
        }
    }

    /// Current position, or `None` without a dataset.
    pub fn position(&self) -> Option<Position> {
        self.active.as_ref().map(|active| Position {
            index: active.index,
            total: active.dataset.len(),
        })
    }

    /// The active image pair.
    pub fn current_pair(&self) -> Option<&ImagePair> {
        self.active
            .as_ref()
            .and_then(|active| active.dataset.get(active.index))
    }

    /// Identity of the active image pair.
    pub fn current_identity(&self) -> Option<PairIdentity> {
        self.current_pair().map(ImagePair::identity)
    }

    /// Points of the active pair.
    pub fn points(&self) -> &CorrespondenceSet {
        &self.points
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.active.as_ref().map(|active| &active.dataset)
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Load a dataset and activate its first pair.
    ///
    /// If a dataset is already active its current set is flushed first.
    pub fn load_dataset(&mut self, dataset: Dataset) -> Result<Position> {
        self.flush()?;

        let first = dataset.get(0).ok_or(DatasetError::Empty)?;
        let points = self.stored_set(first)?;

        if self.active.is_none() && !self.points.is_empty() {
            log::debug!(
                "Discarding {} unsaved points from the standalone session",
                self.points.len()
            );
        }

        log::info!("Loaded dataset with {} pairs", dataset.len());
        self.active = Some(ActiveDataset { dataset, index: 0 });
        self.points = points;
        self.log_activation();

        Ok(Position {
            index: 0,
            total: self.dataset().map_or(0, Dataset::len),
        })
    }

    /// Move to the next pair. No-op at the last pair.
    pub fn next(&mut self) -> Result<Navigation> {
        let index = self.active_index()?;
        self.move_to(index + 1)
    }

    /// Move to the previous pair. No-op at the first pair.
    pub fn previous(&mut self) -> Result<Navigation> {
        let index = self.active_index()?;
        match index.checked_sub(1) {
            Some(target) => self.move_to(target),
            None => Ok(Navigation::Stayed),
        }
    }

    /// Append a tapped point and persist the active set.
    ///
    /// If persisting fails the point is not kept. Image checks happen in
    /// [`on_rgb_tap`](crate::state::AnnotationSession::on_rgb_tap).
    pub(crate) fn append(
        &mut self,
        rgb: PixelCoord,
        offset: OffsetVector,
    ) -> Result<CorrespondencePoint> {
        let before = self.points.clone();
        let point = self.points.append_from_rgb_tap(rgb, offset);
        self.commit_or_restore(before)?;
        Ok(point)
    }

    /// Re-derive all depth points for a new offset and persist the active set.
    pub(crate) fn rederive(&mut self, offset: OffsetVector) -> Result<()> {
        let before = self.points.clone();
        self.points.rederive_all(offset);
        if self.points == before {
            return Ok(());
        }
        self.commit_or_restore(before)
    }

    /// Remove all points of the active pair, including its stored record.
    pub(crate) fn clear(&mut self) -> Result<()> {
        let before = self.points.clone();
        self.points.clear();
        self.commit_or_restore(before)
    }

    /// Write the active set to the store.
    ///
    /// A non-empty set is upserted. An empty set removes the stored record if
    /// there is one, so a cleared pair stays distinguishable from a pair that
    /// was never annotated; otherwise nothing is written.
    pub fn flush(&mut self) -> Result<()> {
        let Some(pair) = self.current_pair().cloned() else {
            return Ok(());
        };
        let identity = pair.identity();

        if self.points.is_empty() {
            if self.store.contains(&identity) {
                self.store.remove(&identity)?;
            } else {
                log::trace!("Nothing to flush for {}", identity);
            }
            return Ok(());
        }

        let record = self.points.to_persistable(ImagePaths::from(&pair));
        self.store.upsert(&identity, record)?;
        Ok(())
    }

    fn active_index(&self) -> Result<usize> {
        self.active
            .as_ref()
            .map(|active| active.index)
            .ok_or(Error::NoDataset)
    }

    fn move_to(&mut self, target: usize) -> Result<Navigation> {
        let Some(active) = &self.active else {
            return Err(Error::NoDataset);
        };
        let from = active.index;
        let Some(incoming) = active.dataset.get(target).cloned() else {
            log::trace!("Navigation to {} ignored at dataset boundary", target);
            return Ok(Navigation::Stayed);
        };

        self.flush()?;
        let points = self.stored_set(&incoming)?;

        self.points = points;
        if let Some(active) = self.active.as_mut() {
            active.index = target;
        }
        self.log_activation();
        Ok(Navigation::Moved { from, to: target })
    }

    /// Set for `pair` from the store, or empty when it was never annotated.
    fn stored_set(&self, pair: &ImagePair) -> Result<CorrespondenceSet> {
        match self.store.get(&pair.identity()) {
            Some(record) => Ok(CorrespondenceSet::from_persistable(record)?),
            None => Ok(CorrespondenceSet::new()),
        }
    }

    fn commit_or_restore(&mut self, before: CorrespondenceSet) -> Result<()> {
        if let Err(e) = self.flush() {
            self.points = before;
            return Err(e);
        }
        Ok(())
    }

    fn log_activation(&self) {
        if let (Some(pair), Some(position)) = (self.current_pair(), self.position()) {
            log::info!(
                "Activated pair {} ({:?}) with {} points",
                position.progress(),
                pair.rgb,
                self.points.len()
            );
        }
    }
}
